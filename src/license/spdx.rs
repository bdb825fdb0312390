use crate::models::{Package, Repository};

/// Licenses treated as least restrictive when ordering and colouring reports.
/// Matching is exact and case-sensitive.
pub const PERMISSIVE: [&str; 9] = [
    "Apache-2.0",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "BSL-1.0",
    "CC0-1.0",
    "MIT",
    "Unlicense",
    "ISC",
    "0BSD",
];

/// Placeholder GitHub reports when it cannot tell which license a repository uses.
const NOASSERTION: &str = "NOASSERTION";

pub fn is_permissive(spdx: &str) -> bool {
    PERMISSIVE.contains(&spdx)
}

/// Pick the license identifier of a dependency.
///
/// Preference: the SPDX id detected by the repository host, then the manifest's
/// `license` field, then the first line of the repository's license file.
pub fn derive_spdx(
    pkg: &Package,
    repository: Option<&Repository>,
    license_text: Option<&str>,
) -> Option<String> {
    let detected = repository
        .and_then(|r| r.license.as_ref())
        .and_then(|l| l.spdx_id.as_deref())
        .filter(|id| !id.is_empty() && *id != NOASSERTION);

    if let Some(id) = detected {
        return Some(id.to_string());
    }

    if let Some(id) = pkg.license_id() {
        return Some(id.to_string());
    }

    license_text
        .and_then(|text| text.lines().next())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(license: Option<&str>) -> Package {
        let mut json = serde_json::json!({ "name": "a", "version": "1.0.0" });
        if let Some(license) = license {
            json["license"] = license.into();
        }
        serde_json::from_value(json).unwrap()
    }

    fn repository(spdx_id: Option<&str>) -> Repository {
        serde_json::from_value(serde_json::json!({
            "description": "repo",
            "license": spdx_id.map(|id| serde_json::json!({ "key": "x", "spdx_id": id })),
        }))
        .unwrap()
    }

    #[test]
    fn test_permissive_set() {
        for id in PERMISSIVE {
            assert!(is_permissive(id));
        }
        assert!(!is_permissive("GPL-3.0"));
        assert!(!is_permissive("mit"));
        assert!(!is_permissive("MPL-2.0"));
    }

    #[test]
    fn test_repository_spdx_wins() {
        let repo = repository(Some("Apache-2.0"));
        assert_eq!(
            derive_spdx(&package(Some("MIT")), Some(&repo), Some("BSD")),
            Some("Apache-2.0".to_string())
        );
    }

    #[test]
    fn test_noassertion_falls_back_to_manifest() {
        let repo = repository(Some("NOASSERTION"));
        assert_eq!(
            derive_spdx(&package(Some("MIT")), Some(&repo), None),
            Some("MIT".to_string())
        );
    }

    #[test]
    fn test_license_text_first_line() {
        let repo = repository(None);
        assert_eq!(
            derive_spdx(&package(None), Some(&repo), Some("  The MIT License  \n\nCopyright")),
            Some("The MIT License".to_string())
        );
        assert_eq!(
            derive_spdx(&package(None), None, Some("ISC")),
            Some("ISC".to_string())
        );
    }

    #[test]
    fn test_nothing_known() {
        assert_eq!(derive_spdx(&package(None), None, None), None);
        assert_eq!(derive_spdx(&package(None), None, Some("\n\n")), None);
    }
}
