//! Report shapes built from the enriched dependency list, and their renderers.
//!
//! - [`terminal`]: coloured tables, one section per group for grouped reports.
//!
//! Grouped reports keep their groups in a fixed order and serialize as a JSON
//! object whose keys appear in that order.

pub mod terminal;

use std::cmp::Ordering;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::collate::locale_cmp;
use crate::license::spdx::is_permissive;
use crate::models::{DependencyAdvanced, DependencySimple, ReportKind};

/// Group key used when the grouped-by value is missing.
pub const MISSING_KEY: &str = "false";

/// Groups with this many members or fewer are not reported as duplicates.
const DUPLICATE_THRESHOLD: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: String,
    pub items: Vec<DependencyAdvanced>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Groups(pub Vec<Group>);

impl Groups {
    #[cfg(test)]
    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|g| g.key.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn sorted_by(mut self, cmp: impl Fn(&str, &str) -> Ordering) -> Self {
        self.0.sort_by(|a, b| cmp(&a.key, &b.key));
        self
    }
}

impl Serialize for Groups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for group in &self.0 {
            map.serialize_entry(&group.key, &group.items)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Simple(Vec<DependencySimple>),
    Advanced(Vec<DependencyAdvanced>),
    Esm(Groups),
    License(Groups),
    GitHub(Vec<DependencyAdvanced>),
    Owner(Groups),
    Duplicates(Groups),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Simple(_) => ReportKind::Simple,
            Report::Advanced(_) => ReportKind::Advanced,
            Report::Esm(_) => ReportKind::Esm,
            Report::License(_) => ReportKind::License,
            Report::GitHub(_) => ReportKind::GitHub,
            Report::Owner(_) => ReportKind::Owner,
            Report::Duplicates(_) => ReportKind::Duplicates,
        }
    }
}

/// Shape an already sorted enriched list into the report `kind`.
///
/// A `simple` report built here strips the enrichment again; the pipeline
/// normally builds it straight from the flattened tree without enriching.
pub fn build(kind: ReportKind, advanceds: Vec<DependencyAdvanced>) -> Report {
    match kind {
        ReportKind::Simple => Report::Simple(advanceds.into_iter().map(|a| a.simple).collect()),
        ReportKind::Advanced => Report::Advanced(advanceds),
        ReportKind::GitHub => Report::GitHub(advanceds),
        ReportKind::Esm => Report::Esm(esm_groups(advanceds)),
        ReportKind::License => Report::License(license_groups(advanceds)),
        ReportKind::Owner => Report::Owner(owner_groups(advanceds)),
        ReportKind::Duplicates => Report::Duplicates(duplicate_groups(advanceds)),
    }
}

/// Partition `items` by `key`, keeping item order inside each group and groups in
/// order of first appearance.
pub fn group_by<F>(items: Vec<DependencyAdvanced>, key: F) -> Groups
where
    F: Fn(&DependencyAdvanced) -> String,
{
    let mut groups: Vec<Group> = Vec::new();
    for item in items {
        let k = key(&item);
        match groups.iter_mut().find(|g| g.key == k) {
            Some(group) => group.items.push(item),
            None => groups.push(Group {
                key: k,
                items: vec![item],
            }),
        }
    }
    Groups(groups)
}

/// `"true"` then `"false"`.
pub fn esm_groups(advanceds: Vec<DependencyAdvanced>) -> Groups {
    group_by(advanceds, |a| a.esm.to_string()).sorted_by(|a, b| locale_cmp(b, a))
}

pub fn license_groups(advanceds: Vec<DependencyAdvanced>) -> Groups {
    group_by(advanceds, |a| {
        a.spdx.clone().unwrap_or_else(|| MISSING_KEY.to_string())
    })
    .sorted_by(license_key_cmp)
}

pub fn owner_groups(advanceds: Vec<DependencyAdvanced>) -> Groups {
    group_by(advanceds, |a| {
        a.owner.clone().unwrap_or_else(|| MISSING_KEY.to_string())
    })
    .sorted_by(locale_cmp)
}

/// Names installed in more than [`DUPLICATE_THRESHOLD`] versions, in reverse name order.
pub fn duplicate_groups(advanceds: Vec<DependencyAdvanced>) -> Groups {
    let mut groups = group_by(advanceds, |a| a.name().to_string()).sorted_by(|a, b| locale_cmp(b, a));
    groups.0.retain(|g| g.items.len() > DUPLICATE_THRESHOLD);
    groups
}

/// Permissive licenses first (alphabetical), then other named licenses
/// (alphabetical), then the missing-license group.
pub fn license_key_cmp(a: &str, b: &str) -> Ordering {
    match (is_permissive(a), is_permissive(b)) {
        (true, true) => locale_cmp(a, b),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => match (a == MISSING_KEY, b == MISSING_KEY) {
            (true, true) => Ordering::Equal,
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, false) => locale_cmp(a, b),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{manifest, simple};

    fn advanced(name: &str, version: &str) -> DependencyAdvanced {
        DependencyAdvanced {
            simple: simple(name, version, Some("r")),
            esm: false,
            spdx: None,
            owner: None,
            repo: None,
            package: manifest(&format!(r#"{{ "name": "{}", "version": "{}" }}"#, name, version)),
            repository: None,
            repository_url: None,
            repository_readme_url: None,
            repository_readme: None,
            repository_license_url: None,
            repository_license: None,
        }
    }

    fn with_spdx(name: &str, spdx: Option<&str>) -> DependencyAdvanced {
        DependencyAdvanced {
            spdx: spdx.map(str::to_string),
            ..advanced(name, "1.0.0")
        }
    }

    #[test]
    fn test_license_key_order() {
        let mut keys = vec!["false", "GPL-3.0", "MIT"];
        keys.sort_by(|a, b| license_key_cmp(a, b));
        assert_eq!(keys, vec!["MIT", "GPL-3.0", "false"]);

        let mut keys = vec!["MPL-2.0", "false", "ISC", "Apache-2.0", "AGPL-3.0", "0BSD"];
        keys.sort_by(|a, b| license_key_cmp(a, b));
        assert_eq!(keys, vec!["0BSD", "Apache-2.0", "ISC", "AGPL-3.0", "MPL-2.0", "false"]);
    }

    #[test]
    fn test_license_groups_partition_input() {
        let input = vec![
            with_spdx("a", Some("MIT")),
            with_spdx("b", None),
            with_spdx("c", Some("GPL-3.0")),
            with_spdx("d", Some("MIT")),
            with_spdx("e", None),
        ];
        let groups = license_groups(input.clone());

        assert_eq!(groups.keys(), vec!["MIT", "GPL-3.0", "false"]);
        let mut seen: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.items.iter().map(|a| a.name()))
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(groups.0[0].items.len(), 2);
    }

    #[test]
    fn test_esm_true_first() {
        let input = vec![
            advanced("a", "1.0.0"),
            DependencyAdvanced {
                esm: true,
                ..advanced("b", "1.0.0")
            },
        ];
        let groups = esm_groups(input);
        assert_eq!(groups.keys(), vec!["true", "false"]);
        assert_eq!(groups.0[0].items[0].name(), "b");
    }

    #[test]
    fn test_owner_groups() {
        let owned = |name: &str, owner: Option<&str>| DependencyAdvanced {
            owner: owner.map(str::to_string),
            ..advanced(name, "1.0.0")
        };
        let groups = owner_groups(vec![
            owned("a", Some("sindresorhus")),
            owned("b", None),
            owned("c", Some("babel")),
            owned("d", Some("sindresorhus")),
        ]);
        assert_eq!(groups.keys(), vec!["babel", "false", "sindresorhus"]);
        assert_eq!(groups.0[2].items.len(), 2);
    }

    #[test]
    fn test_duplicates_keep_groups_larger_than_two() {
        let input = vec![
            advanced("a", "1.0.0"),
            advanced("a", "2.0.0"),
            advanced("b", "1.0.0"),
            advanced("b", "2.0.0"),
            advanced("b", "3.0.0"),
            advanced("c", "1.0.0"),
            advanced("c", "2.0.0"),
            advanced("c", "3.0.0"),
            advanced("c", "4.0.0"),
        ];
        let groups = duplicate_groups(input);
        assert_eq!(groups.keys(), vec!["c", "b"]);
        assert!(groups.iter().all(|g| g.items.len() > 2));
    }

    #[test]
    fn test_grouped_report_serializes_ordered_object() {
        let report = build(
            ReportKind::License,
            vec![with_spdx("a", None), with_spdx("b", Some("MIT"))],
        );
        let json = serde_json::to_string(&report).unwrap();
        let mit = json.find("\"MIT\"").unwrap();
        let missing = json.find("\"false\"").unwrap();
        assert!(mit < missing);
        assert!(json.starts_with('{'));
    }

    #[test]
    fn test_github_and_advanced_share_payload() {
        let input = vec![advanced("a", "1.0.0")];
        let github = serde_json::to_value(build(ReportKind::GitHub, input.clone())).unwrap();
        let plain = serde_json::to_value(build(ReportKind::Advanced, input)).unwrap();
        assert_eq!(github, plain);
    }

    #[test]
    fn test_simple_from_enriched_list_keeps_order() {
        let input = vec![advanced("a", "2.0.0"), advanced("a", "1.0.0"), advanced("b", "1.0.0")];
        let Report::Simple(simples) = build(ReportKind::Simple, input) else {
            panic!("expected a simple report");
        };
        let ids: Vec<&str> = simples.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a^2.0.0", "a^1.0.0", "b^1.0.0"]);
    }
}
