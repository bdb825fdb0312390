use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::collate::locale_cmp;
use crate::models::{DependencyNode, DependencyNodes, DependencyRoot, DependencySimple};

/// Package name as the first path segment of a public registry tarball URL.
static REGISTRY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://registry\.npmjs\.org/([\w.-]+)/").unwrap());

/// Identity of a canonical dependency. `^` never occurs in package names or
/// resolved versions.
pub fn dependency_id(name: &str, version: &str) -> String {
    format!("{}^{}", name, version)
}

/// Canonical name of a tree node.
///
/// Aliased installs (`"foo": "npm:@scope/bar@1"`) keep the alias as their key in
/// the tree, so the real name is recovered from the tarball URL when possible.
pub fn dependency_name(declared: &str, node: &DependencyNode) -> String {
    let Some(resolved) = node.resolved.as_deref() else {
        return declared.to_string();
    };

    let differs =
        |caps: regex::Captures<'_>| Some(caps[1].to_string()).filter(|name| name != declared);

    let namespaced = Regex::new(&format!(r"/(@[\w-]+/{})/", regex::escape(declared)))
        .ok()
        .and_then(|re| re.captures(resolved).and_then(differs));

    namespaced
        .or_else(|| REGISTRY_REGEX.captures(resolved).and_then(differs))
        .unwrap_or_else(|| declared.to_string())
}

#[derive(Default)]
struct Accumulator {
    simples: Vec<DependencySimple>,
    index: HashMap<String, usize>,
}

impl Accumulator {
    fn visit(&mut self, nodes: Option<&DependencyNodes>) {
        let Some(nodes) = nodes else {
            return;
        };

        for (declared, node) in nodes.iter() {
            let name = dependency_name(declared, node);
            let id = dependency_id(&name, &node.version);
            let resolved = node.resolved.clone().filter(|r| !r.is_empty());

            match self.index.get(&id).copied() {
                Some(pos) => {
                    let existing = &mut self.simples[pos];
                    existing.nodes_nr += 1;
                    if existing.registry.is_none() {
                        existing.registry = resolved;
                    }
                }
                None => {
                    self.index.insert(id.clone(), self.simples.len());
                    self.simples.push(DependencySimple {
                        id,
                        name,
                        registry: resolved,
                        version: node.version.clone(),
                        nodes_nr: 1,
                    });
                }
            }

            // Children are visited for duplicates too: the same package can pull
            // in different versions at different positions.
            self.visit(node.dependencies.as_ref());
        }
    }
}

/// Collapse the installed tree into one record per `(name, version)`, sorted by name.
///
/// Only resolved records (those with a registry location) are returned when any
/// exist; unresolved records are then dropped from the listing. The unresolved
/// set is returned only when nothing in the tree is resolved.
pub fn flatten(root: &DependencyRoot) -> Vec<DependencySimple> {
    let mut acc = Accumulator::default();
    acc.visit(root.dependencies.as_ref());

    let (mut resolved, mut unresolved): (Vec<_>, Vec<_>) = acc
        .simples
        .into_iter()
        .partition(|simple| simple.registry.is_some());

    resolved.sort_by(|a, b| locale_cmp(&a.name, &b.name));
    unresolved.sort_by(|a, b| locale_cmp(&a.name, &b.name));

    if resolved.is_empty() {
        unresolved
    } else {
        if !unresolved.is_empty() {
            debug!(
                dropped = unresolved.len(),
                "ignoring dependencies without a resolved location"
            );
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> DependencyRoot {
        serde_json::from_str(json).unwrap()
    }

    fn node(version: &str, resolved: Option<&str>) -> DependencyNode {
        DependencyNode {
            resolved: resolved.map(str::to_string),
            version: version.to_string(),
            dependencies: None,
        }
    }

    #[test]
    fn test_single_dependency() {
        let root = parse(
            r#"{ "dependencies": { "a": { "version": "1.0.0", "resolved": "https://registry.npmjs.org/a/-/a-1.0.0.tgz" } } }"#,
        );
        let simples = flatten(&root);
        assert_eq!(
            simples,
            vec![DependencySimple {
                id: "a^1.0.0".to_string(),
                name: "a".to_string(),
                registry: Some("https://registry.npmjs.org/a/-/a-1.0.0.tgz".to_string()),
                version: "1.0.0".to_string(),
                nodes_nr: 1,
            }]
        );
    }

    #[test]
    fn test_duplicate_positions_collapse() {
        let root = parse(
            r#"{ "dependencies": {
                "lodash": { "version": "4.17.21", "resolved": "https://registry.npmjs.org/lodash/-/lodash-4.17.21.tgz" },
                "x": {
                    "version": "1.0.0",
                    "resolved": "https://registry.npmjs.org/x/-/x-1.0.0.tgz",
                    "dependencies": {
                        "lodash": { "version": "4.17.21", "resolved": "https://registry.npmjs.org/lodash/-/lodash-4.17.21.tgz" }
                    }
                }
            } }"#,
        );
        let simples = flatten(&root);
        assert_eq!(simples.len(), 2);
        assert_eq!(simples[0].id, "lodash^4.17.21");
        assert_eq!(simples[0].nodes_nr, 2);
        assert_eq!(simples[1].id, "x^1.0.0");
    }

    #[test]
    fn test_duplicates_still_visit_children() {
        let root = parse(
            r#"{ "dependencies": {
                "a": { "version": "1.0.0", "resolved": "r/a", "dependencies": { "b": { "version": "1.0.0", "resolved": "r/b1" } } },
                "c": { "version": "1.0.0", "resolved": "r/c", "dependencies": {
                    "a": { "version": "1.0.0", "resolved": "r/a", "dependencies": { "b": { "version": "2.0.0", "resolved": "r/b2" } } }
                } }
            } }"#,
        );
        let ids: Vec<String> = flatten(&root).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a^1.0.0", "b^1.0.0", "b^2.0.0", "c^1.0.0"]);
    }

    #[test]
    fn test_registry_adopted_from_later_occurrence() {
        let root = parse(
            r#"{ "dependencies": {
                "a": { "version": "1.0.0" },
                "b": { "version": "1.0.0", "resolved": "r/b", "dependencies": {
                    "a": { "version": "1.0.0", "resolved": "https://registry.npmjs.org/a/-/a-1.0.0.tgz" }
                } }
            } }"#,
        );
        let simples = flatten(&root);
        assert_eq!(simples[0].id, "a^1.0.0");
        assert_eq!(simples[0].nodes_nr, 2);
        assert_eq!(
            simples[0].registry.as_deref(),
            Some("https://registry.npmjs.org/a/-/a-1.0.0.tgz")
        );
    }

    #[test]
    fn test_unresolved_dropped_when_resolved_exist() {
        let root = parse(
            r#"{ "dependencies": {
                "linked": { "version": "0.0.1" },
                "real": { "version": "1.0.0", "resolved": "https://registry.npmjs.org/real/-/real-1.0.0.tgz" }
            } }"#,
        );
        let names: Vec<String> = flatten(&root).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn test_unresolved_kept_when_nothing_resolved() {
        let root = parse(
            r#"{ "dependencies": { "b": { "version": "1.0.0" }, "a": { "version": "1.0.0", "resolved": "" } } }"#,
        );
        let names: Vec<String> = flatten(&root).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_tree() {
        assert!(flatten(&DependencyRoot::default()).is_empty());
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let json = r#"{ "dependencies": {
            "zod": { "version": "3.0.0", "resolved": "r/zod" },
            "Zod": { "version": "3.0.0", "resolved": "r/Zod" },
            "abbrev": { "version": "1.0.0", "resolved": "r/abbrev", "dependencies": { "zod": { "version": "2.0.0", "resolved": "r/zod2" } } }
        } }"#;
        let first = serde_json::to_string(&flatten(&parse(json))).unwrap();
        let second = serde_json::to_string(&flatten(&parse(json))).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_name_without_resolved_is_declared() {
        assert_eq!(dependency_name("foo", &node("1.0.0", None)), "foo");
    }

    #[test]
    fn test_name_from_scoped_alias() {
        let n = node("7.0.0", Some("https://registry.npmjs.org/@babel/core/-/core-7.0.0.tgz"));
        assert_eq!(dependency_name("core", &n), "@babel/core");
        assert_eq!(dependency_name("@babel/core", &n), "@babel/core");
    }

    #[test]
    fn test_name_from_registry_alias() {
        let n = node(
            "4.2.3",
            Some("https://registry.npmjs.org/string-width/-/string-width-4.2.3.tgz"),
        );
        assert_eq!(dependency_name("string-width-cjs", &n), "string-width");
    }

    #[test]
    fn test_name_from_non_registry_location() {
        let n = node("1.0.0", Some("git+ssh://git@github.com/foo/bar.git#abc"));
        assert_eq!(dependency_name("bar", &n), "bar");
    }
}
