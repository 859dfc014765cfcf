//! Transitive orphan search over pointer endpoints

use std::collections::{HashMap, HashSet, VecDeque};

/// A pointer and the component ids its endpoints name
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerRef<'a> {
    pub id: &'a str,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
}

/// Pointers that reference a removed id, directly or through other orphaned
/// pointers, in breadth-first order. Pointers listed in `removed` are never
/// reported.
pub fn orphan_closure(removed: &[String], pointers: &[PointerRef<'_>]) -> Vec<String> {
    let mut referencing: HashMap<&str, Vec<&str>> = HashMap::new();
    for pointer in pointers {
        for endpoint in [pointer.from, pointer.to].into_iter().flatten() {
            referencing.entry(endpoint).or_default().push(pointer.id);
        }
    }

    let mut gone: HashSet<&str> = removed.iter().map(|id| id.as_str()).collect();
    let mut queue: VecDeque<&str> = removed.iter().map(|id| id.as_str()).collect();
    let mut orphaned = Vec::new();

    while let Some(id) = queue.pop_front() {
        let Some(dependents) = referencing.get(id) else {
            continue;
        };
        for &dependent in dependents {
            if gone.insert(dependent) {
                orphaned.push(dependent.to_string());
                queue.push_back(dependent);
            }
        }
    }

    orphaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ptr<'a>(id: &'a str, from: &'a str, to: &'a str) -> PointerRef<'a> {
        PointerRef {
            id,
            from: Some(from),
            to: Some(to),
        }
    }

    #[test]
    fn test_direct_and_indirect() {
        let pointers = vec![
            ptr("f1", "s1", "c1"),
            ptr("k1", "p1", "f1"),
            ptr("k2", "k1", "v1"),
            ptr("k3", "p1", "v1"),
        ];
        let orphaned = orphan_closure(&["s1".to_string()], &pointers);
        assert_eq!(orphaned, vec!["f1", "k1", "k2"]);
    }

    #[test]
    fn test_nothing_references_removed() {
        let pointers = vec![ptr("f1", "s2", "c1")];
        assert!(orphan_closure(&["s1".to_string()], &pointers).is_empty());
    }

    #[test]
    fn test_cycle_between_pointers_terminates() {
        let pointers = vec![ptr("k1", "s1", "k2"), ptr("k2", "k1", "v1")];
        let orphaned = orphan_closure(&["s1".to_string()], &pointers);
        assert_eq!(orphaned, vec!["k1", "k2"]);
    }

    #[test]
    fn test_removed_pointer_not_reported() {
        let pointers = vec![ptr("f1", "s1", "c1")];
        let orphaned = orphan_closure(&["s1".to_string(), "f1".to_string()], &pointers);
        assert!(orphaned.is_empty());
    }
}
