//! Classification of a new component list against the previous one

use crate::collection::ComponentCollection;
use crate::component::Component;

/// Result of comparing two collections by id and structural equality
#[derive(Debug, Default, PartialEq)]
pub struct ComponentDiff<'a> {
    /// In the new collection's order
    pub added: Vec<&'a Component>,
    /// New values whose previous value differs
    pub updated: Vec<&'a Component>,
    /// Ids of the previous collection that are gone, in previous order
    pub deleted: Vec<String>,
}

impl<'a> ComponentDiff<'a> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

pub fn diff<'a>(new: &'a ComponentCollection, old: &ComponentCollection) -> ComponentDiff<'a> {
    let mut result = ComponentDiff::default();

    for component in new.iter() {
        match old.get_by_id(component.id()) {
            None => result.added.push(component),
            Some(previous) if previous != component => result.updated.push(component),
            Some(_) => {}
        }
    }

    result.deleted = old
        .ids()
        .filter(|id| !new.contains(id))
        .map(str::to_string)
        .collect();

    result
}

/// Split into non-pointer and pointer components, keeping relative order
pub fn pointers_last<'a, I>(components: I) -> Vec<&'a Component>
where
    I: IntoIterator<Item = &'a Component>,
{
    let (pointers, shapes): (Vec<&Component>, Vec<&Component>) =
        components.into_iter().partition(|c| c.is_pointer());
    shapes.into_iter().chain(pointers).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classification() {
        let old = ComponentCollection::new(vec![
            Component::stock("s1", 0.0, 0.0, "A"),
            Component::stock("s2", 0.0, 0.0, "B"),
            Component::cloud("c1", 0.0, 0.0),
        ]);
        let new = ComponentCollection::new(vec![
            Component::stock("s1", 0.0, 0.0, "A"),
            Component::stock("s2", 10.0, 0.0, "B"),
            Component::flow("f1", "s1", "s2"),
        ]);

        let d = diff(&new, &old);
        let ids = |v: &Vec<&Component>| v.iter().map(|c| c.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids(&d.added), vec!["f1"]);
        assert_eq!(ids(&d.updated), vec!["s2"]);
        assert_eq!(d.deleted, vec!["c1"]);
    }

    #[test]
    fn test_identical_lists_diff_empty() {
        let list = vec![
            Component::stock("s1", 0.0, 0.0, "A"),
            Component::flow("f1", "s1", "p5,5"),
        ];
        let a = ComponentCollection::new(list.clone());
        let b = ComponentCollection::new(list);
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn test_pointers_last() {
        let list = vec![
            Component::flow("f1", "s1", "s2"),
            Component::stock("s1", 0.0, 0.0, "A"),
            Component::connection("k1", "s1", "f1"),
            Component::stock("s2", 0.0, 0.0, "B"),
        ];
        let ordered: Vec<&str> = pointers_last(&list).iter().map(|c| c.id()).collect();
        assert_eq!(ordered, vec!["s1", "s2", "f1", "k1"]);
    }
}
