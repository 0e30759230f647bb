//! Tests for the id-unique, capacity-checked sets used for node links.
use procgraph::error::CollectionError;
use procgraph::prelude::*;

#[test]
fn test_add_is_idempotent_per_id() {
    let mut set = IdentifiableSet::new();
    assert_eq!(set.add(Identifier::from("a")), Ok(true));
    assert_eq!(set.add(Identifier::from("a")), Ok(false));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_singleton_rejects_second_distinct_element() {
    let mut set = IdentifiableSet::singleton();
    assert_eq!(set.add(Identifier::from("x")), Ok(true));

    let result = set.add(Identifier::from("y"));
    assert!(matches!(
        result,
        Err(CollectionError::IllegalState { ref id, max: 1 }) if id == "y"
    ));

    // Adding the element that is already there is not an error.
    assert_eq!(set.add(Identifier::from("x")), Ok(false));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_empty_set_accepts_nothing() {
    let mut set: IdentifiableSet<Identifier> = IdentifiableSet::empty();
    assert!(!set.has_room());
    assert!(matches!(
        set.add(Identifier::from("a")),
        Err(CollectionError::IllegalState { max: 0, .. })
    ));
    assert!(set.is_empty());
}

#[test]
fn test_bounded_set_keeps_insertion_order() {
    let mut set = IdentifiableSet::with_max(3);
    for id in ["c", "a", "b"] {
        set.add(Identifier::from(id)).unwrap();
    }
    assert!(!set.has_room());
    let ids: Vec<_> = set.ids().flatten().collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(set.position(Some("a")), Some(1));
}

#[test]
fn test_get_by_id_and_by_missing_id() {
    let mut set = IdentifiableSet::new();
    set.add(Identifier::from("known")).unwrap();
    assert_eq!(
        set.get(Some("known")).map(Identifier::as_str),
        Some("known")
    );
    assert!(set.get(Some("unknown")).is_none());
    assert!(set.get(None).is_none());
}

#[test]
fn test_element_without_id_is_found_by_none() {
    let mut set = IdentifiableSet::new();
    set.add(ProcessNode::activity()).unwrap();
    set.add(ProcessNode::end().with_id("end")).unwrap();

    // A second element without id counts as the same id.
    assert_eq!(set.add(ProcessNode::start()), Ok(false));
    assert!(set.get(None).is_some());
    assert_eq!(set.len(), 2);
}

#[test]
fn test_remove_variants() {
    let mut set = IdentifiableSet::new();
    for id in ["a", "b", "c"] {
        set.add(Identifier::from(id)).unwrap();
    }

    assert_eq!(set.remove_at(0).map(Identifier::into_inner), Ok("a".to_string()));
    assert_eq!(set.remove(&Identifier::from("c")), Ok(true));
    assert_eq!(set.remove("c"), Ok(false));
    assert_eq!(set.remove_id(Some("b")), Ok(true));
    assert!(set.is_empty());

    assert_eq!(
        set.remove_at(4),
        Err(CollectionError::IndexOutOfBounds { index: 4, len: 0 })
    );
}

#[test]
fn test_replace_at_keeps_ids_unique() {
    let mut set = IdentifiableSet::new();
    set.add(Identifier::from("a")).unwrap();
    set.add(Identifier::from("b")).unwrap();

    assert_eq!(
        set.replace_at(0, Identifier::from("z")),
        Ok(Identifier::from("a"))
    );
    assert!(matches!(
        set.replace_at(0, Identifier::from("b")),
        Err(CollectionError::IllegalState { .. })
    ));
}

#[test]
fn test_read_only_view_rejects_mutation() {
    let mut set = IdentifiableSet::new();
    set.add(Identifier::from("a")).unwrap();
    let mut view = set.clone().read_only();

    assert!(view.is_read_only());
    assert_eq!(
        view.add(Identifier::from("b")),
        Err(CollectionError::UnsupportedOperation("add"))
    );
    assert_eq!(
        view.remove_id(Some("a")),
        Err(CollectionError::UnsupportedOperation("remove"))
    );
    assert_eq!(view.clear(), Err(CollectionError::UnsupportedOperation("clear")));
    assert_eq!(view.len(), 1);

    // Wrapping an already read-only view changes nothing.
    let twice = view.clone().read_only();
    assert_eq!(twice, view);

    // The source set stays writable.
    assert_eq!(set.add(Identifier::from("b")), Ok(true));
}

#[test]
fn test_node_link_snapshots_are_read_only() {
    let mut node = ProcessNode::join(1, 2).with_id("merge");
    node.add_predecessor("a").unwrap();
    node.add_predecessor("b").unwrap();

    let mut snapshot = node.predecessor_snapshot();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.add(NodeRef::from("c")).is_err());
    assert_eq!(node.predecessors().len(), 2);
}
