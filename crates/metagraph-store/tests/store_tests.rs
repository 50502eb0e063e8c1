use super::*;
use crate::builder::GraphBuilder;
use crate::error::KeyIndexError;
use crate::key_index::PropertyOrigin;
use crate::m3::CoreTypes;
use std::sync::Barrier;
use std::thread;

fn children(store: &NodeStore, parent: NodeId, names: &[&str]) -> Vec<NodeId> {
    let key = store.intern("children");
    names
        .iter()
        .map(|name| {
            let child = store.new_node(name, None);
            store.add_value(parent, key, child).expect("parent exists");
            child
        })
        .collect()
}

#[test]
fn test_new_node_assigns_unique_valid_ids() {
    let store = NodeStore::new();
    let class = store.new_node("Class", None);
    let dog = store.new_node("Dog", Some(class));
    assert!(class.is_valid());
    assert!(dog.is_valid());
    assert_ne!(class, dog);
    assert_eq!(&*store.name_string(dog), "Dog");
    assert_eq!(store.classifier_of(dog), Some(class));
    assert_eq!(store.classifier_of(class), None);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_ids_are_not_shared_between_stores() {
    let a = NodeStore::new();
    let b = NodeStore::new();
    let x = a.new_node("x", None);
    let y = b.new_node("y", None);
    assert_ne!(x, y);
    assert!(!b.contains(x));
    assert_ne!(a.instance_id(), b.instance_id());
}

#[test]
fn test_values_of_never_fails() {
    let store = NodeStore::new();
    let node = store.new_node("n", None);
    let key = store.intern("children");
    assert!(store.values_of(node, key).is_empty());
    assert!(store.values_of(NodeId(u32::MAX), key).is_empty());

    let target = store.new_node("t", None);
    store.set_value_to_one(node, key, target).expect("node exists");
    assert_eq!(&*store.values_of(node, key), &[target]);
}

#[test]
fn test_to_many_values_keep_order() {
    let store = NodeStore::new();
    let parent = store.new_node("p", None);
    let kids = children(&store, parent, &["c", "a", "b"]);
    assert_eq!(&*store.values_of(parent, store.intern("children")), &kids[..]);
}

#[test]
fn test_value_to_one_shapes() {
    let store = NodeStore::new();
    let node = store.new_node("n", None);
    let key = store.intern("children");
    assert_eq!(store.value_to_one(node, key), Ok(None));

    let kids = children(&store, node, &["only"]);
    assert_eq!(store.value_to_one(node, key), Ok(Some(kids[0])));

    children(&store, node, &["second"]);
    assert!(matches!(
        store.value_to_one(node, key),
        Err(StoreError::NotToOne { owner, .. }) if owner == node
    ));

    assert_eq!(
        store.value_to_one(NodeId(u32::MAX), key),
        Err(StoreError::UnknownNode(NodeId(u32::MAX)))
    );
}

#[test]
fn test_slot_on_to_one_property_is_rejected() {
    let store = NodeStore::new();
    let node = store.new_node("n", None);
    let other = store.new_node("o", None);
    let key = store.intern("general");
    store.set_value_to_one(node, key, other).expect("node exists");
    assert!(matches!(
        store.add_value(node, key, other),
        Err(StoreError::NotToMany { ref property, .. }) if property == "general"
    ));
}

#[test]
fn test_value_by_name_small_and_indexed() {
    let store = NodeStore::new();
    let key = store.intern("children");
    for n in [3usize, 20] {
        let parent = store.new_node("pkg", None);
        let names: Vec<String> = (0..n).map(|i| format!("child{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let kids = children(&store, parent, &refs);
        for (i, name) in names.iter().enumerate() {
            assert_eq!(store.value_by_name(parent, key, name), Ok(Some(kids[i])));
        }
        assert_eq!(store.value_by_name(parent, key, "missing"), Ok(None));
        let slot = store.slot(parent, key).expect("to-many");
        assert_eq!(slot.has_unique_index(), n > 10);
    }
}

#[test]
fn test_conflict_reports_owner_and_key() {
    let store = NodeStore::new();
    let key = store.intern("children");
    let parent = store.new_node("meta", None);
    let mut names: Vec<String> = (0..12).map(|i| format!("child{i}")).collect();
    names.push("dup".to_string());
    names.push("dup".to_string());
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let kids = children(&store, parent, &refs);

    let err = store.value_by_name(parent, key, "dup").unwrap_err();
    assert_eq!(
        err,
        StoreError::IndexConflict {
            owner: parent,
            owner_name: "meta".to_string(),
            property: "children".to_string(),
            key: "dup".to_string(),
        }
    );
    assert!(err.to_string().contains("'dup'"));
    assert!(err.to_string().contains("meta"));

    // Other keys still resolve while the collision persists.
    assert_eq!(store.value_by_name(parent, key, "child3"), Ok(Some(kids[3])));

    let last = kids[kids.len() - 1];
    assert_eq!(store.remove_value(parent, key, last), Ok(true));
    assert_eq!(
        store.value_by_name(parent, key, "dup"),
        Ok(Some(kids[kids.len() - 2]))
    );
}

#[test]
fn test_values_by_classifier_and_property_name() {
    let store = NodeStore::new();
    let class = store.new_node("Class", None);
    let enumeration = store.new_node("Enumeration", None);
    let raw_type = store.intern("rawType");
    let owner = store.new_node("owner", None);
    let key = store.intern("typeArguments");

    let mut expected_classes = Vec::new();
    let mut expected_dogs = Vec::new();
    let dog = store.new_node("Dog", Some(class));
    for i in 0..15 {
        let classifier = if i % 2 == 0 { class } else { enumeration };
        let value = store.new_node(&format!("v{i}"), Some(classifier));
        if i % 2 == 0 {
            expected_classes.push(value);
        }
        if i % 5 == 0 {
            store.set_value_to_one(value, raw_type, dog).expect("value exists");
            expected_dogs.push(value);
        }
        store.add_value(owner, key, value).expect("owner exists");
    }

    assert_eq!(
        store.values_by_key(owner, key, IndexSpec::Classifier, IndexKey::Node(class)),
        expected_classes
    );
    assert_eq!(
        store.values_by_key(
            owner,
            key,
            IndexSpec::PropertyName(raw_type),
            IndexKey::Name(store.intern("Dog"))
        ),
        expected_dogs
    );
    assert_eq!(
        store.values_by_key(
            owner,
            key,
            IndexSpec::PropertyValue(raw_type),
            IndexKey::Node(dog)
        ),
        expected_dogs
    );
    assert!(
        store
            .values_by_key(owner, key, IndexSpec::Classifier, IndexKey::Absent)
            .is_empty()
    );
}

#[test]
fn test_copy_node_is_independent() {
    let store = NodeStore::new();
    let key = store.intern("children");
    let general = store.intern("general");
    let original = store.new_node("pkg", None);
    let target = store.new_node("target", None);
    store.set_value_to_one(original, general, target).expect("exists");
    let kids = children(&store, original, &["a", "b"]);
    store
        .set_flags(original, NodeFlags::PERSISTENT, true)
        .expect("exists");

    let copy = store.copy_node(original).expect("exists");
    assert_ne!(copy, original);
    assert_eq!(store.name_of(copy), store.name_of(original));
    assert_eq!(&*store.values_of(copy, key), &kids[..]);
    assert_eq!(store.value_to_one(copy, general), Ok(Some(target)));
    assert!(store.flags_of(copy).contains(NodeFlags::PERSISTENT));

    children(&store, copy, &["c"]);
    assert_eq!(store.values_of(original, key).len(), 2);
    assert_eq!(store.values_of(copy, key).len(), 3);
}

#[test]
fn test_literals_round_trip() {
    let store = NodeStore::new();
    let int = store.new_integer(-42, None);
    let yes = store.new_boolean(true, None);
    let text = store.new_string("hello", None);
    assert_eq!(store.integer_value(int), Some(-42));
    assert_eq!(store.boolean_value(yes), Some(true));
    assert_eq!(store.string_value(text).as_deref(), Some("hello"));
    assert_eq!(store.integer_value(text), None);
}

#[test]
fn test_set_value_at_and_remove_property() {
    let store = NodeStore::new();
    let key = store.intern("children");
    let parent = store.new_node("p", None);
    let kids = children(&store, parent, &["a", "b"]);
    let replacement = store.new_node("z", None);

    assert_eq!(store.set_value_at(parent, key, 1, replacement), Ok(kids[1]));
    assert_eq!(&*store.values_of(parent, key), &[kids[0], replacement]);
    assert!(matches!(
        store.set_value_at(parent, key, 5, replacement),
        Err(StoreError::OffsetOutOfBounds { offset: 5, len: 2, .. })
    ));

    assert_eq!(store.remove_values(parent, key, &[kids[0], kids[0]]), Ok(1));
    assert_eq!(store.remove_property(parent, key), Ok(true));
    assert!(store.values_of(parent, key).is_empty());
    assert!(!store.property_names(parent).contains(&key));
}

#[test]
fn test_source_information_is_kept() {
    let store = NodeStore::new();
    let source = SourceInformation::new("model.pure", 3, 1, 5, 2);
    let node = store.new_node_with_source("Dog", None, source.clone());
    assert_eq!(store.source_of(node), Some(source));
    assert_eq!(
        store.source_of(node).map(|s| s.to_string()).as_deref(),
        Some("model.pure:3:1-5:2")
    );
}

#[test]
fn test_real_key_for_uses_classifier_index() {
    let store = NodeStore::new();
    let core = CoreTypes::bootstrap(&store).expect("bootstrap");
    let builder = GraphBuilder::new(&store, &core);
    let dog = builder.class("zoo::Dog").expect("class");

    let key = store.real_key_for(dog, "properties").expect("registered");
    assert_eq!(key.to_string(), "Root.children.meta.children.pure.children.metamodel.children.type.children.Class.properties.properties");

    let assoc = store.real_key_for(dog, "specializations").expect("registered");
    assert_eq!(assoc.origin(), PropertyOrigin::Association);

    assert_eq!(
        store.real_key_for(dog, "propertiesC"),
        Err(StoreError::KeyIndex(KeyIndexError::UnsupportedKey {
            key: "propertiesC".to_string()
        }))
    );

    let loose = store.new_node("loose", None);
    assert_eq!(
        store.real_key_for(loose, "name"),
        Err(StoreError::MissingKeyIndex(loose))
    );
}

#[test]
fn test_concurrent_adds_to_one_slot() {
    let store = Arc::new(NodeStore::new());
    let key = store.intern("children");
    let parent = store.new_node("p", None);
    let threads = 8;
    let per_thread = 50;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    let child = store.new_node(&format!("t{t}_{i}"), None);
                    store.add_value(parent, key, child).expect("parent exists");
                    // Interleave key queries so index builds race with adds.
                    let _ = store.value_by_name(parent, key, &format!("t{t}_0"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert_eq!(store.values_of(parent, key).len(), threads * per_thread);
    for t in 0..threads {
        let found = store
            .value_by_name(parent, key, &format!("t{t}_{}", per_thread - 1))
            .expect("no conflict");
        assert!(found.is_some());
    }
}

#[test]
fn test_reclassified_value_is_found_by_built_index() {
    let store = NodeStore::new();
    let kind_a = store.new_node("A", None);
    let kind_b = store.new_node("B", None);
    let owner = store.new_node("owner", None);
    let key = store.intern("elements");
    let values: Vec<NodeId> = (0..12)
        .map(|i| store.new_node(&format!("v{i}"), Some(kind_a)))
        .collect();
    store.add_values(owner, key, &values).expect("owner exists");

    let by_b = |store: &NodeStore| {
        store.values_by_key(owner, key, IndexSpec::Classifier, IndexKey::Node(kind_b))
    };
    assert!(by_b(&store).is_empty());
    assert!(store.slot(owner, key).expect("to-many").has_general_index());

    store.set_classifier(values[0], Some(kind_b)).expect("value exists");
    assert_eq!(by_b(&store), vec![values[0]]);
    assert_eq!(
        store.values_by_key(owner, key, IndexSpec::Classifier, IndexKey::Node(kind_a)),
        values[1..].to_vec()
    );
}

#[test]
fn test_to_one_changes_reach_built_indexes() {
    let store = NodeStore::new();
    let owner = store.new_node("owner", None);
    let key = store.intern("typeArguments");
    let raw_type = store.intern("rawType");
    let dog = store.new_node("Dog", None);
    let cat = store.new_node("Cat", None);
    let values: Vec<NodeId> = (0..12)
        .map(|i| {
            let value = store.new_node(&format!("g{i}"), None);
            store.set_value_to_one(value, raw_type, dog).expect("value exists");
            value
        })
        .collect();
    store.add_values(owner, key, &values).expect("owner exists");

    let by_raw = |store: &NodeStore, raw: NodeId| {
        store.values_by_key(owner, key, IndexSpec::PropertyValue(raw_type), IndexKey::Node(raw))
    };
    assert_eq!(by_raw(&store, dog).len(), 12);
    let generation = store.key_generation();

    store.set_value_to_one(values[4], raw_type, cat).expect("value exists");
    assert!(store.key_generation() > generation);
    assert_eq!(by_raw(&store, cat), vec![values[4]]);
    assert_eq!(by_raw(&store, dog).len(), 11);

    // Unique lookups by the referenced name see the change as well.
    let cat_name = IndexKey::Name(store.intern("Cat"));
    assert_eq!(
        store.value_by_key(owner, key, IndexSpec::PropertyName(raw_type), cat_name),
        Ok(Some(values[4]))
    );
    assert_eq!(store.remove_property(values[4], raw_type), Ok(true));
    assert_eq!(
        store.value_by_key(owner, key, IndexSpec::PropertyName(raw_type), cat_name),
        Ok(None)
    );
    assert!(by_raw(&store, cat).is_empty());

    // Removing an unset property changes nothing.
    let generation = store.key_generation();
    assert_eq!(store.remove_property(values[4], raw_type), Ok(false));
    assert_eq!(store.key_generation(), generation);
}

#[test]
fn test_property_keys_read_inline_to_one_only() {
    let store = NodeStore::new();
    let raw_type = store.intern("rawType");
    let dog = store.new_node("Dog", None);
    let inline = store.new_node("inline", None);
    let slotted = store.new_node("slotted", None);
    store.set_value_to_one(inline, raw_type, dog).expect("node exists");
    store.add_value(slotted, raw_type, dog).expect("node exists");

    assert_eq!(store.value_to_one(inline, raw_type), Ok(Some(dog)));
    assert_eq!(store.value_to_one(slotted, raw_type), Ok(Some(dog)));
    assert_eq!(
        store.index_key(IndexSpec::PropertyValue(raw_type), inline),
        IndexKey::Node(dog)
    );
    assert_eq!(
        store.index_key(IndexSpec::PropertyValue(raw_type), slotted),
        IndexKey::Absent
    );
    assert_eq!(
        store.index_key(IndexSpec::PropertyName(raw_type), slotted),
        IndexKey::Absent
    );
}
