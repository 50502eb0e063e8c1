use super::*;
use metagraph_store::{CoreTypes, GraphBuilder, NodeStore};

struct Collections {
    list: NodeId,
    my_list: NodeId,
    pair: NodeId,
    string_map: NodeId,
}

/// `MyList<U> extends List<U>`, `StringMap<V> extends Pair<String, V>`.
fn collections(b: &GraphBuilder<'_>) -> Collections {
    let list = b.class("collections::List").unwrap();
    b.type_parameter(list, "T", false).unwrap();

    let my_list = b.class("collections::MyList").unwrap();
    b.type_parameter(my_list, "U", false).unwrap();
    let u = b.parameter_type("U").unwrap();
    let list_of_u = b.generic_type_with(list, &[u], &[]).unwrap();
    b.generalize(my_list, list_of_u).unwrap();

    let pair = b.class("collections::Pair").unwrap();
    b.type_parameter(pair, "K", false).unwrap();
    b.type_parameter(pair, "V", false).unwrap();

    let string_map = b.class("collections::StringMap").unwrap();
    b.type_parameter(string_map, "V", false).unwrap();
    let string = b.generic_type(b.core().string).unwrap();
    let v = b.parameter_type("V").unwrap();
    let pair_of_string_v = b.generic_type_with(pair, &[string, v], &[]).unwrap();
    b.generalize(string_map, pair_of_string_v).unwrap();

    Collections {
        list,
        my_list,
        pair,
        string_map,
    }
}

fn setup() -> (NodeStore, CoreTypes) {
    let store = NodeStore::new();
    let core = CoreTypes::bootstrap(&store).expect("bootstrap");
    (store, core)
}

fn bound_raw(graph: &TypeGraph<'_>, bindings: &Bindings, name: &str) -> Option<NodeId> {
    let atom = graph.store().intern(name);
    let view = bindings.types.get(&atom)?;
    let resolved = graph.resolve(view).ok()?;
    graph.raw_type(resolved.node).ok().flatten()
}

#[test]
fn test_bind_arguments_by_parameter_name() {
    let (store, core) = setup();
    let b = GraphBuilder::new(&store, &core);
    let graph = TypeGraph::new(&store, &core);
    let c = collections(&b);

    let integer = b.generic_type(core.integer).unwrap();
    let list_of_integer = b.generic_type_with(c.list, &[integer], &[]).unwrap();
    let bindings = bind_arguments(&graph, c.list, &GenericTypeRef::new(list_of_integer))
        .unwrap()
        .unwrap();
    assert_eq!(bound_raw(&graph, &bindings, "T"), Some(core.integer));

    // Argument count disagreeing with the declared parameters.
    let bare_list = b.generic_type(c.list).unwrap();
    assert!(bind_arguments(&graph, c.list, &GenericTypeRef::new(bare_list))
        .unwrap()
        .is_none());
}

#[test]
fn test_arguments_are_substituted_along_generalizations() {
    let (store, core) = setup();
    let b = GraphBuilder::new(&store, &core);
    let graph = TypeGraph::new(&store, &core);
    let c = collections(&b);

    let integer = b.generic_type(core.integer).unwrap();
    let my_list_of_integer = b.generic_type_with(c.my_list, &[integer], &[]).unwrap();
    let bindings = InheritanceResolver
        .resolve_bindings(&graph, &GenericTypeRef::new(my_list_of_integer), c.list)
        .unwrap()
        .unwrap();
    assert_eq!(bound_raw(&graph, &bindings, "T"), Some(core.integer));
    assert_eq!(bindings.types.len(), 1);
}

#[test]
fn test_partially_fixed_arguments() {
    let (store, core) = setup();
    let b = GraphBuilder::new(&store, &core);
    let graph = TypeGraph::new(&store, &core);
    let c = collections(&b);

    let boolean = b.generic_type(core.boolean).unwrap();
    let string_map_of_boolean = b.generic_type_with(c.string_map, &[boolean], &[]).unwrap();
    let bindings = InheritanceResolver
        .resolve_bindings(&graph, &GenericTypeRef::new(string_map_of_boolean), c.pair)
        .unwrap()
        .unwrap();
    assert_eq!(bound_raw(&graph, &bindings, "K"), Some(core.string));
    assert_eq!(bound_raw(&graph, &bindings, "V"), Some(core.boolean));
}

#[test]
fn test_unrelated_super_type_has_no_bindings() {
    let (store, core) = setup();
    let b = GraphBuilder::new(&store, &core);
    let graph = TypeGraph::new(&store, &core);
    let c = collections(&b);

    let integer = b.generic_type(core.integer).unwrap();
    let my_list_of_integer = b.generic_type_with(c.my_list, &[integer], &[]).unwrap();
    assert!(InheritanceResolver
        .resolve_bindings(&graph, &GenericTypeRef::new(my_list_of_integer), c.pair)
        .unwrap()
        .is_none());

    // A non-concrete sub type has nothing to resolve.
    let t = b.parameter_type("T").unwrap();
    assert!(InheritanceResolver
        .resolve_bindings(&graph, &GenericTypeRef::new(t), c.list)
        .unwrap()
        .is_none());
}

#[test]
fn test_sub_type_arity_mismatch_has_no_bindings() {
    let (store, core) = setup();
    let b = GraphBuilder::new(&store, &core);
    let graph = TypeGraph::new(&store, &core);
    let c = collections(&b);

    let bare_my_list = b.generic_type(c.my_list).unwrap();
    assert!(InheritanceResolver
        .resolve_bindings(&graph, &GenericTypeRef::new(bare_my_list), c.list)
        .unwrap()
        .is_none());
}

#[test]
fn test_multiplicity_arguments_are_bound() {
    let (store, core) = setup();
    let b = GraphBuilder::new(&store, &core);
    let graph = TypeGraph::new(&store, &core);

    let holder = b.class("model::Holder").unwrap();
    b.multiplicity_parameter(holder, "m").unwrap();
    let sub_holder = b.class("model::SubHolder").unwrap();
    b.multiplicity_parameter(sub_holder, "n").unwrap();
    let n = b.parameter_multiplicity("n").unwrap();
    let holder_of_n = b.generic_type_with(holder, &[], &[n]).unwrap();
    b.generalize(sub_holder, holder_of_n).unwrap();

    let one = b.pure_one().unwrap();
    let sub_holder_one = b.generic_type_with(sub_holder, &[], &[one]).unwrap();
    let bindings = InheritanceResolver
        .resolve_bindings(&graph, &GenericTypeRef::new(sub_holder_one), holder)
        .unwrap()
        .unwrap();
    let m = bindings
        .multiplicities
        .get(&store.intern("m"))
        .expect("m bound");
    assert_eq!(
        graph.multiplicity_shape(m),
        Ok(crate::generic_type::MultiplicityShape::Concrete {
            lower: 1,
            upper: Some(1)
        })
    );
}

#[test]
fn test_generalization_cycle_terminates() {
    let (store, core) = setup();
    let b = GraphBuilder::new(&store, &core);
    let graph = TypeGraph::new(&store, &core);
    let x = b.class("model::X").unwrap();
    let y = b.class("model::Y").unwrap();
    let target = b.class("model::Target").unwrap();
    b.extends(x, y).unwrap();
    b.extends(y, x).unwrap();

    let x_type = b.generic_type(x).unwrap();
    assert!(InheritanceResolver
        .resolve_bindings(&graph, &GenericTypeRef::new(x_type), target)
        .unwrap()
        .is_none());
}
