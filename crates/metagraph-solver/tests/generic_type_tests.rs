use super::*;
use metagraph_store::GraphBuilder;

struct Fixture {
    store: NodeStore,
    core: CoreTypes,
}

impl Fixture {
    fn new() -> Self {
        let store = NodeStore::new();
        let core = CoreTypes::bootstrap(&store).expect("bootstrap");
        Self { store, core }
    }

    fn builder(&self) -> GraphBuilder<'_> {
        GraphBuilder::new(&self.store, &self.core)
    }

    fn graph(&self) -> TypeGraph<'_> {
        TypeGraph::new(&self.store, &self.core)
    }

    /// `List<T>` with one covariant type parameter.
    fn list(&self) -> NodeId {
        let b = self.builder();
        let list = b.class("collections::List").unwrap();
        b.type_parameter(list, "T", false).unwrap();
        list
    }
}

fn bind(store: &NodeStore, name: &str, to: NodeId) -> Option<Arc<Bindings>> {
    let mut bindings = Bindings::default();
    bindings
        .types
        .insert(store.intern(name), GenericTypeRef::new(to));
    bindings.into_shared()
}

#[test]
fn test_raw_type_and_parameter_name() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();
    let integer = b.generic_type(fx.core.integer).unwrap();
    let t = b.parameter_type("T").unwrap();

    assert_eq!(graph.raw_type(integer), Ok(Some(fx.core.integer)));
    assert_eq!(graph.parameter_name(integer), Ok(None));
    assert_eq!(graph.raw_type(t), Ok(None));
    assert_eq!(graph.parameter_name(t), Ok(Some(fx.store.intern("T"))));
}

#[test]
fn test_resolve_follows_bindings() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();
    let integer = b.generic_type(fx.core.integer).unwrap();
    let t = b.parameter_type("T").unwrap();

    let bound = GenericTypeRef::with_bindings(t, bind(&fx.store, "T", integer));
    assert_eq!(graph.resolve(&bound).unwrap().node, integer);

    // No binding for the parameter: the reference stays non-concrete.
    let unbound = GenericTypeRef::with_bindings(t, bind(&fx.store, "U", integer));
    assert_eq!(graph.resolve(&unbound).unwrap().node, t);
    assert_eq!(graph.resolve(&GenericTypeRef::new(t)).unwrap().node, t);
}

#[test]
fn test_resolve_rejects_shapeless_generic_type() {
    let fx = Fixture::new();
    let graph = fx.graph();
    let empty = fx.store.new_node("", Some(fx.core.generic_type));
    assert!(matches!(
        graph.resolve(&GenericTypeRef::new(empty)),
        Err(MatchError::MalformedGraph { node, .. }) if node == empty
    ));
}

#[test]
fn test_type_parameters_carry_variance() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();
    let consumer = b.class("fn::Consumer").unwrap();
    let t = b.type_parameter(consumer, "T", true).unwrap();
    let r = b.type_parameter(consumer, "R", false).unwrap();

    let parameters = graph.type_parameters(consumer).unwrap();
    assert_eq!(
        parameters,
        vec![
            TypeParameterInfo {
                node: t,
                name: fx.store.intern("T"),
                contravariant: true,
            },
            TypeParameterInfo {
                node: r,
                name: fx.store.intern("R"),
                contravariant: false,
            },
        ]
    );
    assert!(graph.type_parameters(fx.core.integer).unwrap().is_empty());
}

#[test]
fn test_multiplicity_parameters_by_name() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();
    let class = b.class("model::Holder").unwrap();
    b.multiplicity_parameter(class, "m").unwrap();
    b.multiplicity_parameter(class, "n").unwrap();
    assert_eq!(
        graph.multiplicity_parameters(class),
        vec![fx.store.intern("m"), fx.store.intern("n")]
    );
}

#[test]
fn test_multiplicity_shapes() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();

    let shape = |node| graph.multiplicity_shape(&MultiplicityRef::new(node));
    assert_eq!(
        shape(b.pure_one().unwrap()),
        Ok(MultiplicityShape::Concrete {
            lower: 1,
            upper: Some(1)
        })
    );
    assert_eq!(
        shape(b.zero_many().unwrap()),
        Ok(MultiplicityShape::Concrete {
            lower: 0,
            upper: None
        })
    );
    assert_eq!(
        shape(b.parameter_multiplicity("m").unwrap()),
        Ok(MultiplicityShape::Parameter(fx.store.intern("m")))
    );

    // Missing lower bound reads as zero.
    let upper_only = fx.store.new_node("", Some(fx.core.multiplicity));
    let three = b.integer(3);
    fx.store
        .set_value_to_one(upper_only, fx.core.keys.upper_bound, three)
        .unwrap();
    assert_eq!(
        shape(upper_only),
        Ok(MultiplicityShape::Concrete {
            lower: 0,
            upper: Some(3)
        })
    );
}

#[test]
fn test_negative_bound_is_malformed() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();
    let bad = fx.store.new_node("", Some(fx.core.multiplicity));
    let minus_one = b.integer(-1);
    fx.store
        .set_value_to_one(bad, fx.core.keys.lower_bound, minus_one)
        .unwrap();
    assert!(matches!(
        graph.multiplicity_shape(&MultiplicityRef::new(bad)),
        Err(MatchError::MalformedGraph { node, .. }) if node == minus_one
    ));
}

#[test]
fn test_structural_equality_of_separately_built_types() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();
    let list = fx.list();

    let integer_a = b.generic_type(fx.core.integer).unwrap();
    let integer_b = b.generic_type(fx.core.integer).unwrap();
    let string = b.generic_type(fx.core.string).unwrap();
    let list_a = b.generic_type_with(list, &[integer_a], &[]).unwrap();
    let list_b = b.generic_type_with(list, &[integer_b], &[]).unwrap();
    let list_c = b.generic_type_with(list, &[string], &[]).unwrap();

    let eq = |x, y| {
        graph
            .structurally_equal(&GenericTypeRef::new(x), &GenericTypeRef::new(y))
            .unwrap()
    };
    assert!(eq(list_a, list_a));
    assert!(eq(list_a, list_b));
    assert!(!eq(list_a, list_c));
    assert!(!eq(integer_a, string));
    assert!(eq(b.parameter_type("T").unwrap(), b.parameter_type("T").unwrap()));
    assert!(!eq(b.parameter_type("T").unwrap(), b.parameter_type("U").unwrap()));
}

#[test]
fn test_structural_equality_sees_through_bindings() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();
    let integer = b.generic_type(fx.core.integer).unwrap();
    let t = b.parameter_type("T").unwrap();
    let bound = GenericTypeRef::with_bindings(t, bind(&fx.store, "T", integer));
    assert!(graph
        .structurally_equal(&bound, &GenericTypeRef::new(integer))
        .unwrap());
}

#[test]
fn test_function_types_compare_structurally() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();

    let make = |param_raw, return_raw| {
        let param = b.generic_type(param_raw).unwrap();
        let ret = b.generic_type(return_raw).unwrap();
        let one = b.pure_one().unwrap();
        let ret_one = b.pure_one().unwrap();
        b.function_type(&[(param, one)], ret, ret_one).unwrap()
    };
    let f = make(fx.core.integer, fx.core.string);
    let g = make(fx.core.integer, fx.core.string);
    let h = make(fx.core.number, fx.core.string);

    let eq = |x, y| {
        graph
            .structurally_equal(&GenericTypeRef::new(x), &GenericTypeRef::new(y))
            .unwrap()
    };
    assert!(eq(f, g));
    assert!(!eq(f, h));
}

#[test]
fn test_function_signature_reads_parameters_in_order() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();

    let integer = b.generic_type(fx.core.integer).unwrap();
    let string = b.generic_type(fx.core.string).unwrap();
    let boolean = b.generic_type(fx.core.boolean).unwrap();
    let one = b.pure_one().unwrap();
    let many = b.zero_many().unwrap();
    let function = b
        .function_type(&[(integer, one), (string, many)], boolean, one)
        .unwrap();
    let raw = graph.raw_type(function).unwrap().unwrap();
    assert!(graph.is_function_type(raw));
    assert!(!graph.is_function_type(fx.core.integer));

    let signature = graph.function_signature(raw, &None).unwrap();
    let parameters: Vec<_> = signature
        .parameters
        .iter()
        .map(|(ty, mult)| (ty.node, mult.node))
        .collect();
    assert_eq!(parameters, vec![(integer, one), (string, many)]);
    assert_eq!(signature.return_type.node, boolean);
    assert_eq!(signature.return_multiplicity.node, one);
}

#[test]
fn test_general_types_requires_general() {
    let fx = Fixture::new();
    let b = fx.builder();
    let graph = fx.graph();
    let class = b.class("model::Broken").unwrap();
    let generalization = fx.store.new_node("", Some(fx.core.generalization));
    fx.store
        .add_value(class, fx.core.keys.generalizations, generalization)
        .unwrap();
    assert!(matches!(
        graph.general_types(class),
        Err(MatchError::MalformedGraph { node, .. }) if node == generalization
    ));
}
