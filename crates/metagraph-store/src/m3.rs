//! The core metamodel: vocabulary and bootstrap of the self-describing types.
//!
//! Every graph starts from the same handful of nodes. Metaclasses (`Class`,
//! `GenericType`, `FunctionType`, ...) classify the nodes that make up user
//! models, and are themselves classified by `Class`. The primitive types hang
//! off `Any` (the top type); `Nil` is the bottom type.

use crate::builder::GraphBuilder;
use crate::error::StoreError;
use crate::key_index::KeyIndex;
use crate::node::NodeId;
use crate::store::NodeStore;
use metagraph_common::{Atom, ShardedInterner};

/// Property names used by the metamodel.
pub mod property {
    pub const NAME: &str = "name";
    pub const CHILDREN: &str = "children";
    pub const PACKAGE: &str = "package";
    pub const PROPERTIES: &str = "properties";
    pub const PROPERTIES_FROM_ASSOCIATIONS: &str = "propertiesFromAssociations";
    pub const GENERALIZATIONS: &str = "generalizations";
    pub const SPECIALIZATIONS: &str = "specializations";
    pub const GENERAL: &str = "general";
    pub const SPECIFIC: &str = "specific";
    pub const RAW_TYPE: &str = "rawType";
    pub const TYPE_ARGUMENTS: &str = "typeArguments";
    pub const MULTIPLICITY_ARGUMENTS: &str = "multiplicityArguments";
    pub const TYPE_PARAMETER: &str = "typeParameter";
    pub const TYPE_PARAMETERS: &str = "typeParameters";
    pub const MULTIPLICITY_PARAMETERS: &str = "multiplicityParameters";
    pub const MULTIPLICITY_PARAMETER: &str = "multiplicityParameter";
    pub const CONTRAVARIANT: &str = "contravariant";
    pub const PARAMETERS: &str = "parameters";
    pub const RETURN_TYPE: &str = "returnType";
    pub const RETURN_MULTIPLICITY: &str = "returnMultiplicity";
    pub const GENERIC_TYPE: &str = "genericType";
    pub const MULTIPLICITY: &str = "multiplicity";
    pub const LOWER_BOUND: &str = "lowerBound";
    pub const UPPER_BOUND: &str = "upperBound";
}

/// Qualified paths of the metaclasses, as used by their key indexes.
pub mod path {
    pub const PACKAGE: &str = "meta::pure::metamodel::Package";
    pub const TYPE: &str = "meta::pure::metamodel::type::Type";
    pub const CLASS: &str = "meta::pure::metamodel::type::Class";
    pub const PROPERTY: &str = "meta::pure::metamodel::function::property::Property";
    pub const GENERIC_TYPE: &str = "meta::pure::metamodel::type::generics::GenericType";
    pub const TYPE_PARAMETER: &str = "meta::pure::metamodel::type::generics::TypeParameter";
    pub const GENERALIZATION: &str = "meta::pure::metamodel::relationship::Generalization";
    pub const MULTIPLICITY: &str = "meta::pure::metamodel::multiplicity::Multiplicity";
    pub const FUNCTION_TYPE: &str = "meta::pure::metamodel::type::FunctionType";
    pub const VARIABLE_EXPRESSION: &str = "meta::pure::metamodel::valuespecification::VariableExpression";
    /// Package holding the metaclasses and the extreme types.
    pub const TYPE_PACKAGE: &str = "meta::pure::metamodel::type";
}

/// Interned metamodel property names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vocabulary {
    pub name: Atom,
    pub children: Atom,
    pub package: Atom,
    pub properties: Atom,
    pub properties_from_associations: Atom,
    pub generalizations: Atom,
    pub specializations: Atom,
    pub general: Atom,
    pub specific: Atom,
    pub raw_type: Atom,
    pub type_arguments: Atom,
    pub multiplicity_arguments: Atom,
    pub type_parameter: Atom,
    pub type_parameters: Atom,
    pub multiplicity_parameters: Atom,
    pub multiplicity_parameter: Atom,
    pub contravariant: Atom,
    pub parameters: Atom,
    pub return_type: Atom,
    pub return_multiplicity: Atom,
    pub generic_type: Atom,
    pub multiplicity: Atom,
    pub lower_bound: Atom,
    pub upper_bound: Atom,
}

impl Vocabulary {
    pub fn new(interner: &ShardedInterner) -> Self {
        Self {
            name: interner.intern(property::NAME),
            children: interner.intern(property::CHILDREN),
            package: interner.intern(property::PACKAGE),
            properties: interner.intern(property::PROPERTIES),
            properties_from_associations: interner.intern(property::PROPERTIES_FROM_ASSOCIATIONS),
            generalizations: interner.intern(property::GENERALIZATIONS),
            specializations: interner.intern(property::SPECIALIZATIONS),
            general: interner.intern(property::GENERAL),
            specific: interner.intern(property::SPECIFIC),
            raw_type: interner.intern(property::RAW_TYPE),
            type_arguments: interner.intern(property::TYPE_ARGUMENTS),
            multiplicity_arguments: interner.intern(property::MULTIPLICITY_ARGUMENTS),
            type_parameter: interner.intern(property::TYPE_PARAMETER),
            type_parameters: interner.intern(property::TYPE_PARAMETERS),
            multiplicity_parameters: interner.intern(property::MULTIPLICITY_PARAMETERS),
            multiplicity_parameter: interner.intern(property::MULTIPLICITY_PARAMETER),
            contravariant: interner.intern(property::CONTRAVARIANT),
            parameters: interner.intern(property::PARAMETERS),
            return_type: interner.intern(property::RETURN_TYPE),
            return_multiplicity: interner.intern(property::RETURN_MULTIPLICITY),
            generic_type: interner.intern(property::GENERIC_TYPE),
            multiplicity: interner.intern(property::MULTIPLICITY),
            lower_bound: interner.intern(property::LOWER_BOUND),
            upper_bound: interner.intern(property::UPPER_BOUND),
        }
    }
}

/// Handles to the bootstrapped metamodel nodes of one store.
#[derive(Clone, Copy, Debug)]
pub struct CoreTypes {
    pub keys: Vocabulary,
    /// The root package.
    pub root: NodeId,

    // Metaclasses
    pub package: NodeId,
    pub class: NodeId,
    pub property: NodeId,
    pub generic_type: NodeId,
    pub generalization: NodeId,
    pub type_parameter: NodeId,
    pub multiplicity: NodeId,
    pub function_type: NodeId,
    pub variable_expression: NodeId,

    // Primitive and extreme types
    pub any: NodeId,
    pub nil: NodeId,
    pub boolean: NodeId,
    pub integer: NodeId,
    pub float: NodeId,
    pub number: NodeId,
    pub string: NodeId,
}

impl CoreTypes {
    /// Create the metamodel nodes in `store` and register their key indexes.
    pub fn bootstrap(store: &NodeStore) -> Result<Self, StoreError> {
        let keys = Vocabulary::new(store.interner());
        let root = store.new_node("Root", None);

        let package = store.new_node("Package", None);
        let class = store.new_node("Class", None);
        let metaclass = |name: &str| store.new_node(name, Some(class));
        let core = Self {
            keys,
            root,
            package,
            class,
            property: metaclass("Property"),
            generic_type: metaclass("GenericType"),
            generalization: metaclass("Generalization"),
            type_parameter: metaclass("TypeParameter"),
            multiplicity: metaclass("Multiplicity"),
            function_type: metaclass("FunctionType"),
            variable_expression: metaclass("VariableExpression"),
            any: metaclass("Any"),
            nil: metaclass("Nil"),
            boolean: metaclass("Boolean"),
            integer: metaclass("Integer"),
            float: metaclass("Float"),
            number: metaclass("Number"),
            string: metaclass("String"),
        };
        store.set_classifier(root, Some(package))?;
        store.set_classifier(package, Some(class))?;
        store.set_classifier(class, Some(class))?;

        let builder = GraphBuilder::new(store, &core);
        let type_package = builder.package(path::TYPE_PACKAGE)?;
        for element in core.metaclasses().into_iter().chain([core.any, core.nil]) {
            builder.add_child(type_package, element)?;
        }
        for primitive in core.primitives() {
            builder.add_child(root, primitive)?;
        }

        builder.extends(core.integer, core.number)?;
        builder.extends(core.float, core.number)?;
        for ty in core
            .metaclasses()
            .into_iter()
            .chain([core.number, core.boolean, core.string])
        {
            builder.extends(ty, core.any)?;
        }

        core.register_key_indexes(store);
        Ok(core)
    }

    pub fn metaclasses(&self) -> [NodeId; 9] {
        [
            self.package,
            self.class,
            self.property,
            self.generic_type,
            self.generalization,
            self.type_parameter,
            self.multiplicity,
            self.function_type,
            self.variable_expression,
        ]
    }

    /// Primitive types living directly in the root package.
    pub fn primitives(&self) -> [NodeId; 5] {
        [self.boolean, self.integer, self.float, self.number, self.string]
    }

    #[inline]
    pub fn is_top(&self, ty: NodeId) -> bool {
        ty == self.any
    }

    #[inline]
    pub fn is_bottom(&self, ty: NodeId) -> bool {
        ty == self.nil
    }

    fn register_key_indexes(&self, store: &NodeStore) {
        use property::*;

        store.register_key_index(
            self.package,
            KeyIndex::builder()
                .with_keys(path::PACKAGE, &[NAME, PACKAGE, CHILDREN])
                .build(),
        );
        store.register_key_index(
            self.class,
            KeyIndex::builder()
                .with_keys(
                    path::CLASS,
                    &[
                        NAME,
                        PACKAGE,
                        TYPE_PARAMETERS,
                        MULTIPLICITY_PARAMETERS,
                        GENERALIZATIONS,
                        PROPERTIES,
                    ],
                )
                .with_key_from_association(path::TYPE, SPECIALIZATIONS)
                .with_key_from_association(path::CLASS, PROPERTIES_FROM_ASSOCIATIONS)
                .build(),
        );
        store.register_key_index(
            self.property,
            KeyIndex::builder()
                .with_keys(path::PROPERTY, &[NAME, GENERIC_TYPE, MULTIPLICITY])
                .build(),
        );
        store.register_key_index(
            self.generic_type,
            KeyIndex::builder()
                .with_keys(
                    path::GENERIC_TYPE,
                    &[RAW_TYPE, TYPE_ARGUMENTS, MULTIPLICITY_ARGUMENTS, TYPE_PARAMETER],
                )
                .build(),
        );
        store.register_key_index(
            self.type_parameter,
            KeyIndex::builder()
                .with_keys(path::TYPE_PARAMETER, &[NAME, CONTRAVARIANT])
                .build(),
        );
        store.register_key_index(
            self.generalization,
            KeyIndex::builder()
                .with_keys(path::GENERALIZATION, &[GENERAL, SPECIFIC])
                .build(),
        );
        store.register_key_index(
            self.multiplicity,
            KeyIndex::builder()
                .with_keys(
                    path::MULTIPLICITY,
                    &[LOWER_BOUND, UPPER_BOUND, MULTIPLICITY_PARAMETER],
                )
                .build(),
        );
        store.register_key_index(
            self.function_type,
            KeyIndex::builder()
                .with_keys(
                    path::FUNCTION_TYPE,
                    &[PARAMETERS, RETURN_TYPE, RETURN_MULTIPLICITY],
                )
                .build(),
        );
        store.register_key_index(
            self.variable_expression,
            KeyIndex::builder()
                .with_keys(path::VARIABLE_EXPRESSION, &[NAME, GENERIC_TYPE, MULTIPLICITY])
                .build(),
        );
    }
}
