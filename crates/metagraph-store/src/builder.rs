//! Graph construction helpers.
//!
//! `GraphBuilder` writes metamodel-shaped node structures (packages, classes,
//! generic types, function types, multiplicities) into a [`NodeStore`].
//! It stands in for the compiler front end when assembling models in tests,
//! benches and bootstrap code.

use crate::error::StoreError;
use crate::key_index::{PATH_SEPARATOR, ROOT_PACKAGE};
use crate::m3::CoreTypes;
use crate::node::NodeId;
use crate::store::NodeStore;

pub struct GraphBuilder<'a> {
    store: &'a NodeStore,
    core: &'a CoreTypes,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(store: &'a NodeStore, core: &'a CoreTypes) -> Self {
        Self { store, core }
    }

    pub fn store(&self) -> &'a NodeStore {
        self.store
    }

    pub fn core(&self) -> &'a CoreTypes {
        self.core
    }

    // =========================================================================
    // Packages and classes
    // =========================================================================

    /// The package at `path` (`a::b::c`), creating missing packages.
    /// The empty path and `Root` name the root package.
    pub fn package(&self, path: &str) -> Result<NodeId, StoreError> {
        let keys = &self.core.keys;
        let mut current = self.core.root;
        for element in path
            .split(PATH_SEPARATOR)
            .filter(|element| !element.is_empty())
            .skip_while(|element| *element == ROOT_PACKAGE)
        {
            current = match self.store.value_by_name(current, keys.children, element)? {
                Some(existing) => existing,
                None => {
                    let package = self.store.new_node(element, Some(self.core.package));
                    self.add_child(current, package)?;
                    package
                }
            };
        }
        Ok(current)
    }

    /// Make `element` a child of `package`.
    pub fn add_child(&self, package: NodeId, element: NodeId) -> Result<(), StoreError> {
        let keys = &self.core.keys;
        self.store.add_value(package, keys.children, element)?;
        self.store.set_value_to_one(element, keys.package, package)
    }

    /// A new class at the qualified path `pkg::Name`.
    pub fn class(&self, qualified_name: &str) -> Result<NodeId, StoreError> {
        let (package_path, name) = qualified_name
            .rsplit_once(PATH_SEPARATOR)
            .unwrap_or(("", qualified_name));
        let package = self.package(package_path)?;
        let class = self.store.new_node(name, Some(self.core.class));
        self.add_child(package, class)?;
        Ok(class)
    }

    /// Declare a type parameter on `class`.
    pub fn type_parameter(
        &self,
        class: NodeId,
        name: &str,
        contravariant: bool,
    ) -> Result<NodeId, StoreError> {
        let keys = &self.core.keys;
        let parameter = self.store.new_node(name, Some(self.core.type_parameter));
        let flag = self.boolean(contravariant);
        self.store.set_value_to_one(parameter, keys.contravariant, flag)?;
        self.store.add_value(class, keys.type_parameters, parameter)?;
        Ok(parameter)
    }

    /// Declare a multiplicity parameter on `class`.
    pub fn multiplicity_parameter(&self, class: NodeId, name: &str) -> Result<NodeId, StoreError> {
        let parameter = self.string(name);
        self.store
            .add_value(class, self.core.keys.multiplicity_parameters, parameter)?;
        Ok(parameter)
    }

    /// Add a generalization from `class` to the generic type `general`.
    pub fn generalize(&self, class: NodeId, general: NodeId) -> Result<NodeId, StoreError> {
        let keys = &self.core.keys;
        let generalization = self.store.new_node("", Some(self.core.generalization));
        self.store.set_value_to_one(generalization, keys.general, general)?;
        self.store.set_value_to_one(generalization, keys.specific, class)?;
        self.store.add_value(class, keys.generalizations, generalization)?;
        if let Some(super_type) = self.store.value_to_one(general, keys.raw_type)? {
            self.store
                .add_value(super_type, keys.specializations, generalization)?;
        }
        Ok(generalization)
    }

    /// Shorthand for a generalization to a parameterless `super_type`.
    pub fn extends(&self, class: NodeId, super_type: NodeId) -> Result<NodeId, StoreError> {
        let general = self.generic_type(super_type)?;
        self.generalize(class, general)
    }

    /// Add an owned property to `class`.
    pub fn property(
        &self,
        class: NodeId,
        name: &str,
        generic_type: NodeId,
        multiplicity: NodeId,
    ) -> Result<NodeId, StoreError> {
        let keys = &self.core.keys;
        let property = self.store.new_node(name, Some(self.core.property));
        self.store.set_value_to_one(property, keys.generic_type, generic_type)?;
        self.store.set_value_to_one(property, keys.multiplicity, multiplicity)?;
        self.store.add_value(class, keys.properties, property)?;
        Ok(property)
    }

    // =========================================================================
    // Generic types
    // =========================================================================

    /// A concrete generic type without arguments.
    pub fn generic_type(&self, raw_type: NodeId) -> Result<NodeId, StoreError> {
        self.generic_type_with(raw_type, &[], &[])
    }

    /// A concrete generic type with type and multiplicity arguments.
    pub fn generic_type_with(
        &self,
        raw_type: NodeId,
        type_arguments: &[NodeId],
        multiplicity_arguments: &[NodeId],
    ) -> Result<NodeId, StoreError> {
        let keys = &self.core.keys;
        let generic_type = self.store.new_node("", Some(self.core.generic_type));
        self.store.set_value_to_one(generic_type, keys.raw_type, raw_type)?;
        if !type_arguments.is_empty() {
            self.store
                .add_values(generic_type, keys.type_arguments, type_arguments)?;
        }
        if !multiplicity_arguments.is_empty() {
            self.store.add_values(
                generic_type,
                keys.multiplicity_arguments,
                multiplicity_arguments,
            )?;
        }
        Ok(generic_type)
    }

    /// A non-concrete generic type referring to the type parameter `name`.
    pub fn parameter_type(&self, name: &str) -> Result<NodeId, StoreError> {
        let generic_type = self.store.new_node("", Some(self.core.generic_type));
        let parameter = self.store.new_node(name, Some(self.core.type_parameter));
        self.store
            .set_value_to_one(generic_type, self.core.keys.type_parameter, parameter)?;
        Ok(generic_type)
    }

    /// A generic type whose raw type is a new function type.
    ///
    /// `parameters` pairs each parameter's generic type with its multiplicity.
    pub fn function_type(
        &self,
        parameters: &[(NodeId, NodeId)],
        return_type: NodeId,
        return_multiplicity: NodeId,
    ) -> Result<NodeId, StoreError> {
        let keys = &self.core.keys;
        let function = self.store.new_node("", Some(self.core.function_type));
        for (i, &(generic_type, multiplicity)) in parameters.iter().enumerate() {
            let parameter = self
                .store
                .new_node(&format!("p{i}"), Some(self.core.variable_expression));
            self.store.set_value_to_one(parameter, keys.generic_type, generic_type)?;
            self.store.set_value_to_one(parameter, keys.multiplicity, multiplicity)?;
            self.store.add_value(function, keys.parameters, parameter)?;
        }
        self.store.set_value_to_one(function, keys.return_type, return_type)?;
        self.store
            .set_value_to_one(function, keys.return_multiplicity, return_multiplicity)?;
        self.generic_type(function)
    }

    // =========================================================================
    // Multiplicities
    // =========================================================================

    /// A concrete multiplicity; `upper == None` is unbounded (`*`).
    pub fn multiplicity(&self, lower: u64, upper: Option<u64>) -> Result<NodeId, StoreError> {
        let keys = &self.core.keys;
        let multiplicity = self.store.new_node("", Some(self.core.multiplicity));
        let lower = self.bound(lower);
        self.store.set_value_to_one(multiplicity, keys.lower_bound, lower)?;
        if let Some(upper) = upper {
            let upper = self.bound(upper);
            self.store.set_value_to_one(multiplicity, keys.upper_bound, upper)?;
        }
        Ok(multiplicity)
    }

    /// `[1]`
    pub fn pure_one(&self) -> Result<NodeId, StoreError> {
        self.multiplicity(1, Some(1))
    }

    /// `[0..1]`
    pub fn zero_one(&self) -> Result<NodeId, StoreError> {
        self.multiplicity(0, Some(1))
    }

    /// `[*]`
    pub fn zero_many(&self) -> Result<NodeId, StoreError> {
        self.multiplicity(0, None)
    }

    /// `[1..*]`
    pub fn one_many(&self) -> Result<NodeId, StoreError> {
        self.multiplicity(1, None)
    }

    /// A multiplicity referring to the multiplicity parameter `name`.
    pub fn parameter_multiplicity(&self, name: &str) -> Result<NodeId, StoreError> {
        let multiplicity = self.store.new_node("", Some(self.core.multiplicity));
        let parameter = self.string(name);
        self.store.set_value_to_one(
            multiplicity,
            self.core.keys.multiplicity_parameter,
            parameter,
        )?;
        Ok(multiplicity)
    }

    fn bound(&self, value: u64) -> NodeId {
        let value = i64::try_from(value).unwrap_or(i64::MAX);
        self.integer(value)
    }

    // =========================================================================
    // Literals
    // =========================================================================

    pub fn integer(&self, value: i64) -> NodeId {
        self.store.new_integer(value, Some(self.core.integer))
    }

    pub fn boolean(&self, value: bool) -> NodeId {
        self.store.new_boolean(value, Some(self.core.boolean))
    }

    pub fn string(&self, value: &str) -> NodeId {
        self.store.new_string(value, Some(self.core.string))
    }
}

#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod tests;
