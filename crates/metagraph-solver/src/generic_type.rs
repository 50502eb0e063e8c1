//! Read-only views of generic type structures in the node store.
//!
//! A generic type node is either concrete (`rawType` set, plus ordered
//! `typeArguments` and `multiplicityArguments`) or a reference to a type
//! parameter (`typeParameter` set, no raw type). The matcher never rewrites
//! the graph to substitute parameters. Instead it carries a [`GenericTypeRef`]:
//! a node plus the bindings in effect where the node is used, and resolves
//! parameter references through those bindings on read.

use crate::error::MatchError;
use crate::recursion::{DepthCounter, RecursionProfile};
use metagraph_common::Atom;
use metagraph_common::limits::MAX_MATCH_DEPTH;
use metagraph_store::{CoreTypes, NodeId, NodeStore};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// A generic type node seen through the parameter bindings of its use site.
#[derive(Clone, Debug)]
pub struct GenericTypeRef {
    pub node: NodeId,
    pub bindings: Option<Arc<Bindings>>,
}

impl GenericTypeRef {
    /// A view with no bindings in effect.
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            bindings: None,
        }
    }

    pub fn with_bindings(node: NodeId, bindings: Option<Arc<Bindings>>) -> Self {
        Self { node, bindings }
    }

    fn same_bindings(&self, other: &Self) -> bool {
        match (&self.bindings, &other.bindings) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A multiplicity node seen through the bindings of its use site.
#[derive(Clone, Debug)]
pub struct MultiplicityRef {
    pub node: NodeId,
    pub bindings: Option<Arc<Bindings>>,
}

impl MultiplicityRef {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            bindings: None,
        }
    }

    pub fn with_bindings(node: NodeId, bindings: Option<Arc<Bindings>>) -> Self {
        Self { node, bindings }
    }
}

/// Type and multiplicity parameter bindings, by parameter name.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    pub types: FxHashMap<Atom, GenericTypeRef>,
    pub multiplicities: FxHashMap<Atom, MultiplicityRef>,
}

impl Bindings {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.multiplicities.is_empty()
    }

    /// Shared form for attaching to views; empty bindings attach as `None`.
    pub fn into_shared(self) -> Option<Arc<Self>> {
        if self.is_empty() {
            None
        } else {
            Some(Arc::new(self))
        }
    }
}

/// A type parameter declared by a raw type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeParameterInfo {
    pub node: NodeId,
    pub name: Atom,
    pub contravariant: bool,
}

/// Resolved shape of a multiplicity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MultiplicityShape {
    /// `[lower..upper]`; `upper == None` is unbounded.
    Concrete { lower: u64, upper: Option<u64> },
    /// An unbound multiplicity parameter.
    Parameter(Atom),
}

/// Parameters and return of a function type, seen through its bindings.
#[derive(Clone, Debug)]
pub struct FunctionSignature {
    pub parameters: SmallVec<[(GenericTypeRef, MultiplicityRef); 4]>,
    pub return_type: GenericTypeRef,
    pub return_multiplicity: MultiplicityRef,
}

/// Metamodel-aware reader over a store.
#[derive(Clone, Copy)]
pub struct TypeGraph<'g> {
    store: &'g NodeStore,
    core: &'g CoreTypes,
}

impl<'g> TypeGraph<'g> {
    pub fn new(store: &'g NodeStore, core: &'g CoreTypes) -> Self {
        Self { store, core }
    }

    pub fn store(&self) -> &'g NodeStore {
        self.store
    }

    pub fn core(&self) -> &'g CoreTypes {
        self.core
    }

    #[inline]
    pub fn is_top(&self, raw: NodeId) -> bool {
        self.core.is_top(raw)
    }

    #[inline]
    pub fn is_bottom(&self, raw: NodeId) -> bool {
        self.core.is_bottom(raw)
    }

    pub fn is_function_type(&self, raw: NodeId) -> bool {
        self.store.classifier_of(raw) == Some(self.core.function_type)
    }

    /// Node name for diagnostics.
    pub fn display_name(&self, node: NodeId) -> String {
        let name = self.store.name_string(node);
        if name.is_empty() {
            node.to_string()
        } else {
            name.to_string()
        }
    }

    fn to_one(&self, node: NodeId, key: Atom) -> Result<Option<NodeId>, MatchError> {
        Ok(self.store.value_to_one(node, key)?)
    }

    fn required(&self, node: NodeId, key: Atom) -> Result<NodeId, MatchError> {
        self.to_one(node, key)?
            .ok_or_else(|| MatchError::MalformedGraph {
                node,
                reason: format!("missing '{}'", self.store.resolve(key)),
            })
    }

    // -------------------------------------------------------------------------
    // Generic types
    // -------------------------------------------------------------------------

    pub fn raw_type(&self, generic_type: NodeId) -> Result<Option<NodeId>, MatchError> {
        self.to_one(generic_type, self.core.keys.raw_type)
    }

    /// Name of the type parameter a non-concrete generic type refers to.
    pub fn parameter_name(&self, generic_type: NodeId) -> Result<Option<Atom>, MatchError> {
        Ok(self
            .to_one(generic_type, self.core.keys.type_parameter)?
            .and_then(|parameter| self.store.name_of(parameter)))
    }

    /// Follow parameter references through bindings until reaching a
    /// concrete generic type or an unbound parameter.
    pub fn resolve(&self, view: &GenericTypeRef) -> Result<GenericTypeRef, MatchError> {
        let mut current = view.clone();
        for _ in 0..MAX_MATCH_DEPTH {
            if self.raw_type(current.node)?.is_some() {
                return Ok(current);
            }
            let Some(name) = self.parameter_name(current.node)? else {
                return Err(MatchError::MalformedGraph {
                    node: current.node,
                    reason: "generic type has neither a raw type nor a type parameter".into(),
                });
            };
            let bound = current
                .bindings
                .as_ref()
                .and_then(|bindings| bindings.types.get(&name))
                .cloned();
            match bound {
                Some(bound) => current = bound,
                None => return Ok(current),
            }
        }
        Err(MatchError::MalformedGraph {
            node: view.node,
            reason: "type parameter bindings do not terminate".into(),
        })
    }

    pub fn type_arguments(&self, view: &GenericTypeRef) -> Vec<GenericTypeRef> {
        self.store
            .values_of(view.node, self.core.keys.type_arguments)
            .iter()
            .map(|&arg| GenericTypeRef::with_bindings(arg, view.bindings.clone()))
            .collect()
    }

    pub fn multiplicity_arguments(&self, view: &GenericTypeRef) -> Vec<MultiplicityRef> {
        self.store
            .values_of(view.node, self.core.keys.multiplicity_arguments)
            .iter()
            .map(|&arg| MultiplicityRef::with_bindings(arg, view.bindings.clone()))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Raw types
    // -------------------------------------------------------------------------

    pub fn type_parameters(&self, raw: NodeId) -> Result<Vec<TypeParameterInfo>, MatchError> {
        let keys = &self.core.keys;
        self.store
            .values_of(raw, keys.type_parameters)
            .iter()
            .map(|&node| -> Result<TypeParameterInfo, MatchError> {
                let name = self.store.name_of(node).ok_or_else(|| MatchError::MalformedGraph {
                    node,
                    reason: "unknown type parameter node".into(),
                })?;
                let contravariant = self
                    .to_one(node, keys.contravariant)?
                    .and_then(|flag| self.store.boolean_value(flag))
                    .unwrap_or(false);
                Ok(TypeParameterInfo {
                    node,
                    name,
                    contravariant,
                })
            })
            .collect()
    }

    pub fn multiplicity_parameters(&self, raw: NodeId) -> Vec<Atom> {
        self.store
            .values_of(raw, self.core.keys.multiplicity_parameters)
            .iter()
            .filter_map(|&node| self.store.name_of(node))
            .collect()
    }

    /// Generic types of a class's direct generalizations, in declaration order.
    pub fn general_types(&self, class: NodeId) -> Result<Vec<NodeId>, MatchError> {
        let keys = &self.core.keys;
        self.store
            .values_of(class, keys.generalizations)
            .iter()
            .map(|&generalization| self.required(generalization, keys.general))
            .collect()
    }

    pub fn function_signature(
        &self,
        raw: NodeId,
        bindings: &Option<Arc<Bindings>>,
    ) -> Result<FunctionSignature, MatchError> {
        let keys = &self.core.keys;
        let parameters = self
            .store
            .values_of(raw, keys.parameters)
            .iter()
            .map(|&parameter| -> Result<(GenericTypeRef, MultiplicityRef), MatchError> {
                let generic_type = self.required(parameter, keys.generic_type)?;
                let multiplicity = self.required(parameter, keys.multiplicity)?;
                Ok((
                    GenericTypeRef::with_bindings(generic_type, bindings.clone()),
                    MultiplicityRef::with_bindings(multiplicity, bindings.clone()),
                ))
            })
            .collect::<Result<SmallVec<_>, MatchError>>()?;
        Ok(FunctionSignature {
            parameters,
            return_type: GenericTypeRef::with_bindings(
                self.required(raw, keys.return_type)?,
                bindings.clone(),
            ),
            return_multiplicity: MultiplicityRef::with_bindings(
                self.required(raw, keys.return_multiplicity)?,
                bindings.clone(),
            ),
        })
    }

    // -------------------------------------------------------------------------
    // Multiplicities
    // -------------------------------------------------------------------------

    /// Shape of a multiplicity after following parameter bindings.
    pub fn multiplicity_shape(
        &self,
        multiplicity: &MultiplicityRef,
    ) -> Result<MultiplicityShape, MatchError> {
        let keys = &self.core.keys;
        let mut current = multiplicity.clone();
        for _ in 0..MAX_MATCH_DEPTH {
            if let Some(parameter) = self.to_one(current.node, keys.multiplicity_parameter)? {
                let name = self.store.name_of(parameter).ok_or_else(|| {
                    MatchError::MalformedGraph {
                        node: parameter,
                        reason: "unknown multiplicity parameter node".into(),
                    }
                })?;
                let bound = current
                    .bindings
                    .as_ref()
                    .and_then(|bindings| bindings.multiplicities.get(&name))
                    .cloned();
                match bound {
                    Some(bound) => {
                        current = bound;
                        continue;
                    }
                    None => return Ok(MultiplicityShape::Parameter(name)),
                }
            }
            let lower = match self.to_one(current.node, keys.lower_bound)? {
                Some(bound) => self.bound_value(bound)?,
                None => 0,
            };
            let upper = match self.to_one(current.node, keys.upper_bound)? {
                Some(bound) => Some(self.bound_value(bound)?),
                None => None,
            };
            return Ok(MultiplicityShape::Concrete { lower, upper });
        }
        Err(MatchError::MalformedGraph {
            node: multiplicity.node,
            reason: "multiplicity parameter bindings do not terminate".into(),
        })
    }

    fn bound_value(&self, literal: NodeId) -> Result<u64, MatchError> {
        self.store
            .integer_value(literal)
            .and_then(|value| u64::try_from(value).ok())
            .ok_or_else(|| MatchError::MalformedGraph {
                node: literal,
                reason: "multiplicity bound is not a non-negative integer".into(),
            })
    }

    // -------------------------------------------------------------------------
    // Structural identity
    // -------------------------------------------------------------------------

    /// Whether two generic types denote the same type after resolution.
    ///
    /// Nesting beyond the identity depth limit compares as different.
    pub fn structurally_equal(
        &self,
        a: &GenericTypeRef,
        b: &GenericTypeRef,
    ) -> Result<bool, MatchError> {
        let mut depth = DepthCounter::with_profile(RecursionProfile::Identity);
        self.equal_at(a, b, &mut depth)
    }

    fn equal_at(
        &self,
        a: &GenericTypeRef,
        b: &GenericTypeRef,
        depth: &mut DepthCounter,
    ) -> Result<bool, MatchError> {
        if !depth.enter() {
            return Ok(false);
        }
        let result = self.equal_inner(a, b, depth);
        depth.leave();
        result
    }

    fn equal_inner(
        &self,
        a: &GenericTypeRef,
        b: &GenericTypeRef,
        depth: &mut DepthCounter,
    ) -> Result<bool, MatchError> {
        let a = self.resolve(a)?;
        let b = self.resolve(b)?;
        if a.node == b.node && a.same_bindings(&b) {
            return Ok(true);
        }
        match (self.raw_type(a.node)?, self.raw_type(b.node)?) {
            (None, None) => Ok(self.parameter_name(a.node)? == self.parameter_name(b.node)?),
            (Some(x), Some(y)) if x == y => {
                let (a_args, b_args) = (self.type_arguments(&a), self.type_arguments(&b));
                if a_args.len() != b_args.len() {
                    return Ok(false);
                }
                for (x, y) in a_args.iter().zip(&b_args) {
                    if !self.equal_at(x, y, depth)? {
                        return Ok(false);
                    }
                }
                self.multiplicities_equal(
                    &self.multiplicity_arguments(&a),
                    &self.multiplicity_arguments(&b),
                )
            }
            (Some(x), Some(y)) if self.is_function_type(x) && self.is_function_type(y) => {
                let fa = self.function_signature(x, &a.bindings)?;
                let fb = self.function_signature(y, &b.bindings)?;
                if fa.parameters.len() != fb.parameters.len() {
                    return Ok(false);
                }
                for ((ta, ma), (tb, mb)) in fa.parameters.iter().zip(&fb.parameters) {
                    if self.multiplicity_shape(ma)? != self.multiplicity_shape(mb)?
                        || !self.equal_at(ta, tb, depth)?
                    {
                        return Ok(false);
                    }
                }
                Ok(self.multiplicity_shape(&fa.return_multiplicity)?
                    == self.multiplicity_shape(&fb.return_multiplicity)?
                    && self.equal_at(&fa.return_type, &fb.return_type, depth)?)
            }
            _ => Ok(false),
        }
    }

    fn multiplicities_equal(
        &self,
        a: &[MultiplicityRef],
        b: &[MultiplicityRef],
    ) -> Result<bool, MatchError> {
        if a.len() != b.len() {
            return Ok(false);
        }
        for (x, y) in a.iter().zip(b) {
            if self.multiplicity_shape(x)? != self.multiplicity_shape(y)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "../tests/generic_type_tests.rs"]
mod tests;
