//! The generic type match engine.
//!
//! Answers "is a value of this type acceptable where that type is expected,
//! and how specifically" for two generic types in the node store. The answer
//! is `Ok(None)` for incompatible types and a ranked [`GenericTypeMatch`]
//! otherwise; overload resolution keeps the minimum over its candidates.
//!
//! ## Algorithm
//!
//! 1. Structurally identical types match exactly.
//! 2. A non-concrete target, then a non-concrete value, is settled by the
//!    parameter behaviors of the [`MatchPolicy`].
//! 3. Raw types are compared with the sub side being the value when
//!    covariant and the target when contravariant. A bottom sub type or a top
//!    super type settles the match without looking at arguments. Function
//!    types compare structurally, parameters with flipped variance and
//!    swapped sides. Classes
//!    compare by the super type's position in the sub type's resolution
//!    order.
//! 4. Type arguments are matched pairwise against the super type's declared
//!    parameters, after the sub type's arguments have been resolved through
//!    inheritance. A contravariant parameter flips the variance of its
//!    argument. Multiplicity arguments follow with the enclosing variance.
//!
//! ## Cycles
//!
//! Generic type structures are expected to be acyclic but nothing enforces
//! it. Each top-level call carries a [`RecursionGuard`] keyed by
//! `(target node, value node, covariant)`. Re-entering a key, or exceeding
//! the depth or iteration budget, yields "no match" and a `warn!` event.

use crate::behavior::{MatchPolicy, NullMatchBehavior, ParameterMatchBehavior};
use crate::error::MatchError;
use crate::generic_type::{GenericTypeRef, MultiplicityRef, TypeGraph};
use crate::hierarchy;
use crate::multiplicity::{BoundsMultiplicityMatcher, MultiplicityMatch, MultiplicityMatcher};
use crate::query_trace;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::resolver::{GenericArgumentResolver, InheritanceResolver};
use crate::type_match::{FunctionTypeMatch, GenericTypeMatch, ParameterMatch, TypeMatch};
use metagraph_store::{CoreTypes, NodeId, NodeStore};
use tracing::{trace, warn};

/// Stack headroom below which recursion moves onto a fresh segment.
const RED_ZONE: usize = 64 * 1024;
/// Size of each additional stack segment.
const STACK_GROWTH: usize = 1024 * 1024;

type MatchKey = (NodeId, NodeId, bool);
type MatchGuard = RecursionGuard<MatchKey>;
type MatchOutcome = Result<Option<GenericTypeMatch>, MatchError>;

/// Ranks the compatibility of generic types read from a [`NodeStore`].
///
/// The engine holds no mutable state; one instance can serve concurrent
/// queries as long as the graph is not mutated meanwhile.
pub struct TypeMatchEngine<'g, R = InheritanceResolver, M = BoundsMultiplicityMatcher> {
    graph: TypeGraph<'g>,
    resolver: R,
    multiplicities: M,
}

impl<'g> TypeMatchEngine<'g> {
    /// Engine with the inheritance resolver and bounds multiplicity matcher.
    pub fn new(store: &'g NodeStore, core: &'g CoreTypes) -> Self {
        Self::with_collaborators(store, core, InheritanceResolver, BoundsMultiplicityMatcher)
    }
}

impl<'g, R, M> TypeMatchEngine<'g, R, M>
where
    R: GenericArgumentResolver,
    M: MultiplicityMatcher,
{
    pub fn with_collaborators(
        store: &'g NodeStore,
        core: &'g CoreTypes,
        resolver: R,
        multiplicities: M,
    ) -> Self {
        Self {
            graph: TypeGraph::new(store, core),
            resolver,
            multiplicities,
        }
    }

    pub fn graph(&self) -> &TypeGraph<'g> {
        &self.graph
    }

    /// Match the generic type `value` against the generic type `target`.
    ///
    /// `covariant` requires value ≤ target; otherwise target ≤ value.
    pub fn match_types(
        &self,
        target: NodeId,
        value: Option<NodeId>,
        covariant: bool,
        policy: MatchPolicy,
    ) -> MatchOutcome {
        let traced = query_trace::enabled();
        let query_id = if traced {
            let id = query_trace::next_query_id();
            query_trace::match_start(id, "match_types", target, value, covariant);
            id
        } else {
            0
        };

        let value = value.map(GenericTypeRef::new);
        let result = self.match_views(&GenericTypeRef::new(target), value.as_ref(), covariant, policy);

        if traced {
            let outcome = match &result {
                Ok(Some(_)) => "match",
                Ok(None) => "no_match",
                Err(_) => "error",
            };
            query_trace::match_end(query_id, "match_types", outcome);
        }
        result
    }

    /// Match two generic type views, each carrying its own bindings.
    pub fn match_views(
        &self,
        target: &GenericTypeRef,
        value: Option<&GenericTypeRef>,
        covariant: bool,
        policy: MatchPolicy,
    ) -> MatchOutcome {
        let mut guard = MatchGuard::with_profile(RecursionProfile::TypeMatch);
        self.match_generic(&mut guard, target, value, covariant, policy)
    }

    /// Match two multiplicity nodes with the configured multiplicity matcher.
    pub fn match_multiplicities(
        &self,
        target: NodeId,
        value: Option<NodeId>,
        covariant: bool,
        policy: MatchPolicy,
    ) -> Result<Option<MultiplicityMatch>, MatchError> {
        let value = value.map(MultiplicityRef::new);
        self.multiplicities.match_multiplicity(
            &self.graph,
            &MultiplicityRef::new(target),
            value.as_ref(),
            covariant,
            policy,
        )
    }

    // =========================================================================
    // Recursion entry
    // =========================================================================

    fn match_generic(
        &self,
        guard: &mut MatchGuard,
        target: &GenericTypeRef,
        value: Option<&GenericTypeRef>,
        covariant: bool,
        policy: MatchPolicy,
    ) -> MatchOutcome {
        let Some(value) = value else {
            return self.match_null(target, policy);
        };
        let target = self.graph.resolve(target)?;
        let value = self.graph.resolve(value)?;

        let key = (target.node, value.node, covariant);
        match guard.enter(key) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => {
                warn!(
                    target = %target.node,
                    value = %value.node,
                    covariant,
                    "cyclic generic type structure; treating as no match"
                );
                return Ok(None);
            }
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                warn!(
                    target = %target.node,
                    value = %value.node,
                    depth = guard.depth(),
                    iterations = guard.iterations(),
                    "generic type match limit exceeded; treating as no match"
                );
                return Ok(None);
            }
        }
        let result = stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
            self.match_entered(guard, &target, &value, covariant, policy)
        });
        guard.leave(key);
        result
    }

    fn match_null(&self, target: &GenericTypeRef, policy: MatchPolicy) -> MatchOutcome {
        match policy.null_behavior {
            NullMatchBehavior::MatchAnything => Ok(Some(GenericTypeMatch::new(TypeMatch::Null))),
            NullMatchBehavior::MatchNothing => Ok(None),
            NullMatchBehavior::Error => Err(MatchError::NullValue {
                target: target.node,
                target_name: self.describe(target),
            }),
        }
    }

    fn match_entered(
        &self,
        guard: &mut MatchGuard,
        target: &GenericTypeRef,
        value: &GenericTypeRef,
        covariant: bool,
        policy: MatchPolicy,
    ) -> MatchOutcome {
        if self.graph.structurally_equal(target, value)? {
            return Ok(Some(GenericTypeMatch::exact()));
        }

        let target_raw = self.graph.raw_type(target.node)?;
        let value_raw = self.graph.raw_type(value.node)?;
        let Some(target_raw) = target_raw else {
            return self.match_non_concrete_target(target, value, value_raw, covariant, policy);
        };
        let Some(value_raw) = value_raw else {
            return self.match_non_concrete_value(target_raw, value, covariant, policy);
        };

        let (sub, sub_raw, sup, sup_raw) = if covariant {
            (value, value_raw, target, target_raw)
        } else {
            (target, target_raw, value, value_raw)
        };
        trace!(sub = %sub_raw, sup = %sup_raw, covariant, "raw type match");

        if self.graph.is_bottom(sub_raw) {
            return Ok(Some(GenericTypeMatch::new(TypeMatch::Bottom)));
        }
        if self.graph.is_top(sup_raw) {
            let distance = self.top_distance(sub_raw)?;
            return Ok(Some(GenericTypeMatch::new(TypeMatch::Distance(distance))));
        }

        let type_match = match (
            self.graph.is_function_type(target_raw),
            self.graph.is_function_type(value_raw),
        ) {
            (true, true) => {
                return self.match_functions(guard, target, target_raw, value, value_raw, covariant, policy);
            }
            (true, false) | (false, true) => return Ok(None),
            (false, false) if sub_raw == sup_raw => TypeMatch::Exact,
            (false, false) => match hierarchy::distance(&self.graph, sub_raw, sup_raw)? {
                Some(distance) => TypeMatch::Distance(distance),
                None => return Ok(None),
            },
        };

        self.match_arguments(guard, type_match, sub, sup, sup_raw, covariant, policy)
    }

    // =========================================================================
    // Non-concrete sides
    // =========================================================================

    fn match_non_concrete_target(
        &self,
        target: &GenericTypeRef,
        value: &GenericTypeRef,
        value_raw: Option<NodeId>,
        covariant: bool,
        policy: MatchPolicy,
    ) -> MatchOutcome {
        let accepted = match policy.target_param_behavior {
            ParameterMatchBehavior::MatchAnything => true,
            ParameterMatchBehavior::MatchNothing => false,
            ParameterMatchBehavior::Error => {
                return Err(MatchError::NonConcreteTarget {
                    node: target.node,
                    parameter: self.describe(target),
                });
            }
            ParameterMatchBehavior::MatchCautiously => match value_raw {
                None => {
                    self.graph.parameter_name(target.node)?
                        == self.graph.parameter_name(value.node)?
                }
                // Only the extreme type is compatible with every instantiation.
                Some(raw) if covariant => self.graph.is_bottom(raw),
                Some(raw) => self.graph.is_top(raw),
            },
        };
        Ok(accepted.then(|| GenericTypeMatch::new(TypeMatch::NonConcrete)))
    }

    fn match_non_concrete_value(
        &self,
        target_raw: NodeId,
        value: &GenericTypeRef,
        covariant: bool,
        policy: MatchPolicy,
    ) -> MatchOutcome {
        let accepted = match policy.value_param_behavior {
            ParameterMatchBehavior::MatchAnything => true,
            ParameterMatchBehavior::MatchNothing => false,
            ParameterMatchBehavior::Error => {
                return Err(MatchError::NonConcreteValue {
                    node: value.node,
                    parameter: self.describe(value),
                });
            }
            ParameterMatchBehavior::MatchCautiously if covariant => self.graph.is_top(target_raw),
            ParameterMatchBehavior::MatchCautiously => self.graph.is_bottom(target_raw),
        };
        Ok(accepted.then(|| GenericTypeMatch::new(TypeMatch::NonConcrete)))
    }

    // =========================================================================
    // Raw type helpers
    // =========================================================================

    /// Distance from `sub_raw` to the top type. Types that do not list the
    /// top type in their resolution order reach it one step past the end.
    fn top_distance(&self, sub_raw: NodeId) -> Result<usize, MatchError> {
        let order = hierarchy::resolution_order(&self.graph, sub_raw)?;
        let top = self.graph.core().any;
        Ok(order
            .iter()
            .position(|&ty| ty == top)
            .unwrap_or(order.len()))
    }

    fn match_functions(
        &self,
        guard: &mut MatchGuard,
        target: &GenericTypeRef,
        target_raw: NodeId,
        value: &GenericTypeRef,
        value_raw: NodeId,
        covariant: bool,
        policy: MatchPolicy,
    ) -> MatchOutcome {
        let target_sig = self.graph.function_signature(target_raw, &target.bindings)?;
        let value_sig = self.graph.function_signature(value_raw, &value.bindings)?;
        if target_sig.parameters.len() != value_sig.parameters.len() {
            return Ok(None);
        }

        // Parameters swap sides along with the variance: the value's parameter
        // becomes the target of the flipped comparison, so the expected
        // signature's parameter stays on the super side.
        let flipped = policy.swapped();
        let mut parameters = Vec::with_capacity(target_sig.parameters.len());
        for ((target_type, target_mult), (value_type, value_mult)) in
            target_sig.parameters.iter().zip(&value_sig.parameters)
        {
            let Some(type_match) =
                self.match_generic(guard, value_type, Some(target_type), !covariant, flipped)?
            else {
                return Ok(None);
            };
            let Some(multiplicity) = self.multiplicities.match_multiplicity(
                &self.graph,
                value_mult,
                Some(target_mult),
                !covariant,
                flipped,
            )?
            else {
                return Ok(None);
            };
            parameters.push(ParameterMatch {
                type_match,
                multiplicity,
            });
        }

        let Some(return_type) = self.match_generic(
            guard,
            &target_sig.return_type,
            Some(&value_sig.return_type),
            covariant,
            policy,
        )?
        else {
            return Ok(None);
        };
        let Some(return_multiplicity) = self.multiplicities.match_multiplicity(
            &self.graph,
            &target_sig.return_multiplicity,
            Some(&value_sig.return_multiplicity),
            covariant,
            policy,
        )?
        else {
            return Ok(None);
        };

        Ok(Some(GenericTypeMatch::new(TypeMatch::Function(Box::new(
            FunctionTypeMatch {
                parameters,
                return_type,
                return_multiplicity,
            },
        )))))
    }

    // =========================================================================
    // Arguments
    // =========================================================================

    fn match_arguments(
        &self,
        guard: &mut MatchGuard,
        type_match: TypeMatch,
        sub: &GenericTypeRef,
        sup: &GenericTypeRef,
        sup_raw: NodeId,
        covariant: bool,
        policy: MatchPolicy,
    ) -> MatchOutcome {
        let parameters = self.graph.type_parameters(sup_raw)?;
        let multiplicity_parameters = self.graph.multiplicity_parameters(sup_raw);
        if parameters.is_empty() && multiplicity_parameters.is_empty() {
            return Ok(Some(GenericTypeMatch::new(type_match)));
        }

        let sup_arguments = self.graph.type_arguments(sup);
        self.check_arity(sup, sup_raw, "type", parameters.len(), sup_arguments.len())?;
        let sup_multiplicities = self.graph.multiplicity_arguments(sup);
        self.check_arity(
            sup,
            sup_raw,
            "multiplicity",
            multiplicity_parameters.len(),
            sup_multiplicities.len(),
        )?;

        let Some(bindings) = self.resolver.resolve_bindings(&self.graph, sub, sup_raw)? else {
            return Ok(None);
        };

        let mut argument_matches = Vec::with_capacity(parameters.len());
        for (parameter, sup_argument) in parameters.iter().zip(&sup_arguments) {
            let Some(sub_argument) = bindings.types.get(&parameter.name) else {
                return Ok(None);
            };
            let (target_argument, value_argument) = if covariant {
                (sup_argument, sub_argument)
            } else {
                (sub_argument, sup_argument)
            };
            let argument_covariant = covariant != parameter.contravariant;
            let Some(argument_match) = self.match_generic(
                guard,
                target_argument,
                Some(value_argument),
                argument_covariant,
                policy,
            )?
            else {
                return Ok(None);
            };
            argument_matches.push(argument_match);
        }

        let mut multiplicity_matches = Vec::with_capacity(multiplicity_parameters.len());
        for (name, sup_multiplicity) in multiplicity_parameters.iter().zip(&sup_multiplicities) {
            let Some(sub_multiplicity) = bindings.multiplicities.get(name) else {
                return Ok(None);
            };
            let (target_multiplicity, value_multiplicity) = if covariant {
                (sup_multiplicity, sub_multiplicity)
            } else {
                (sub_multiplicity, sup_multiplicity)
            };
            let Some(multiplicity_match) = self.multiplicities.match_multiplicity(
                &self.graph,
                target_multiplicity,
                Some(value_multiplicity),
                covariant,
                policy,
            )?
            else {
                return Ok(None);
            };
            multiplicity_matches.push(multiplicity_match);
        }

        Ok(Some(GenericTypeMatch::with_arguments(
            type_match,
            argument_matches,
            multiplicity_matches,
        )))
    }

    fn check_arity(
        &self,
        generic_type: &GenericTypeRef,
        raw: NodeId,
        kind: &'static str,
        expected: usize,
        found: usize,
    ) -> Result<(), MatchError> {
        if expected == found {
            return Ok(());
        }
        Err(MatchError::ArityMismatch {
            generic_type: generic_type.node,
            raw,
            raw_name: self.graph.display_name(raw),
            kind,
            expected,
            found,
        })
    }

    /// Raw type or parameter name of a view, for diagnostics.
    fn describe(&self, view: &GenericTypeRef) -> String {
        if let Ok(Some(raw)) = self.graph.raw_type(view.node) {
            return self.graph.display_name(raw);
        }
        match self.graph.parameter_name(view.node) {
            Ok(Some(name)) => self.graph.store().resolve(name).to_string(),
            _ => view.node.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/matcher_tests.rs"]
mod tests;
