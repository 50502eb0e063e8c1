//! Generic argument resolution through inheritance.
//!
//! To compare `ArrayList<Dog>` against `List<Animal>`, the matcher needs the
//! value's arguments in terms of `List`'s declared parameters. The resolver
//! walks the generalization chain from `ArrayList` up to `List`, substituting
//! arguments at every step, and returns the bindings `List` sees.

use crate::error::MatchError;
use crate::generic_type::{Bindings, GenericTypeRef, TypeGraph};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use metagraph_store::NodeId;
use tracing::warn;

/// Binds a sub type's arguments to the parameters of one of its supertypes.
pub trait GenericArgumentResolver {
    /// Bindings of `super_raw`'s type and multiplicity parameters as seen from
    /// `sub`, a concrete generic type whose raw type specializes `super_raw`.
    ///
    /// Returns `None` when `sub` cannot be homogenized against `super_raw`
    /// (no inheritance path, or an argument count that disagrees with the
    /// parameters declared along the path).
    fn resolve_bindings(
        &self,
        graph: &TypeGraph<'_>,
        sub: &GenericTypeRef,
        super_raw: NodeId,
    ) -> Result<Option<Bindings>, MatchError>;
}

/// Resolver following `generalizations` depth-first in declaration order.
#[derive(Clone, Copy, Debug, Default)]
pub struct InheritanceResolver;

impl GenericArgumentResolver for InheritanceResolver {
    fn resolve_bindings(
        &self,
        graph: &TypeGraph<'_>,
        sub: &GenericTypeRef,
        super_raw: NodeId,
    ) -> Result<Option<Bindings>, MatchError> {
        let Some(sub_raw) = graph.raw_type(sub.node)? else {
            return Ok(None);
        };
        let mut guard = RecursionGuard::with_profile(RecursionProfile::GeneralizationWalk);
        walk(graph, sub, sub_raw, super_raw, &mut guard)
    }
}

/// Bind the arguments of `view` to the parameters `raw` declares.
pub fn bind_arguments(
    graph: &TypeGraph<'_>,
    raw: NodeId,
    view: &GenericTypeRef,
) -> Result<Option<Bindings>, MatchError> {
    let parameters = graph.type_parameters(raw)?;
    let arguments = graph.type_arguments(view);
    if parameters.len() != arguments.len() {
        return Ok(None);
    }
    let multiplicity_parameters = graph.multiplicity_parameters(raw);
    let multiplicity_arguments = graph.multiplicity_arguments(view);
    if multiplicity_parameters.len() != multiplicity_arguments.len() {
        return Ok(None);
    }

    let mut bindings = Bindings::default();
    bindings.types.extend(
        parameters
            .iter()
            .map(|parameter| parameter.name)
            .zip(arguments),
    );
    bindings
        .multiplicities
        .extend(multiplicity_parameters.into_iter().zip(multiplicity_arguments));
    Ok(Some(bindings))
}

fn walk(
    graph: &TypeGraph<'_>,
    view: &GenericTypeRef,
    raw: NodeId,
    super_raw: NodeId,
    guard: &mut RecursionGuard<NodeId>,
) -> Result<Option<Bindings>, MatchError> {
    let Some(bindings) = bind_arguments(graph, raw, view)? else {
        return Ok(None);
    };
    if raw == super_raw {
        return Ok(Some(bindings));
    }

    match guard.enter(raw) {
        RecursionResult::Entered => {}
        RecursionResult::Cycle => return Ok(None),
        RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
            warn!(raw = %raw, "inheritance walk limit exceeded");
            return Ok(None);
        }
    }
    let result = walk_generalizations(graph, raw, bindings, super_raw, guard);
    guard.leave(raw);
    result
}

fn walk_generalizations(
    graph: &TypeGraph<'_>,
    raw: NodeId,
    bindings: Bindings,
    super_raw: NodeId,
    guard: &mut RecursionGuard<NodeId>,
) -> Result<Option<Bindings>, MatchError> {
    let shared = bindings.into_shared();
    for general in graph.general_types(raw)? {
        let Some(general_raw) = graph.raw_type(general)? else {
            continue;
        };
        let general_view = GenericTypeRef::with_bindings(general, shared.clone());
        if let Some(found) = walk(graph, &general_view, general_raw, super_raw, guard)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "../tests/resolver_tests.rs"]
mod tests;
