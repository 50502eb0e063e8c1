//! Generalization resolution order.
//!
//! The resolution order of a class lists the class followed by every
//! supertype reachable through `generalizations`, nearest first. It is the C3
//! linearization of the generalization graph, so a supertype never precedes
//! one of its own subtypes. Hierarchies that have no C3 linearization fall
//! back to breadth-first discovery order.
//!
//! The position of a supertype in this order is the distance the type match
//! engine reports for a subtype match.

use crate::error::MatchError;
use crate::generic_type::TypeGraph;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use metagraph_store::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Raw types of a class's direct generalizations, in declaration order.
/// Generalizations to non-concrete types are skipped.
pub fn direct_supertypes(graph: &TypeGraph<'_>, class: NodeId) -> Result<Vec<NodeId>, MatchError> {
    let mut supers = Vec::new();
    for general in graph.general_types(class)? {
        if let Some(raw) = graph.raw_type(general)? {
            if !supers.contains(&raw) {
                supers.push(raw);
            }
        }
    }
    Ok(supers)
}

/// `class` followed by all of its supertypes, nearest first.
pub fn resolution_order(graph: &TypeGraph<'_>, class: NodeId) -> Result<Vec<NodeId>, MatchError> {
    let mut linearizer = Linearizer {
        graph,
        guard: RecursionGuard::with_profile(RecursionProfile::GeneralizationWalk),
        memo: FxHashMap::default(),
    };
    linearizer.linearize(class)
}

/// Position of `super_type` in the resolution order of `class`.
pub fn distance(
    graph: &TypeGraph<'_>,
    class: NodeId,
    super_type: NodeId,
) -> Result<Option<usize>, MatchError> {
    if class == super_type {
        return Ok(Some(0));
    }
    Ok(resolution_order(graph, class)?
        .iter()
        .position(|&ty| ty == super_type))
}

struct Linearizer<'a, 'g> {
    graph: &'a TypeGraph<'g>,
    guard: RecursionGuard<NodeId>,
    memo: FxHashMap<NodeId, Vec<NodeId>>,
}

impl Linearizer<'_, '_> {
    fn linearize(&mut self, class: NodeId) -> Result<Vec<NodeId>, MatchError> {
        if let Some(order) = self.memo.get(&class) {
            return Ok(order.clone());
        }
        match self.guard.enter(class) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => {
                warn!(
                    class = %class,
                    name = %self.graph.display_name(class),
                    "generalization cycle; cutting the cyclic edge"
                );
                return Ok(Vec::new());
            }
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                warn!(class = %class, "generalization walk limit exceeded");
                return Ok(vec![class]);
            }
        }
        let result = self.linearize_entered(class);
        self.guard.leave(class);
        let order = result?;
        self.memo.insert(class, order.clone());
        Ok(order)
    }

    fn linearize_entered(&mut self, class: NodeId) -> Result<Vec<NodeId>, MatchError> {
        let supers = direct_supertypes(self.graph, class)?;
        let mut sequences: Vec<VecDeque<NodeId>> = Vec::with_capacity(supers.len() + 1);
        for &super_type in &supers {
            sequences.push(self.linearize(super_type)?.into());
        }
        sequences.push(supers.iter().copied().collect());

        let tail = match merge(sequences) {
            Some(merged) => merged,
            None => {
                debug!(class = %class, "no C3 linearization; using breadth-first order");
                self.breadth_first(class)?
            }
        };
        let mut order = Vec::with_capacity(tail.len() + 1);
        order.push(class);
        order.extend(tail.into_iter().filter(|&ty| ty != class));
        Ok(order)
    }

    fn breadth_first(&self, class: NodeId) -> Result<Vec<NodeId>, MatchError> {
        let mut seen = FxHashSet::default();
        seen.insert(class);
        let mut queue = VecDeque::from([class]);
        let mut order = Vec::new();
        while let Some(current) = queue.pop_front() {
            for super_type in direct_supertypes(self.graph, current)? {
                if seen.insert(super_type) {
                    order.push(super_type);
                    queue.push_back(super_type);
                }
            }
        }
        Ok(order)
    }
}

/// C3 merge: repeatedly take the first head that appears in no tail.
fn merge(mut sequences: Vec<VecDeque<NodeId>>) -> Option<Vec<NodeId>> {
    let mut result = Vec::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Some(result);
        }
        let candidate = sequences.iter().filter_map(|seq| seq.front().copied()).find(|head| {
            !sequences
                .iter()
                .any(|seq| seq.iter().skip(1).any(|ty| ty == head))
        })?;
        result.push(candidate);
        for seq in &mut sequences {
            if seq.front() == Some(&candidate) {
                seq.pop_front();
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/hierarchy_tests.rs"]
mod tests;
