//! Most-specific candidate selection.
//!
//! Overload resolution matches every candidate's parameter types against the
//! argument types, then keeps the candidates whose result is minimal under
//! the match order. Incompatible candidates (`None`) never win.

/// Outcome of choosing among ranked candidates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    NoMatch,
    Unique(usize),
    /// Several candidates tie for most specific; indices in input order.
    Ambiguous(Vec<usize>),
}

impl Selection {
    pub fn unique(&self) -> Option<usize> {
        match self {
            Self::Unique(index) => Some(*index),
            _ => None,
        }
    }
}

/// Indices of the minimal results, in input order.
pub fn select_most_specific<T: Ord>(results: &[Option<T>]) -> Vec<usize> {
    let Some(best) = results.iter().flatten().min() else {
        return Vec::new();
    };
    results
        .iter()
        .enumerate()
        .filter(|(_, result)| result.as_ref() == Some(best))
        .map(|(index, _)| index)
        .collect()
}

/// [`select_most_specific`], classified.
pub fn select<T: Ord>(results: &[Option<T>]) -> Selection {
    let mut winners = select_most_specific(results);
    match winners.len() {
        0 => Selection::NoMatch,
        1 => Selection::Unique(winners.remove(0)),
        _ => Selection::Ambiguous(winners),
    }
}

/// Joins the per-argument results of a multi-argument candidate into one
/// result that orders lexicographically. Any incompatible argument makes the
/// whole candidate incompatible.
pub fn combine<T: Clone>(per_argument: &[Option<T>]) -> Option<Vec<T>> {
    per_argument.iter().cloned().collect()
}

#[cfg(test)]
#[path = "../tests/overload_tests.rs"]
mod tests;
