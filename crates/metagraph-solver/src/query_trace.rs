//! Structured query tracing for match entry points.
//!
//! Events use target `metagraph::match_json` and are intended to be consumed
//! with: `METAGRAPH_LOG=metagraph::match_json=trace METAGRAPH_LOG_FORMAT=json`.
//!
//! Environment:
//! - `METAGRAPH_QUERY_RUN_ID`: optional run identifier attached to every event.

use metagraph_store::NodeId;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, trace};

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);
static QUERY_RUN_ID: OnceLock<String> = OnceLock::new();

#[inline]
pub(crate) fn enabled() -> bool {
    tracing::enabled!(target: "metagraph::match_json", Level::TRACE)
}

#[inline]
pub(crate) fn next_query_id() -> u64 {
    NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

#[inline]
fn run_id() -> &'static str {
    QUERY_RUN_ID
        .get_or_init(|| {
            std::env::var("METAGRAPH_QUERY_RUN_ID").unwrap_or_else(|_| "default".to_string())
        })
        .as_str()
}

#[inline]
pub(crate) fn match_start(
    query_id: u64,
    op: &'static str,
    target: NodeId,
    value: Option<NodeId>,
    covariant: bool,
) {
    trace!(
        target: "metagraph::match_json",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        target_node_id = target.0,
        value_node_id = value.map(|v| v.0),
        covariant
    );
}

#[inline]
pub(crate) fn match_end(query_id: u64, op: &'static str, outcome: &'static str) {
    trace!(
        target: "metagraph::match_json",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op,
        outcome
    );
}
