//! Tracing setup for the metagraph binaries, tests and benches.
//!
//! Nothing is installed unless `METAGRAPH_LOG` (or `RUST_LOG`) holds a filter.
//! `METAGRAPH_LOG_FORMAT` picks `text` (default), `tree` or `json`; every
//! format writes to stderr.
//!
//! Useful targets:
//!
//! - `metagraph_store::slot` traces index builds and drops at the lower
//!   threshold, and reports unique-key collisions at `debug`.
//! - `metagraph_store::store` reports node allocation at `trace`.
//! - `metagraph_solver::hierarchy` warns when a generalization cycle is cut.
//! - `metagraph_solver::matcher` warns when a match hits a cycle or the
//!   recursion limits, and traces each raw type comparison.
//! - `metagraph::match_json` carries one start and one end event per
//!   `match_types` call, tagged with `METAGRAPH_QUERY_RUN_ID`.
//!
//! ```bash
//! # Why did a slot stop using its index?
//! METAGRAPH_LOG="metagraph_store::slot=trace" cargo test -p metagraph-store
//!
//! # Match queries as JSON lines, one run tagged for later filtering
//! METAGRAPH_LOG="metagraph::match_json=trace" METAGRAPH_LOG_FORMAT=json \
//!     METAGRAPH_QUERY_RUN_ID=overloads cargo bench --bench match_bench
//!
//! # Nested argument matching as an indented tree
//! METAGRAPH_LOG="metagraph_solver=trace" METAGRAPH_LOG_FORMAT=tree cargo test -p metagraph-solver
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a `METAGRAPH_LOG_FORMAT` value; unknown values mean `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("METAGRAPH_LOG_FORMAT").unwrap_or_default())
    }
}

/// Build an `EnvFilter` from `METAGRAPH_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("METAGRAPH_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `METAGRAPH_LOG` nor `RUST_LOG` is set. All output
/// goes to stderr. Calling it twice, or after another subscriber was
/// installed, leaves the existing subscriber in place.
pub fn init_tracing() {
    let has_metagraph_log = std::env::var("METAGRAPH_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_metagraph_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    let format = LogFormat::from_env();

    let installed = match format {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).try_init().is_ok()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).try_init().is_ok()
        }
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok(),
    };
    if installed {
        tracing::debug!(?format, "metagraph tracing initialised");
    }
}
