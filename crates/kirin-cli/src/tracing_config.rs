//! Tracing configuration for the `kirin` binary.
//!
//! Supports three output formats controlled by `KIRIN_LOG_FORMAT`:
//!
//! - `text` (default): standard `tracing-subscriber` flat output
//! - `tree`: hierarchical indented output via `tracing-tree`, one level per
//!   pass (`resolve_file`, `link`, `deserialize_module`, ...)
//! - `json`: one JSON object per span/event
//!
//! ## Quick start
//!
//! ```bash
//! KIRIN_LOG=debug KIRIN_LOG_FORMAT=tree kirin link lib.kirl app.kirl
//! KIRIN_LOG="kirin_linker=trace,kirin_resolve=debug" kirin resolve project.json
//! ```
//!
//! The subscriber is only initialised when `KIRIN_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

pub const LOG_ENV: &str = "KIRIN_LOG";
pub const LOG_FORMAT_ENV: &str = "KIRIN_LOG_FORMAT";

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
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var(LOG_FORMAT_ENV).unwrap_or_default())
    }
}

/// `KIRIN_LOG` takes precedence over `RUST_LOG`.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var(LOG_ENV) {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber. All output goes to stderr so
/// `--format json` reports on stdout stay parseable.
pub fn init_tracing() {
    let has_kirin_log = std::env::var(LOG_ENV).is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_kirin_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_writer(std::io::stderr)
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
