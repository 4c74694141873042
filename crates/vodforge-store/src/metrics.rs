//! Store metrics collection.
//!
//! Standardized counters for monitoring the two tiers:
//! - Index hit/miss counters for reads
//! - Durable-tier operation counters by status

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Index lookups by outcome ("hit" / "miss").
    pub const INDEX_LOOKUPS_TOTAL: &str = "jobstore_index_lookups_total";

    /// Durable-tier operations by operation and status ("ok" / "error").
    pub const DURABLE_OPS_TOTAL: &str = "jobstore_durable_ops_total";
}

/// Record an index lookup.
pub fn record_index_lookup(hit: bool) {
    counter!(
        names::INDEX_LOOKUPS_TOTAL,
        "outcome" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

/// Record a durable-tier operation.
pub fn record_durable_op(operation: &'static str, ok: bool) {
    counter!(
        names::DURABLE_OPS_TOTAL,
        "operation" => operation,
        "status" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}
