//! Metric definitions.
//!
//! All metrics follow Prometheus naming conventions:
//! - `_total` suffix for counters
//! - plain names for gauges

use metrics::{counter, describe_counter, describe_gauge};

/// Register all metrics with descriptions.
pub fn register_metrics() {
    describe_counter!(
        "ibguid_vf_guid_assigned_total",
        "Total number of VFs whose GUIDs were written and driver unbound (by source: pool, random)"
    );
    describe_counter!(
        "ibguid_pool_fallback_total",
        "Total number of pool lookups that fell back to a random GUID (by reason)"
    );
    describe_gauge!("ibguid_config_entries", "Number of PFs in the loaded ib guid config");
}

pub fn record_guid_assigned(source: &str) {
    counter!("ibguid_vf_guid_assigned_total", "source" => source.to_string()).increment(1);
}

pub fn record_pool_fallback(reason: &str) {
    counter!("ibguid_pool_fallback_total", "reason" => reason.to_string()).increment(1);
}
