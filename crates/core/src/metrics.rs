//! Prometheus metrics for the ingestion pipeline.
//!
//! The runner is a batch process, so metrics are exported by writing the text
//! exposition to a file picked up by a node-exporter textfile collector.

use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Registry holding every pipeline metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

// =============================================================================
// Batch / archive
// =============================================================================

/// Archives disposed by result.
pub static ARCHIVES_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "parkwarden_archives_processed_total",
            "Evidence archives processed",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Tickets created remotely.
pub static TICKETS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "parkwarden_tickets_created_total",
        "Tickets created in the remote system",
    )
    .unwrap()
});

/// Offences skipped during validation.
pub static OFFENCES_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "parkwarden_offences_skipped_total",
            "Offence records skipped before submission",
        ),
        &["reason"], // "missing_vehicle_id", "missing_event", "bad_timestamp"
    )
    .unwrap()
});

/// Attachment outcomes.
pub static ATTACHMENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "parkwarden_attachments_total",
            "Evidence image attachment outcomes",
        ),
        &["outcome"], // "uploaded", "missing", "failed"
    )
    .unwrap()
});

// =============================================================================
// Remote API
// =============================================================================

/// Remote request duration in seconds.
pub static REMOTE_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "parkwarden_remote_request_duration_seconds",
            "Duration of ticketing API requests",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["endpoint", "result"],
    )
    .unwrap()
});

/// All metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ARCHIVES_PROCESSED.clone()),
        Box::new(TICKETS_CREATED.clone()),
        Box::new(OFFENCES_SKIPPED.clone()),
        Box::new(ATTACHMENTS.clone()),
        Box::new(REMOTE_REQUEST_DURATION.clone()),
    ]
}

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Write the exposition next to `path` and rename it into place.
pub fn write_textfile(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, encode_metrics())?;
    std::fs::rename(&tmp, path)
}
