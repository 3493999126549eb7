/*!
 * # Metrics Module
 *
 * Prometheus counters for rental activity, exposed in text format at
 * `/metrics`. Each [`RentalMetrics`] owns its own registry so independent
 * application instances (and tests) never collide on registration.
 */

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to export metrics: {0}")]
    ExportError(String),
}

#[derive(Clone)]
pub struct RentalMetrics {
    registry: Registry,
    checkouts: IntCounter,
    check_ins: IntCounter,
    rejections: IntCounterVec,
    reconciled_rentals: IntCounterVec,
}

impl RentalMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new_custom(Some("video_store".into()), None)?;

        let checkouts = IntCounter::new("rental_checkouts_total", "Videos checked out")?;
        let check_ins = IntCounter::new("rental_check_ins_total", "Videos checked in")?;
        let rejections = IntCounterVec::new(
            Opts::new(
                "rental_rejections_total",
                "Rental requests refused by the ledger",
            ),
            &["reason"],
        )?;
        let reconciled_rentals = IntCounterVec::new(
            Opts::new(
                "rental_reconciled_total",
                "Outstanding rentals released because a customer or video was deleted",
            ),
            &["record"],
        )?;

        registry.register(Box::new(checkouts.clone()))?;
        registry.register(Box::new(check_ins.clone()))?;
        registry.register(Box::new(rejections.clone()))?;
        registry.register(Box::new(reconciled_rentals.clone()))?;

        Ok(Self {
            registry,
            checkouts,
            check_ins,
            rejections,
            reconciled_rentals,
        })
    }

    pub fn record_checkout(&self) {
        self.checkouts.inc();
    }

    pub fn record_check_in(&self) {
        self.check_ins.inc();
    }

    /// `reason` is a short label such as `inventory_exhausted`.
    pub fn record_rejection(&self, reason: &str) {
        self.rejections.with_label_values(&[reason]).inc();
    }

    pub fn record_reconciled(&self, record: &str, released: u64) {
        self.reconciled_rentals
            .with_label_values(&[record])
            .inc_by(released);
    }

    pub fn checkouts(&self) -> u64 {
        self.checkouts.get()
    }

    pub fn check_ins(&self) -> u64 {
        self.check_ins.get()
    }

    pub fn rejections(&self, reason: &str) -> u64 {
        self.rejections.with_label_values(&[reason]).get()
    }

    /// Prometheus text exposition of every registered metric.
    pub fn export(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::ExportError(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::ExportError(e.to_string()))
    }
}

// HTTP endpoint handler for metrics
pub async fn metrics_handler(State(metrics): State<Arc<RentalMetrics>>) -> Response {
    match metrics.export() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Metrics export failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_export() {
        let metrics = RentalMetrics::new().unwrap();
        metrics.record_checkout();
        metrics.record_checkout();
        metrics.record_check_in();
        metrics.record_rejection("inventory_exhausted");
        metrics.record_reconciled("customer", 2);

        let text = metrics.export().unwrap();
        assert!(text.contains("video_store_rental_checkouts_total 2"));
        assert!(text.contains("video_store_rental_check_ins_total 1"));
        assert!(text.contains("reason=\"inventory_exhausted\""));
        assert!(text.contains("record=\"customer\"} 2"));
    }

    #[test]
    fn separate_instances_do_not_share_counts() {
        let first = RentalMetrics::new().unwrap();
        let second = RentalMetrics::new().unwrap();
        first.record_checkout();
        second.record_check_in();
        assert_eq!(first.checkouts(), 1);
        assert_eq!(first.check_ins(), 0);
        assert_eq!(second.checkouts(), 0);
        assert_eq!(second.check_ins(), 1);
    }

    #[test]
    fn check_out_and_check_in_refusals_share_one_family() {
        let metrics = RentalMetrics::new().unwrap();
        metrics.record_rejection("inventory_exhausted");
        metrics.record_rejection("no_outstanding_rental");
        metrics.record_rejection("no_outstanding_rental");

        assert_eq!(metrics.rejections("inventory_exhausted"), 1);
        assert_eq!(metrics.rejections("no_outstanding_rental"), 2);

        let text = metrics.export().unwrap();
        assert!(text.contains(
            "video_store_rental_rejections_total{reason=\"no_outstanding_rental\"} 2"
        ));
    }
}
