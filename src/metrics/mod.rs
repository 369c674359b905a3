//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Nonce allocation
//! - Transaction signing and submission
//! - Receipt confirmation and cancellation
//! - Deployment verification failures

use crate::error::{TxManagerError, TxResult};

use lazy_static::lazy_static;
use prometheus::{register_counter, register_histogram, Counter, Encoder, Histogram, TextEncoder};

lazy_static! {
    pub static ref NONCES_ALLOCATED: Counter = register_counter!(
        "txmanager_nonces_allocated_total",
        "Total nonces handed out by nonce sequencers"
    ).unwrap();

    pub static ref TX_SIGNED: Counter = register_counter!(
        "txmanager_transactions_signed_total",
        "Total transactions signed"
    ).unwrap();

    pub static ref TX_SENT: Counter = register_counter!(
        "txmanager_transactions_sent_total",
        "Total transactions broadcast"
    ).unwrap();

    pub static ref TX_SEND_FAILED: Counter = register_counter!(
        "txmanager_transactions_send_failed_total",
        "Total broadcasts that failed (nonce consumed)"
    ).unwrap();

    pub static ref RECEIPTS_CONFIRMED: Counter = register_counter!(
        "txmanager_receipts_confirmed_total",
        "Total receipts obtained by polling"
    ).unwrap();

    pub static ref POLLS_CANCELLED: Counter = register_counter!(
        "txmanager_polls_cancelled_total",
        "Total receipt polls cancelled by the caller"
    ).unwrap();

    pub static ref DEPLOYMENTS_FAILED: Counter = register_counter!(
        "txmanager_deployments_failed_total",
        "Total mined deployments that left no contract code"
    ).unwrap();

    pub static ref CONFIRMATION_LATENCY: Histogram = register_histogram!(
        "txmanager_confirmation_latency_seconds",
        "Time from first receipt query to receipt",
        vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    ).unwrap();
}

/// Render all registered metrics in the Prometheus text format
pub fn gather() -> TxResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(encoding_error)?;
    String::from_utf8(buffer).map_err(encoding_error)
}

fn encoding_error(err: impl std::fmt::Display) -> TxManagerError {
    TxManagerError::Metrics(err.to_string())
}

// Helper functions to record metrics

pub fn record_nonce_allocated() {
    NONCES_ALLOCATED.inc();
}

pub fn record_tx_signed() {
    TX_SIGNED.inc();
}

pub fn record_tx_sent() {
    TX_SENT.inc();
}

pub fn record_tx_send_failed() {
    TX_SEND_FAILED.inc();
}

pub fn record_receipt_confirmed(latency_secs: f64) {
    RECEIPTS_CONFIRMED.inc();
    CONFIRMATION_LATENCY.observe(latency_secs);
}

pub fn record_poll_cancelled() {
    POLLS_CANCELLED.inc();
}

pub fn record_deployment_failed() {
    DEPLOYMENTS_FAILED.inc();
}
