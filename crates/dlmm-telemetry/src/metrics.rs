//! Prometheus metrics for the market maker.
//!
//! Covers:
//! - Control loop ticks and their outcome
//! - Resting order replacement per side
//! - Hedge orders and hedged volume
//! - Unwind pairs and unwound volume
//! - Current quote prices and positions
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a fatal configuration error that should
//! crash at startup. These panics only occur during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram, register_int_gauge_vec,
    CounterVec, Encoder, GaugeVec, Histogram, IntGaugeVec, TextEncoder,
};

use crate::error::TelemetryResult;

/// Total ticks by outcome (completed / skipped).
pub static TICKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dlmm_ticks_total",
        "Total control loop ticks by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Tick wall time in milliseconds, settlement delay included.
pub static TICK_DURATION_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "dlmm_tick_duration_ms",
        "Control loop tick duration in milliseconds",
        vec![1.0, 5.0, 10.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Resting order sync attempts.
/// Labels: side, outcome (replaced / guarded / rejected / failed)
pub static ORDER_SYNC_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dlmm_order_sync_total",
        "Resting quote replacement attempts",
        &["side", "outcome"]
    )
    .unwrap()
});

/// Hedge orders submitted on the liquid leg.
pub static HEDGE_ORDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dlmm_hedge_orders_total",
        "Immediate hedge orders submitted",
        &["side"]
    )
    .unwrap()
});

/// Hedge volume submitted on the liquid leg.
pub static HEDGE_VOLUME_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dlmm_hedge_volume_total",
        "Volume submitted by hedge orders",
        &["side"]
    )
    .unwrap()
});

/// Unwind order pairs submitted.
/// Labels: direction (sell_illiquid / buy_illiquid)
pub static UNWIND_PAIRS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dlmm_unwind_pairs_total",
        "Unwind order pairs submitted",
        &["direction"]
    )
    .unwrap()
});

/// Unwind volume submitted per leg.
pub static UNWIND_VOLUME_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dlmm_unwind_volume_total",
        "Volume submitted by unwind pairs",
        &["direction"]
    )
    .unwrap()
});

/// Current illiquid quote price per side.
pub static QUOTE_PRICE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "dlmm_quote_price",
        "Current illiquid quote price",
        &["side"]
    )
    .unwrap()
});

/// Last observed position per instrument.
pub static POSITION: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "dlmm_position",
        "Last observed signed position",
        &["instrument"]
    )
    .unwrap()
});

/// Venue call failures by operation.
pub static VENUE_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dlmm_venue_errors_total",
        "Venue call failures",
        &["operation"]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a tick outcome and its duration.
    pub fn tick(outcome: &str, duration_ms: f64) {
        TICKS_TOTAL.with_label_values(&[outcome]).inc();
        TICK_DURATION_MS.observe(duration_ms);
    }

    /// Record a resting order sync attempt.
    pub fn order_sync(side: &str, outcome: &str) {
        ORDER_SYNC_TOTAL.with_label_values(&[side, outcome]).inc();
    }

    /// Record a submitted hedge.
    pub fn hedge(side: &str, volume: u64) {
        HEDGE_ORDERS_TOTAL.with_label_values(&[side]).inc();
        HEDGE_VOLUME_TOTAL
            .with_label_values(&[side])
            .inc_by(volume as f64);
    }

    /// Record a submitted unwind pair.
    pub fn unwind_pair(direction: &str, volume: u64) {
        UNWIND_PAIRS_TOTAL.with_label_values(&[direction]).inc();
        UNWIND_VOLUME_TOTAL
            .with_label_values(&[direction])
            .inc_by(volume as f64);
    }

    /// Set the current quote prices.
    pub fn quotes(bid: f64, ask: f64) {
        QUOTE_PRICE.with_label_values(&["bid"]).set(bid);
        QUOTE_PRICE.with_label_values(&["ask"]).set(ask);
    }

    /// Set the last observed position of an instrument.
    pub fn position(instrument: &str, position: i64) {
        POSITION.with_label_values(&[instrument]).set(position);
    }

    /// Record a failed venue call.
    pub fn venue_error(operation: &str) {
        VENUE_ERRORS_TOTAL.with_label_values(&[operation]).inc();
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
