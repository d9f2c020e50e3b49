//! Venue trait for market data, positions and order routing.
//!
//! Provides a trait-based abstraction over the trading venue. This allows
//! the control loop to run unchanged against a live connection or the
//! in-memory [`PaperVenue`](crate::PaperVenue).

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;

use dlmm_core::{
    InstrumentId, OrderBook, OrderId, OrderRequest, OutstandingOrder, PositionCash,
};

use crate::error::VenueResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Trading venue operations consumed by the market maker.
///
/// Calls are awaited one at a time. No method carries a timeout; a slow
/// venue stalls the caller.
pub trait Venue: Send + Sync {
    /// Current order book snapshot. Either side may be empty.
    fn order_book<'a>(&'a self, instrument: &'a InstrumentId)
        -> BoxFuture<'a, VenueResult<OrderBook>>;

    /// Signed position in one instrument.
    fn position<'a>(&'a self, instrument: &'a InstrumentId) -> BoxFuture<'a, VenueResult<i64>>;

    /// Position and cash for every instrument the account has traded.
    fn positions_and_cash(
        &self,
    ) -> BoxFuture<'_, VenueResult<BTreeMap<InstrumentId, PositionCash>>>;

    /// Submit an order. Returns the venue order id.
    ///
    /// An accepted immediate order may still execute for zero volume.
    fn place_order(&self, order: OrderRequest) -> BoxFuture<'_, VenueResult<OrderId>>;

    /// Cancel a resting order.
    fn cancel_order<'a>(
        &'a self,
        instrument: &'a InstrumentId,
        order_id: OrderId,
    ) -> BoxFuture<'a, VenueResult<()>>;

    /// Orders still resting on the book for an instrument.
    fn outstanding_orders<'a>(
        &'a self,
        instrument: &'a InstrumentId,
    ) -> BoxFuture<'a, VenueResult<BTreeMap<OrderId, OutstandingOrder>>>;
}

/// Arc wrapper for Venue trait objects.
pub type DynVenue = Arc<dyn Venue>;
