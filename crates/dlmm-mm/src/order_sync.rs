//! Resting quote replacement on the illiquid instrument.
//!
//! A side is replaced by cancelling every outstanding order on that side
//! and placing one fresh resting order at the new price. The position
//! guard skips the replacement (leaving the old orders alone) when a fill
//! would push the illiquid position past `max_position`.

use std::collections::BTreeMap;

use dlmm_core::{InstrumentId, OrderId, OrderRequest, OutstandingOrder, Price, Side, Volume};
use dlmm_telemetry::Metrics;
use dlmm_venue::{Venue, VenueError};
use tracing::{debug, info, warn};

use crate::error::MmResult;

/// Which sides still have at least one resting order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutstandingSides {
    pub bid: bool,
    pub ask: bool,
}

impl OutstandingSides {
    pub fn from_orders(orders: &BTreeMap<OrderId, OutstandingOrder>) -> Self {
        let mut sides = Self::default();
        for order in orders.values() {
            match order.side {
                Side::Bid => sides.bid = true,
                Side::Ask => sides.ask = true,
            }
        }
        sides
    }

    pub fn has(&self, side: Side) -> bool {
        match side {
            Side::Bid => self.bid,
            Side::Ask => self.ask,
        }
    }
}

/// Result of one side replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Old orders cancelled and a new one accepted.
    Replaced { cancelled: usize, order_id: OrderId },
    /// Position guard blocked the side. Nothing was cancelled or placed.
    Guarded,
    /// Old orders cancelled but the venue refused the new order.
    Rejected { cancelled: usize, reason: String },
    /// Listing or cancelling failed. The side may still hold old orders.
    Failed { reason: String },
}

impl SyncOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replaced { .. } => "replaced",
            Self::Guarded => "guarded",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Whether a fill on `side` keeps the illiquid position within `max_position`.
///
/// Selling requires `position >= -max_position`, buying requires
/// `position <= max_position`.
pub fn position_allows(side: Side, position: i64, max_position: i64) -> bool {
    match side {
        Side::Ask => position >= -max_position,
        Side::Bid => position <= max_position,
    }
}

/// Which sides of `instrument` still have resting orders.
pub async fn outstanding_sides(
    venue: &dyn Venue,
    instrument: &InstrumentId,
) -> MmResult<OutstandingSides> {
    let orders = venue.outstanding_orders(instrument).await?;
    Ok(OutstandingSides::from_orders(&orders))
}

/// Cancel outstanding orders on one side, or on both when `side` is `None`.
///
/// An order that disappears between listing and cancelling (filled in the
/// meantime) is skipped. Returns the number of orders cancelled.
pub async fn cancel_side(
    venue: &dyn Venue,
    instrument: &InstrumentId,
    side: Option<Side>,
) -> MmResult<usize> {
    let orders = venue.outstanding_orders(instrument).await?;

    let mut cancelled = 0;
    for (order_id, order) in orders {
        if side.is_some_and(|s| s != order.side) {
            continue;
        }
        match venue.cancel_order(instrument, order_id).await {
            Ok(()) => cancelled += 1,
            Err(VenueError::UnknownOrder { .. }) => {
                debug!(
                    instrument = %instrument,
                    order_id = %order_id,
                    "Order gone before cancel"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(cancelled)
}

/// Keeps exactly one resting order per quoted side.
#[derive(Debug, Clone)]
pub struct OrderSync {
    instrument: InstrumentId,
    max_position: i64,
}

impl OrderSync {
    pub fn new(instrument: InstrumentId, max_position: i64) -> Self {
        Self {
            instrument,
            max_position,
        }
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    /// Replace the resting order on `side` with one at `price`.
    ///
    /// `position` is the current illiquid position. Listing or cancelling
    /// errors propagate; a refused placement is reported as
    /// [`SyncOutcome::Rejected`].
    pub async fn sync(
        &self,
        venue: &dyn Venue,
        side: Side,
        price: Price,
        volume: Volume,
        position: i64,
    ) -> MmResult<SyncOutcome> {
        if !position_allows(side, position, self.max_position) {
            debug!(
                instrument = %self.instrument,
                side = %side,
                position,
                max_position = self.max_position,
                "Position limit reached, side not re-quoted"
            );
            Metrics::order_sync(side.as_str(), "guarded");
            return Ok(SyncOutcome::Guarded);
        }

        let cancelled = cancel_side(venue, &self.instrument, Some(side)).await?;

        let order = OrderRequest::resting(self.instrument.clone(), side, price, volume);
        let outcome = match venue.place_order(order).await {
            Ok(order_id) => {
                info!(
                    instrument = %self.instrument,
                    side = %side,
                    price = %price,
                    volume = %volume,
                    cancelled,
                    order_id = %order_id,
                    "Quote replaced"
                );
                SyncOutcome::Replaced {
                    cancelled,
                    order_id,
                }
            }
            Err(e) => {
                warn!(
                    instrument = %self.instrument,
                    side = %side,
                    price = %price,
                    error = %e,
                    "Quote placement rejected"
                );
                Metrics::venue_error("place_order");
                SyncOutcome::Rejected {
                    cancelled,
                    reason: e.to_string(),
                }
            }
        };

        Metrics::order_sync(side.as_str(), outcome.as_str());
        Ok(outcome)
    }
}
