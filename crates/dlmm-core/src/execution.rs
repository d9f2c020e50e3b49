//! Venue payload types: order requests, outstanding orders, positions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instrument::InstrumentId;
use crate::order::{OrderKind, Side};
use crate::{Price, Volume};

/// Order to be submitted to the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Target instrument.
    pub instrument: InstrumentId,
    /// Bid (buy) or ask (sell).
    pub side: Side,
    /// Limit price.
    pub price: Price,
    /// Order volume.
    pub volume: Volume,
    /// Resting or immediate.
    #[serde(default)]
    pub kind: OrderKind,
}

impl OrderRequest {
    /// Resting limit order.
    #[must_use]
    pub fn resting(instrument: InstrumentId, side: Side, price: Price, volume: Volume) -> Self {
        Self {
            instrument,
            side,
            price,
            volume,
            kind: OrderKind::Resting,
        }
    }

    /// Immediate-or-nothing order.
    #[must_use]
    pub fn immediate(instrument: InstrumentId, side: Side, price: Price, volume: Volume) -> Self {
        Self {
            instrument,
            side,
            price,
            volume,
            kind: OrderKind::Immediate,
        }
    }
}

/// An order the venue still holds on the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutstandingOrder {
    pub side: Side,
    pub price: Price,
    pub volume: Volume,
}

/// Position and cash for one instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCash {
    /// Signed position (positive = long).
    pub position: i64,
    /// Cash attributed to trading this instrument.
    pub cash: Decimal,
}
