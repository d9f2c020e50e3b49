//! Order book snapshots.
//!
//! A snapshot is immutable once fetched. Bids are ordered by descending
//! price, asks by ascending price, so level 0 is always the best level.

use serde::{Deserialize, Serialize};

use crate::{Price, Volume};

/// Book state for null-side detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookState {
    /// Both sides have at least one level.
    Valid,
    /// No bid levels.
    NoBid,
    /// No ask levels.
    NoAsk,
    /// Both sides empty.
    Empty,
}

impl std::fmt::Display for BookState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "VALID"),
            Self::NoBid => write!(f, "NO_BID"),
            Self::NoAsk => write!(f, "NO_ASK"),
            Self::Empty => write!(f, "EMPTY"),
        }
    }
}

/// A single price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub volume: Volume,
}

impl PriceLevel {
    pub fn new(price: Price, volume: Volume) -> Self {
        Self { price, volume }
    }
}

/// Best bid and best ask of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopOfBook {
    pub bid: PriceLevel,
    pub ask: PriceLevel,
}

impl TopOfBook {
    pub fn bid_price(&self) -> Price {
        self.bid.price
    }

    pub fn ask_price(&self) -> Price {
        self.ask.price
    }
}

/// Order book snapshot for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Bid levels, best (highest) first.
    pub bids: Vec<PriceLevel>,
    /// Ask levels, best (lowest) first.
    pub asks: Vec<PriceLevel>,
}

impl OrderBook {
    /// Build a snapshot, sorting both sides into best-first order.
    pub fn new(mut bids: Vec<PriceLevel>, mut asks: Vec<PriceLevel>) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        Self { bids, asks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Levels of one side, best first.
    pub fn levels(&self, side: crate::Side) -> &[PriceLevel] {
        match side {
            crate::Side::Bid => &self.bids,
            crate::Side::Ask => &self.asks,
        }
    }

    pub fn state(&self) -> BookState {
        match (self.bids.is_empty(), self.asks.is_empty()) {
            (false, false) => BookState::Valid,
            (true, false) => BookState::NoBid,
            (false, true) => BookState::NoAsk,
            (true, true) => BookState::Empty,
        }
    }

    /// Best bid and ask, or `None` if either side is empty.
    pub fn top(&self) -> Option<TopOfBook> {
        Some(TopOfBook {
            bid: *self.best_bid()?,
            ask: *self.best_ask()?,
        })
    }
}
