//! Illiquid quote prices.
//!
//! Holds the current bid/ask the market maker wants resting on the
//! illiquid instrument and moves them each tick:
//! - every `narrow_period` ticks both sides step inward by `narrow_step`
//! - each side is then clamped to stay at least `pillow` outside the
//!   liquid market's same side
//! - after the fill check, a side with no outstanding order steps outward
//!   by `narrow_step * widen_multiplier`
//!
//! After a clamp, `bid <= liquid_bid - pillow` and
//! `ask >= liquid_ask + pillow` hold exactly.

use dlmm_core::{Price, Side, TopOfBook};
use rust_decimal::Decimal;

use crate::config::MakerConfig;
use crate::order_sync::OutstandingSides;

/// Which quote sides moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteUpdate {
    pub bid_updated: bool,
    pub ask_updated: bool,
}

impl QuoteUpdate {
    pub fn any(&self) -> bool {
        self.bid_updated || self.ask_updated
    }

    pub fn is_updated(&self, side: Side) -> bool {
        match side {
            Side::Bid => self.bid_updated,
            Side::Ask => self.ask_updated,
        }
    }
}

/// Quote state for the illiquid instrument.
#[derive(Debug, Clone)]
pub struct QuoteEngine {
    bid: Price,
    ask: Price,
    narrow_step: Decimal,
    pillow: Decimal,
    narrow_period: u64,
    widen_step: Decimal,
}

impl QuoteEngine {
    pub fn new(bid: Price, ask: Price, config: &MakerConfig) -> Self {
        Self {
            bid,
            ask,
            narrow_step: config.narrow_step,
            pillow: config.pillow,
            narrow_period: config.narrow_period.max(1),
            widen_step: config.widen_step(),
        }
    }

    /// Seed quotes `seed_offset` outside the first observed illiquid top of book.
    pub fn seed(illiquid: &TopOfBook, config: &MakerConfig) -> Self {
        Self::new(
            illiquid.bid_price() - config.seed_offset,
            illiquid.ask_price() + config.seed_offset,
            config,
        )
    }

    pub fn bid(&self) -> Price {
        self.bid
    }

    pub fn ask(&self) -> Price {
        self.ask
    }

    pub fn price(&self, side: Side) -> Price {
        match side {
            Side::Bid => self.bid,
            Side::Ask => self.ask,
        }
    }

    /// Narrow on schedule, then clamp against the liquid top of book.
    ///
    /// A narrowing tick marks both sides updated, and so does a clamp on
    /// the side it moves, even when the resulting price is unchanged. The
    /// resting order is then refreshed at full volume. Tick 0 narrows.
    pub fn advance(&mut self, tick: u64, liquid: &TopOfBook) -> QuoteUpdate {
        let mut update = QuoteUpdate::default();

        if tick % self.narrow_period == 0 {
            self.bid += self.narrow_step;
            self.ask -= self.narrow_step;
            update.bid_updated = true;
            update.ask_updated = true;
        }

        let clamped = self.clamp(liquid);
        QuoteUpdate {
            bid_updated: update.bid_updated || clamped.bid_updated,
            ask_updated: update.ask_updated || clamped.ask_updated,
        }
    }

    /// Whether both sides keep the pillow margin against `liquid`.
    pub fn respects_pillow(&self, liquid: &TopOfBook) -> bool {
        liquid.bid_price() - self.bid >= self.pillow && self.ask - liquid.ask_price() >= self.pillow
    }

    /// Widen every side that no longer has an outstanding order.
    pub fn widen_unfilled(&mut self, outstanding: OutstandingSides) -> QuoteUpdate {
        let update = QuoteUpdate {
            bid_updated: !outstanding.bid,
            ask_updated: !outstanding.ask,
        };
        if update.bid_updated {
            self.widen(Side::Bid);
        }
        if update.ask_updated {
            self.widen(Side::Ask);
        }
        update
    }

    pub fn widen(&mut self, side: Side) {
        match side {
            Side::Bid => self.bid -= self.widen_step,
            Side::Ask => self.ask += self.widen_step,
        }
    }

    fn clamp(&mut self, liquid: &TopOfBook) -> QuoteUpdate {
        let mut update = QuoteUpdate::default();
        if liquid.bid_price() - self.bid < self.pillow {
            self.bid = liquid.bid_price() - self.pillow;
            update.bid_updated = true;
        }
        if self.ask - liquid.ask_price() < self.pillow {
            self.ask = liquid.ask_price() + self.pillow;
            update.ask_updated = true;
        }
        update
    }
}
