//! Offsetting inventory unwind.
//!
//! When the illiquid and liquid positions have opposite signs, the pair
//! can be closed together: trade the illiquid leg at its best price and
//! the liquid leg against its book depth. The walk visits liquid levels
//! best-first and keeps submitting pairs while the two prices lock in a
//! non-negative margin:
//!
//! ```text
//! illiquid long, liquid short:  sell illiquid @ bid, buy liquid @ ask[i]
//!                               while illiquid_bid >= ask[i]
//! illiquid short, liquid long:  buy illiquid @ ask,  sell liquid @ bid[i]
//!                               while illiquid_ask <= bid[i]
//! ```
//!
//! Positions are read from the venue right before every pair is sized, so
//! a walk never unwinds more than is currently held and stops as soon as
//! the positions stop offsetting.

use dlmm_core::{
    InstrumentPair, OrderBook, OrderId, OrderRequest, Price, PriceLevel, Side, TopOfBook, Volume,
};
use dlmm_telemetry::Metrics;
use dlmm_venue::Venue;
use tracing::{debug, info, warn};

use crate::error::MmResult;

/// Which way the offsetting pair is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwindDirection {
    /// Illiquid long, liquid short.
    SellIlliquid,
    /// Illiquid short, liquid long.
    BuyIlliquid,
}

impl UnwindDirection {
    /// Direction for a pair of positions, or `None` unless they offset.
    pub fn from_positions(position_liquid: i64, position_illiquid: i64) -> Option<Self> {
        match (position_illiquid.signum(), position_liquid.signum()) {
            (1, -1) => Some(Self::SellIlliquid),
            (-1, 1) => Some(Self::BuyIlliquid),
            _ => None,
        }
    }

    pub fn illiquid_side(&self) -> Side {
        match self {
            Self::SellIlliquid => Side::Ask,
            Self::BuyIlliquid => Side::Bid,
        }
    }

    pub fn liquid_side(&self) -> Side {
        self.illiquid_side().opposite()
    }

    /// Illiquid level the walk trades against.
    fn illiquid_level(&self, illiquid: &TopOfBook) -> PriceLevel {
        match self {
            Self::SellIlliquid => illiquid.bid,
            Self::BuyIlliquid => illiquid.ask,
        }
    }

    /// Liquid levels the walk trades against, best first.
    fn liquid_levels<'a>(&self, liquid: &'a OrderBook) -> &'a [PriceLevel] {
        liquid.levels(self.liquid_side().opposite())
    }

    fn is_favorable(&self, illiquid_price: Price, liquid_price: Price) -> bool {
        match self {
            Self::SellIlliquid => illiquid_price >= liquid_price,
            Self::BuyIlliquid => illiquid_price <= liquid_price,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SellIlliquid => "sell_illiquid",
            Self::BuyIlliquid => "buy_illiquid",
        }
    }
}

impl std::fmt::Display for UnwindDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwindStop {
    /// Positions did not offset when the walk was triggered.
    NotOffsetting,
    /// Level `level` no longer locks in a non-negative margin.
    Unfavorable { level: usize },
    /// Every liquid level was used.
    BookExhausted,
    /// Re-read positions stopped offsetting in the walk's direction.
    PositionsClosed { level: usize },
    /// The volume rule produced zero at `level`.
    NoVolume { level: usize },
    /// The venue refused the illiquid leg at `level`.
    Rejected { level: usize },
}

/// One submitted order pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwindPair {
    pub level: usize,
    pub volume: Volume,
    pub illiquid_price: Price,
    pub liquid_price: Price,
    pub illiquid_order: OrderId,
    /// `None` if the venue refused the liquid leg.
    pub liquid_order: Option<OrderId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwindReport {
    pub direction: Option<UnwindDirection>,
    pub pairs: Vec<UnwindPair>,
    pub stop: UnwindStop,
}

impl UnwindReport {
    fn idle() -> Self {
        Self {
            direction: None,
            pairs: Vec::new(),
            stop: UnwindStop::NotOffsetting,
        }
    }

    pub fn volume(&self) -> Volume {
        self.pairs
            .iter()
            .fold(Volume::ZERO, |acc, pair| acc + pair.volume)
    }
}

#[derive(Debug, Clone)]
pub struct UnwindEngine {
    pair: InstrumentPair,
}

impl UnwindEngine {
    pub fn new(pair: InstrumentPair) -> Self {
        Self { pair }
    }

    /// Walk the liquid book and close offsetting inventory.
    ///
    /// `position_liquid`/`position_illiquid` only select the direction;
    /// every pair is sized from positions re-read just before submission.
    /// Position read failures propagate.
    pub async fn run(
        &self,
        venue: &dyn Venue,
        position_liquid: i64,
        position_illiquid: i64,
        illiquid: &TopOfBook,
        liquid: &OrderBook,
    ) -> MmResult<UnwindReport> {
        let Some(direction) = UnwindDirection::from_positions(position_liquid, position_illiquid)
        else {
            return Ok(UnwindReport::idle());
        };

        let levels = direction.liquid_levels(liquid);
        let illiquid_level = direction.illiquid_level(illiquid);
        let mut illiquid_remaining = illiquid_level.volume;
        let mut pairs = Vec::new();

        debug!(
            direction = %direction,
            position_liquid,
            position_illiquid,
            illiquid_price = %illiquid_level.price,
            levels = levels.len(),
            "Unwind walk started"
        );

        let mut level = 0;
        let stop = loop {
            let Some(liquid_level) = levels.get(level) else {
                break UnwindStop::BookExhausted;
            };
            if !direction.is_favorable(illiquid_level.price, liquid_level.price) {
                break UnwindStop::Unfavorable { level };
            }

            let position_liquid = venue.position(&self.pair.liquid).await?;
            let position_illiquid = venue.position(&self.pair.illiquid).await?;
            let current = UnwindDirection::from_positions(position_liquid, position_illiquid);
            if current != Some(direction) {
                break UnwindStop::PositionsClosed { level };
            }

            let volume = illiquid_remaining
                .min(liquid_level.volume)
                .min(Volume::of_position(position_illiquid))
                .min(Volume::of_position(position_liquid));
            if volume.is_zero() {
                break UnwindStop::NoVolume { level };
            }

            let illiquid_order = OrderRequest::immediate(
                self.pair.illiquid.clone(),
                direction.illiquid_side(),
                illiquid_level.price,
                volume,
            );
            let illiquid_id = match venue.place_order(illiquid_order).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(
                        direction = %direction,
                        level,
                        error = %e,
                        "Unwind illiquid leg rejected"
                    );
                    Metrics::venue_error("place_order");
                    break UnwindStop::Rejected { level };
                }
            };

            let liquid_order = OrderRequest::immediate(
                self.pair.liquid.clone(),
                direction.liquid_side(),
                liquid_level.price,
                volume,
            );
            let liquid_id = match venue.place_order(liquid_order).await {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(
                        direction = %direction,
                        level,
                        error = %e,
                        "Unwind liquid leg rejected"
                    );
                    Metrics::venue_error("place_order");
                    None
                }
            };

            info!(
                direction = %direction,
                level,
                volume = %volume,
                illiquid_price = %illiquid_level.price,
                liquid_price = %liquid_level.price,
                "Unwind pair submitted"
            );
            Metrics::unwind_pair(direction.as_str(), volume.get());

            illiquid_remaining = illiquid_remaining.saturating_sub(volume);
            pairs.push(UnwindPair {
                level,
                volume,
                illiquid_price: illiquid_level.price,
                liquid_price: liquid_level.price,
                illiquid_order: illiquid_id,
                liquid_order: liquid_id,
            });
            level += 1;
        };

        debug!(direction = %direction, pairs = pairs.len(), stop = ?stop, "Unwind walk finished");

        Ok(UnwindReport {
            direction: Some(direction),
            pairs,
            stop,
        })
    }
}
