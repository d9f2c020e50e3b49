//! Shared fixtures for control loop tests.

use std::sync::Arc;

use dlmm_core::{InstrumentId, InstrumentPair, OrderBook, Price, PriceLevel, Volume};
use dlmm_mm::MakerConfig;
use dlmm_venue::PaperVenue;
use rust_decimal::Decimal;

pub fn pair() -> InstrumentPair {
    InstrumentPair::new(
        InstrumentId::new("PHILIPS_A").unwrap(),
        InstrumentId::new("PHILIPS_B").unwrap(),
    )
    .unwrap()
}

pub fn level(price: Decimal, volume: u64) -> PriceLevel {
    PriceLevel::new(Price::new(price), Volume::new(volume))
}

/// Book with one level per side.
pub fn book(bid: Decimal, ask: Decimal, volume: u64) -> OrderBook {
    OrderBook::new(vec![level(bid, volume)], vec![level(ask, volume)])
}

/// Defaults without the settlement delay.
pub fn config() -> MakerConfig {
    MakerConfig {
        settlement_delay_ms: 0,
        ..Default::default()
    }
}

pub fn venue(liquid: OrderBook, illiquid: OrderBook) -> Arc<PaperVenue> {
    let pair = pair();
    let venue = PaperVenue::new([pair.liquid.clone(), pair.illiquid.clone()]);
    venue.set_book(&pair.liquid, liquid);
    venue.set_book(&pair.illiquid, illiquid);
    Arc::new(venue)
}
