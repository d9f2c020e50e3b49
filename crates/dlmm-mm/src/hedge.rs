//! Delta hedge on the liquid instrument.
//!
//! Both instruments represent the same asset, so the net exposure is the
//! sum of the two positions. A non-zero sum is closed with one immediate
//! order on the liquid leg at the liquid top of book: a net long sells
//! into the best bid, a net short buys from the best ask.

use dlmm_core::{InstrumentId, OrderId, OrderRequest, Side, TopOfBook, Volume};
use dlmm_telemetry::Metrics;
use dlmm_venue::Venue;
use tracing::{info, warn};

/// Order that brings `position_liquid + position_illiquid` back to zero.
///
/// Returns `None` when already flat.
pub fn plan_hedge(
    liquid: &InstrumentId,
    position_liquid: i64,
    position_illiquid: i64,
    liquid_top: &TopOfBook,
) -> Option<OrderRequest> {
    let total = position_liquid.saturating_add(position_illiquid);
    let side = Side::closing(total)?;
    let price = match side {
        Side::Ask => liquid_top.bid_price(),
        Side::Bid => liquid_top.ask_price(),
    };
    Some(OrderRequest::immediate(
        liquid.clone(),
        side,
        price,
        Volume::of_position(total),
    ))
}

/// A submitted hedge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HedgeReport {
    pub order: OrderRequest,
    /// `None` if the venue refused the order.
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Clone)]
pub struct HedgeExecutor {
    liquid: InstrumentId,
}

impl HedgeExecutor {
    pub fn new(liquid: InstrumentId) -> Self {
        Self { liquid }
    }

    /// Submit the hedge for the given positions, if any.
    ///
    /// A refused order is logged and reported; the next tick recomputes
    /// the imbalance from fresh positions.
    pub async fn hedge(
        &self,
        venue: &dyn Venue,
        position_liquid: i64,
        position_illiquid: i64,
        liquid_top: &TopOfBook,
    ) -> Option<HedgeReport> {
        let order = plan_hedge(&self.liquid, position_liquid, position_illiquid, liquid_top)?;

        info!(
            instrument = %order.instrument,
            side = %order.side,
            price = %order.price,
            volume = %order.volume,
            position_liquid,
            position_illiquid,
            "Hedging net exposure"
        );

        let order_id = match venue.place_order(order.clone()).await {
            Ok(id) => {
                Metrics::hedge(order.side.as_str(), order.volume.get());
                Some(id)
            }
            Err(e) => {
                warn!(
                    instrument = %order.instrument,
                    side = %order.side,
                    error = %e,
                    "Hedge order rejected"
                );
                Metrics::venue_error("place_order");
                None
            }
        };

        Some(HedgeReport { order, order_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlmm_core::{OrderBook, OrderKind, Price, PriceLevel};
    use dlmm_venue::PaperVenue;
    use rust_decimal_macros::dec;

    fn liquid() -> InstrumentId {
        InstrumentId::new("PHILIPS_A").unwrap()
    }

    fn liquid_top() -> TopOfBook {
        TopOfBook {
            bid: PriceLevel::new(Price::new(dec!(100.0)), Volume::new(50)),
            ask: PriceLevel::new(Price::new(dec!(100.2)), Volume::new(50)),
        }
    }

    #[test]
    fn test_flat_needs_no_hedge() {
        assert!(plan_hedge(&liquid(), 0, 0, &liquid_top()).is_none());
        assert!(plan_hedge(&liquid(), -14, 14, &liquid_top()).is_none());
    }

    #[test]
    fn test_net_long_sells_at_bid() {
        let order = plan_hedge(&liquid(), 0, 14, &liquid_top()).unwrap();
        assert_eq!(order.side, Side::Ask);
        assert_eq!(order.price, Price::new(dec!(100.0)));
        assert_eq!(order.volume, Volume::new(14));
        assert_eq!(order.kind, OrderKind::Immediate);
    }

    #[test]
    fn test_net_short_buys_at_ask() {
        let order = plan_hedge(&liquid(), 4, -10, &liquid_top()).unwrap();
        assert_eq!(order.side, Side::Bid);
        assert_eq!(order.price, Price::new(dec!(100.2)));
        assert_eq!(order.volume, Volume::new(6));
    }

    #[tokio::test]
    async fn test_hedge_restores_zero_delta() {
        let venue = PaperVenue::new([liquid()]);
        venue.set_book(
            &liquid(),
            OrderBook::new(
                vec![PriceLevel::new(Price::new(dec!(100.0)), Volume::new(50))],
                vec![PriceLevel::new(Price::new(dec!(100.2)), Volume::new(50))],
            ),
        );
        let executor = HedgeExecutor::new(liquid());

        let report = executor.hedge(&venue, 0, 14, &liquid_top()).await.unwrap();

        assert!(report.order_id.is_some());
        assert_eq!(venue.position_of(&liquid()), -14);
    }

    #[tokio::test]
    async fn test_rejected_hedge_reported() {
        let venue = PaperVenue::new([liquid()]);
        venue.reject_next_orders(1, "halted");
        let executor = HedgeExecutor::new(liquid());

        let report = executor.hedge(&venue, 0, -3, &liquid_top()).await.unwrap();

        assert!(report.order_id.is_none());
        assert_eq!(venue.mutation_count(), 0);
    }
}
