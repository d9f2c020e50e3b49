//! Emergency flatten.
//!
//! Bypasses the control loop and closes every non-zero position with one
//! immediate order at a dominating price: longs sell at
//! `flatten_sell_price`, shorts buy at `flatten_buy_price`. The prices
//! trade through any realistic book, so the fill is bought at the cost of
//! price.

use std::collections::BTreeMap;

use dlmm_core::{InstrumentId, OrderId, OrderRequest, PositionCash, Price, Side, Volume};
use dlmm_venue::Venue;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::MmResult;

/// One immediate order per non-zero position, in instrument order.
pub fn plan_flatten(
    positions: &BTreeMap<InstrumentId, PositionCash>,
    sell_price: Decimal,
    buy_price: Decimal,
) -> Vec<OrderRequest> {
    positions
        .iter()
        .filter_map(|(instrument, account)| {
            let side = Side::closing(account.position)?;
            let price = match side {
                Side::Ask => sell_price,
                Side::Bid => buy_price,
            };
            Some(OrderRequest::immediate(
                instrument.clone(),
                side,
                Price::new(price),
                Volume::of_position(account.position),
            ))
        })
        .collect()
}

/// Submitted flatten orders and the account before and after.
#[derive(Debug, Clone)]
pub struct FlattenReport {
    pub before: BTreeMap<InstrumentId, PositionCash>,
    pub after: BTreeMap<InstrumentId, PositionCash>,
    pub submitted: Vec<(OrderRequest, Option<OrderId>)>,
}

impl FlattenReport {
    /// Whether every position ended flat.
    pub fn is_flat(&self) -> bool {
        self.after.values().all(|account| account.position == 0)
    }
}

/// Close every position the venue reports.
pub async fn flatten_all(
    venue: &dyn Venue,
    sell_price: Decimal,
    buy_price: Decimal,
) -> MmResult<FlattenReport> {
    let before = venue.positions_and_cash().await?;
    log_positions("Positions before flatten", &before);

    let orders = plan_flatten(&before, sell_price, buy_price);
    let mut submitted = Vec::with_capacity(orders.len());
    for order in orders {
        info!(
            instrument = %order.instrument,
            side = %order.side,
            price = %order.price,
            volume = %order.volume,
            "Flatten order"
        );
        let order_id = match venue.place_order(order.clone()).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(instrument = %order.instrument, error = %e, "Flatten order rejected");
                None
            }
        };
        submitted.push((order, order_id));
    }

    let after = venue.positions_and_cash().await?;
    log_positions("Positions after flatten", &after);

    Ok(FlattenReport {
        before,
        after,
        submitted,
    })
}

pub(crate) fn log_positions(message: &str, positions: &BTreeMap<InstrumentId, PositionCash>) {
    for (instrument, account) in positions {
        info!(
            instrument = %instrument,
            position = account.position,
            cash = %account.cash,
            "{message}"
        );
    }
}
