//! In-memory paper venue.
//!
//! Holds one order book per instrument and a single account. Orders match
//! against the book's opposite side at or better than their limit price,
//! consuming the levels they trade through. Immediate orders discard any
//! unfilled remainder; resting orders keep it on the book until cancelled
//! or filled through [`PaperVenue::fill_resting`]. Accepted mutations are
//! counted, and the most recent [`CALL_LOG_CAPACITY`] are kept for inspection.

use std::collections::{BTreeMap, HashMap, VecDeque};

use dlmm_core::{
    InstrumentId, OrderBook, OrderId, OrderKind, OrderRequest, OutstandingOrder, PositionCash,
    Price, Side, Volume,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{VenueError, VenueResult};
use crate::venue::{BoxFuture, Venue};

/// Number of recent mutations kept in the call log.
pub const CALL_LOG_CAPACITY: usize = 1024;

/// A mutation accepted by the paper venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueCall {
    Place {
        order_id: OrderId,
        order: OrderRequest,
    },
    Cancel {
        instrument: InstrumentId,
        order_id: OrderId,
    },
}

#[derive(Debug, Clone)]
struct RestingOrder {
    instrument: InstrumentId,
    order: OutstandingOrder,
}

#[derive(Debug, Default)]
struct PaperState {
    books: HashMap<InstrumentId, OrderBook>,
    accounts: BTreeMap<InstrumentId, PositionCash>,
    resting: BTreeMap<OrderId, RestingOrder>,
    next_order_id: u64,
    calls: VecDeque<VenueCall>,
    mutations: usize,
    rejections: VecDeque<String>,
    cancel_failures: VecDeque<String>,
    unavailable: bool,
}

impl PaperState {
    fn check_available(&self) -> VenueResult<()> {
        if self.unavailable {
            return Err(VenueError::Unavailable("paper venue offline".to_string()));
        }
        Ok(())
    }

    fn check_known(&self, instrument: &InstrumentId) -> VenueResult<()> {
        if self.accounts.contains_key(instrument) {
            Ok(())
        } else {
            Err(VenueError::UnknownInstrument(instrument.clone()))
        }
    }

    fn record(&mut self, call: VenueCall) {
        self.mutations += 1;
        if self.calls.len() == CALL_LOG_CAPACITY {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }

    /// Trade against the book. Returns the filled volume.
    fn execute(
        &mut self,
        instrument: &InstrumentId,
        side: Side,
        limit: Price,
        volume: Volume,
    ) -> Volume {
        let Some(book) = self.books.get_mut(instrument) else {
            return Volume::ZERO;
        };
        let account = self.accounts.entry(instrument.clone()).or_default();

        let levels = match side {
            Side::Bid => &mut book.asks,
            Side::Ask => &mut book.bids,
        };

        let mut remaining = volume;
        while !remaining.is_zero() {
            let Some(level) = levels.first_mut() else {
                break;
            };
            let crosses = match side {
                Side::Bid => level.price <= limit,
                Side::Ask => level.price >= limit,
            };
            if !crosses {
                break;
            }

            let take = remaining.min(level.volume);
            level.volume = level.volume.saturating_sub(take);
            remaining = remaining.saturating_sub(take);

            account.position += take.signed(side.sign());
            let notional = take.notional(level.price);
            match side {
                Side::Bid => account.cash -= notional,
                Side::Ask => account.cash += notional,
            }

            if level.volume.is_zero() {
                levels.remove(0);
            }
        }

        volume.saturating_sub(remaining)
    }

    fn settle(&mut self, instrument: &InstrumentId, side: Side, price: Price, volume: Volume) {
        let account = self.accounts.entry(instrument.clone()).or_default();
        account.position += volume.signed(side.sign());
        let notional = volume.notional(price);
        match side {
            Side::Bid => account.cash -= notional,
            Side::Ask => account.cash += notional,
        }
    }
}

/// In-memory venue with a single account.
#[derive(Debug)]
pub struct PaperVenue {
    state: Mutex<PaperState>,
}

impl PaperVenue {
    /// Create a venue trading the given instruments, all flat with empty books.
    pub fn new<I>(instruments: I) -> Self
    where
        I: IntoIterator<Item = InstrumentId>,
    {
        let mut state = PaperState {
            next_order_id: 1,
            ..Default::default()
        };
        for instrument in instruments {
            state.books.insert(instrument.clone(), OrderBook::empty());
            state.accounts.insert(instrument, PositionCash::default());
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// Replace an instrument's book, registering the instrument if needed.
    pub fn set_book(&self, instrument: &InstrumentId, book: OrderBook) {
        let mut state = self.state.lock();
        state.accounts.entry(instrument.clone()).or_default();
        state.books.insert(instrument.clone(), book);
    }

    /// Current book (after any liquidity consumed by our own orders).
    pub fn book(&self, instrument: &InstrumentId) -> Option<OrderBook> {
        self.state.lock().books.get(instrument).cloned()
    }

    /// Overwrite a position, registering the instrument if needed.
    pub fn set_position(&self, instrument: &InstrumentId, position: i64) {
        let mut state = self.state.lock();
        state.books.entry(instrument.clone()).or_default();
        state.accounts.entry(instrument.clone()).or_default().position = position;
    }

    pub fn position_of(&self, instrument: &InstrumentId) -> i64 {
        self.state
            .lock()
            .accounts
            .get(instrument)
            .map(|a| a.position)
            .unwrap_or(0)
    }

    /// Simulate a counterparty trading against every resting order on one side.
    ///
    /// Returns the total volume filled.
    pub fn fill_resting(&self, instrument: &InstrumentId, side: Side) -> Volume {
        let mut state = self.state.lock();
        let filled: Vec<OrderId> = state
            .resting
            .iter()
            .filter(|(_, r)| &r.instrument == instrument && r.order.side == side)
            .map(|(id, _)| *id)
            .collect();

        let mut total = Volume::ZERO;
        for id in filled {
            if let Some(resting) = state.resting.remove(&id) {
                state.settle(instrument, side, resting.order.price, resting.order.volume);
                total = total + resting.order.volume;
            }
        }
        debug!(instrument = %instrument, side = %side, volume = %total, "Paper resting fill");
        total
    }

    /// Reject the next `count` placements with `reason`.
    pub fn reject_next_orders(&self, count: usize, reason: &str) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state.rejections.push_back(reason.to_string());
        }
    }

    /// Fail the next `count` cancels with [`VenueError::Unavailable`].
    pub fn fail_next_cancels(&self, count: usize, reason: &str) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state.cancel_failures.push_back(reason.to_string());
        }
    }

    /// Make every call fail with [`VenueError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Most recent accepted mutations in submission order.
    pub fn calls(&self) -> Vec<VenueCall> {
        self.state.lock().calls.iter().cloned().collect()
    }

    /// Accepted order placements in submission order.
    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                VenueCall::Place { order, .. } => Some(order.clone()),
                VenueCall::Cancel { .. } => None,
            })
            .collect()
    }

    /// Accepted mutations since creation, including those evicted from the log.
    pub fn mutation_count(&self) -> usize {
        self.state.lock().mutations
    }

    /// Empty the call log. The mutation count is kept.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn place_sync(&self, order: OrderRequest) -> VenueResult<OrderId> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.check_known(&order.instrument)?;
        if let Some(reason) = state.rejections.pop_front() {
            return Err(VenueError::OrderRejected(reason));
        }
        if order.volume.is_zero() {
            return Err(VenueError::OrderRejected("zero volume".to_string()));
        }

        let order_id = OrderId::new(state.next_order_id);
        state.next_order_id += 1;
        state.record(VenueCall::Place {
            order_id,
            order: order.clone(),
        });

        let filled = state.execute(&order.instrument, order.side, order.price, order.volume);
        let remainder = order.volume.saturating_sub(filled);

        match order.kind {
            OrderKind::Immediate => {
                debug!(
                    instrument = %order.instrument,
                    side = %order.side,
                    price = %order.price,
                    filled = %filled,
                    discarded = %remainder,
                    "Paper immediate order"
                );
            }
            OrderKind::Resting if !remainder.is_zero() => {
                state.resting.insert(
                    order_id,
                    RestingOrder {
                        instrument: order.instrument.clone(),
                        order: OutstandingOrder {
                            side: order.side,
                            price: order.price,
                            volume: remainder,
                        },
                    },
                );
            }
            OrderKind::Resting => {}
        }

        Ok(order_id)
    }

    fn cancel_sync(&self, instrument: &InstrumentId, order_id: OrderId) -> VenueResult<()> {
        let mut state = self.state.lock();
        state.check_available()?;
        if let Some(reason) = state.cancel_failures.pop_front() {
            return Err(VenueError::Unavailable(reason));
        }
        let matches = state
            .resting
            .get(&order_id)
            .is_some_and(|r| &r.instrument == instrument);
        if !matches {
            return Err(VenueError::UnknownOrder {
                instrument: instrument.clone(),
                order_id,
            });
        }
        state.resting.remove(&order_id);
        state.record(VenueCall::Cancel {
            instrument: instrument.clone(),
            order_id,
        });
        Ok(())
    }
}

impl Venue for PaperVenue {
    fn order_book<'a>(
        &'a self,
        instrument: &'a InstrumentId,
    ) -> BoxFuture<'a, VenueResult<OrderBook>> {
        Box::pin(async move {
            let state = self.state.lock();
            state.check_available()?;
            state
                .books
                .get(instrument)
                .cloned()
                .ok_or_else(|| VenueError::UnknownInstrument(instrument.clone()))
        })
    }

    fn position<'a>(&'a self, instrument: &'a InstrumentId) -> BoxFuture<'a, VenueResult<i64>> {
        Box::pin(async move {
            let state = self.state.lock();
            state.check_available()?;
            state
                .accounts
                .get(instrument)
                .map(|a| a.position)
                .ok_or_else(|| VenueError::UnknownInstrument(instrument.clone()))
        })
    }

    fn positions_and_cash(
        &self,
    ) -> BoxFuture<'_, VenueResult<BTreeMap<InstrumentId, PositionCash>>> {
        Box::pin(async move {
            let state = self.state.lock();
            state.check_available()?;
            Ok(state.accounts.clone())
        })
    }

    fn place_order(&self, order: OrderRequest) -> BoxFuture<'_, VenueResult<OrderId>> {
        Box::pin(async move { self.place_sync(order) })
    }

    fn cancel_order<'a>(
        &'a self,
        instrument: &'a InstrumentId,
        order_id: OrderId,
    ) -> BoxFuture<'a, VenueResult<()>> {
        Box::pin(async move { self.cancel_sync(instrument, order_id) })
    }

    fn outstanding_orders<'a>(
        &'a self,
        instrument: &'a InstrumentId,
    ) -> BoxFuture<'a, VenueResult<BTreeMap<OrderId, OutstandingOrder>>> {
        Box::pin(async move {
            let state = self.state.lock();
            state.check_available()?;
            state.check_known(instrument)?;
            Ok(state
                .resting
                .iter()
                .filter(|(_, r)| &r.instrument == instrument)
                .map(|(id, r)| (*id, r.order.clone()))
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlmm_core::PriceLevel;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn instrument(name: &str) -> InstrumentId {
        InstrumentId::new(name).unwrap()
    }

    fn level(price: Decimal, volume: u64) -> PriceLevel {
        PriceLevel::new(Price::new(price), Volume::new(volume))
    }

    fn venue_with_book() -> (PaperVenue, InstrumentId) {
        let a = instrument("PHILIPS_A");
        let venue = PaperVenue::new([a.clone()]);
        venue.set_book(
            &a,
            OrderBook::new(
                vec![level(dec!(100.0), 5), level(dec!(99.9), 10)],
                vec![level(dec!(100.2), 4), level(dec!(100.3), 10)],
            ),
        );
        (venue, a)
    }

    #[test]
    fn test_immediate_buy_walks_levels_and_discards_remainder() {
        let (venue, a) = venue_with_book();
        let order = OrderRequest::immediate(
            a.clone(),
            Side::Bid,
            Price::new(dec!(100.2)),
            Volume::new(6),
        );
        tokio_test::block_on(venue.place_order(order)).unwrap();

        // Only the 100.2 level crosses the limit: 4 filled, 2 discarded.
        assert_eq!(venue.position_of(&a), 4);
        let book = venue.book(&a).unwrap();
        assert_eq!(book.best_ask().unwrap().price, Price::new(dec!(100.3)));
        let outstanding = tokio_test::block_on(venue.outstanding_orders(&a)).unwrap();
        assert!(outstanding.is_empty());

        let accounts = tokio_test::block_on(venue.positions_and_cash()).unwrap();
        assert_eq!(accounts[&a].cash, dec!(-400.8));
    }

    #[test]
    fn test_immediate_sell_updates_cash() {
        let (venue, a) = venue_with_book();
        let order =
            OrderRequest::immediate(a.clone(), Side::Ask, Price::new(dec!(99.9)), Volume::new(7));
        tokio_test::block_on(venue.place_order(order)).unwrap();

        assert_eq!(venue.position_of(&a), -7);
        let accounts = tokio_test::block_on(venue.positions_and_cash()).unwrap();
        // 5 @ 100.0 + 2 @ 99.9
        assert_eq!(accounts[&a].cash, dec!(699.8));
    }

    #[test]
    fn test_resting_order_rests_then_cancels() {
        let (venue, a) = venue_with_book();
        let order =
            OrderRequest::resting(a.clone(), Side::Bid, Price::new(dec!(99.5)), Volume::new(14));
        let id = tokio_test::block_on(venue.place_order(order)).unwrap();

        let outstanding = tokio_test::block_on(venue.outstanding_orders(&a)).unwrap();
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[&id].volume, Volume::new(14));
        assert_eq!(venue.position_of(&a), 0);

        tokio_test::block_on(venue.cancel_order(&a, id)).unwrap();
        assert!(tokio_test::block_on(venue.outstanding_orders(&a))
            .unwrap()
            .is_empty());
        assert_eq!(venue.mutation_count(), 2);
    }

    #[test]
    fn test_fill_resting_settles_at_order_price() {
        let (venue, a) = venue_with_book();
        let order =
            OrderRequest::resting(a.clone(), Side::Ask, Price::new(dec!(101.0)), Volume::new(3));
        tokio_test::block_on(venue.place_order(order)).unwrap();

        assert_eq!(venue.fill_resting(&a, Side::Bid), Volume::ZERO);
        assert_eq!(venue.fill_resting(&a, Side::Ask), Volume::new(3));
        assert_eq!(venue.position_of(&a), -3);
        assert!(tokio_test::block_on(venue.outstanding_orders(&a))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rejection_queue() {
        let (venue, a) = venue_with_book();
        venue.reject_next_orders(1, "risk check");
        let order =
            OrderRequest::resting(a.clone(), Side::Bid, Price::new(dec!(99.0)), Volume::new(1));

        let first = tokio_test::block_on(venue.place_order(order.clone()));
        assert!(matches!(first, Err(VenueError::OrderRejected(_))));
        assert_eq!(venue.mutation_count(), 0);

        assert!(tokio_test::block_on(venue.place_order(order)).is_ok());
    }

    #[test]
    fn test_unknown_instrument_and_order() {
        let (venue, a) = venue_with_book();
        let b = instrument("PHILIPS_B");
        assert!(matches!(
            tokio_test::block_on(venue.order_book(&b)),
            Err(VenueError::UnknownInstrument(_))
        ));
        assert!(matches!(
            tokio_test::block_on(venue.cancel_order(&a, OrderId::new(99))),
            Err(VenueError::UnknownOrder { .. })
        ));
    }

    #[test]
    fn test_call_log_is_bounded() {
        let (venue, a) = venue_with_book();
        let order =
            OrderRequest::resting(a.clone(), Side::Bid, Price::new(dec!(99.0)), Volume::new(1));
        for _ in 0..CALL_LOG_CAPACITY + 10 {
            tokio_test::block_on(venue.place_order(order.clone())).unwrap();
        }

        let calls = venue.calls();
        assert_eq!(calls.len(), CALL_LOG_CAPACITY);
        assert_eq!(venue.mutation_count(), CALL_LOG_CAPACITY + 10);
        // Oldest entries are evicted first.
        assert!(matches!(
            &calls[0],
            VenueCall::Place { order_id, .. } if *order_id == OrderId::new(11)
        ));
    }

    #[test]
    fn test_cancel_failure_keeps_order() {
        let (venue, a) = venue_with_book();
        let order =
            OrderRequest::resting(a.clone(), Side::Bid, Price::new(dec!(99.5)), Volume::new(14));
        let id = tokio_test::block_on(venue.place_order(order)).unwrap();

        venue.fail_next_cancels(1, "timeout");
        assert!(matches!(
            tokio_test::block_on(venue.cancel_order(&a, id)),
            Err(VenueError::Unavailable(_))
        ));
        assert_eq!(tokio_test::block_on(venue.outstanding_orders(&a)).unwrap().len(), 1);
        assert!(tokio_test::block_on(venue.cancel_order(&a, id)).is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_fails_reads() {
        let (venue, a) = venue_with_book();
        venue.set_unavailable(true);
        assert!(matches!(
            venue.position(&a).await,
            Err(VenueError::Unavailable(_))
        ));
        venue.set_unavailable(false);
        assert_eq!(venue.position(&a).await.unwrap(), 0);
    }
}
