//! Control loop.
//!
//! One tick walks the phases in order:
//!
//! ```text
//! Idle → QuoteUpdate → OrderSync → Hedge → SettlementDelay
//!      → FillCheck → SpreadAdjust → Unwind → Idle
//! ```
//!
//! A book with an empty side or a failed venue read abandons the rest of
//! the tick, except during order sync: a failed cancel is logged and the
//! tick goes on to the hedge; the next tick starts from fresh data. Shutdown is observed
//! only between ticks, so a started tick always finishes its side effects.

use std::sync::Arc;
use std::time::Instant;

use dlmm_core::{InstrumentId, InstrumentPair, OrderBook, Price, Side, TopOfBook};
use dlmm_telemetry::Metrics;
use dlmm_venue::{DynVenue, Venue};
use rust_decimal::prelude::ToPrimitive;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::MakerConfig;
use crate::error::{MmError, MmResult};
use crate::flatten::log_positions;
use crate::hedge::{HedgeExecutor, HedgeReport};
use crate::order_sync::{cancel_side, outstanding_sides, OrderSync, SyncOutcome};
use crate::quote_engine::{QuoteEngine, QuoteUpdate};
use crate::unwind::{UnwindEngine, UnwindReport};

/// Phase of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    QuoteUpdate,
    OrderSync,
    Hedge,
    SettlementDelay,
    FillCheck,
    SpreadAdjust,
    Unwind,
}

impl std::fmt::Display for TickPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::QuoteUpdate => "quote_update",
            Self::OrderSync => "order_sync",
            Self::Hedge => "hedge",
            Self::SettlementDelay => "settlement_delay",
            Self::FillCheck => "fill_check",
            Self::SpreadAdjust => "spread_adjust",
            Self::Unwind => "unwind",
        };
        f.write_str(name)
    }
}

/// Everything a completed tick did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub quotes: QuoteUpdate,
    pub syncs: Vec<(Side, SyncOutcome)>,
    pub hedge: Option<HedgeReport>,
    pub widened: QuoteUpdate,
    pub unwind: UnwindReport,
    pub bid: Price,
    pub ask: Price,
}

#[derive(Debug)]
pub enum TickOutcome {
    Completed(TickReport),
    /// The tick stopped at `phase`; later phases did not run.
    Skipped {
        tick: u64,
        phase: TickPhase,
        error: MmError,
    },
}

impl TickOutcome {
    pub fn tick(&self) -> u64 {
        match self {
            Self::Completed(report) => report.tick,
            Self::Skipped { tick, .. } => *tick,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// Totals over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub completed: u64,
    pub skipped: u64,
    pub hedges: u64,
    pub unwind_pairs: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Completed(report) => {
                self.completed += 1;
                if report.hedge.is_some() {
                    self.hedges += 1;
                }
                self.unwind_pairs += report.unwind.pairs.len() as u64;
            }
            TickOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

struct TickFailure {
    phase: TickPhase,
    error: MmError,
}

impl TickFailure {
    fn at(phase: TickPhase) -> impl Fn(MmError) -> Self {
        move |error| Self { phase, error }
    }
}

/// Poll the illiquid book until both sides are present.
///
/// Retries with exponential backoff up to `init_max_attempts` polls.
/// A venue error counts as a failed poll.
pub async fn acquire_seed(
    venue: &dyn Venue,
    instrument: &InstrumentId,
    config: &MakerConfig,
    shutdown: &CancellationToken,
) -> MmResult<TopOfBook> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match venue.order_book(instrument).await {
            Ok(book) => match book.top() {
                Some(top) => {
                    info!(
                        instrument = %instrument,
                        bid = %top.bid_price(),
                        ask = %top.ask_price(),
                        attempt,
                        "Initial market observed"
                    );
                    return Ok(top);
                }
                None => {
                    debug!(
                        instrument = %instrument,
                        state = %book.state(),
                        attempt,
                        "Waiting for two-sided book"
                    );
                }
            },
            Err(e) => {
                warn!(instrument = %instrument, error = %e, attempt, "Book poll failed");
                Metrics::venue_error("order_book");
            }
        }

        if attempt >= config.init_max_attempts {
            error!(
                instrument = %instrument,
                attempts = attempt,
                "No two-sided book, giving up"
            );
            return Err(MmError::InitTimeout { attempts: attempt });
        }

        let delay = config.init_backoff(attempt);
        tokio::select! {
            biased;
            () = shutdown.cancelled() => return Err(MmError::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }
    }
}

async fn read_top(
    venue: &dyn Venue,
    instrument: &InstrumentId,
) -> MmResult<(OrderBook, TopOfBook)> {
    let book = match venue.order_book(instrument).await {
        Ok(book) => book,
        Err(e) => {
            Metrics::venue_error("order_book");
            return Err(e.into());
        }
    };
    match book.top() {
        Some(top) => Ok((book, top)),
        None => Err(MmError::NoData {
            instrument: instrument.clone(),
            state: book.state(),
        }),
    }
}

async fn read_position(venue: &dyn Venue, instrument: &InstrumentId) -> MmResult<i64> {
    match venue.position(instrument).await {
        Ok(position) => {
            Metrics::position(instrument.as_str(), position);
            Ok(position)
        }
        Err(e) => {
            Metrics::venue_error("position");
            Err(e.into())
        }
    }
}

fn as_f64(price: Price) -> f64 {
    price.inner().to_f64().unwrap_or_default()
}

/// Market maker for one liquid/illiquid pair.
pub struct MarketMaker {
    config: MakerConfig,
    pair: InstrumentPair,
    venue: DynVenue,
    engine: QuoteEngine,
    order_sync: OrderSync,
    hedger: HedgeExecutor,
    unwinder: UnwindEngine,
    tick: u64,
}

impl MarketMaker {
    /// Seed quotes from the live illiquid book and clear leftover orders.
    pub async fn initialize(
        config: MakerConfig,
        pair: InstrumentPair,
        venue: DynVenue,
        shutdown: &CancellationToken,
    ) -> MmResult<Self> {
        config.validate()?;
        let top = acquire_seed(venue.as_ref(), &pair.illiquid, &config, shutdown).await?;
        let engine = QuoteEngine::seed(&top, &config);
        info!(
            bid = %engine.bid(),
            ask = %engine.ask(),
            seed_offset = %config.seed_offset,
            "Quotes seeded"
        );

        let maker = Self::with_engine(config, pair, venue, engine);
        maker.cancel_all_outstanding().await?;
        Ok(maker)
    }

    /// Start from known quotes instead of polling the venue.
    pub fn with_quotes(
        config: MakerConfig,
        pair: InstrumentPair,
        venue: DynVenue,
        bid: Price,
        ask: Price,
    ) -> MmResult<Self> {
        config.validate()?;
        let engine = QuoteEngine::new(bid, ask, &config);
        Ok(Self::with_engine(config, pair, venue, engine))
    }

    fn with_engine(
        config: MakerConfig,
        pair: InstrumentPair,
        venue: DynVenue,
        engine: QuoteEngine,
    ) -> Self {
        Self {
            order_sync: OrderSync::new(pair.illiquid.clone(), config.max_position),
            hedger: HedgeExecutor::new(pair.liquid.clone()),
            unwinder: UnwindEngine::new(pair.clone()),
            config,
            pair,
            venue,
            engine,
            tick: 0,
        }
    }

    /// Set the counter for the next tick.
    #[must_use]
    pub fn starting_at(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    pub fn engine(&self) -> &QuoteEngine {
        &self.engine
    }

    pub fn pair(&self) -> &InstrumentPair {
        &self.pair
    }

    /// Counter value the next tick will run with.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Cancel every outstanding order on both instruments.
    pub async fn cancel_all_outstanding(&self) -> MmResult<usize> {
        let mut total = 0;
        for instrument in self.pair.both() {
            total += cancel_side(self.venue.as_ref(), instrument, None).await?;
        }
        info!(cancelled = total, "Cleared outstanding orders");
        Ok(total)
    }

    /// Log position and cash of every instrument. Failures are logged only.
    pub async fn report_positions(&self) {
        match self.venue.positions_and_cash().await {
            Ok(positions) => {
                for (instrument, account) in &positions {
                    Metrics::position(instrument.as_str(), account.position);
                }
                log_positions("Position report", &positions);
            }
            Err(e) => {
                warn!(error = %e, "Position report failed");
                Metrics::venue_error("positions_and_cash");
            }
        }
    }

    /// Run one tick and advance the counter.
    pub async fn tick(&mut self) -> TickOutcome {
        let tick = self.tick;
        self.tick += 1;
        let started = Instant::now();

        if tick % self.config.report_interval == 0 {
            self.report_positions().await;
        }

        let outcome = match self.run_tick(tick).await {
            Ok(report) => {
                debug!(tick, bid = %report.bid, ask = %report.ask, "Tick completed");
                TickOutcome::Completed(report)
            }
            Err(TickFailure { phase, error }) => {
                warn!(tick, phase = %phase, error = %error, "Tick skipped");
                TickOutcome::Skipped { tick, phase, error }
            }
        };

        Metrics::tick(outcome.as_str(), started.elapsed().as_secs_f64() * 1000.0);
        outcome
    }

    async fn run_tick(&mut self, tick: u64) -> Result<TickReport, TickFailure> {
        let venue = Arc::clone(&self.venue);
        let venue = venue.as_ref();

        // Quote update
        let (_, liquid_top) = read_top(venue, &self.pair.liquid)
            .await
            .map_err(TickFailure::at(TickPhase::QuoteUpdate))?;
        read_top(venue, &self.pair.illiquid)
            .await
            .map_err(TickFailure::at(TickPhase::QuoteUpdate))?;
        let quotes = self.engine.advance(tick, &liquid_top);
        Metrics::quotes(as_f64(self.engine.bid()), as_f64(self.engine.ask()));
        debug!(
            tick,
            bid = %self.engine.bid(),
            ask = %self.engine.ask(),
            bid_updated = quotes.bid_updated,
            ask_updated = quotes.ask_updated,
            "Quotes advanced"
        );

        // Order sync, ask first
        let mut syncs = Vec::new();
        if quotes.any() {
            let position = read_position(venue, &self.pair.illiquid)
                .await
                .map_err(TickFailure::at(TickPhase::OrderSync))?;
            for side in [Side::Ask, Side::Bid] {
                if !quotes.is_updated(side) {
                    continue;
                }
                let outcome = match self
                    .order_sync
                    .sync(
                        venue,
                        side,
                        self.engine.price(side),
                        self.config.quote_volume,
                        position,
                    )
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(
                            tick,
                            side = %side,
                            error = %e,
                            "Order sync failed, continuing to hedge"
                        );
                        Metrics::venue_error("order_sync");
                        Metrics::order_sync(side.as_str(), "failed");
                        SyncOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                syncs.push((side, outcome));
            }
        }

        // Hedge from a fresh position snapshot
        let position_liquid = read_position(venue, &self.pair.liquid)
            .await
            .map_err(TickFailure::at(TickPhase::Hedge))?;
        let position_illiquid = read_position(venue, &self.pair.illiquid)
            .await
            .map_err(TickFailure::at(TickPhase::Hedge))?;
        let hedge = self
            .hedger
            .hedge(venue, position_liquid, position_illiquid, &liquid_top)
            .await;

        let delay = self.config.settlement_delay();
        if !delay.is_zero() {
            debug!(tick, delay_ms = self.config.settlement_delay_ms, "Settlement delay");
            tokio::time::sleep(delay).await;
        }

        let outstanding = outstanding_sides(venue, &self.pair.illiquid)
            .await
            .map_err(TickFailure::at(TickPhase::FillCheck))?;

        let widened = self.engine.widen_unfilled(outstanding);
        if widened.any() {
            debug!(
                tick,
                bid = %self.engine.bid(),
                ask = %self.engine.ask(),
                bid_widened = widened.bid_updated,
                ask_widened = widened.ask_updated,
                "Spread widened"
            );
        }

        // Unwind against fresh books and positions
        let (liquid_book, _) = read_top(venue, &self.pair.liquid)
            .await
            .map_err(TickFailure::at(TickPhase::Unwind))?;
        let (_, illiquid_top) = read_top(venue, &self.pair.illiquid)
            .await
            .map_err(TickFailure::at(TickPhase::Unwind))?;
        let position_liquid = read_position(venue, &self.pair.liquid)
            .await
            .map_err(TickFailure::at(TickPhase::Unwind))?;
        let position_illiquid = read_position(venue, &self.pair.illiquid)
            .await
            .map_err(TickFailure::at(TickPhase::Unwind))?;
        let unwind = self
            .unwinder
            .run(
                venue,
                position_liquid,
                position_illiquid,
                &illiquid_top,
                &liquid_book,
            )
            .await
            .map_err(TickFailure::at(TickPhase::Unwind))?;

        Metrics::quotes(as_f64(self.engine.bid()), as_f64(self.engine.ask()));

        Ok(TickReport {
            tick,
            quotes,
            syncs,
            hedge,
            widened,
            unwind,
            bid: self.engine.bid(),
            ask: self.engine.ask(),
        })
    }

    /// Run ticks until `shutdown` fires or `max_steps` ticks have run.
    ///
    /// Resting orders are left in place on exit.
    pub async fn run(
        &mut self,
        shutdown: &CancellationToken,
        max_steps: Option<u64>,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(
            liquid = %self.pair.liquid,
            illiquid = %self.pair.illiquid,
            max_steps = ?max_steps,
            "Control loop started"
        );

        loop {
            if shutdown.is_cancelled() {
                info!(tick = self.tick, "Shutdown requested, stopping between ticks");
                break;
            }
            if max_steps.is_some_and(|max| summary.ticks >= max) {
                info!(ticks = summary.ticks, "Step limit reached");
                break;
            }

            let outcome = self.tick().await;
            summary.record(&outcome);

            let interval = self.config.tick_interval();
            if !interval.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(interval) => {}
                    () = shutdown.cancelled() => {}
                }
            }
        }

        info!(
            ticks = summary.ticks,
            completed = summary.completed,
            skipped = summary.skipped,
            hedges = summary.hedges,
            unwind_pairs = summary.unwind_pairs,
            "Control loop stopped"
        );
        summary
    }
}
