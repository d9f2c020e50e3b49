//! Delta-neutral market making for a dual-listed instrument pair.
//!
//! Quotes a two-sided market on the illiquid listing and offsets every
//! fill on the liquid listing:
//! - Quote engine: narrow periodically, clamp against the liquid market,
//!   widen sides that stopped resting
//! - Order sync: one resting order per side, guarded by `max_position`
//! - Hedge: close the net position with an immediate liquid order
//! - Unwind: close offsetting inventory while the prices lock in margin
//! - Flatten: emergency exit at dominating prices
//!
//! # Architecture
//!
//! ```text
//! MarketMaker.tick()
//!   ├─ QuoteEngine.advance()        liquid top of book → bid/ask
//!   ├─ OrderSync.sync()             cancel + place resting (ask, bid)
//!   ├─ HedgeExecutor.hedge()        immediate order on the liquid leg
//!   ├─ settlement delay
//!   ├─ outstanding_sides()          fill check
//!   ├─ QuoteEngine.widen_unfilled()
//!   └─ UnwindEngine.run()           walk liquid depth
//!          ↓
//!       dyn Venue
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod flatten;
pub mod hedge;
pub mod order_sync;
pub mod quote_engine;
pub mod unwind;

pub use config::MakerConfig;
pub use control::{acquire_seed, MarketMaker, RunSummary, TickOutcome, TickPhase, TickReport};
pub use error::{MmError, MmResult};
pub use flatten::{flatten_all, plan_flatten, FlattenReport};
pub use hedge::{plan_hedge, HedgeExecutor, HedgeReport};
pub use order_sync::{
    cancel_side, outstanding_sides, position_allows, OrderSync, OutstandingSides, SyncOutcome,
};
pub use quote_engine::{QuoteEngine, QuoteUpdate};
pub use unwind::{UnwindDirection, UnwindEngine, UnwindPair, UnwindReport, UnwindStop};
