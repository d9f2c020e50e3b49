//! Core domain types for the dual-listing market maker.
//!
//! This crate provides the vocabulary shared by every other crate:
//! - `InstrumentId`, `InstrumentPair`: the liquid/illiquid instrument pair
//! - `Price`, `Volume`: precision-safe numeric types
//! - `OrderBook`, `PriceLevel`, `TopOfBook`: order book snapshots
//! - `Side`, `OrderKind`, `OrderId`: trading enums and identifiers
//! - `OrderRequest`, `OutstandingOrder`, `PositionCash`: venue payloads

pub mod book;
pub mod decimal;
pub mod error;
pub mod execution;
pub mod instrument;
pub mod order;

pub use book::{BookState, OrderBook, PriceLevel, TopOfBook};
pub use decimal::{Price, Volume};
pub use error::{CoreError, Result};
pub use execution::{OrderRequest, OutstandingOrder, PositionCash};
pub use instrument::{InstrumentId, InstrumentPair, Leg};
pub use order::{OrderId, OrderKind, Side};
