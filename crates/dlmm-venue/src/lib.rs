//! Trading venue interface.
//!
//! The market maker never talks to an exchange directly. Everything it
//! needs from a live market goes through the [`Venue`] trait:
//! - Order book snapshots per instrument
//! - Position and cash queries
//! - Resting / immediate order placement and cancellation
//! - Outstanding order listing
//!
//! [`PaperVenue`] is an in-memory implementation that matches immediate
//! orders against its own book levels. It backs the test suite and the
//! binary's dry-run mode.

pub mod error;
pub mod paper;
pub mod venue;

pub use error::{VenueError, VenueResult};
pub use paper::{PaperVenue, VenueCall, CALL_LOG_CAPACITY};
pub use venue::{BoxFuture, DynVenue, Venue};
