//! Venue error types.

use dlmm_core::{InstrumentId, OrderId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(InstrumentId),

    #[error("Unknown order {order_id} on {instrument}")]
    UnknownOrder {
        instrument: InstrumentId,
        order_id: OrderId,
    },

    #[error("Venue unavailable: {0}")]
    Unavailable(String),
}

pub type VenueResult<T> = Result<T, VenueError>;
