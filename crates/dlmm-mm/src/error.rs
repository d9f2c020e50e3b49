//! Market maker error types.

use dlmm_core::{BookState, InstrumentId};
use dlmm_venue::VenueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MmError {
    /// A book side needed for a decision is empty. The tick is abandoned.
    #[error("No market data for {instrument}: book is {state}")]
    NoData {
        instrument: InstrumentId,
        state: BookState,
    },

    #[error("Initial quote acquisition timed out after {attempts} attempts")]
    InitTimeout { attempts: u32 },

    #[error("Shutdown requested")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Venue error: {0}")]
    Venue(#[from] VenueError),
}

pub type MmResult<T> = Result<T, MmError>;
