//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid instrument setup: {0}")]
    Core(#[from] dlmm_core::CoreError),

    #[error("Market maker error: {0}")]
    Maker(#[from] dlmm_mm::MmError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] dlmm_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
