//! Dual-listing market maker application.
//!
//! Wires configuration, the venue and the control loop together.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
