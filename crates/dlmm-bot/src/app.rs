//! Application wiring.
//!
//! Builds the venue from configuration and drives either the control loop
//! or the emergency flatten.

use std::sync::Arc;

use dlmm_core::InstrumentPair;
use dlmm_mm::{flatten_all, FlattenReport, MarketMaker, MmError, RunSummary};
use dlmm_telemetry::Metrics;
use dlmm_venue::DynVenue;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;

pub struct Application {
    config: AppConfig,
    pair: InstrumentPair,
    venue: DynVenue,
    shutdown: CancellationToken,
}

impl Application {
    /// Create an application backed by the configured paper venue.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let pair = config.instruments.pair()?;
        let venue: DynVenue = Arc::new(config.paper.build_venue(&pair)?);
        Ok(Self::with_venue(config, pair, venue))
    }

    pub fn with_venue(config: AppConfig, pair: InstrumentPair, venue: DynVenue) -> Self {
        Self {
            config,
            pair,
            venue,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the control loop between ticks.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the control loop until Ctrl-C or `max_steps` ticks.
    pub async fn run(&self, max_steps: Option<u64>) -> AppResult<RunSummary> {
        info!(
            liquid = %self.pair.liquid,
            illiquid = %self.pair.illiquid,
            "Starting market maker"
        );

        let token = self.shutdown.clone();
        let signal = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
                token.cancel();
            }
        });

        let result = self.run_loop(max_steps).await;
        signal.abort();
        result
    }

    async fn run_loop(&self, max_steps: Option<u64>) -> AppResult<RunSummary> {
        let mut maker = match MarketMaker::initialize(
            self.config.maker.clone(),
            self.pair.clone(),
            Arc::clone(&self.venue),
            &self.shutdown,
        )
        .await
        {
            Ok(maker) => maker,
            Err(MmError::Cancelled) => {
                info!("Shutdown before the first tick");
                return Ok(RunSummary::default());
            }
            Err(e) => return Err(e.into()),
        };

        let summary = maker.run(&self.shutdown, max_steps).await;
        maker.report_positions().await;

        match Metrics::render() {
            Ok(text) => debug!(metrics = %text, "Final metrics"),
            Err(e) => warn!(error = %e, "Failed to render metrics"),
        }
        Ok(summary)
    }

    /// Close every open position at dominating prices.
    pub async fn flatten(&self) -> AppResult<FlattenReport> {
        warn!("Emergency flatten requested");
        let report = flatten_all(
            self.venue.as_ref(),
            self.config.maker.flatten_sell_price,
            self.config.maker.flatten_buy_price,
        )
        .await?;

        if report.is_flat() {
            info!(orders = report.submitted.len(), "All positions flat");
        } else {
            warn!(orders = report.submitted.len(), "Positions remain after flatten");
        }
        Ok(report)
    }
}
