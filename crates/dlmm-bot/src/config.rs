//! Application configuration.

use std::path::Path;

use dlmm_core::{InstrumentId, InstrumentPair, OrderBook, Price, PriceLevel, Volume};
use dlmm_mm::MakerConfig;
use dlmm_venue::PaperVenue;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub instruments: InstrumentsConfig,

    #[serde(default)]
    pub maker: MakerConfig,

    /// Initial state of the in-memory venue.
    #[serde(default)]
    pub paper: PaperConfig,
}

/// The traded pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentsConfig {
    /// Liquid listing, used for hedging.
    #[serde(default = "default_liquid")]
    pub liquid: String,

    /// Illiquid listing, quoted on both sides.
    #[serde(default = "default_illiquid")]
    pub illiquid: String,
}

impl Default for InstrumentsConfig {
    fn default() -> Self {
        Self {
            liquid: default_liquid(),
            illiquid: default_illiquid(),
        }
    }
}

impl InstrumentsConfig {
    pub fn pair(&self) -> AppResult<InstrumentPair> {
        let liquid = InstrumentId::new(self.liquid.as_str())?;
        let illiquid = InstrumentId::new(self.illiquid.as_str())?;
        Ok(InstrumentPair::new(liquid, illiquid)?)
    }
}

fn default_liquid() -> String {
    "PHILIPS_A".to_string()
}

fn default_illiquid() -> String {
    "PHILIPS_B".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperConfig {
    #[serde(default)]
    pub books: Vec<PaperBookConfig>,

    #[serde(default)]
    pub positions: Vec<PaperPositionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperBookConfig {
    pub instrument: String,
    #[serde(default)]
    pub bids: Vec<LevelConfig>,
    #[serde(default)]
    pub asks: Vec<LevelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub price: Decimal,
    pub volume: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperPositionConfig {
    pub instrument: String,
    pub position: i64,
}

impl PaperConfig {
    /// Build a paper venue trading `pair` from the configured books and positions.
    pub fn build_venue(&self, pair: &InstrumentPair) -> AppResult<PaperVenue> {
        let venue = PaperVenue::new([pair.liquid.clone(), pair.illiquid.clone()]);

        for entry in &self.books {
            let instrument = InstrumentId::new(entry.instrument.as_str())?;
            let levels = |levels: &[LevelConfig]| -> Vec<PriceLevel> {
                levels
                    .iter()
                    .map(|l| PriceLevel::new(Price::new(l.price), Volume::new(l.volume)))
                    .collect()
            };
            venue.set_book(
                &instrument,
                OrderBook::new(levels(&entry.bids), levels(&entry.asks)),
            );
        }

        for entry in &self.positions {
            let instrument = InstrumentId::new(entry.instrument.as_str())?;
            venue.set_position(&instrument, entry.position);
        }

        Ok(venue)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, then `DLMM_CONFIG`, then the default path.
    ///
    /// Falls back to built-in defaults when no file exists at the
    /// default path. An explicitly named file must exist.
    pub fn load(path: Option<String>) -> AppResult<Self> {
        if let Some(path) = path.or_else(|| std::env::var("DLMM_CONFIG").ok()) {
            return Self::from_file(path);
        }

        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            tracing::warn!(path = DEFAULT_CONFIG_PATH, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        self.instruments.pair()?;
        self.maker.validate()?;
        Ok(())
    }
}
