//! Market making configuration.

use std::time::Duration;

use dlmm_core::Volume;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MmError, MmResult};

/// Market making configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerConfig {
    /// Quote step (δ). Periodic narrowing moves each side inward by this much.
    #[serde(default = "default_narrow_step")]
    pub narrow_step: Decimal,

    /// Minimum distance between an illiquid quote and the liquid market's
    /// same side. The illiquid spread is always at least the liquid spread
    /// plus twice this margin.
    #[serde(default = "default_pillow")]
    pub pillow: Decimal,

    /// Narrow both sides every this many ticks (N).
    #[serde(default = "default_narrow_period")]
    pub narrow_period: u64,

    /// Widening multiplier (k). A side with no outstanding order moves
    /// outward by `narrow_step * widen_multiplier`.
    #[serde(default = "default_widen_multiplier")]
    pub widen_multiplier: Decimal,

    /// Volume of each resting quote.
    #[serde(default = "default_quote_volume")]
    pub quote_volume: Volume,

    /// Maximum absolute illiquid position before the side that would grow
    /// it stops being re-quoted.
    #[serde(default = "default_max_position")]
    pub max_position: i64,

    /// Delay between order placement and the fill check (ms).
    #[serde(default = "default_settlement_delay_ms")]
    pub settlement_delay_ms: u64,

    /// Pause between ticks (ms). Zero runs ticks back to back.
    #[serde(default)]
    pub tick_interval_ms: u64,

    /// Initial quotes sit this far outside the first observed illiquid bid/ask.
    #[serde(default = "default_seed_offset")]
    pub seed_offset: Decimal,

    /// Log positions and cash every this many ticks.
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,

    /// Book polls before initial quote acquisition gives up.
    #[serde(default = "default_init_max_attempts")]
    pub init_max_attempts: u32,

    /// Base delay for exponential backoff between book polls (ms).
    #[serde(default = "default_init_base_delay_ms")]
    pub init_base_delay_ms: u64,

    /// Maximum delay between book polls (ms).
    #[serde(default = "default_init_max_delay_ms")]
    pub init_max_delay_ms: u64,

    /// Emergency flatten sells long positions at this price.
    #[serde(default = "default_flatten_sell_price")]
    pub flatten_sell_price: Decimal,

    /// Emergency flatten buys back short positions at this price.
    #[serde(default = "default_flatten_buy_price")]
    pub flatten_buy_price: Decimal,
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            narrow_step: default_narrow_step(),
            pillow: default_pillow(),
            narrow_period: default_narrow_period(),
            widen_multiplier: default_widen_multiplier(),
            quote_volume: default_quote_volume(),
            max_position: default_max_position(),
            settlement_delay_ms: default_settlement_delay_ms(),
            tick_interval_ms: 0,
            seed_offset: default_seed_offset(),
            report_interval: default_report_interval(),
            init_max_attempts: default_init_max_attempts(),
            init_base_delay_ms: default_init_base_delay_ms(),
            init_max_delay_ms: default_init_max_delay_ms(),
            flatten_sell_price: default_flatten_sell_price(),
            flatten_buy_price: default_flatten_buy_price(),
        }
    }
}

impl MakerConfig {
    /// Reject configurations the control loop cannot run with.
    pub fn validate(&self) -> MmResult<()> {
        if self.narrow_step <= Decimal::ZERO {
            return Err(MmError::InvalidConfig(format!(
                "narrow_step must be positive, got {}",
                self.narrow_step
            )));
        }
        if self.pillow < Decimal::ZERO {
            return Err(MmError::InvalidConfig(format!(
                "pillow must not be negative, got {}",
                self.pillow
            )));
        }
        if self.widen_multiplier < Decimal::ZERO {
            return Err(MmError::InvalidConfig(format!(
                "widen_multiplier must not be negative, got {}",
                self.widen_multiplier
            )));
        }
        if self.narrow_period == 0 {
            return Err(MmError::InvalidConfig(
                "narrow_period must be at least 1".to_string(),
            ));
        }
        if self.report_interval == 0 {
            return Err(MmError::InvalidConfig(
                "report_interval must be at least 1".to_string(),
            ));
        }
        if self.quote_volume.is_zero() {
            return Err(MmError::InvalidConfig(
                "quote_volume must be positive".to_string(),
            ));
        }
        if self.max_position < 0 {
            return Err(MmError::InvalidConfig(format!(
                "max_position must not be negative, got {}",
                self.max_position
            )));
        }
        if self.init_max_attempts == 0 {
            return Err(MmError::InvalidConfig(
                "init_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.flatten_sell_price >= self.flatten_buy_price {
            return Err(MmError::InvalidConfig(format!(
                "flatten_sell_price ({}) must be below flatten_buy_price ({})",
                self.flatten_sell_price, self.flatten_buy_price
            )));
        }
        Ok(())
    }

    /// Widening step: δ·k.
    pub fn widen_step(&self) -> Decimal {
        self.narrow_step * self.widen_multiplier
    }

    pub fn settlement_delay(&self) -> Duration {
        Duration::from_millis(self.settlement_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Exponential backoff for the initial book poll: base * 2^(attempt-1), capped.
    pub fn init_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(10);
        let delay = self.init_base_delay_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay.min(self.init_max_delay_ms))
    }
}

fn default_narrow_step() -> Decimal {
    Decimal::new(1, 1) // 0.1
}
fn default_pillow() -> Decimal {
    Decimal::new(1, 1) // 0.1
}
fn default_narrow_period() -> u64 {
    9
}
fn default_widen_multiplier() -> Decimal {
    Decimal::TWO
}
fn default_quote_volume() -> Volume {
    Volume::new(14)
}
fn default_max_position() -> i64 {
    200
}
fn default_settlement_delay_ms() -> u64 {
    100
}
fn default_seed_offset() -> Decimal {
    Decimal::new(8, 1) // 0.8
}
fn default_report_interval() -> u64 {
    50
}
fn default_init_max_attempts() -> u32 {
    50
}
fn default_init_base_delay_ms() -> u64 {
    100
}
fn default_init_max_delay_ms() -> u64 {
    5_000
}
fn default_flatten_sell_price() -> Decimal {
    Decimal::ONE
}
fn default_flatten_buy_price() -> Decimal {
    Decimal::new(100_000, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = MakerConfig::default();
        assert_eq!(config.narrow_step, dec!(0.1));
        assert_eq!(config.pillow, dec!(0.1));
        assert_eq!(config.narrow_period, 9);
        assert_eq!(config.widen_multiplier, dec!(2));
        assert_eq!(config.quote_volume, Volume::new(14));
        assert_eq!(config.max_position, 200);
        assert_eq!(config.settlement_delay_ms, 100);
        assert_eq!(config.seed_offset, dec!(0.8));
        assert_eq!(config.report_interval, 50);
        assert_eq!(config.widen_step(), dec!(0.2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serde_defaults() {
        let toml_str = r#"
pillow = "0.2"
quote_volume = 5
"#;
        let config: MakerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pillow, dec!(0.2));
        assert_eq!(config.quote_volume, Volume::new(5));
        assert_eq!(config.narrow_step, dec!(0.1));
        assert_eq!(config.narrow_period, 9);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            MakerConfig {
                narrow_step: Decimal::ZERO,
                ..Default::default()
            },
            MakerConfig {
                pillow: dec!(-0.1),
                ..Default::default()
            },
            MakerConfig {
                narrow_period: 0,
                ..Default::default()
            },
            MakerConfig {
                quote_volume: Volume::ZERO,
                ..Default::default()
            },
            MakerConfig {
                init_max_attempts: 0,
                ..Default::default()
            },
            MakerConfig {
                flatten_sell_price: dec!(100000),
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(MmError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_init_backoff_doubles_and_caps() {
        let config = MakerConfig {
            init_base_delay_ms: 100,
            init_max_delay_ms: 1_000,
            ..Default::default()
        };
        assert_eq!(config.init_backoff(1), Duration::from_millis(100));
        assert_eq!(config.init_backoff(2), Duration::from_millis(200));
        assert_eq!(config.init_backoff(4), Duration::from_millis(800));
        assert_eq!(config.init_backoff(5), Duration::from_millis(1_000));
        assert_eq!(config.init_backoff(40), Duration::from_millis(1_000));
    }
}
