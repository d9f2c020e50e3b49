//! Instrument identifiers and the traded pair.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Venue instrument identifier (e.g. `PHILIPS_A`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    /// Create an instrument id.
    ///
    /// Returns an error for empty or whitespace-only names.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::InvalidInstrument(
                "instrument name must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstrumentId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for InstrumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which leg of the pair an instrument plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    /// Deep book, used for hedging and unwinding ("A").
    Liquid,
    /// Thin book, quoted two-sided ("B").
    Illiquid,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Liquid => write!(f, "liquid"),
            Self::Illiquid => write!(f, "illiquid"),
        }
    }
}

/// The dual-listed pair: one liquid hedge leg, one illiquid quoted leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentPair {
    pub liquid: InstrumentId,
    pub illiquid: InstrumentId,
}

impl InstrumentPair {
    /// Create a pair. Both legs must be distinct instruments.
    pub fn new(liquid: InstrumentId, illiquid: InstrumentId) -> Result<Self, CoreError> {
        if liquid == illiquid {
            return Err(CoreError::InvalidInstrument(format!(
                "liquid and illiquid legs must differ, both are {liquid}"
            )));
        }
        Ok(Self { liquid, illiquid })
    }

    pub fn get(&self, leg: Leg) -> &InstrumentId {
        match leg {
            Leg::Liquid => &self.liquid,
            Leg::Illiquid => &self.illiquid,
        }
    }

    /// Both legs, liquid first.
    pub fn both(&self) -> [&InstrumentId; 2] {
        [&self.liquid, &self.illiquid]
    }
}
