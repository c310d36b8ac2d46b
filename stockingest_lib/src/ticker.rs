//! Normalized exchange symbols.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::IngestError;

pub const MAX_TICKER_LENGTH: usize = 20;

/// An exchange symbol, trimmed and uppercased.
///
/// Allowed characters cover class shares (`BRK.B`, `BF-B`), index symbols
/// (`^GSPC`) and FX/futures style symbols (`EURUSD=X`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, IngestError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(IngestError::InvalidTicker("ticker is empty".to_string()));
        }
        if normalized.len() > MAX_TICKER_LENGTH {
            return Err(IngestError::InvalidTicker(format!(
                "{} exceeds {} characters",
                normalized, MAX_TICKER_LENGTH
            )));
        }
        if let Some(bad) = normalized
            .chars()
            .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || ".-^=".contains(*c)))
        {
            return Err(IngestError::InvalidTicker(format!(
                "{} contains invalid character {:?}",
                normalized, bad
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ticker::parse(s)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
