//! Request payloads accepted by the relay and forwarded to the API server

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolsQuery {
    pub exchange: String,
}

impl SymbolsQuery {
    pub fn new(exchange: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
        }
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        require_non_empty("exchange", &self.exchange)
    }
}

/// Chart request. Range bounds that were not supplied are left out of the
/// forwarded body entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartQuery {
    pub symbol: String,
    pub interval: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_to: Option<String>,
}

impl ChartQuery {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            range_from: None,
            range_to: None,
        }
    }

    pub fn with_range(mut self, range_from: Option<String>, range_to: Option<String>) -> Self {
        self.range_from = range_from;
        self.range_to = range_to;
        self
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        require_non_empty("symbol", &self.symbol)?;
        require_non_empty("interval", &self.interval)
    }

    /// Empty range bounds count as absent.
    pub fn normalized(self) -> Self {
        Self {
            range_from: self.range_from.filter(|v| !v.is_empty()),
            range_to: self.range_to.filter(|v| !v.is_empty()),
            ..self
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), RelayError> {
    if value.trim().is_empty() {
        Err(RelayError::InvalidRequest(format!(
            "field '{}' must be a non-empty string",
            field
        )))
    } else {
        Ok(())
    }
}
