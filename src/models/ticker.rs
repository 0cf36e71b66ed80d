use serde::Serialize;

use super::price_point::{FieldValue, PricePoint, UNAVAILABLE};

/// Descriptive metadata for a ticker as reported by the market-data provider.
///
/// Every field is optional because providers fill them inconsistently; the
/// `resolve_*` methods own the fallback order so callers never pick keys
/// themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyProfile {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub sector: Option<String>,
}

impl CompanyProfile {
    /// Short name, then long name, then the ticker itself. Blank strings count as missing.
    pub fn resolve_company_name(&self, ticker: &str) -> String {
        non_blank(&self.short_name)
            .or_else(|| non_blank(&self.long_name))
            .unwrap_or(ticker)
            .to_string()
    }

    pub fn resolve_sector(&self) -> FieldValue<String> {
        non_blank(&self.sector).map(str::to_string).into()
    }

    /// Keeps each non-blank field of `self`, taking the rest from `fallback`.
    pub fn or_fill(self, fallback: CompanyProfile) -> CompanyProfile {
        fn pick(primary: Option<String>, fallback: Option<String>) -> Option<String> {
            if non_blank(&primary).is_some() {
                primary
            } else {
                fallback
            }
        }

        CompanyProfile {
            short_name: pick(self.short_name, fallback.short_name),
            long_name: pick(self.long_name, fallback.long_name),
            sector: pick(self.sector, fallback.sector),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerSeries {
    pub company_name: String,
    #[serde(rename = "data")]
    pub points: Vec<PricePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSnapshot {
    pub company_name: String,
    pub current_price: FieldValue<f64>,
    pub sector: FieldValue<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TickerSnapshot {
    /// All fields unavailable, carrying the reason for the failure.
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            company_name: UNAVAILABLE.to_string(),
            current_price: FieldValue::Unavailable,
            sector: FieldValue::Unavailable,
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
