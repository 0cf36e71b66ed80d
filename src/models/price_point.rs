use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Placeholder written in place of any value the upstream could not supply.
pub const UNAVAILABLE: &str = "N/A";

/// A JSON field that is either a real value or the `"N/A"` sentinel.
///
/// Keeps the response shape constant: an unavailable value is still present
/// in the payload, never `null` and never omitted.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    Available(T),
    Unavailable,
}

impl FieldValue<f64> {
    /// NaN and infinities become unavailable.
    pub fn finite(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => FieldValue::Available(v),
            _ => FieldValue::Unavailable,
        }
    }
}

impl<T> From<Option<T>> for FieldValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Unavailable, FieldValue::Available)
    }
}

impl<T: Serialize> Serialize for FieldValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Available(v) => v.serialize(serializer),
            FieldValue::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

// One trading session of adjusted prices. `price` is the adjusted close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub price: f64,
    pub open: FieldValue<f64>,
    pub high: FieldValue<f64>,
    pub low: FieldValue<f64>,
    pub volume: FieldValue<u64>,
}

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_point_serializes_with_calendar_date_and_sentinels() {
        let point = PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            price: 170.12,
            open: FieldValue::Available(168.0),
            high: FieldValue::Unavailable,
            low: FieldValue::finite(Some(f64::NAN)),
            volume: FieldValue::Available(1_000),
        };

        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(
            value,
            json!({
                "date": "2024-03-05",
                "price": 170.12,
                "open": 168.0,
                "high": "N/A",
                "low": "N/A",
                "volume": 1000
            })
        );
    }

    #[test]
    fn test_finite_rejects_infinity() {
        assert_eq!(FieldValue::finite(Some(f64::INFINITY)), FieldValue::Unavailable);
        assert_eq!(FieldValue::finite(None), FieldValue::Unavailable);
        assert_eq!(FieldValue::finite(Some(1.5)), FieldValue::Available(1.5));
    }
}
