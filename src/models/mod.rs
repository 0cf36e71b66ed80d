mod constituent;
mod price_point;
mod ticker;

pub use constituent::ConstituentRecord;
pub use price_point::{FieldValue, PricePoint, UNAVAILABLE};
pub use ticker::{CompanyProfile, TickerSeries, TickerSnapshot};
