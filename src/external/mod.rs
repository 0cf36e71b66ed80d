pub mod constituent_source;
pub mod market_data;
pub mod yahoofinance;

#[cfg(test)]
pub mod fakes;
