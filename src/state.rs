use std::sync::Arc;
use crate::external::constituent_source::ConstituentSource;
use crate::external::market_data::MarketDataProvider;

#[derive(Clone)]
pub struct AppState {
    pub market_data: Arc<dyn MarketDataProvider>,
    pub constituent_source: Arc<dyn ConstituentSource>,
}
