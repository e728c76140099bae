pub mod fetch_service;
pub mod indicator_service;
pub mod market_service;
pub mod metrics_service;
pub mod navigator_service;
pub mod normalize_service;
pub mod orderbook_service;
pub mod trades_service;
