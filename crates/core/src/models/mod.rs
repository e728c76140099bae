pub mod capital;
pub mod indicator;
pub mod kpi;
pub mod log_file;
pub mod market;
pub mod orderbook;
pub mod settings;
pub mod signal;
