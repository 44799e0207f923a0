pub mod matching_engine;
pub mod notifications;
pub mod orderbook;
