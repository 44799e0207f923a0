// Expose the modules
pub mod config;
pub mod domain;
pub mod perf;
pub mod workload;

// Re-export key types for easier usage
pub use domain::models::types::{
    InstrumentId, Order, OrderError, OrderId, OrderStatus, Price, Quantity, Side, TradeNotification,
    TraderId, trade_price,
};
pub use domain::services::matching_engine::{
    EngineStats, MatchingEngine, MatchingError, MatchingResult,
};
pub use domain::services::notifications::{
    ChannelError, NotificationReader, NotificationWriter, notification_channel,
};
pub use domain::services::orderbook::{DepthLevel, OrderBook, PriceLevel};
