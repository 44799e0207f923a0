pub mod depth;
pub mod orderbook;

pub use self::depth::DepthLevel;
pub use self::orderbook::{OrderBook, PriceLevel};
