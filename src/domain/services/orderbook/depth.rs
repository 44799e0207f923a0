use serde::{Deserialize, Serialize};

use crate::domain::models::types::{Price, Quantity};

/// Aggregated volume at a single price level of one side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// The price for this level
    pub price: Price,
    /// Total remaining quantity at this price level
    pub volume: Quantity,
    /// Number of resting orders at this price level
    pub order_count: usize,
}

impl DepthLevel {
    #[inline]
    pub fn new(price: Price, volume: Quantity, order_count: usize) -> Self {
        Self {
            price,
            volume,
            order_count,
        }
    }
}
