//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements one side of a limit order book for a single instrument.
// Orders are kept in price-time priority: price levels ordered best-first, FIFO within a
// level.
//
// | Component     | Description                                                               |
// |---------------|---------------------------------------------------------------------------|
// | OrderBook     | One side (bids or asks) of the book                                       |
// | PriceLevel    | Groups resting orders at the same price                                   |
// | FIFO Queue    | Orders within each price level are matched first-in-first-out            |
//
//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                        | Key Methods             |
// |---------------|----------------------------------------------------|-------------------------|
// | PriceLevel    | Maintains orders at a specific price               | peek_next_order         |
// |               |                                                    | is_empty                |
// |               |                                                    | order_count             |
// |---------------|----------------------------------------------------|-------------------------|
// | OrderBook     | One side of the book                               | insert                  |
// |               |                                                    | best_price              |
// |               |                                                    | peek_earliest_at        |
// |               |                                                    | remove_earliest_at      |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                  | Description                               | Return Type             |
// |-----------------------|-------------------------------------------|-------------------------|
// | new                   | Creates an empty book for a side          | OrderBook               |
// | insert                | Appends order to the tail of its level    | ()                      |
// | best_price            | Lowest ask / highest bid                  | Option<Price>           |
// | peek_earliest_at      | Head of a level's FIFO                    | Option<&Order>          |
// | remove_earliest_at    | Pops the head of a level's FIFO           | Option<Order>           |
// | volume_at_price       | Total open quantity at a level            | Option<Quantity>        |
// | depth                 | Aggregated best-first levels              | Vec<DepthLevel>         |
//
//--------------------------------------------------------------------------------------------------
// TESTS
//--------------------------------------------------------------------------------------------------
// | Name                          | Description                                              |
// |-------------------------------|----------------------------------------------------------|
// | test_empty_orderbook          | Verifies initial empty state                             |
// | test_best_bid_is_highest      | Buy book exposes the highest price                       |
// | test_best_ask_is_lowest       | Sell book exposes the lowest price                       |
// | test_fifo_within_level        | Earliest arrival is at the head of its level             |
// | test_remove_drops_empty_level | Popping the last order removes the level                 |
// | test_fill_earliest_at         | Partial and full fills of the head order                 |
// | test_depth                    | Depth levels are aggregated best-first                   |
//--------------------------------------------------------------------------------------------------

use std::collections::{BTreeMap, VecDeque};

use crate::domain::models::types::{Order, Price, Quantity, Side};
use crate::domain::services::orderbook::depth::DepthLevel;

/// Represents a price level in the order book, maintaining a FIFO queue of orders
/// at the same price point.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    orders: VecDeque<Order>,
    total_volume: Quantity,
}

impl PriceLevel {
    /// Creates a new, empty price level.
    ///
    /// # Arguments
    /// * `price` - The price for this level
    /// * `initial_capacity` - Optional capacity for the order queue
    pub fn new(price: Price, initial_capacity: Option<usize>) -> Self {
        let capacity = initial_capacity.unwrap_or(4);
        Self {
            price,
            orders: VecDeque::with_capacity(capacity),
            total_volume: 0,
        }
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    /// Returns the next order to be matched without removing it from the queue.
    #[inline]
    pub fn peek_next_order(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Orders at this level, earliest arrival first.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Total remaining quantity of all orders at this level.
    pub fn total_volume(&self) -> Quantity {
        self.total_volume
    }

    #[inline]
    fn push_back(&mut self, order: Order) {
        self.total_volume = self.total_volume.saturating_add(order.remaining());
        self.orders.push_back(order);
    }

    #[inline]
    fn pop_front(&mut self) -> Option<Order> {
        let order = self.orders.pop_front()?;
        self.total_volume = self.total_volume.saturating_sub(order.remaining());
        Some(order)
    }
}

/// One side of a limit order book.
///
/// Levels live in a `BTreeMap` keyed by price. A buy book's best level is its highest
/// key, a sell book's best level its lowest key; the best price is cached so the
/// matching loop reads it in O(1).
#[derive(Debug)]
pub struct OrderBook {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
    best_price: Option<Price>,
    order_count: usize,
}

impl OrderBook {
    /// Creates an empty book holding orders of `side`.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            best_price: None,
            order_count: 0,
        }
    }

    /// The side of the orders this book holds.
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Number of resting orders across all levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.order_count
    }

    /// Number of distinct price levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Returns the best price: the highest bid for a buy book, the lowest ask for a
    /// sell book, or `None` when the book is empty.
    #[inline(always)]
    pub fn best_price(&self) -> Option<Price> {
        self.best_price
    }

    /// Appends an order to the tail of its price level, creating the level if absent.
    ///
    /// The order must belong to this book's side and have a positive remaining amount.
    #[inline]
    pub fn insert(&mut self, order: Order) {
        debug_assert_eq!(order.side(), self.side);
        debug_assert!(order.remaining() > 0);

        let price = order.price();
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price, Some(4)))
            .push_back(order);
        self.order_count += 1;

        if self.best_price.map_or(true, |best| !self.side.is_better_or_equal(best, price)) {
            self.best_price = Some(price);
        }
    }

    /// Returns the earliest resting order at `price` without removing it.
    #[inline(always)]
    pub fn peek_earliest_at(&self, price: Price) -> Option<&Order> {
        self.levels.get(&price).and_then(PriceLevel::peek_next_order)
    }

    /// Pops the earliest resting order at `price`, dropping the level if it empties.
    ///
    /// Returns `None` if there is no level at `price`.
    #[inline]
    pub fn remove_earliest_at(&mut self, price: Price) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let order = level.pop_front()?;
        self.order_count -= 1;

        if level.is_empty() {
            self.drop_level(price);
        }

        Some(order)
    }

    /// Fills `quantity` of the earliest order at `price`.
    ///
    /// A head order that reaches zero is removed right away (and its level with it if the
    /// level empties), so an exhausted order is never observable in the book. Returns
    /// true when the head order was removed.
    #[inline(always)]
    pub(crate) fn fill_earliest_at(&mut self, price: Price, quantity: Quantity) -> bool {
        let Some(level) = self.levels.get_mut(&price) else {
            return false;
        };
        let Some(head) = level.orders.front_mut() else {
            return false;
        };

        head.fill(quantity);
        level.total_volume = level.total_volume.saturating_sub(quantity);

        if !head.is_filled() {
            return false;
        }

        level.orders.pop_front();
        self.order_count -= 1;
        if level.is_empty() {
            self.drop_level(price);
        }
        true
    }

    /// Total remaining quantity at `price`, or `None` if no level exists there.
    pub fn volume_at_price(&self, price: Price) -> Option<Quantity> {
        self.levels.get(&price).map(PriceLevel::total_volume)
    }

    /// Number of resting orders at `price`.
    pub fn order_count_at_price(&self, price: Price) -> usize {
        self.levels.get(&price).map_or(0, PriceLevel::order_count)
    }

    /// Gets a reference to the price level at `price`.
    pub fn get_price_level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Price levels in priority order, best first.
    pub fn levels(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        }
    }

    /// Resting orders in matching priority: best price first, then arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.levels().flat_map(|level| level.orders())
    }

    /// Total remaining quantity resting in this book.
    pub fn total_volume(&self) -> Quantity {
        self.levels.values().map(PriceLevel::total_volume).sum()
    }

    /// Aggregated view of up to `limit` levels, best first.
    pub fn depth(&self, limit: usize) -> Vec<DepthLevel> {
        self.levels()
            .take(limit)
            .map(|level| DepthLevel::new(level.price, level.total_volume, level.order_count()))
            .collect()
    }

    #[inline]
    fn drop_level(&mut self, price: Price) {
        self.levels.remove(&price);
        if self.best_price == Some(price) {
            self.best_price = match self.side {
                Side::Buy => self.levels.keys().next_back().copied(),
                Side::Sell => self.levels.keys().next().copied(),
            };
        }
    }
}
