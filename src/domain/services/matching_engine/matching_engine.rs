//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the core matching logic for a single instrument. Incoming orders
// are matched against the opposite book in price-time priority, every fill is priced at
// the midpoint of the two limits and produces one notification per side.
//
// | Component                | Description                                                |
// |--------------------------|------------------------------------------------------------|
// | MatchingEngine           | Owns the buy book, the sell book and the notification writer|
// | EngineStats              | Running counters for submissions, fills and volume         |
// | match_order              | The matching loop, shared by both sides                    |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Return Type      |
// |-------------------------|---------------------------------------------------|------------------|
// | new                     | Creates an engine for one instrument              | MatchingEngine   |
// | submit_buy              | Matches a buy order, rests any remainder          | Result<Status>   |
// | submit_sell             | Matches a sell order, rests any remainder         | Result<Status>   |
// | submit                  | Routes an order by its own side                   | Result<Status>   |
//--------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::domain::models::types::{
    InstrumentId, Order, OrderStatus, Price, Quantity, Side, TradeNotification, trade_price,
};
use crate::domain::services::matching_engine::{MatchingError, MatchingResult};
use crate::domain::services::notifications::NotificationWriter;
use crate::domain::services::orderbook::OrderBook;

/// Running counters kept by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Orders accepted by `submit_buy` / `submit_sell`.
    pub orders_submitted: u64,
    /// Accepted orders that left a remainder in their book.
    pub orders_rested: u64,
    /// Individual fills between an incoming and a resting order.
    pub matches: u64,
    /// Quantity traded across all fills.
    pub volume: Quantity,
    /// Notifications written, two per fill.
    pub notifications: u64,
}

/// The matching engine for one instrument.
///
/// # Price-Time Priority
///
/// * Better prices are matched first (higher bids, lower asks)
/// * At the same price level, orders are matched in arrival order (FIFO)
///
/// # Trade Pricing
///
/// Each fill trades at `floor((buy limit + sell limit) / 2)`, giving both sides price
/// improvement relative to their limits. The buy leg notification carries the negated
/// price and is always written before the sell leg, which carries the positive price.
///
/// # Concurrency
///
/// Submissions take `&mut self`: one logical writer per instrument. The notification
/// writer is the only handle shared with another thread.
#[derive(Debug)]
pub struct MatchingEngine {
    instrument_id: InstrumentId,
    buys: OrderBook,
    sells: OrderBook,
    notifications: NotificationWriter,
    stats: EngineStats,
}

impl MatchingEngine {
    /// Creates a new matching engine for a specific instrument.
    ///
    /// # Arguments
    ///
    /// * `instrument_id` - The instrument this engine matches; orders for any other
    ///   instrument are rejected
    /// * `notifications` - Producer end of the channel fills are written to
    ///
    /// # Examples
    ///
    /// ```
    /// use stock_matcher::{MatchingEngine, Order, notification_channel};
    /// use uuid::Uuid;
    ///
    /// let instrument_id = Uuid::new_v4();
    /// let (writer, mut reader) = notification_channel(16).unwrap();
    /// let mut engine = MatchingEngine::new(instrument_id, writer);
    ///
    /// engine.submit_buy(Order::buy(7, 1, 1, 1, instrument_id).unwrap()).unwrap();
    /// engine.submit_sell(Order::sell(7, 1, 2, 2, instrument_id).unwrap()).unwrap();
    ///
    /// assert_eq!(reader.read().price, -7);
    /// assert_eq!(reader.read().price, 7);
    /// ```
    pub fn new(instrument_id: InstrumentId, notifications: NotificationWriter) -> Self {
        info!(
            "Created matching engine for instrument {} (notification capacity: {})",
            instrument_id,
            notifications.capacity()
        );
        Self {
            instrument_id,
            buys: OrderBook::new(Side::Buy),
            sells: OrderBook::new(Side::Sell),
            notifications,
            stats: EngineStats::default(),
        }
    }

    /// Matches a buy order against the sell book; any remainder rests in the buy book.
    ///
    /// # Errors
    ///
    /// Rejects, without touching either book, an order for another instrument
    /// (`WrongInstrument`), a sell order (`WrongSide`), an order with nothing left to
    /// match (`ZeroAmount`) or one that breaks the `Order` invariants (`InvalidOrder`).
    #[inline]
    pub fn submit_buy(&mut self, order: Order) -> MatchingResult<OrderStatus> {
        self.process_order(Side::Buy, order)
    }

    /// Matches a sell order against the buy book; any remainder rests in the sell book.
    ///
    /// # Errors
    ///
    /// Same rejections as [`MatchingEngine::submit_buy`], with the sides swapped.
    #[inline]
    pub fn submit_sell(&mut self, order: Order) -> MatchingResult<OrderStatus> {
        self.process_order(Side::Sell, order)
    }

    /// Routes an order to `submit_buy` or `submit_sell` according to its own side.
    pub fn submit(&mut self, order: Order) -> MatchingResult<OrderStatus> {
        let side = order.side();
        self.process_order(side, order)
    }

    #[inline(always)]
    fn process_order(&mut self, side: Side, mut order: Order) -> MatchingResult<OrderStatus> {
        self.validate(side, &order)?;
        self.stats.orders_submitted += 1;

        let (own, opposite) = match side {
            Side::Buy => (&mut self.buys, &mut self.sells),
            Side::Sell => (&mut self.sells, &mut self.buys),
        };

        match_order(&mut order, opposite, &mut self.notifications, &mut self.stats);

        if order.is_filled() {
            return Ok(OrderStatus::Filled);
        }

        let status = if order.filled() > 0 {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Resting
        };
        debug!(
            "Resting {} order {} at {} (remaining {})",
            side,
            order.order_id(),
            order.price(),
            order.remaining()
        );
        own.insert(order);
        self.stats.orders_rested += 1;
        Ok(status)
    }

    #[inline(always)]
    fn validate(&self, side: Side, order: &Order) -> MatchingResult<()> {
        if order.instrument_id() != self.instrument_id {
            return Err(MatchingError::WrongInstrument {
                expected: self.instrument_id,
                got: order.instrument_id(),
            });
        }
        if order.side() != side {
            return Err(MatchingError::WrongSide {
                expected: side,
                got: order.side(),
            });
        }
        if order.remaining() == 0 {
            return Err(MatchingError::ZeroAmount(order.order_id()));
        }
        order.validate()?;
        Ok(())
    }

    pub fn instrument_id(&self) -> InstrumentId {
        self.instrument_id
    }

    /// Resting buy orders.
    pub fn buy_book(&self) -> &OrderBook {
        &self.buys
    }

    /// Resting sell orders.
    pub fn sell_book(&self) -> &OrderBook {
        &self.sells
    }

    /// Returns the book holding orders of `side`.
    pub fn book(&self, side: Side) -> &OrderBook {
        match side {
            Side::Buy => &self.buys,
            Side::Sell => &self.sells,
        }
    }

    /// Highest resting buy price.
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.buys.best_price()
    }

    /// Lowest resting sell price.
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.sells.best_price()
    }

    /// Returns the spread between the best ask and the best bid, saturating at
    /// `Price::MAX` when the difference does not fit.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}

/// Matches `incoming` against `opposite` until it is exhausted or the best opposite price
/// no longer crosses its limit.
///
/// Works for both sides: the incoming order's side decides which price crosses and which
/// order gets the buy leg.
#[inline(always)]
fn match_order(
    incoming: &mut Order,
    opposite: &mut OrderBook,
    notifications: &mut NotificationWriter,
    stats: &mut EngineStats,
) {
    let side = incoming.side();

    while !incoming.is_filled() {
        let Some(best) = opposite.best_price() else {
            break;
        };
        if !side.is_better_or_equal(incoming.price(), best) {
            break;
        }
        let Some(resting) = opposite.peek_earliest_at(best) else {
            break;
        };

        let quantity = incoming.remaining().min(resting.remaining());
        let (buy, sell) = match side {
            Side::Buy => (&*incoming, resting),
            Side::Sell => (resting, &*incoming),
        };
        let price = trade_price(buy.price(), sell.price());

        notifications.write(TradeNotification::buy_leg(price, quantity, buy, sell));
        notifications.write(TradeNotification::sell_leg(price, quantity, buy, sell));
        trace!(
            "Matched buy {} with sell {}: {} @ {}",
            buy.order_id(),
            sell.order_id(),
            quantity,
            price
        );

        incoming.fill(quantity);
        opposite.fill_earliest_at(best, quantity);

        stats.matches += 1;
        stats.volume += quantity;
        stats.notifications += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::notifications::{NotificationReader, notification_channel};
    use uuid::Uuid;

    fn setup_engine() -> (MatchingEngine, NotificationReader, Uuid) {
        let instrument_id = Uuid::new_v4();
        let (writer, reader) = notification_channel(64).unwrap();
        (MatchingEngine::new(instrument_id, writer), reader, instrument_id)
    }

    fn notification(price: Price, amount: Quantity, order_id: u64, counterparty: u64) -> TradeNotification {
        TradeNotification {
            price,
            amount,
            order_id,
            counterparty_trader_id: counterparty,
        }
    }

    #[test]
    fn test_exact_match() {
        let (mut engine, mut reader, instrument_id) = setup_engine();

        let status = engine.submit_buy(Order::buy(7, 1, 1, 1, instrument_id).unwrap()).unwrap();
        assert_eq!(status, OrderStatus::Resting);
        let status = engine.submit_sell(Order::sell(7, 1, 2, 2, instrument_id).unwrap()).unwrap();
        assert_eq!(status, OrderStatus::Filled);

        assert_eq!(reader.try_read(), Some(notification(-7, 1, 1, 2)));
        assert_eq!(reader.try_read(), Some(notification(7, 1, 2, 1)));
        assert_eq!(reader.try_read(), None);
        assert!(engine.buy_book().is_empty());
        assert!(engine.sell_book().is_empty());
    }

    #[test]
    fn test_cascading_partial_fills() {
        let (mut engine, mut reader, instrument_id) = setup_engine();

        engine.submit_buy(Order::buy(7, 2, 1, 1, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(7, 1, 2, 2, instrument_id).unwrap()).unwrap();

        assert_eq!(reader.read(), notification(-7, 1, 1, 2));
        assert_eq!(reader.read(), notification(7, 1, 2, 1));
        assert_eq!(engine.buy_book().peek_earliest_at(7).unwrap().remaining(), 1);

        engine.submit_sell(Order::sell(7, 1, 3, 3, instrument_id).unwrap()).unwrap();

        assert_eq!(reader.read(), notification(-7, 1, 1, 3));
        assert_eq!(reader.read(), notification(7, 1, 3, 1));
        assert!(engine.buy_book().is_empty());
        assert!(engine.sell_book().is_empty());
    }

    #[test]
    fn test_no_cross() {
        let (mut engine, mut reader, instrument_id) = setup_engine();

        engine.submit_buy(Order::buy(5, 1, 1, 1, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(10, 1, 2, 2, instrument_id).unwrap()).unwrap();

        assert_eq!(reader.try_read(), None);
        assert_eq!(engine.best_bid(), Some(5));
        assert_eq!(engine.best_ask(), Some(10));
        assert_eq!(engine.spread(), Some(5));
    }

    #[test]
    fn test_aggressive_buy_sweeps_levels_and_rests_remainder() {
        let (mut engine, mut reader, instrument_id) = setup_engine();

        engine.submit_sell(Order::sell(10, 1, 1, 1, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(11, 2, 2, 2, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(20, 5, 3, 3, instrument_id).unwrap()).unwrap();

        let status = engine.submit_buy(Order::buy(12, 5, 9, 9, instrument_id).unwrap()).unwrap();
        assert_eq!(status, OrderStatus::PartiallyFilled);

        // (12 + 10) / 2 = 11, then (12 + 11) / 2 = 11
        assert_eq!(reader.read(), notification(-11, 1, 9, 1));
        assert_eq!(reader.read(), notification(11, 1, 1, 9));
        assert_eq!(reader.read(), notification(-11, 2, 9, 2));
        assert_eq!(reader.read(), notification(11, 2, 2, 9));
        assert_eq!(reader.try_read(), None);

        assert_eq!(engine.best_bid(), Some(12));
        assert_eq!(engine.buy_book().volume_at_price(12), Some(2));
        assert_eq!(engine.best_ask(), Some(20));
    }

    #[test]
    fn test_aggressive_sell_emits_buy_leg_first() {
        let (mut engine, mut reader, instrument_id) = setup_engine();

        engine.submit_buy(Order::buy(9, 1, 1, 1, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(6, 1, 2, 2, instrument_id).unwrap()).unwrap();

        let first = reader.read();
        let second = reader.read();
        assert!(first.is_buy_leg());
        assert_eq!(first, notification(-7, 1, 1, 2));
        assert_eq!(second, notification(7, 1, 2, 1));
    }

    #[test]
    fn test_time_priority_at_equal_price() {
        let (mut engine, mut reader, instrument_id) = setup_engine();

        engine.submit_sell(Order::sell(10, 1, 1, 1, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(10, 1, 2, 2, instrument_id).unwrap()).unwrap();
        engine.submit_buy(Order::buy(10, 1, 3, 3, instrument_id).unwrap()).unwrap();

        assert_eq!(reader.read(), notification(-10, 1, 3, 1));
        assert_eq!(reader.read(), notification(10, 1, 1, 3));
        assert_eq!(engine.sell_book().peek_earliest_at(10).unwrap().order_id(), 2);
    }

    #[test]
    fn test_better_price_beats_earlier_arrival() {
        let (mut engine, mut reader, instrument_id) = setup_engine();

        engine.submit_buy(Order::buy(10, 1, 1, 1, instrument_id).unwrap()).unwrap();
        engine.submit_buy(Order::buy(11, 1, 2, 2, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(9, 1, 3, 3, instrument_id).unwrap()).unwrap();

        assert_eq!(reader.read(), notification(-10, 1, 2, 3));
        assert_eq!(engine.best_bid(), Some(10));
    }

    #[test]
    fn test_wrong_instrument_is_rejected_without_mutation() {
        let (mut engine, mut reader, instrument_id) = setup_engine();
        engine.submit_sell(Order::sell(10, 1, 1, 1, instrument_id).unwrap()).unwrap();

        let other = Uuid::new_v4();
        let err = engine.submit_buy(Order::buy(10, 1, 2, 2, other).unwrap()).unwrap_err();
        assert_eq!(err, MatchingError::WrongInstrument { expected: instrument_id, got: other });

        assert_eq!(reader.try_read(), None);
        assert_eq!(engine.sell_book().len(), 1);
        assert!(engine.buy_book().is_empty());
        assert_eq!(engine.stats().orders_submitted, 1);
    }

    #[test]
    fn test_wrong_side_is_rejected() {
        let (mut engine, _reader, instrument_id) = setup_engine();

        let err = engine.submit_buy(Order::sell(10, 1, 1, 1, instrument_id).unwrap()).unwrap_err();
        assert_eq!(err, MatchingError::WrongSide { expected: Side::Buy, got: Side::Sell });
        assert!(engine.sell_book().is_empty());
    }

    #[test]
    fn test_order_with_nothing_open_is_rejected() {
        let (mut engine, mut reader, instrument_id) = setup_engine();
        engine.submit_sell(Order::sell(10, 1, 1, 1, instrument_id).unwrap()).unwrap();

        let json = format!(
            r#"{{"side":"BUY","trader_id":2,"order_id":2,"instrument_id":"{instrument_id}","price":10,"amount":3,"remaining":0}}"#
        );
        let exhausted: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(engine.submit_buy(exhausted), Err(MatchingError::ZeroAmount(2)));
        assert_eq!(engine.sell_book().len(), 1);
        assert!(engine.buy_book().is_empty());
        assert_eq!(reader.try_read(), None);
        assert_eq!(engine.stats().orders_submitted, 1);
    }

    #[test]
    fn test_extreme_prices_match_without_overflow() {
        let (mut engine, mut reader, instrument_id) = setup_engine();

        engine.submit_buy(Order::buy(Price::MIN + 1, 1, 1, 1, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(Price::MIN + 1, 1, 2, 2, instrument_id).unwrap()).unwrap();
        assert_eq!(reader.read(), notification(Price::MAX, 1, 1, 2));
        assert_eq!(reader.read(), notification(Price::MIN + 1, 1, 2, 1));

        engine.submit_sell(Order::sell(Price::MAX, 1, 3, 3, instrument_id).unwrap()).unwrap();
        engine.submit_buy(Order::buy(Price::MAX, 1, 4, 4, instrument_id).unwrap()).unwrap();
        assert_eq!(reader.read(), notification(-Price::MAX, 1, 4, 3));
        assert_eq!(reader.read(), notification(Price::MAX, 1, 3, 4));
    }

    #[test]
    fn test_spread_saturates_at_extreme_prices() {
        let (mut engine, _reader, instrument_id) = setup_engine();

        engine.submit_buy(Order::buy(Price::MIN + 1, 1, 1, 1, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(Price::MAX, 1, 2, 2, instrument_id).unwrap()).unwrap();

        assert_eq!(engine.spread(), Some(Price::MAX));
        assert_eq!(engine.buy_book().len(), 1);
        assert_eq!(engine.sell_book().len(), 1);
    }

    #[test]
    fn test_submit_routes_by_side() {
        let (mut engine, mut reader, instrument_id) = setup_engine();

        engine.submit(Order::sell(8, 1, 1, 1, instrument_id).unwrap()).unwrap();
        engine.submit(Order::buy(8, 1, 2, 2, instrument_id).unwrap()).unwrap();

        assert_eq!(reader.read(), notification(-8, 1, 2, 1));
    }

    #[test]
    fn test_stats() {
        let (mut engine, _reader, instrument_id) = setup_engine();

        engine.submit_buy(Order::buy(10, 3, 1, 1, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(10, 1, 2, 2, instrument_id).unwrap()).unwrap();
        engine.submit_sell(Order::sell(9, 4, 3, 3, instrument_id).unwrap()).unwrap();

        assert_eq!(
            engine.stats(),
            EngineStats {
                orders_submitted: 3,
                orders_rested: 2,
                matches: 2,
                volume: 3,
                notifications: 4,
            }
        );
        assert_eq!(engine.sell_book().volume_at_price(9), Some(2));
    }
}
