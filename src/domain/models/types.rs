//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the core value types used throughout the matcher: orders, order
// status and the trade notifications handed to downstream consumers.
//
// | Section            | Description                                                      |
// |--------------------|------------------------------------------------------------------|
// | ALIASES            | Numeric identities (Price, Quantity, TraderId, OrderId).         |
// | ENUMS              | Side and OrderStatus.                                            |
// | STRUCTS            | Order and TradeNotification.                                     |
// | FUNCTIONS          | trade_price (midpoint pricing).                                  |
// | ERRORS             | OrderError.                                                      |
// | TESTS              | Unit tests for the defined types.                                |
//--------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

//--------------------------------------------------------------------------------------------------
//  ALIASES
//--------------------------------------------------------------------------------------------------

/// Limit price in caller-defined units (e.g. minor currency units).
pub type Price = i64;
/// Order quantity in whole units.
pub type Quantity = u64;
pub type TraderId = u64;
pub type OrderId = u64;
/// Identifier of the single instrument an engine matches.
pub type InstrumentId = Uuid;

//--------------------------------------------------------------------------------------------------
//  ENUMS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                          |
// |---------------|------------------------------------------------------|
// | Side          | Buy or sell.                                         |
// | OrderStatus   | Where a submitted order ended up after matching.     |
//--------------------------------------------------------------------------------------------------

/// Represents the side of an order (Buy or Sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns true when `level_price` is at least as good as `than` from this side's
    /// point of view: higher for bids, lower for asks.
    #[inline(always)]
    pub fn is_better_or_equal(&self, level_price: Price, than: Price) -> bool {
        match self {
            Self::Buy => level_price >= than,
            Self::Sell => level_price <= than,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Outcome of a single submission.
///
/// `Filled` is terminal: a filled order is never inserted into a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// No fill happened; the whole order rests in its book.
    Resting,
    /// Some quantity was filled and the remainder rests in its book.
    PartiallyFilled,
    /// The order was fully matched during submission.
    Filled,
}

//--------------------------------------------------------------------------------------------------
//  STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name              | Description                                         |
// |-------------------|-----------------------------------------------------|
// | Order             | Identity plus remaining price/quantity state.       |
// | TradeNotification | One leg of a fill, addressed to one order.          |
//--------------------------------------------------------------------------------------------------

/// A limit order for the engine's instrument.
///
/// Identity fields are private and exposed through getters so they cannot change once
/// the order has been built. Only the engine decrements `remaining`. Deserialized orders
/// go through the same checks as `Order::new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderFields")]
pub struct Order {
    side: Side,
    trader_id: TraderId,
    order_id: OrderId,
    instrument_id: InstrumentId,
    price: Price,
    amount: Quantity,
    remaining: Quantity,
}

impl Order {
    /// Builds a new order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::ZeroAmount` if `amount` is zero and
    /// `OrderError::PriceOutOfRange` for `Price::MIN`, whose buy-leg notification price
    /// could not be negated.
    pub fn new(
        side: Side,
        price: Price,
        amount: Quantity,
        trader_id: TraderId,
        order_id: OrderId,
        instrument_id: InstrumentId,
    ) -> Result<Self, OrderError> {
        let order = Self {
            side,
            trader_id,
            order_id,
            instrument_id,
            price,
            amount,
            remaining: amount,
        };
        order.validate()?;
        Ok(order)
    }

    /// Checks the invariants every order holds: a representable price, a positive
    /// amount and no more open than was submitted.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.price == Price::MIN {
            return Err(OrderError::PriceOutOfRange {
                order_id: self.order_id,
                price: self.price,
            });
        }
        if self.amount == 0 {
            return Err(OrderError::ZeroAmount { order_id: self.order_id });
        }
        if self.remaining > self.amount {
            return Err(OrderError::RemainingExceedsAmount {
                order_id: self.order_id,
                remaining: self.remaining,
                amount: self.amount,
            });
        }
        Ok(())
    }

    /// Shorthand for a buy order.
    pub fn buy(
        price: Price,
        amount: Quantity,
        trader_id: TraderId,
        order_id: OrderId,
        instrument_id: InstrumentId,
    ) -> Result<Self, OrderError> {
        Self::new(Side::Buy, price, amount, trader_id, order_id, instrument_id)
    }

    /// Shorthand for a sell order.
    pub fn sell(
        price: Price,
        amount: Quantity,
        trader_id: TraderId,
        order_id: OrderId,
        instrument_id: InstrumentId,
    ) -> Result<Self, OrderError> {
        Self::new(Side::Sell, price, amount, trader_id, order_id, instrument_id)
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn trader_id(&self) -> TraderId {
        self.trader_id
    }

    #[inline]
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    #[inline]
    pub fn instrument_id(&self) -> InstrumentId {
        self.instrument_id
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    /// Quantity originally submitted.
    #[inline]
    pub fn amount(&self) -> Quantity {
        self.amount
    }

    /// Quantity still open.
    #[inline]
    pub fn remaining(&self) -> Quantity {
        self.remaining
    }

    /// Quantity filled so far.
    #[inline]
    pub fn filled(&self) -> Quantity {
        self.amount - self.remaining
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    /// Decrements the open quantity by a fill.
    ///
    /// Callers never fill more than what is open.
    #[inline(always)]
    pub(crate) fn fill(&mut self, quantity: Quantity) {
        debug_assert!(quantity <= self.remaining);
        self.remaining -= quantity;
    }
}

/// Wire shape of an `Order`; converted through `Order::validate`.
#[derive(Deserialize)]
struct OrderFields {
    side: Side,
    trader_id: TraderId,
    order_id: OrderId,
    instrument_id: InstrumentId,
    price: Price,
    amount: Quantity,
    remaining: Quantity,
}

impl TryFrom<OrderFields> for Order {
    type Error = OrderError;

    fn try_from(fields: OrderFields) -> Result<Self, Self::Error> {
        let order = Order {
            side: fields.side,
            trader_id: fields.trader_id,
            order_id: fields.order_id,
            instrument_id: fields.instrument_id,
            price: fields.price,
            amount: fields.amount,
            remaining: fields.remaining,
        };
        order.validate()?;
        Ok(order)
    }
}

/// One leg of a fill, addressed to a single order.
///
/// Buy legs carry the negated trade price and sell legs the positive trade price, so a
/// consumer can tell them apart by sign alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeNotification {
    /// Signed trade price: negative for the buy leg, positive for the sell leg.
    pub price: Price,
    /// Quantity filled in this match.
    pub amount: Quantity,
    /// Order this leg is addressed to.
    pub order_id: OrderId,
    /// Trader on the other side of the match.
    pub counterparty_trader_id: TraderId,
}

impl TradeNotification {
    /// The leg addressed to the buy order of a match.
    ///
    /// Orders never carry `Price::MIN`, so an engine trade price always negates exactly;
    /// a `Price::MIN` passed in directly saturates to `Price::MAX`.
    #[inline(always)]
    pub fn buy_leg(trade_price: Price, amount: Quantity, buy: &Order, sell: &Order) -> Self {
        Self {
            price: trade_price.saturating_neg(),
            amount,
            order_id: buy.order_id,
            counterparty_trader_id: sell.trader_id,
        }
    }

    /// The leg addressed to the sell order of a match.
    #[inline(always)]
    pub fn sell_leg(trade_price: Price, amount: Quantity, buy: &Order, sell: &Order) -> Self {
        Self {
            price: trade_price,
            amount,
            order_id: sell.order_id,
            counterparty_trader_id: buy.trader_id,
        }
    }

    /// Tells the legs apart by sign. Only meaningful when the trade price is positive:
    /// at a zero trade price both legs read as sell legs, and at a negative trade price
    /// the signs are swapped.
    #[inline]
    pub fn is_buy_leg(&self) -> bool {
        self.price < 0
    }

    /// Unsigned trade price.
    #[inline]
    pub fn trade_price(&self) -> Price {
        self.price.abs()
    }
}

//--------------------------------------------------------------------------------------------------
//  FUNCTIONS
//--------------------------------------------------------------------------------------------------

/// Midpoint between a buy limit and a sell limit, rounded toward negative infinity.
///
/// The sum is widened so extreme prices cannot overflow. For the non-negative prices the
/// venue trades this is plain truncating division.
#[inline(always)]
pub fn trade_price(buy_price: Price, sell_price: Price) -> Price {
    ((buy_price as i128 + sell_price as i128).div_euclid(2)) as Price
}

//--------------------------------------------------------------------------------------------------
//  ERRORS
//--------------------------------------------------------------------------------------------------

/// Errors raised while building an order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Orders must be for a positive quantity.
    #[error("Order {order_id} has a zero amount")]
    ZeroAmount { order_id: OrderId },

    /// `Price::MIN` has no positive counterpart to carry on a buy leg.
    #[error("Order {order_id} has an unsupported price {price}")]
    PriceOutOfRange { order_id: OrderId, price: Price },

    #[error("Order {order_id} has {remaining} open out of {amount}")]
    RemainingExceedsAmount {
        order_id: OrderId,
        remaining: Quantity,
        amount: Quantity,
    },
}
