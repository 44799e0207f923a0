use thiserror::Error;

use crate::domain::models::types::{InstrumentId, OrderError, OrderId, Side};

pub mod matching_engine;

/// Re-export key types for convenience
pub use self::matching_engine::{EngineStats, MatchingEngine};

/// Errors that reject a submission before any book mutation happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchingError {
    /// The order was routed to the engine of another instrument.
    #[error("Order is for wrong instrument (expected {expected}, got {got})")]
    WrongInstrument {
        expected: InstrumentId,
        got: InstrumentId,
    },

    /// A sell order was passed to `submit_buy`, or a buy order to `submit_sell`.
    #[error("Order is on the wrong side (expected {expected}, got {got})")]
    WrongSide { expected: Side, got: Side },

    /// The order has nothing left to match.
    #[error("Order {0} has no remaining amount")]
    ZeroAmount(OrderId),

    /// The order breaks the `Order` invariants (only reachable for orders not built by
    /// `Order::new`).
    #[error(transparent)]
    InvalidOrder(#[from] OrderError),
}

/// Type alias for Result with MatchingError
pub type MatchingResult<T> = Result<T, MatchingError>;
