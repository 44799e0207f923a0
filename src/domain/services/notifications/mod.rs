//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Bounded, non-blocking hand-off of trade notifications from the matching engine to a
// downstream consumer (settlement, reporting).
//
// | Component            | Description                                                  |
// |----------------------|--------------------------------------------------------------|
// | notification_channel | Builds a writer/reader pair over a fixed-capacity ring       |
// | NotificationWriter   | Single producer handle                                       |
// | NotificationReader   | Single consumer handle                                       |
// | ChannelError         | Construction errors                                          |
//--------------------------------------------------------------------------------------------------

use thiserror::Error;

mod ring;

pub use ring::{NotificationReader, NotificationWriter, notification_channel};

/// Errors that can occur while building a notification channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// A ring needs at least one slot.
    #[error("Notification channel capacity must be greater than zero")]
    ZeroCapacity,
}

/// Type alias for Result with ChannelError
pub type ChannelResult<T> = Result<T, ChannelError>;
