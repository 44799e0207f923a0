//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the fixed-capacity ring that carries trade notifications from the
// matching thread to a single consumer.
//
// | Component            | Description                                                  |
// |----------------------|--------------------------------------------------------------|
// | NotificationWriter   | Producer handle owned by the matching engine                 |
// | NotificationReader   | Consumer handle used to drain notifications                  |
// | Ring                 | Shared slots plus monotonic write/read positions             |
//
// Overrun policy: writes never block and never fail. A consumer that falls more than
// `capacity` notifications behind reads slots that later writes have already replaced.
// Such entries are lost silently; the reader can detect the condition with `is_overrun`.
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crossbeam_utils::CachePadded;
use tracing::{info, warn};

use crate::domain::models::types::TradeNotification;
use crate::domain::services::notifications::{ChannelError, ChannelResult};

/// One notification slot. Fields are independent atomics, so a read racing a write to the
/// same slot (only possible under overrun) can observe a mix of two records.
#[derive(Debug, Default)]
struct Slot {
    price: AtomicI64,
    amount: AtomicU64,
    order_id: AtomicU64,
    counterparty_trader_id: AtomicU64,
}

impl Slot {
    #[inline(always)]
    fn store(&self, notification: &TradeNotification) {
        self.price.store(notification.price, Ordering::Relaxed);
        self.amount.store(notification.amount, Ordering::Relaxed);
        self.order_id.store(notification.order_id, Ordering::Relaxed);
        self.counterparty_trader_id
            .store(notification.counterparty_trader_id, Ordering::Relaxed);
    }

    #[inline(always)]
    fn load(&self) -> TradeNotification {
        TradeNotification {
            price: self.price.load(Ordering::Relaxed),
            amount: self.amount.load(Ordering::Relaxed),
            order_id: self.order_id.load(Ordering::Relaxed),
            counterparty_trader_id: self.counterparty_trader_id.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
struct Ring {
    slots: Box<[Slot]>,
    /// Total number of notifications ever written.
    written: CachePadded<AtomicU64>,
    /// Total number of notifications ever read.
    read: CachePadded<AtomicU64>,
}

impl Ring {
    #[inline(always)]
    fn slot(&self, position: u64) -> &Slot {
        &self.slots[(position % self.slots.len() as u64) as usize]
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Creates a notification channel with room for `capacity` undrained notifications.
///
/// # Errors
///
/// Returns `ChannelError::ZeroCapacity` if `capacity` is zero.
///
/// # Examples
///
/// ```
/// use stock_matcher::{notification_channel, TradeNotification};
///
/// let (mut writer, mut reader) = notification_channel(4).unwrap();
/// writer.write(TradeNotification { price: -7, amount: 1, order_id: 1, counterparty_trader_id: 2 });
/// assert_eq!(reader.read().price, -7);
/// assert!(reader.try_read().is_none());
/// ```
pub fn notification_channel(
    capacity: usize,
) -> ChannelResult<(NotificationWriter, NotificationReader)> {
    if capacity == 0 {
        return Err(ChannelError::ZeroCapacity);
    }

    let slots = (0..capacity).map(|_| Slot::default()).collect();
    let ring = Arc::new(Ring {
        slots,
        written: CachePadded::new(AtomicU64::new(0)),
        read: CachePadded::new(AtomicU64::new(0)),
    });
    info!("Created notification channel with capacity: {}", capacity);

    let writer = NotificationWriter {
        ring: Arc::clone(&ring),
        position: 0,
    };
    let reader = NotificationReader {
        ring,
        position: 0,
        overrun_reported: false,
    };
    Ok((writer, reader))
}

/// Producer side of a notification channel.
///
/// There is exactly one writer per channel; it is `Send` but not `Clone`.
#[derive(Debug)]
pub struct NotificationWriter {
    ring: Arc<Ring>,
    position: u64,
}

impl NotificationWriter {
    /// Stores one notification and advances the write position.
    ///
    /// Never blocks. If the reader is `capacity` or more notifications behind, the oldest
    /// undrained entry is overwritten.
    #[inline(always)]
    pub fn write(&mut self, notification: TradeNotification) {
        self.ring.slot(self.position).store(&notification);
        self.position += 1;
        self.ring.written.store(self.position, Ordering::Release);
    }

    /// Total number of notifications written so far.
    #[inline]
    pub fn written(&self) -> u64 {
        self.position
    }

    /// Number of written notifications the reader has not consumed yet. May exceed the
    /// capacity when the reader has been overrun.
    pub fn backlog(&self) -> u64 {
        self.position
            .saturating_sub(self.ring.read.load(Ordering::Acquire))
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// Consumer side of a notification channel.
///
/// There is exactly one reader per channel; it is `Send` but not `Clone`.
#[derive(Debug)]
pub struct NotificationReader {
    ring: Arc<Ring>,
    position: u64,
    overrun_reported: bool,
}

impl NotificationReader {
    /// Reads the notification at the current read position and advances it.
    ///
    /// This is unconditional: when the reader has caught up with the writer it returns
    /// whatever the slot holds (the all-zero default if it was never written, otherwise
    /// a stale earlier record). When the reader has been overrun the slot holds a later
    /// notification than the one originally written at this position.
    #[inline]
    pub fn read(&mut self) -> TradeNotification {
        self.check_overrun(self.ring.written.load(Ordering::Acquire));
        let notification = self.ring.slot(self.position).load();
        self.advance();
        notification
    }

    /// Reads the next notification if the writer has produced one the reader has not
    /// consumed yet.
    #[inline]
    pub fn try_read(&mut self) -> Option<TradeNotification> {
        let written = self.ring.written.load(Ordering::Acquire);
        if self.position >= written {
            return None;
        }

        self.check_overrun(written);
        let notification = self.ring.slot(self.position).load();
        self.advance();
        Some(notification)
    }

    /// Reads every notification currently available into `out`, returning how many were
    /// read.
    pub fn drain_into(&mut self, out: &mut Vec<TradeNotification>) -> usize {
        let before = out.len();
        while let Some(notification) = self.try_read() {
            out.push(notification);
        }
        out.len() - before
    }

    /// Number of notifications written but not yet read.
    pub fn pending(&self) -> u64 {
        self.ring
            .written
            .load(Ordering::Acquire)
            .saturating_sub(self.position)
    }

    /// True when the writer has lapped this reader, i.e. some undrained notifications have
    /// already been overwritten.
    pub fn is_overrun(&self) -> bool {
        self.pending() > self.ring.capacity() as u64
    }

    /// Total number of notifications read so far.
    pub fn consumed(&self) -> u64 {
        self.position
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[inline(always)]
    fn advance(&mut self) {
        self.position += 1;
        self.ring.read.store(self.position, Ordering::Release);
    }

    #[inline]
    fn check_overrun(&mut self, written: u64) {
        let lag = written.saturating_sub(self.position);
        if lag > self.ring.capacity() as u64 {
            if !self.overrun_reported {
                warn!(
                    "Notification reader overrun: {} notifications behind with capacity {}",
                    lag,
                    self.ring.capacity()
                );
                self.overrun_reported = true;
            }
        } else {
            self.overrun_reported = false;
        }
    }
}
