//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Throughput run: one engine, a synthetic workload submitted as interleaved buy/sell
// pairs, and an optional consumer thread draining the notification channel.
//
// | Name          | Description                                                     |
// |---------------|-----------------------------------------------------------------|
// | PerfOptions   | What to generate and how to run it                              |
// | PerfReport    | Timing, engine counters and final book sizes                    |
// | run           | Generates the workload, runs it and reports                     |
//--------------------------------------------------------------------------------------------------

use std::thread;
use std::time::Instant;

use crossbeam_channel::TryRecvError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::models::types::Price;
use crate::domain::services::matching_engine::{EngineStats, MatchingEngine, MatchingError};
use crate::domain::services::notifications::{ChannelError, NotificationReader, notification_channel};
use crate::workload::{PriceDistribution, Workload, WorkloadError};

#[derive(Error, Debug)]
pub enum PerfError {
    #[error(transparent)]
    Workload(#[from] WorkloadError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Matching(#[from] MatchingError),

    #[error("notification drain thread panicked")]
    DrainPanicked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfOptions {
    pub order_count: usize,
    pub notification_capacity: usize,
    pub price_low: Price,
    pub price_high: Price,
    pub distribution: PriceDistribution,
    pub seed: u64,
    /// Drain the channel on a separate thread while matching.
    pub drain: bool,
}

impl From<&Config> for PerfOptions {
    fn from(config: &Config) -> Self {
        Self {
            order_count: config.order_count,
            notification_capacity: config.notification_capacity,
            price_low: config.price_low,
            price_high: config.price_high,
            distribution: config.distribution,
            seed: config.seed,
            drain: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfReport {
    pub options: PerfOptions,
    /// Buy and sell submissions combined.
    pub orders: u64,
    pub elapsed_nanos: u64,
    pub orders_per_sec: f64,
    pub stats: EngineStats,
    pub resting_buys: usize,
    pub resting_sells: usize,
    /// Notifications taken off the channel by the drain thread, if one ran.
    pub notifications_drained: Option<u64>,
}

/// Generates the workload described by `options`, submits buy `i` then sell `i` for every
/// `i`, and reports how long matching took. Workload generation is not timed.
pub fn run(options: &PerfOptions) -> Result<PerfReport, PerfError> {
    let instrument_id = Uuid::new_v4();
    let workload = Workload::generate(
        options.order_count,
        options.price_low,
        options.price_high,
        options.distribution,
        instrument_id,
        options.seed,
    )?;
    info!("Generated {} buy/sell pairs", workload.len());

    let (writer, reader) = notification_channel(options.notification_capacity)?;
    let mut engine = MatchingEngine::new(instrument_id, writer);

    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    let drain = options
        .drain
        .then(|| thread::spawn(move || drain_until_stopped(reader, stop_rx)));

    let start = Instant::now();
    for (buy, sell) in workload.buys.into_iter().zip(workload.sells) {
        engine.submit_buy(buy)?;
        engine.submit_sell(sell)?;
    }
    let elapsed = start.elapsed();

    let _ = stop_tx.send(());
    let notifications_drained = match drain {
        Some(handle) => Some(handle.join().map_err(|_| PerfError::DrainPanicked)?),
        None => None,
    };

    let orders = options.order_count as u64 * 2;
    let seconds = elapsed.as_secs_f64();
    let report = PerfReport {
        options: options.clone(),
        orders,
        elapsed_nanos: elapsed.as_nanos() as u64,
        orders_per_sec: if seconds > 0.0 { orders as f64 / seconds } else { 0.0 },
        stats: engine.stats(),
        resting_buys: engine.buy_book().len(),
        resting_sells: engine.sell_book().len(),
        notifications_drained,
    };
    info!(
        "Matched {} orders in {:?} ({:.0} orders/s)",
        report.orders, elapsed, report.orders_per_sec
    );
    Ok(report)
}

fn drain_until_stopped(
    mut reader: NotificationReader,
    stop: crossbeam_channel::Receiver<()>,
) -> u64 {
    loop {
        while reader.try_read().is_some() {}

        match stop.try_recv() {
            Err(TryRecvError::Empty) => thread::yield_now(),
            Ok(()) | Err(TryRecvError::Disconnected) => break,
        }
    }

    // Pick up whatever was written between the last drain and the stop signal.
    while reader.try_read().is_some() {}
    debug!(
        "Drain thread stopped after {} notifications (overrun: {})",
        reader.consumed(),
        reader.is_overrun()
    );
    reader.consumed()
}
