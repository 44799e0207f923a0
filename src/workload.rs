//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Synthetic order streams for throughput runs and benches.
//
// | Name               | Description                                                    |
// |--------------------|----------------------------------------------------------------|
// | PriceDistribution  | Flat (uniform) or Pyramid (sum of four uniform draws)          |
// | price_range        | Draws `n` prices in `[low, high)`                              |
// | make_orders        | Builds `n` single-unit orders of one side                      |
// | Workload           | Matching buy and sell streams generated from one seed          |
//--------------------------------------------------------------------------------------------------

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::types::{InstrumentId, Order, OrderError, Price, Side};

/// Shape of generated limit prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PriceDistribution {
    /// Uniform over `[low, high)`.
    #[default]
    Flat,
    /// Sum of four uniform draws over a quarter of the range each, so prices cluster
    /// around the middle of `[low, high)`.
    Pyramid,
}

/// Errors raised while generating a workload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkloadError {
    #[error("Price range [{low}, {high}) is too narrow for a {distribution:?} distribution")]
    EmptyPriceRange {
        low: Price,
        high: Price,
        distribution: PriceDistribution,
    },

    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Draws `n` prices in `[low, high)` following `distribution`.
///
/// # Errors
///
/// Returns `EmptyPriceRange` when the range holds no value to draw (for `Pyramid`, when
/// it is narrower than four).
pub fn price_range<R: Rng>(
    n: usize,
    low: Price,
    high: Price,
    distribution: PriceDistribution,
    rng: &mut R,
) -> Result<Vec<Price>, WorkloadError> {
    let span = high.saturating_sub(low);
    let step = match distribution {
        PriceDistribution::Flat => span,
        PriceDistribution::Pyramid => span / 4,
    };
    if step <= 0 {
        return Err(WorkloadError::EmptyPriceRange { low, high, distribution });
    }

    let prices = (0..n)
        .map(|_| match distribution {
            PriceDistribution::Flat => low + rng.gen_range(0..step),
            PriceDistribution::Pyramid => {
                low + (0..4).map(|_| rng.gen_range(0..step)).sum::<Price>()
            }
        })
        .collect();
    Ok(prices)
}

/// Builds `n` single-unit orders of `side`; order `i` has trader id and order id `i`.
pub fn make_orders<R: Rng>(
    n: usize,
    side: Side,
    low: Price,
    high: Price,
    distribution: PriceDistribution,
    instrument_id: InstrumentId,
    rng: &mut R,
) -> Result<Vec<Order>, WorkloadError> {
    price_range(n, low, high, distribution, rng)?
        .into_iter()
        .enumerate()
        .map(|(i, price)| {
            Order::new(side, price, 1, i as u64, i as u64, instrument_id).map_err(Into::into)
        })
        .collect()
}

/// Buy and sell streams of equal length, generated from one seeded RNG.
#[derive(Debug, Clone)]
pub struct Workload {
    pub buys: Vec<Order>,
    pub sells: Vec<Order>,
}

impl Workload {
    /// Generates `n` sells then `n` buys over `[low, high)`.
    pub fn generate(
        n: usize,
        low: Price,
        high: Price,
        distribution: PriceDistribution,
        instrument_id: InstrumentId,
        seed: u64,
    ) -> Result<Self, WorkloadError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let sells = make_orders(n, Side::Sell, low, high, distribution, instrument_id, &mut rng)?;
        let buys = make_orders(n, Side::Buy, low, high, distribution, instrument_id, &mut rng)?;
        Ok(Self { buys, sells })
    }

    pub fn len(&self) -> usize {
        self.buys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buys.is_empty()
    }
}
