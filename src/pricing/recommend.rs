use super::history::{CollapsedSeries, PriceHistory};
use super::stats;
use super::InvalidInputError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Percentile used for both the zone risk statistic and the weighted bid threshold
const PERCENTILE: f64 = 99.0;

/// Center of the recency curve as a fraction of the window
const RECENCY_CENTER: f64 = 0.7;
const RECENCY_SCALE: f64 = 0.2;

/// Zone and bid price to request spot instances at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub zone: String,
    pub price: f64,
}

/// Conservative upper bound on a zone's price: `max(mean + 3*std, p99)`.
///
/// Three-sigma catches generally volatile zones, p99 catches a persistent
/// high plateau. `None` for an empty slice.
pub fn zone_risk(prices: &[f64]) -> Option<f64> {
    let mean = stats::mean(prices)?;
    let std_dev = stats::std_dev(prices)?;
    let p99 = stats::percentile(prices, PERCENTILE)?;
    Some((mean + 3.0 * std_dev).max(p99))
}

/// Weights for `n` chronologically ordered points, summing to 1.
///
/// A tanh curve centered at 70% of the window is rescaled to `[1, 2]` and then
/// normalized, so the most recent ~30% of points dominate while every point
/// keeps a positive weight.
pub fn recency_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let raw: Vec<f64> = (0..n)
        .map(|i| {
            let base = i as f64 / n as f64;
            ((base - RECENCY_CENTER) / RECENCY_SCALE).tanh()
        })
        .collect();

    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let normalized: Vec<f64> = if range > 0.0 {
        raw.iter().map(|w| (w - min) / range + 1.0).collect()
    } else {
        vec![1.0; n]
    };

    let total: f64 = normalized.iter().sum();
    normalized.into_iter().map(|w| w / total).collect()
}

/// Highest observed price whose recency-weighted value reaches the weighted p99.
fn weighted_bid(prices: &[f64]) -> Option<f64> {
    let weighted: Vec<f64> = recency_weights(prices.len())
        .iter()
        .zip(prices)
        .map(|(weight, price)| weight * price)
        .collect();
    let threshold = stats::percentile(&weighted, PERCENTILE)?;

    weighted
        .iter()
        .zip(prices)
        .filter(|(value, _)| **value >= threshold)
        .map(|(_, price)| *price)
        .reduce(f64::max)
}

/// Pick the zone least likely to spike and a bid price for it.
///
/// Zones are compared by `zone_risk`; ties go to the lexicographically first
/// zone. The bid is taken from the chosen zone with `weighted_bid`.
///
/// # Errors
///
/// `InvalidInputError` if the history is empty, or any zone has no
/// observations or a non-finite or non-positive price.
pub fn recommend(history: &PriceHistory) -> Result<Recommendation, InvalidInputError> {
    if history.is_empty() {
        return Err(InvalidInputError::EmptyHistory);
    }

    let mut best: Option<(&str, f64, CollapsedSeries)> = None;
    for (zone, series) in history {
        let collapsed = series.collapse_checked(zone)?;
        let risk = zone_risk(&collapsed.prices()).ok_or_else(|| InvalidInputError::EmptyZone {
            zone: zone.clone(),
        })?;
        debug!(zone = %zone, risk, points = collapsed.len(), "scored zone");

        if best.as_ref().map_or(true, |(_, best_risk, _)| risk < *best_risk) {
            best = Some((zone.as_str(), risk, collapsed));
        }
    }

    let (zone, risk, collapsed) = best.ok_or(InvalidInputError::EmptyHistory)?;
    let price = weighted_bid(&collapsed.prices()).ok_or_else(|| InvalidInputError::EmptyZone {
        zone: zone.to_string(),
    })?;
    debug!(zone, risk, price, "selected zone");

    Ok(Recommendation {
        zone: zone.to_string(),
        price,
    })
}
