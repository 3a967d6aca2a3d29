use super::stats;
use super::InvalidInputError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single spot price point reported for a zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceObservation {
    pub fn new(price: f64, timestamp: DateTime<Utc>) -> Self {
        Self { price, timestamp }
    }
}

/// Observations for one availability zone, in any timestamp order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSeries {
    pub observations: Vec<PriceObservation>,
}

/// Zone name to series. Ordered so that iteration is lexicographic by zone.
pub type PriceHistory = BTreeMap<String, ZoneSeries>;

/// One maximum price per distinct timestamp, ascending by timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedSeries {
    points: Vec<(DateTime<Utc>, f64)>,
}

impl ZoneSeries {
    pub fn new(observations: Vec<PriceObservation>) -> Self {
        Self { observations }
    }

    pub fn push(&mut self, observation: PriceObservation) {
        self.observations.push(observation);
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Collapse duplicate timestamps to their maximum price.
    ///
    /// Paginated fetches can return the same point more than once, and EC2
    /// reports one record per product variant at the same instant.
    pub fn collapse(&self) -> CollapsedSeries {
        let mut by_timestamp: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
        for observation in &self.observations {
            by_timestamp
                .entry(observation.timestamp)
                .and_modify(|max| *max = max.max(observation.price))
                .or_insert(observation.price);
        }
        CollapsedSeries {
            points: by_timestamp.into_iter().collect(),
        }
    }

    /// Collapse and check that the zone can take part in a recommendation.
    pub(crate) fn collapse_checked(&self, zone: &str) -> Result<CollapsedSeries, InvalidInputError> {
        if let Some(bad) = self
            .observations
            .iter()
            .find(|o| !o.price.is_finite() || o.price <= 0.0)
        {
            return Err(InvalidInputError::InvalidPrice {
                zone: zone.to_string(),
                price: bad.price,
            });
        }
        let collapsed = self.collapse();
        if collapsed.is_empty() {
            return Err(InvalidInputError::EmptyZone {
                zone: zone.to_string(),
            });
        }
        Ok(collapsed)
    }
}

impl FromIterator<PriceObservation> for ZoneSeries {
    fn from_iter<I: IntoIterator<Item = PriceObservation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl CollapsedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(DateTime<Utc>, f64)] {
        &self.points
    }

    /// Prices in chronological order, oldest first
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|(_, price)| *price).collect()
    }

    /// Most recent point
    pub fn latest(&self) -> Option<(DateTime<Utc>, f64)> {
        self.points.last().copied()
    }
}

/// Per-zone statistics shown by `prices history`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub zone: String,
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub risk: f64,
    pub points: usize,
    pub last_update: DateTime<Utc>,
}

impl ZoneSummary {
    /// Summarise a collapsed series; `None` when it has no points.
    pub fn from_collapsed(zone: &str, collapsed: &CollapsedSeries) -> Option<Self> {
        let prices = collapsed.prices();
        let (last_update, current) = collapsed.latest()?;
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            zone: zone.to_string(),
            current,
            min,
            max,
            mean: stats::mean(&prices)?,
            std_dev: stats::std_dev(&prices)?,
            risk: super::zone_risk(&prices)?,
            points: prices.len(),
            last_update,
        })
    }

    /// Summaries for every zone with data, in zone order
    pub fn for_history(history: &PriceHistory) -> Vec<Self> {
        history
            .iter()
            .filter_map(|(zone, series)| Self::from_collapsed(zone, &series.collapse()))
            .collect()
    }
}
