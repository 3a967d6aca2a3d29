//! Spot price history and bid recommendations
//!
//! - `history`: price observations, per-zone series and collapsing
//! - `stats`: mean, standard deviation and nearest-rank percentiles
//! - `recommend`: zone risk scoring and recency-weighted bid selection
//! - `fetch`: building a `PriceHistory` from a `SpotProvider`
//!
//! Everything except `fetch` is pure and synchronous.

mod fetch;
mod history;
mod recommend;
pub mod stats;

pub use fetch::{fetch_price_history, PriceQuery};
pub use history::{CollapsedSeries, PriceHistory, PriceObservation, ZoneSeries, ZoneSummary};
pub use recommend::{recommend, recency_weights, zone_risk, Recommendation};

use thiserror::Error;

/// Price history that cannot produce a recommendation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    #[error("price history is empty")]
    EmptyHistory,

    #[error("zone {zone} has no price observations")]
    EmptyZone { zone: String },

    #[error("zone {zone} has an invalid price {price}")]
    InvalidPrice { zone: String, price: f64 },
}
