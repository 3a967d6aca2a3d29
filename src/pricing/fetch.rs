use super::history::{PriceHistory, ZoneSeries};
use crate::config::LaunchProfile;
use crate::error::{Result, SpotctlError};
use crate::provider::SpotProvider;
use chrono::{DateTime, Duration, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{info, warn};

/// Instance type, product and time window for a price history lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuery {
    pub instance_type: String,
    pub product: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl PriceQuery {
    /// Window ending at `end_time` and reaching back `lookback`
    pub fn for_profile(profile: &LaunchProfile, lookback: Duration, end_time: DateTime<Utc>) -> Self {
        Self {
            instance_type: profile.instance_type.clone(),
            product: profile.product.clone(),
            start_time: end_time - lookback,
            end_time,
        }
    }
}

/// Fetch price history for `zones`, at most `concurrency` zones at a time.
///
/// Zones without any price points in the window are left out of the result.
pub async fn fetch_price_history(
    provider: &dyn SpotProvider,
    zones: &[String],
    query: &PriceQuery,
    concurrency: usize,
    progress: &ProgressBar,
) -> Result<PriceHistory> {
    info!(
        "Fetching {} price history for {} zone(s) from {} to {}",
        query.instance_type,
        zones.len(),
        query.start_time,
        query.end_time
    );

    let fetched: Vec<_> = stream::iter(zones.iter().cloned())
        .map(|zone| async move {
            let observations = provider.spot_price_history(query, &zone).await?;
            progress.inc(1);
            Ok::<_, SpotctlError>((zone, observations))
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut history = PriceHistory::new();
    for (zone, observations) in fetched {
        if observations.is_empty() {
            warn!("No {} price points for zone {}, skipping", query.product, zone);
            continue;
        }
        history.insert(zone, ZoneSeries::new(observations));
    }
    Ok(history)
}
