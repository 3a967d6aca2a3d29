use crate::error::Result;
use crate::output::{print_json, OutputFormat};
use crate::provider::SpotProvider;
use crate::validation::validate_zone;

/// Zones to query: the requested ones (validated, deduplicated, sorted) or
/// every available zone in the region when none are given.
pub async fn resolve_zones(provider: &dyn SpotProvider, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return provider.availability_zones().await;
    }
    for zone in requested {
        validate_zone(zone)?;
    }
    let mut zones = requested.to_vec();
    zones.sort();
    zones.dedup();
    Ok(zones)
}

pub async fn list_zones(provider: &dyn SpotProvider, output: OutputFormat) -> Result<()> {
    let zones = provider.availability_zones().await?;
    if output.is_json() {
        return print_json(&zones);
    }
    for zone in &zones {
        println!("{}", zone);
    }
    Ok(())
}
