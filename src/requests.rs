//! Spot request commands: create, list and cancel
//!
//! Requests are one-time. A request created with `--valid-hours` expires on
//! its own if EC2 has not fulfilled it by then.

use crate::config::{Config, LaunchProfile};
use crate::error::Result;
use crate::instances::print_state_changes;
use crate::output::{print_json, spot_requests_table, OutputFormat};
use crate::provider::{ResourceId, SpotLaunchSpec, SpotProvider, SpotRequestSummary, StateChange};
use crate::validation::{
    validate_count, validate_ids, validate_price, validate_spot_request_id, validate_zone,
};
use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Clone, Debug)]
pub enum RequestCommands {
    /// Request spot instances for a launch profile
    Create {
        /// Launch profile name from the config file
        profile: String,
        /// Availability zone, e.g. us-east-1b
        zone: String,
        /// Maximum price in dollars per instance-hour
        price: f64,
        /// Number of instances
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// Cancel the request if unfulfilled after this many hours
        #[arg(long)]
        valid_hours: Option<u32>,
    },
    /// List spot requests, oldest first
    List,
    /// Cancel spot requests
    Cancel {
        /// Spot request IDs (sir-...)
        #[arg(required = true)]
        request_ids: Vec<String>,
    },
}

pub async fn handle_command(
    cmd: RequestCommands,
    config: &Config,
    provider: &dyn SpotProvider,
    output: OutputFormat,
) -> Result<()> {
    match cmd {
        RequestCommands::Create {
            profile,
            zone,
            price,
            count,
            valid_hours,
        } => {
            let launch_profile = config.profile(&profile)?;
            let spec = build_launch_spec(launch_profile, &zone, price, count, valid_hours, Utc::now())?;
            let requests = submit_spot_request(provider, &spec).await?;
            print_requests(&requests, output)
        }
        RequestCommands::List => {
            let requests = list_spot_requests(provider).await?;
            print_requests(&requests, output)
        }
        RequestCommands::Cancel { request_ids } => {
            let changes = cancel_spot_requests(provider, &request_ids).await?;
            print_state_changes(&changes, output, "No requests cancelled")
        }
    }
}

pub(crate) fn print_requests(requests: &[SpotRequestSummary], output: OutputFormat) -> Result<()> {
    if output.is_json() {
        return print_json(requests);
    }
    if requests.is_empty() {
        println!("No spot requests found");
    } else {
        println!("{}", spot_requests_table(requests));
    }
    Ok(())
}

/// Launch parameters from a profile plus the zone, price and count to request
pub fn build_launch_spec(
    profile: &LaunchProfile,
    zone: &str,
    price: f64,
    count: u32,
    valid_hours: Option<u32>,
    now: DateTime<Utc>,
) -> Result<SpotLaunchSpec> {
    validate_zone(zone)?;
    validate_price(price)?;
    validate_count(count)?;

    Ok(SpotLaunchSpec {
        instance_type: profile.instance_type.clone(),
        image_id: profile.image_id.clone(),
        key_name: profile.key_name.clone(),
        security_group_name: profile.security_group_name.clone(),
        security_group_id: profile.security_group_id.clone(),
        availability_zone: zone.to_string(),
        price,
        count,
        valid_until: valid_hours.map(|h| now + Duration::hours(i64::from(h))),
    })
}

pub async fn submit_spot_request(
    provider: &dyn SpotProvider,
    spec: &SpotLaunchSpec,
) -> Result<Vec<SpotRequestSummary>> {
    info!(
        "Requesting {} x {} in {} at ${:.4}/h",
        spec.count, spec.instance_type, spec.availability_zone, spec.price
    );
    provider.request_spot_instances(spec).await
}

/// All spot requests ordered by creation time
pub async fn list_spot_requests(provider: &dyn SpotProvider) -> Result<Vec<SpotRequestSummary>> {
    let mut requests = provider.spot_requests().await?;
    requests.sort_by(|a, b| {
        a.create_time
            .cmp(&b.create_time)
            .then_with(|| a.request_id.cmp(&b.request_id))
    });
    Ok(requests)
}

pub async fn cancel_spot_requests(
    provider: &dyn SpotProvider,
    request_ids: &[ResourceId],
) -> Result<Vec<StateChange>> {
    validate_ids(request_ids, validate_spot_request_id)?;
    provider.cancel_spot_requests(request_ids).await
}
