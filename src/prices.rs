//! Price commands: per-zone history statistics and bid recommendations

use crate::config::Config;
use crate::error::{Result, SpotctlError};
use crate::output::{price_summary_table, print_json, OutputFormat};
use crate::pricing::{
    fetch_price_history, recommend, PriceHistory, PriceQuery, Recommendation, ZoneSummary,
};
use crate::provider::{SpotProvider, SpotRequestSummary};
use crate::requests::{build_launch_spec, print_requests, submit_spot_request};
use crate::utils::format_price;
use crate::zones::resolve_zones;
use chrono::{Duration, Utc};
use clap::Subcommand;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

#[derive(Subcommand, Clone, Debug)]
pub enum PriceCommands {
    /// Show spot price statistics per zone
    History {
        /// Launch profile name from the config file
        profile: String,
        /// Hours of history to fetch (default from config)
        #[arg(long)]
        hours: Option<u32>,
        /// Restrict to these zones (repeatable; default all available zones)
        #[arg(long = "zone")]
        zones: Vec<String>,
    },
    /// Recommend a zone and bid price
    Recommend {
        /// Launch profile name from the config file
        profile: String,
        /// Hours of history to fetch (default from config)
        #[arg(long)]
        hours: Option<u32>,
        /// Restrict to these zones (repeatable; default all available zones)
        #[arg(long = "zone")]
        zones: Vec<String>,
        /// Request this many instances at the recommended zone and price
        #[arg(long)]
        request: Option<u32>,
        /// Expire the request after this many hours
        #[arg(long, requires = "request")]
        valid_hours: Option<u32>,
    },
}

/// Everything `prices history` and `prices recommend` report
#[derive(Debug, Clone, Serialize)]
pub struct PriceReport {
    pub profile: String,
    pub query: PriceQuery,
    pub zones: Vec<ZoneSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<SpotRequestSummary>,
}

pub async fn handle_command(
    cmd: PriceCommands,
    config: &Config,
    provider: &dyn SpotProvider,
    output: OutputFormat,
) -> Result<()> {
    match cmd {
        PriceCommands::History {
            profile,
            hours,
            zones,
        } => {
            let report = price_history(provider, config, &profile, hours, &zones, output).await?;
            if output.is_json() {
                return print_json(&report);
            }
            print_summary(&report);
            Ok(())
        }
        PriceCommands::Recommend {
            profile,
            hours,
            zones,
            request,
            valid_hours,
        } => {
            let mut report =
                price_recommendation(provider, config, &profile, hours, &zones, output).await?;

            if let (Some(count), Some(rec)) = (request, report.recommendation.as_ref()) {
                let launch_profile = config.profile(&profile)?;
                let spec = build_launch_spec(
                    launch_profile,
                    &rec.zone,
                    rec.price,
                    count,
                    valid_hours,
                    Utc::now(),
                )?;
                report.requests = submit_spot_request(provider, &spec).await?;
            }

            if output.is_json() {
                return print_json(&report);
            }
            print_summary(&report);
            if let Some(rec) = &report.recommendation {
                println!(
                    "{} {} at {}/h for {}",
                    style("Recommended:").green().bold(),
                    rec.zone,
                    format_price(rec.price),
                    report.query.instance_type
                );
            }
            if request.is_some() {
                print_requests(&report.requests, output)?;
            }
            Ok(())
        }
    }
}

fn print_summary(report: &PriceReport) {
    let best = report.recommendation.as_ref().map(|r| r.zone.as_str());
    println!(
        "{} ({}) from {} to {}",
        report.query.instance_type,
        report.query.product,
        report.query.start_time.format("%Y-%m-%d %H:%M"),
        report.query.end_time.format("%Y-%m-%d %H:%M UTC")
    );
    println!("{}", price_summary_table(&report.zones, best));
}

fn progress_bar(zones: usize, output: OutputFormat) -> ProgressBar {
    if output.is_json() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(zones as u64);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} zones")
    {
        pb.set_style(bar_style);
    }
    pb
}

/// Fetch history for a profile's instance type and product
pub async fn load_history(
    provider: &dyn SpotProvider,
    config: &Config,
    profile: &str,
    hours: Option<u32>,
    zones: &[String],
    output: OutputFormat,
) -> Result<(PriceQuery, PriceHistory)> {
    let launch_profile = config.profile(profile)?;
    let hours = hours.unwrap_or(config.pricing.lookback_hours);
    if hours == 0 {
        return Err(SpotctlError::validation("hours", "lookback must be at least one hour"));
    }

    let zones = resolve_zones(provider, zones).await?;
    let query = PriceQuery::for_profile(launch_profile, Duration::hours(i64::from(hours)), Utc::now());

    let pb = progress_bar(zones.len(), output);
    let history = fetch_price_history(
        provider,
        &zones,
        &query,
        config.pricing.max_zone_requests,
        &pb,
    )
    .await;
    pb.finish_and_clear();
    Ok((query, history?))
}

pub async fn price_history(
    provider: &dyn SpotProvider,
    config: &Config,
    profile: &str,
    hours: Option<u32>,
    zones: &[String],
    output: OutputFormat,
) -> Result<PriceReport> {
    let (query, history) = load_history(provider, config, profile, hours, zones, output).await?;
    Ok(PriceReport {
        profile: profile.to_string(),
        query,
        zones: ZoneSummary::for_history(&history),
        recommendation: None,
        requests: Vec::new(),
    })
}

/// History plus the recommended zone and bid; fails when no zone has data
pub async fn price_recommendation(
    provider: &dyn SpotProvider,
    config: &Config,
    profile: &str,
    hours: Option<u32>,
    zones: &[String],
    output: OutputFormat,
) -> Result<PriceReport> {
    let (query, history) = load_history(provider, config, profile, hours, zones, output).await?;
    let recommendation = recommend(&history)?;
    Ok(PriceReport {
        profile: profile.to_string(),
        query,
        zones: ZoneSummary::for_history(&history),
        recommendation: Some(recommendation),
        requests: Vec::new(),
    })
}
