//! Text tables and JSON output for listings
//!
//! Every listing function returns a `comfy_table::Table`; callers print it.
//! JSON output serializes the same summaries the tables are built from.

use crate::config::LaunchProfile;
use crate::error::Result;
use crate::pricing::ZoneSummary;
use crate::provider::{InstanceSummary, SpotRequestSummary, StateChange, VolumeSummary};
use crate::utils::{format_price, format_runtime, format_timestamp};
use clap::ValueEnum;
use comfy_table::{Cell, Color, Table};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == OutputFormat::Json
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Green for healthy states, yellow for transitional ones, red for finished ones
pub fn state_cell(state: &str) -> Cell {
    let color = match state {
        "running" | "active" | "fulfilled" | "available" | "in-use" => Some(Color::Green),
        "pending" | "open" | "stopping" | "stopped" | "creating" | "rebooting" => {
            Some(Color::Yellow)
        }
        "terminated" | "shutting-down" | "cancelled" | "closed" | "failed" | "deleting"
        | "deleted" | "error" => Some(Color::Red),
        _ => None,
    };
    match color {
        Some(color) => Cell::new(state).fg(color),
        None => Cell::new(state),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

pub fn instances_table(instances: &[InstanceSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Name",
        "Instance ID",
        "State",
        "Type",
        "Image",
        "Zone",
        "Public IP",
        "Private IP",
        "Key",
        "Launched",
        "Runtime",
        "Spot Request",
    ]);

    for inst in instances {
        let runtime = if inst.is_terminated() {
            None
        } else {
            format_runtime(inst.launch_time)
        };
        table.add_row(vec![
            Cell::new(or_dash(inst.name())),
            Cell::new(&inst.instance_id),
            state_cell(&inst.state),
            Cell::new(or_dash(inst.instance_type.as_deref())),
            Cell::new(or_dash(inst.image_id.as_deref())),
            Cell::new(or_dash(inst.availability_zone.as_deref())),
            Cell::new(or_dash(inst.public_ip.as_deref())),
            Cell::new(or_dash(inst.private_ip.as_deref())),
            Cell::new(or_dash(inst.key_name.as_deref())),
            Cell::new(format_timestamp(inst.launch_time)),
            Cell::new(runtime.as_deref().unwrap_or("-")),
            Cell::new(or_dash(inst.spot_request_id.as_deref())),
        ]);
    }
    table
}

pub fn spot_requests_table(requests: &[SpotRequestSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Request ID",
        "State",
        "Status",
        "Price",
        "Zone",
        "Instance ID",
        "Created",
        "Valid Until",
    ]);

    for req in requests {
        table.add_row(vec![
            Cell::new(&req.request_id),
            state_cell(&req.state),
            Cell::new(or_dash(req.status_code.as_deref())),
            Cell::new(req.spot_price.map(format_price).unwrap_or_else(|| "-".to_string())),
            Cell::new(or_dash(req.availability_zone.as_deref())),
            Cell::new(or_dash(req.instance_id.as_deref())),
            Cell::new(format_timestamp(req.create_time)),
            Cell::new(format_timestamp(req.valid_until)),
        ]);
    }
    table
}

pub fn volumes_table(volumes: &[VolumeSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Name",
        "Volume ID",
        "Size (GB)",
        "Type",
        "State",
        "Zone",
        "Attached To",
        "Created",
    ]);

    for vol in volumes {
        table.add_row(vec![
            Cell::new(or_dash(vol.name())),
            Cell::new(&vol.volume_id),
            Cell::new(
                vol.size_gb
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(or_dash(vol.volume_type.as_deref())),
            state_cell(&vol.state),
            Cell::new(or_dash(vol.availability_zone.as_deref())),
            Cell::new(or_dash(vol.attached_to.as_deref())),
            Cell::new(format_timestamp(vol.create_time)),
        ]);
    }
    table
}

/// Per-zone statistics; `best_zone` is highlighted when given
pub fn price_summary_table(summaries: &[ZoneSummary], best_zone: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Zone", "Current", "Min", "Max", "Mean", "Std Dev", "Risk", "Points", "Last Update",
    ]);

    for s in summaries {
        let zone = if best_zone == Some(s.zone.as_str()) {
            Cell::new(&s.zone).fg(Color::Green)
        } else {
            Cell::new(&s.zone)
        };
        table.add_row(vec![
            zone,
            Cell::new(format_price(s.current)),
            Cell::new(format_price(s.min)),
            Cell::new(format_price(s.max)),
            Cell::new(format_price(s.mean)),
            Cell::new(format!("{:.4}", s.std_dev)),
            Cell::new(format_price(s.risk)),
            Cell::new(s.points),
            Cell::new(format_timestamp(Some(s.last_update))),
        ]);
    }
    table
}

pub fn profiles_table(profiles: &BTreeMap<String, LaunchProfile>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Profile",
        "Instance Type",
        "Product",
        "Image",
        "Key",
        "Security Group",
    ]);

    for (name, profile) in profiles {
        let group = profile
            .security_group_id
            .as_deref()
            .or(profile.security_group_name.as_deref());
        table.add_row(vec![
            Cell::new(name),
            Cell::new(&profile.instance_type),
            Cell::new(&profile.product),
            Cell::new(&profile.image_id),
            Cell::new(or_dash(profile.key_name.as_deref())),
            Cell::new(or_dash(group)),
        ]);
    }
    table
}

/// One `id: state` line per change, as printed after terminate and cancel
pub fn format_state_changes(changes: &[StateChange]) -> String {
    changes
        .iter()
        .map(|c| match &c.previous_state {
            Some(prev) => format!("{}: {} -> {}", c.resource_id, prev, c.current_state),
            None => format!("{}: {}", c.resource_id, c.current_state),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
