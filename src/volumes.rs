//! EBS volume commands: list, tag and delete

use crate::error::{Result, SpotctlError};
use crate::output::{print_json, volumes_table, OutputFormat};
use crate::provider::{ResourceId, ResourceTag, SpotProvider, VolumeSummary};
use crate::validation::{parse_tags, validate_ids, validate_volume_id, validate_zone};
use clap::Subcommand;
use tracing::info;

/// Volumes carrying this tag with value `true` need `--force` to delete
pub const PROTECTED_TAG: &str = "spotctl:protected";

#[derive(Subcommand, Clone, Debug)]
pub enum VolumeCommands {
    /// List EBS volumes
    List {
        /// Only volumes in this availability zone
        #[arg(long)]
        zone: Option<String>,
    },
    /// Add tags to volumes
    Tag {
        /// Volume IDs
        #[arg(required = true)]
        volume_ids: Vec<String>,
        /// Tag as KEY=VALUE (repeatable)
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
    },
    /// Delete volumes
    Delete {
        /// Volume IDs
        #[arg(required = true)]
        volume_ids: Vec<String>,
        /// Delete volumes tagged spotctl:protected=true
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    cmd: VolumeCommands,
    provider: &dyn SpotProvider,
    output: OutputFormat,
) -> Result<()> {
    match cmd {
        VolumeCommands::List { zone } => {
            let volumes = list_volumes(provider, zone.as_deref()).await?;
            if output.is_json() {
                print_json(&volumes)
            } else if volumes.is_empty() {
                println!("No volumes found");
                Ok(())
            } else {
                println!("{}", volumes_table(&volumes));
                Ok(())
            }
        }
        VolumeCommands::Tag { volume_ids, tags } => {
            let tags = tag_volumes(provider, &volume_ids, &tags).await?;
            if output.is_json() {
                print_json(&tags)
            } else {
                println!("Tagged {} volume(s)", volume_ids.len());
                Ok(())
            }
        }
        VolumeCommands::Delete { volume_ids, force } => {
            let deleted = delete_volumes(provider, &volume_ids, force).await?;
            if output.is_json() {
                print_json(&deleted)
            } else {
                for id in &deleted {
                    println!("{}: deleted", id);
                }
                Ok(())
            }
        }
    }
}

/// Volumes sorted by zone then ID, optionally restricted to one zone
pub async fn list_volumes(provider: &dyn SpotProvider, zone: Option<&str>) -> Result<Vec<VolumeSummary>> {
    if let Some(zone) = zone {
        validate_zone(zone)?;
    }
    let mut volumes: Vec<VolumeSummary> = provider
        .volumes()
        .await?
        .into_iter()
        .filter(|v| zone.is_none() || v.availability_zone.as_deref() == zone)
        .collect();
    volumes.sort_by(|a, b| {
        a.availability_zone
            .cmp(&b.availability_zone)
            .then_with(|| a.volume_id.cmp(&b.volume_id))
    });
    Ok(volumes)
}

pub async fn tag_volumes(
    provider: &dyn SpotProvider,
    volume_ids: &[ResourceId],
    raw_tags: &[String],
) -> Result<Vec<ResourceTag>> {
    validate_ids(volume_ids, validate_volume_id)?;
    let tags = parse_tags(raw_tags)?;
    provider.create_tags(volume_ids, &tags).await?;
    Ok(tags)
}

fn is_protected(volume: &VolumeSummary) -> bool {
    volume
        .tags
        .iter()
        .any(|t| t.key == PROTECTED_TAG && t.value.eq_ignore_ascii_case("true"))
}

/// Delete volumes after checking every one of them.
///
/// Nothing is deleted if any ID is unknown, attached to an instance, or
/// protected without `force`.
pub async fn delete_volumes(
    provider: &dyn SpotProvider,
    volume_ids: &[ResourceId],
    force: bool,
) -> Result<Vec<ResourceId>> {
    validate_ids(volume_ids, validate_volume_id)?;
    let known = provider.volumes().await?;

    for id in volume_ids {
        let volume = known
            .iter()
            .find(|v| &v.volume_id == id)
            .ok_or_else(|| SpotctlError::ResourceNotFound {
                resource_type: "volume".to_string(),
                resource_id: id.clone(),
            })?;

        if let Some(instance_id) = &volume.attached_to {
            return Err(SpotctlError::validation(
                "volume_id",
                format!("{} is attached to {}; detach it first", id, instance_id),
            ));
        }
        if is_protected(volume) && !force {
            return Err(SpotctlError::validation(
                "volume_id",
                format!(
                    "{} is tagged {}=true; use --force to delete it anyway",
                    id, PROTECTED_TAG
                ),
            ));
        }
    }

    let mut deleted = Vec::with_capacity(volume_ids.len());
    for id in volume_ids {
        provider.delete_volume(id).await?;
        deleted.push(id.clone());
    }
    info!("Deleted {} volume(s)", deleted.len());
    Ok(deleted)
}
