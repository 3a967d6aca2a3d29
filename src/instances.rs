//! Instance commands: list, reboot, terminate and tag

use crate::error::Result;
use crate::output::{format_state_changes, instances_table, print_json, OutputFormat};
use crate::provider::{InstanceSummary, ResourceId, ResourceTag, SpotProvider, StateChange};
use crate::validation::{parse_tags, validate_ids, validate_instance_id};
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Clone, Debug)]
pub enum InstanceCommands {
    /// List instances, oldest launch first
    List,
    /// Reboot instances
    Reboot {
        /// Instance IDs
        #[arg(required = true)]
        instance_ids: Vec<String>,
    },
    /// Terminate instances
    Terminate {
        /// Instance IDs
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        instance_ids: Vec<String>,
        /// Terminate every instance that is not already terminated
        #[arg(long)]
        all: bool,
    },
    /// Add tags to instances
    Tag {
        /// Instance IDs
        #[arg(required = true)]
        instance_ids: Vec<String>,
        /// Tag as KEY=VALUE (repeatable)
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
    },
}

pub async fn handle_command(
    cmd: InstanceCommands,
    provider: &dyn SpotProvider,
    output: OutputFormat,
) -> Result<()> {
    match cmd {
        InstanceCommands::List => {
            let instances = list_instances(provider).await?;
            if output.is_json() {
                print_json(&instances)
            } else if instances.is_empty() {
                println!("No instances found");
                Ok(())
            } else {
                println!("{}", instances_table(&instances));
                Ok(())
            }
        }
        InstanceCommands::Reboot { instance_ids } => {
            reboot_instances(provider, &instance_ids).await?;
            if output.is_json() {
                print_json(&instance_ids)
            } else {
                println!("Reboot requested for {}", instance_ids.join(", "));
                Ok(())
            }
        }
        InstanceCommands::Terminate { instance_ids, all } => {
            let changes = if all {
                terminate_all_instances(provider).await?
            } else {
                terminate_instances(provider, &instance_ids).await?
            };
            print_state_changes(&changes, output, "No instances to terminate")
        }
        InstanceCommands::Tag { instance_ids, tags } => {
            let tags = tag_instances(provider, &instance_ids, &tags).await?;
            if output.is_json() {
                print_json(&tags)
            } else {
                println!("Tagged {} instance(s)", instance_ids.len());
                Ok(())
            }
        }
    }
}

pub(crate) fn print_state_changes(
    changes: &[StateChange],
    output: OutputFormat,
    empty_message: &str,
) -> Result<()> {
    if output.is_json() {
        return print_json(changes);
    }
    if changes.is_empty() {
        println!("{}", empty_message);
    } else {
        println!("{}", format_state_changes(changes));
    }
    Ok(())
}

/// All instances ordered by launch time, instances without one first
pub async fn list_instances(provider: &dyn SpotProvider) -> Result<Vec<InstanceSummary>> {
    let mut instances = provider.instances().await?;
    instances.sort_by(|a, b| {
        a.launch_time
            .cmp(&b.launch_time)
            .then_with(|| a.instance_id.cmp(&b.instance_id))
    });
    Ok(instances)
}

pub async fn reboot_instances(provider: &dyn SpotProvider, instance_ids: &[ResourceId]) -> Result<()> {
    validate_ids(instance_ids, validate_instance_id)?;
    provider.reboot_instances(instance_ids).await
}

pub async fn terminate_instances(
    provider: &dyn SpotProvider,
    instance_ids: &[ResourceId],
) -> Result<Vec<StateChange>> {
    validate_ids(instance_ids, validate_instance_id)?;
    info!("Terminating {}", instance_ids.join(", "));
    provider.terminate_instances(instance_ids).await
}

/// Terminate every instance not already terminated or shutting down.
///
/// Makes no terminate call when nothing is left to terminate.
pub async fn terminate_all_instances(provider: &dyn SpotProvider) -> Result<Vec<StateChange>> {
    let targets: Vec<ResourceId> = provider
        .instances()
        .await?
        .into_iter()
        .filter(|i| !i.is_terminated())
        .map(|i| i.instance_id)
        .collect();

    if targets.is_empty() {
        info!("No running instances to terminate");
        return Ok(Vec::new());
    }
    info!("Terminating all {} instance(s)", targets.len());
    provider.terminate_instances(&targets).await
}

pub async fn tag_instances(
    provider: &dyn SpotProvider,
    instance_ids: &[ResourceId],
    raw_tags: &[String],
) -> Result<Vec<ResourceTag>> {
    validate_ids(instance_ids, validate_instance_id)?;
    let tags = parse_tags(raw_tags)?;
    provider.create_tags(instance_ids, &tags).await?;
    Ok(tags)
}
