use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use spotctl::config::{self, Config};
use spotctl::exit_codes::exit_code_for_anyhow;
use spotctl::output::{print_json, profiles_table, OutputFormat};
use spotctl::{aws, instances, prices, requests, volumes, zones};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spotctl")]
#[command(
    about = "EC2 spot price analysis and instance console",
    long_about = "spotctl recommends an availability zone and bid for EC2 spot instances from recent price history, and manages the resulting spot requests, instances and volumes.\n\nLaunch profiles (instance type, product, AMI, key, security group) live in the config file; run `spotctl init` to create one."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// AWS region (overrides the config file)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Named AWS profile (overrides the config file)
    #[arg(long, global = true)]
    aws_profile: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example configuration file
    Init {
        /// Output path for config file
        #[arg(default_value = ".spotctl.toml")]
        path: PathBuf,
    },
    /// List launch profiles from the config file
    Profiles,
    /// List available zones in the region
    Zones,
    /// Spot price history and bid recommendations
    Prices {
        #[command(subcommand)]
        subcommand: prices::PriceCommands,
    },
    /// Create, list and cancel spot requests
    Requests {
        #[command(subcommand)]
        subcommand: requests::RequestCommands,
    },
    /// List, reboot, terminate and tag instances
    Instances {
        #[command(subcommand)]
        subcommand: instances::InstanceCommands,
    },
    /// List, tag and delete EBS volumes
    Volumes {
        #[command(subcommand)]
        subcommand: volumes::VolumeCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Warnings only unless --verbose; RUST_LOG takes precedence when set
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(exit_code_for_anyhow(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { path } = &cli.command {
        return config::init_config(path);
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(region) = cli.region {
        config.aws.region = Some(region);
    }
    if let Some(profile) = cli.aws_profile {
        config.aws.profile = Some(profile);
    }

    if let Commands::Profiles = cli.command {
        if cli.output.is_json() {
            print_json(&config.profiles)?;
        } else if config.profiles.is_empty() {
            println!("No launch profiles configured. Run `spotctl init` to create an example.");
        } else {
            println!("{}", profiles_table(&config.profiles));
        }
        return Ok(());
    }

    let provider = aws::connect(&config).await;
    let output = cli.output;

    match cli.command {
        Commands::Zones => zones::list_zones(&provider, output).await?,
        Commands::Prices { subcommand } => {
            prices::handle_command(subcommand, &config, &provider, output).await?
        }
        Commands::Requests { subcommand } => {
            requests::handle_command(subcommand, &config, &provider, output).await?
        }
        Commands::Instances { subcommand } => {
            instances::handle_command(subcommand, &provider, output).await?
        }
        Commands::Volumes { subcommand } => {
            volumes::handle_command(subcommand, &provider, output).await?
        }
        Commands::Init { .. } | Commands::Profiles => {}
    }

    Ok(())
}
