//! EC2 backend for `SpotProvider`
//!
//! - `ec2`: `Ec2Provider`, the trait implementation over `aws_sdk_ec2::Client`
//! - `helpers`: SDK type conversions and error classification
//!
//! Credentials come from the standard AWS chain. `[aws]` in the config file
//! (or `--region` / `--aws-profile`) pins the region and named profile.

mod ec2;
mod helpers;

pub use ec2::Ec2Provider;

use crate::config::{AwsConfig, Config};
use crate::retry::ExponentialBackoffPolicy;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::Client as Ec2Client;
use tracing::debug;

/// Load the shared SDK config for the configured region and profile
pub async fn load_sdk_config(aws: &AwsConfig) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &aws.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &aws.profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}

/// Build an `Ec2Provider` from the loaded configuration
pub async fn connect(config: &Config) -> Ec2Provider {
    let sdk_config = load_sdk_config(&config.aws).await;
    debug!(
        "Using region {}",
        sdk_config
            .region()
            .map(|r| r.as_ref().to_string())
            .unwrap_or_else(|| "<default>".to_string())
    );
    Ec2Provider::new(
        Ec2Client::new(&sdk_config),
        ExponentialBackoffPolicy::from_config(&config.retry),
    )
}
