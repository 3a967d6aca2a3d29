//! Input validation utilities
//!
//! Checks command-line input before any EC2 call is made.

use crate::error::{Result, SpotctlError};
use crate::provider::ResourceTag;

fn validate_prefixed_id(field: &str, id: &str, prefix: &str, min: usize, max: usize) -> Result<()> {
    let Some(rest) = id.strip_prefix(prefix) else {
        return Err(SpotctlError::validation(
            field,
            format!("must start with '{}', got: {}", prefix, id),
        ));
    };

    if rest.len() < min || rest.len() > max {
        return Err(SpotctlError::validation(
            field,
            format!(
                "expected {}-{} characters after '{}', got: {} (len: {})",
                min,
                max,
                prefix,
                id,
                rest.len()
            ),
        ));
    }

    if !rest.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SpotctlError::validation(
            field,
            format!(
                "must contain only alphanumeric characters after '{}', got: {}",
                prefix, id
            ),
        ));
    }

    Ok(())
}

/// Instance IDs are "i-" followed by 8 to 17 alphanumeric characters
pub fn validate_instance_id(instance_id: &str) -> Result<()> {
    validate_prefixed_id("instance_id", instance_id, "i-", 8, 17)
}

/// Volume IDs are "vol-" followed by 8 to 17 alphanumeric characters
pub fn validate_volume_id(volume_id: &str) -> Result<()> {
    validate_prefixed_id("volume_id", volume_id, "vol-", 8, 17)
}

pub fn validate_spot_request_id(request_id: &str) -> Result<()> {
    validate_prefixed_id("spot_request_id", request_id, "sir-", 8, 17)
}

pub fn validate_ids(ids: &[String], validate: fn(&str) -> Result<()>) -> Result<()> {
    if ids.is_empty() {
        return Err(SpotctlError::validation("ids", "at least one ID is required"));
    }
    ids.iter().try_for_each(|id| validate(id))
}

/// Availability zone names look like "us-east-1a" or "us-west-2-lax-1a"
pub fn validate_zone(zone: &str) -> Result<()> {
    let well_formed = zone.contains('-')
        && zone
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && zone.chars().last().is_some_and(|c| c.is_ascii_lowercase());
    if !well_formed {
        return Err(SpotctlError::validation(
            "availability_zone",
            format!("not a valid availability zone name: {}", zone),
        ));
    }
    Ok(())
}

/// Bid prices are dollars per instance-hour
pub fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(SpotctlError::validation(
            "price",
            format!("bid price must be a positive number, got: {}", price),
        ));
    }
    Ok(())
}

pub fn validate_count(count: u32) -> Result<()> {
    if count == 0 {
        return Err(SpotctlError::validation(
            "count",
            "instance count must be at least 1",
        ));
    }
    Ok(())
}

/// Parse a `KEY=VALUE` tag. The value may be empty; the key may not.
pub fn parse_tag(input: &str) -> Result<ResourceTag> {
    let Some((key, value)) = input.split_once('=') else {
        return Err(SpotctlError::validation(
            "tag",
            format!("expected KEY=VALUE, got: {}", input),
        ));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(SpotctlError::validation("tag", "tag key cannot be empty"));
    }
    if key.len() > 128 || value.len() > 256 {
        return Err(SpotctlError::validation(
            "tag",
            "tag keys are limited to 128 and values to 256 characters",
        ));
    }
    if key.to_ascii_lowercase().starts_with("aws:") {
        return Err(SpotctlError::validation(
            "tag",
            format!("the 'aws:' prefix is reserved, got: {}", key),
        ));
    }
    Ok(ResourceTag::new(key, value))
}

/// Parse every `KEY=VALUE` argument; at least one is required
pub fn parse_tags(inputs: &[String]) -> Result<Vec<ResourceTag>> {
    if inputs.is_empty() {
        return Err(SpotctlError::validation("tag", "at least one --tag KEY=VALUE is required"));
    }
    inputs.iter().map(|input| parse_tag(input)).collect()
}
