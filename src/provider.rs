//! Cloud provider seam for spot operations
//!
//! Console commands talk to EC2 only through `SpotProvider`. The production
//! implementation is `crate::aws::Ec2Provider`; tests substitute a mock.
//! Every method is a single logical remote operation (pagination and retries
//! are the implementation's concern) and returns provider-agnostic summaries.

use crate::error::Result;
use crate::pricing::{PriceObservation, PriceQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resource identifier (instance ID, volume ID, spot request ID)
pub type ResourceId = String;

/// Key/value tag attached to an instance or volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTag {
    pub key: String,
    pub value: String,
}

impl ResourceTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

fn name_tag(tags: &[ResourceTag]) -> Option<&str> {
    tags.iter()
        .find(|tag| tag.key == "Name")
        .map(|tag| tag.value.as_str())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub instance_id: ResourceId,
    pub image_id: Option<String>,
    pub availability_zone: Option<String>,
    pub instance_type: Option<String>,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub key_name: Option<String>,
    pub state: String,
    pub launch_time: Option<DateTime<Utc>>,
    pub spot_request_id: Option<ResourceId>,
    pub tags: Vec<ResourceTag>,
}

impl InstanceSummary {
    pub fn name(&self) -> Option<&str> {
        name_tag(&self.tags)
    }

    /// Terminated instances stay visible in DescribeInstances for about an hour
    pub fn is_terminated(&self) -> bool {
        matches!(self.state.as_str(), "terminated" | "shutting-down")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotRequestSummary {
    pub request_id: ResourceId,
    pub create_time: Option<DateTime<Utc>>,
    pub spot_price: Option<f64>,
    pub instance_id: Option<ResourceId>,
    pub valid_until: Option<DateTime<Utc>>,
    pub state: String,
    pub status_code: Option<String>,
    pub status_message: Option<String>,
    pub availability_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub volume_id: ResourceId,
    pub size_gb: Option<i32>,
    pub volume_type: Option<String>,
    pub state: String,
    pub availability_zone: Option<String>,
    pub attached_to: Option<ResourceId>,
    pub create_time: Option<DateTime<Utc>>,
    pub tags: Vec<ResourceTag>,
}

impl VolumeSummary {
    pub fn name(&self) -> Option<&str> {
        name_tag(&self.tags)
    }
}

/// Result of a terminate or cancel call for one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub resource_id: ResourceId,
    pub previous_state: Option<String>,
    pub current_state: String,
}

/// Everything needed to submit a one-time spot request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotLaunchSpec {
    pub instance_type: String,
    pub image_id: String,
    pub key_name: Option<String>,
    pub security_group_name: Option<String>,
    pub security_group_id: Option<String>,
    pub availability_zone: String,
    pub price: f64,
    pub count: u32,
    /// Request expires at this instant when set
    pub valid_until: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SpotProvider: Send + Sync {
    /// Names of zones in the `available` state, sorted
    async fn availability_zones(&self) -> Result<Vec<String>>;

    /// Raw spot price records for one zone, all pages
    async fn spot_price_history(
        &self,
        query: &PriceQuery,
        zone: &str,
    ) -> Result<Vec<PriceObservation>>;

    async fn request_spot_instances(&self, spec: &SpotLaunchSpec) -> Result<Vec<SpotRequestSummary>>;

    async fn spot_requests(&self) -> Result<Vec<SpotRequestSummary>>;

    async fn cancel_spot_requests(&self, request_ids: &[ResourceId]) -> Result<Vec<StateChange>>;

    async fn instances(&self) -> Result<Vec<InstanceSummary>>;

    async fn reboot_instances(&self, instance_ids: &[ResourceId]) -> Result<()>;

    async fn terminate_instances(&self, instance_ids: &[ResourceId]) -> Result<Vec<StateChange>>;

    async fn create_tags(&self, resource_ids: &[ResourceId], tags: &[ResourceTag]) -> Result<()>;

    async fn volumes(&self) -> Result<Vec<VolumeSummary>>;

    async fn delete_volume(&self, volume_id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(state: &str, tags: Vec<ResourceTag>) -> InstanceSummary {
        InstanceSummary {
            instance_id: "i-0123456789abcdef0".to_string(),
            image_id: None,
            availability_zone: None,
            instance_type: None,
            public_ip: None,
            private_ip: None,
            key_name: None,
            state: state.to_string(),
            launch_time: None,
            spot_request_id: None,
            tags,
        }
    }

    #[test]
    fn test_instance_name_tag() {
        let named = instance(
            "running",
            vec![
                ResourceTag::new("team", "ml"),
                ResourceTag::new("Name", "worker-1"),
            ],
        );
        assert_eq!(named.name(), Some("worker-1"));
        assert_eq!(instance("running", vec![]).name(), None);
    }

    #[test]
    fn test_is_terminated() {
        assert!(instance("terminated", vec![]).is_terminated());
        assert!(instance("shutting-down", vec![]).is_terminated());
        assert!(!instance("running", vec![]).is_terminated());
        assert!(!instance("stopped", vec![]).is_terminated());
    }
}
