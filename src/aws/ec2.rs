use super::helpers::{
    cancelled_request_change, classify_sdk_error, instance_state_change, instance_summary,
    price_observation, spot_request_summary, to_sdk_tags, to_smithy, volume_summary,
};
use crate::error::{Result, SpotctlError};
use crate::pricing::{PriceObservation, PriceQuery};
use crate::provider::{
    InstanceSummary, ResourceId, ResourceTag, SpotLaunchSpec, SpotProvider, SpotRequestSummary,
    StateChange, VolumeSummary,
};
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};
use async_trait::async_trait;
use aws_sdk_ec2::types::{
    AvailabilityZoneState, InstanceType, RequestSpotLaunchSpecification, SpotInstanceType,
    SpotPlacement,
};
use aws_sdk_ec2::Client as Ec2Client;
use tracing::{debug, info};

/// `SpotProvider` backed by the EC2 API
///
/// Every call goes through the retry policy. List calls follow `NextToken`
/// until the last page.
pub struct Ec2Provider {
    client: Ec2Client,
    retry: ExponentialBackoffPolicy,
}

impl Ec2Provider {
    pub fn new(client: Ec2Client, retry: ExponentialBackoffPolicy) -> Self {
        Self { client, retry }
    }
}

fn client_token() -> String {
    format!("spotctl-{:016x}", fastrand::u64(..))
}

#[async_trait]
impl SpotProvider for Ec2Provider {
    async fn availability_zones(&self) -> Result<Vec<String>> {
        let client = &self.client;
        let response = self
            .retry
            .execute_with_retry(|| async move {
                client
                    .describe_availability_zones()
                    .send()
                    .await
                    .map_err(|e| classify_sdk_error("DescribeAvailabilityZones", e))
            })
            .await?;

        let mut zones: Vec<String> = response
            .availability_zones()
            .iter()
            .filter(|z| z.state() == Some(&AvailabilityZoneState::Available))
            .filter_map(|z| z.zone_name().map(str::to_string))
            .collect();
        zones.sort();
        debug!("{} available zones", zones.len());
        Ok(zones)
    }

    async fn spot_price_history(
        &self,
        query: &PriceQuery,
        zone: &str,
    ) -> Result<Vec<PriceObservation>> {
        let client = &self.client;
        let mut observations = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0;

        loop {
            let token = next_token.take();
            let page = self
                .retry
                .execute_with_retry(|| {
                    let token = token.clone();
                    async move {
                        client
                            .describe_spot_price_history()
                            .start_time(to_smithy(query.start_time))
                            .end_time(to_smithy(query.end_time))
                            .instance_types(InstanceType::from(query.instance_type.as_str()))
                            .product_descriptions(query.product.as_str())
                            .availability_zone(zone)
                            .set_next_token(token)
                            .send()
                            .await
                            .map_err(|e| classify_sdk_error("DescribeSpotPriceHistory", e))
                    }
                })
                .await?;

            pages += 1;
            observations.extend(page.spot_price_history().iter().filter_map(price_observation));
            next_token = page
                .next_token()
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        debug!(
            "{}: {} price points over {} page(s)",
            zone,
            observations.len(),
            pages
        );
        Ok(observations)
    }

    async fn request_spot_instances(&self, spec: &SpotLaunchSpec) -> Result<Vec<SpotRequestSummary>> {
        let count = i32::try_from(spec.count)
            .map_err(|_| SpotctlError::validation("count", "instance count is too large"))?;

        let mut launch = RequestSpotLaunchSpecification::builder()
            .image_id(&spec.image_id)
            .instance_type(InstanceType::from(spec.instance_type.as_str()))
            .placement(
                SpotPlacement::builder()
                    .availability_zone(&spec.availability_zone)
                    .build(),
            );
        if let Some(key_name) = &spec.key_name {
            launch = launch.key_name(key_name);
        }
        if let Some(group_name) = &spec.security_group_name {
            launch = launch.security_groups(group_name);
        }
        if let Some(group_id) = &spec.security_group_id {
            launch = launch.security_group_ids(group_id);
        }
        let launch = launch.build();

        let price = format!("{:.6}", spec.price);
        let valid_until = spec.valid_until.map(to_smithy);
        // Same token on every attempt so a retried call does not double the request
        let token = client_token();

        let client = &self.client;
        let response = self
            .retry
            .execute_with_retry(|| {
                let launch = launch.clone();
                let price = price.clone();
                let token = token.clone();
                let valid_until = valid_until.clone();
                async move {
                    client
                        .request_spot_instances()
                        .spot_price(price)
                        .instance_count(count)
                        .r#type(SpotInstanceType::OneTime)
                        .launch_specification(launch)
                        .set_valid_until(valid_until)
                        .client_token(token)
                        .send()
                        .await
                        .map_err(|e| classify_sdk_error("RequestSpotInstances", e))
                }
            })
            .await?;

        let requests: Vec<SpotRequestSummary> = response
            .spot_instance_requests()
            .iter()
            .filter_map(spot_request_summary)
            .collect();
        info!(
            "Requested {} x {} in {} at {}",
            spec.count, spec.instance_type, spec.availability_zone, price
        );
        Ok(requests)
    }

    async fn spot_requests(&self) -> Result<Vec<SpotRequestSummary>> {
        let client = &self.client;
        let mut requests = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let token = next_token.take();
            let page = self
                .retry
                .execute_with_retry(|| {
                    let token = token.clone();
                    async move {
                        client
                            .describe_spot_instance_requests()
                            .set_next_token(token)
                            .send()
                            .await
                            .map_err(|e| classify_sdk_error("DescribeSpotInstanceRequests", e))
                    }
                })
                .await?;

            requests.extend(
                page.spot_instance_requests()
                    .iter()
                    .filter_map(spot_request_summary),
            );
            next_token = page
                .next_token()
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok(requests)
    }

    async fn cancel_spot_requests(&self, request_ids: &[ResourceId]) -> Result<Vec<StateChange>> {
        let client = &self.client;
        let response = self
            .retry
            .execute_with_retry(|| async move {
                client
                    .cancel_spot_instance_requests()
                    .set_spot_instance_request_ids(Some(request_ids.to_vec()))
                    .send()
                    .await
                    .map_err(|e| classify_sdk_error("CancelSpotInstanceRequests", e))
            })
            .await?;

        Ok(response
            .cancelled_spot_instance_requests()
            .iter()
            .filter_map(cancelled_request_change)
            .collect())
    }

    async fn instances(&self) -> Result<Vec<InstanceSummary>> {
        let client = &self.client;
        let mut instances = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let token = next_token.take();
            let page = self
                .retry
                .execute_with_retry(|| {
                    let token = token.clone();
                    async move {
                        client
                            .describe_instances()
                            .set_next_token(token)
                            .send()
                            .await
                            .map_err(|e| classify_sdk_error("DescribeInstances", e))
                    }
                })
                .await?;

            instances.extend(
                page.reservations()
                    .iter()
                    .flat_map(|r| r.instances())
                    .filter_map(instance_summary),
            );
            next_token = page
                .next_token()
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok(instances)
    }

    async fn reboot_instances(&self, instance_ids: &[ResourceId]) -> Result<()> {
        let client = &self.client;
        self.retry
            .execute_with_retry(|| async move {
                client
                    .reboot_instances()
                    .set_instance_ids(Some(instance_ids.to_vec()))
                    .send()
                    .await
                    .map_err(|e| classify_sdk_error("RebootInstances", e))
            })
            .await?;
        info!("Reboot requested for {} instance(s)", instance_ids.len());
        Ok(())
    }

    async fn terminate_instances(&self, instance_ids: &[ResourceId]) -> Result<Vec<StateChange>> {
        let client = &self.client;
        let response = self
            .retry
            .execute_with_retry(|| async move {
                client
                    .terminate_instances()
                    .set_instance_ids(Some(instance_ids.to_vec()))
                    .send()
                    .await
                    .map_err(|e| classify_sdk_error("TerminateInstances", e))
            })
            .await?;

        Ok(response
            .terminating_instances()
            .iter()
            .filter_map(instance_state_change)
            .collect())
    }

    async fn create_tags(&self, resource_ids: &[ResourceId], tags: &[ResourceTag]) -> Result<()> {
        let client = &self.client;
        let sdk_tags = to_sdk_tags(tags);
        self.retry
            .execute_with_retry(|| {
                let sdk_tags = sdk_tags.clone();
                async move {
                    client
                        .create_tags()
                        .set_resources(Some(resource_ids.to_vec()))
                        .set_tags(Some(sdk_tags))
                        .send()
                        .await
                        .map_err(|e| classify_sdk_error("CreateTags", e))
                }
            })
            .await?;
        Ok(())
    }

    async fn volumes(&self) -> Result<Vec<VolumeSummary>> {
        let client = &self.client;
        let mut volumes = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let token = next_token.take();
            let page = self
                .retry
                .execute_with_retry(|| {
                    let token = token.clone();
                    async move {
                        client
                            .describe_volumes()
                            .set_next_token(token)
                            .send()
                            .await
                            .map_err(|e| classify_sdk_error("DescribeVolumes", e))
                    }
                })
                .await?;

            volumes.extend(page.volumes().iter().filter_map(volume_summary));
            next_token = page
                .next_token()
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok(volumes)
    }

    async fn delete_volume(&self, volume_id: &str) -> Result<()> {
        let client = &self.client;
        self.retry
            .execute_with_retry(|| async move {
                client
                    .delete_volume()
                    .volume_id(volume_id)
                    .send()
                    .await
                    .map_err(|e| classify_sdk_error("DeleteVolume", e))
            })
            .await?;
        info!("Deleted volume {}", volume_id);
        Ok(())
    }
}
