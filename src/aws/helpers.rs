//! Conversions between EC2 SDK types and `crate::provider` summaries
//!
//! Also classifies SDK errors: throttling and transport failures become the
//! retryable `CloudProvider` variant, everything else becomes `Aws`.

use crate::error::SpotctlError;
use crate::pricing::PriceObservation;
use crate::provider::{
    InstanceSummary, ResourceTag, SpotRequestSummary, StateChange, VolumeSummary,
};
use crate::utils::parse_price;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::primitives::DateTime as SmithyDateTime;
use aws_sdk_ec2::types::{
    CancelledSpotInstanceRequest, Instance, InstanceStateChange, SpotInstanceRequest, SpotPrice,
    Tag, Volume,
};
use chrono::{DateTime, Utc};

/// Service error codes EC2 returns for throttling and internal failures
const RETRYABLE_CODES: &[&str] = &[
    "RequestLimitExceeded",
    "Throttling",
    "ThrottlingException",
    "InternalError",
    "Unavailable",
    "ServiceUnavailable",
];

pub(crate) fn classify_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> SpotctlError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug + 'static,
{
    let transient = matches!(
        err,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_)
    );
    let throttled = err
        .as_service_error()
        .and_then(|e| e.code())
        .is_some_and(|code| RETRYABLE_CODES.contains(&code));
    let message = DisplayErrorContext(&err).to_string();

    if transient || throttled {
        SpotctlError::CloudProvider {
            operation: operation.to_string(),
            message,
        }
    } else {
        SpotctlError::Aws(format!("{} failed: {}", operation, message))
    }
}

pub(crate) fn to_chrono(dt: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos())
}

pub(crate) fn to_smithy(dt: DateTime<Utc>) -> SmithyDateTime {
    SmithyDateTime::from_secs_and_nanos(dt.timestamp(), dt.timestamp_subsec_nanos())
}

pub(crate) fn from_sdk_tags(tags: &[Tag]) -> Vec<ResourceTag> {
    tags.iter()
        .filter_map(|tag| tag.key().map(|k| ResourceTag::new(k, tag.value().unwrap_or(""))))
        .collect()
}

pub(crate) fn to_sdk_tags(tags: &[ResourceTag]) -> Vec<Tag> {
    tags.iter()
        .map(|t| Tag::builder().key(&t.key).value(&t.value).build())
        .collect()
}

/// Records with an unparseable price or timestamp are dropped
pub(crate) fn price_observation(record: &SpotPrice) -> Option<PriceObservation> {
    let price = record.spot_price().and_then(parse_price)?;
    let timestamp = record.timestamp().and_then(to_chrono)?;
    Some(PriceObservation::new(price, timestamp))
}

pub(crate) fn instance_summary(instance: &Instance) -> Option<InstanceSummary> {
    Some(InstanceSummary {
        instance_id: instance.instance_id()?.to_string(),
        image_id: instance.image_id().map(str::to_string),
        availability_zone: instance
            .placement()
            .and_then(|p| p.availability_zone())
            .map(str::to_string),
        instance_type: instance.instance_type().map(|t| t.as_str().to_string()),
        public_ip: instance.public_ip_address().map(str::to_string),
        private_ip: instance.private_ip_address().map(str::to_string),
        key_name: instance.key_name().map(str::to_string),
        state: instance
            .state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        launch_time: instance.launch_time().and_then(to_chrono),
        spot_request_id: instance.spot_instance_request_id().map(str::to_string),
        tags: from_sdk_tags(instance.tags()),
    })
}

pub(crate) fn spot_request_summary(request: &SpotInstanceRequest) -> Option<SpotRequestSummary> {
    let availability_zone = request
        .launched_availability_zone()
        .or_else(|| {
            request
                .launch_specification()
                .and_then(|spec| spec.placement())
                .and_then(|p| p.availability_zone())
        })
        .map(str::to_string);

    Some(SpotRequestSummary {
        request_id: request.spot_instance_request_id()?.to_string(),
        create_time: request.create_time().and_then(to_chrono),
        spot_price: request.spot_price().and_then(parse_price),
        instance_id: request.instance_id().map(str::to_string),
        valid_until: request.valid_until().and_then(to_chrono),
        state: request
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        status_code: request.status().and_then(|s| s.code()).map(str::to_string),
        status_message: request.status().and_then(|s| s.message()).map(str::to_string),
        availability_zone,
    })
}

pub(crate) fn volume_summary(volume: &Volume) -> Option<VolumeSummary> {
    Some(VolumeSummary {
        volume_id: volume.volume_id()?.to_string(),
        size_gb: volume.size(),
        volume_type: volume.volume_type().map(|t| t.as_str().to_string()),
        state: volume
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        availability_zone: volume.availability_zone().map(str::to_string),
        attached_to: volume
            .attachments()
            .first()
            .and_then(|a| a.instance_id())
            .map(str::to_string),
        create_time: volume.create_time().and_then(to_chrono),
        tags: from_sdk_tags(volume.tags()),
    })
}

pub(crate) fn instance_state_change(change: &InstanceStateChange) -> Option<StateChange> {
    Some(StateChange {
        resource_id: change.instance_id()?.to_string(),
        previous_state: change
            .previous_state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string()),
        current_state: change
            .current_state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    })
}

pub(crate) fn cancelled_request_change(cancelled: &CancelledSpotInstanceRequest) -> Option<StateChange> {
    Some(StateChange {
        resource_id: cancelled.spot_instance_request_id()?.to_string(),
        previous_state: None,
        current_state: cancelled
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    })
}
