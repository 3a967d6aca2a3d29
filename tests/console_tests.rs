//! Console operations against a mocked `SpotProvider`

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use mockall::mock;
use spotctl::config::Config;
use spotctl::error::{Result, SpotctlError};
use spotctl::instances::{
    list_instances, reboot_instances, tag_instances, terminate_all_instances, terminate_instances,
};
use spotctl::output::OutputFormat;
use spotctl::prices::{price_history, price_recommendation};
use spotctl::pricing::{PriceObservation, PriceQuery};
use spotctl::provider::{
    InstanceSummary, ResourceId, ResourceTag, SpotLaunchSpec, SpotProvider, SpotRequestSummary,
    StateChange, VolumeSummary,
};
use spotctl::requests::{build_launch_spec, cancel_spot_requests, list_spot_requests};
use spotctl::volumes::{delete_volumes, list_volumes, tag_volumes, PROTECTED_TAG};
use spotctl::zones::resolve_zones;

mock! {
    pub Provider {}

    #[async_trait]
    impl SpotProvider for Provider {
        async fn availability_zones(&self) -> Result<Vec<String>>;
        async fn spot_price_history(&self, query: &PriceQuery, zone: &str) -> Result<Vec<PriceObservation>>;
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
}

fn instance(id: &str, state: &str, launched_hours_ago: Option<i64>) -> InstanceSummary {
    InstanceSummary {
        instance_id: id.to_string(),
        image_id: Some("ami-08fa3ed5577079e64".to_string()),
        availability_zone: Some("us-east-1b".to_string()),
        instance_type: Some("c5.xlarge".to_string()),
        public_ip: None,
        private_ip: None,
        key_name: None,
        state: state.to_string(),
        launch_time: launched_hours_ago.map(|h| Utc::now() - Duration::hours(h)),
        spot_request_id: None,
        tags: Vec::new(),
    }
}

fn volume(id: &str, zone: &str, attached_to: Option<&str>, tags: Vec<ResourceTag>) -> VolumeSummary {
    VolumeSummary {
        volume_id: id.to_string(),
        size_gb: Some(8),
        volume_type: Some("gp3".to_string()),
        state: if attached_to.is_some() { "in-use" } else { "available" }.to_string(),
        availability_zone: Some(zone.to_string()),
        attached_to: attached_to.map(str::to_string),
        create_time: None,
        tags,
    }
}

fn terminating(id: &str) -> StateChange {
    StateChange {
        resource_id: id.to_string(),
        previous_state: Some("running".to_string()),
        current_state: "shutting-down".to_string(),
    }
}

const I_A: &str = "i-0a1b2c3d4e5f60001";
const I_B: &str = "i-0a1b2c3d4e5f60002";
const I_C: &str = "i-0a1b2c3d4e5f60003";
const VOL_A: &str = "vol-049df61146c4d7901";
const VOL_B: &str = "vol-049df61146c4d7902";

#[tokio::test]
async fn test_list_instances_oldest_first() {
    let mut provider = MockProvider::new();
    provider.expect_instances().returning(|| {
        Ok(vec![
            instance(I_A, "running", Some(1)),
            instance(I_B, "running", Some(5)),
            instance(I_C, "pending", None),
        ])
    });

    let ids: Vec<String> = list_instances(&provider)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.instance_id)
        .collect();
    assert_eq!(ids, vec![I_C, I_B, I_A]);
}

#[tokio::test]
async fn test_terminate_all_skips_terminated() {
    let mut provider = MockProvider::new();
    provider.expect_instances().returning(|| {
        Ok(vec![
            instance(I_A, "running", Some(2)),
            instance(I_B, "terminated", Some(9)),
            instance(I_C, "shutting-down", Some(3)),
        ])
    });
    provider
        .expect_terminate_instances()
        .withf(|ids| ids == [I_A.to_string()])
        .times(1)
        .returning(|ids| Ok(ids.iter().map(|id| terminating(id)).collect()));

    let changes = terminate_all_instances(&provider).await.unwrap();
    assert_eq!(changes, vec![terminating(I_A)]);
}

#[tokio::test]
async fn test_terminate_all_with_nothing_running() {
    let mut provider = MockProvider::new();
    provider
        .expect_instances()
        .returning(|| Ok(vec![instance(I_B, "terminated", Some(9))]));
    provider.expect_terminate_instances().never();

    assert!(terminate_all_instances(&provider).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_ids_never_reach_provider() {
    let mut provider = MockProvider::new();
    provider.expect_terminate_instances().never();
    provider.expect_reboot_instances().never();
    provider.expect_cancel_spot_requests().never();

    let bad = vec!["web-server".to_string()];
    assert!(matches!(
        terminate_instances(&provider, &bad).await,
        Err(SpotctlError::Validation { .. })
    ));
    assert!(reboot_instances(&provider, &[]).await.is_err());
    assert!(cancel_spot_requests(&provider, &[I_A.to_string()]).await.is_err());
}

#[tokio::test]
async fn test_tag_instances_parses_tags() {
    let mut provider = MockProvider::new();
    provider
        .expect_create_tags()
        .withf(|ids, tags| {
            ids == [I_A.to_string()]
                && tags == [ResourceTag::new("Name", "worker"), ResourceTag::new("team", "ml")]
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let tags = tag_instances(
        &provider,
        &[I_A.to_string()],
        &["Name=worker".to_string(), "team=ml".to_string()],
    )
    .await
    .unwrap();
    assert_eq!(tags.len(), 2);
}

#[tokio::test]
async fn test_tag_volumes_rejects_reserved_prefix() {
    let mut provider = MockProvider::new();
    provider.expect_create_tags().never();

    let result = tag_volumes(&provider, &[VOL_A.to_string()], &["aws:owner=me".to_string()]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_list_volumes_by_zone() {
    let mut provider = MockProvider::new();
    provider.expect_volumes().returning(|| {
        Ok(vec![
            volume(VOL_B, "us-east-1b", None, Vec::new()),
            volume(VOL_A, "us-east-1a", None, Vec::new()),
        ])
    });

    let all = list_volumes(&provider, None).await.unwrap();
    assert_eq!(all[0].volume_id, VOL_A);

    let zone_b = list_volumes(&provider, Some("us-east-1b")).await.unwrap();
    assert_eq!(zone_b.len(), 1);
    assert_eq!(zone_b[0].volume_id, VOL_B);
}

#[tokio::test]
async fn test_delete_refuses_attached_volume() {
    let mut provider = MockProvider::new();
    provider.expect_volumes().returning(|| {
        Ok(vec![
            volume(VOL_A, "us-east-1a", None, Vec::new()),
            volume(VOL_B, "us-east-1a", Some(I_A), Vec::new()),
        ])
    });
    provider.expect_delete_volume().never();

    let err = delete_volumes(&provider, &[VOL_A.to_string(), VOL_B.to_string()], true)
        .await
        .unwrap_err();
    assert!(err.to_string().contains(I_A));
}

#[tokio::test]
async fn test_delete_protected_volume_needs_force() {
    let mut provider = MockProvider::new();
    provider.expect_volumes().returning(|| {
        Ok(vec![volume(
            VOL_A,
            "us-east-1a",
            None,
            vec![ResourceTag::new(PROTECTED_TAG, "true")],
        )])
    });
    provider
        .expect_delete_volume()
        .withf(|id| id == VOL_A)
        .times(1)
        .returning(|_| Ok(()));

    assert!(delete_volumes(&provider, &[VOL_A.to_string()], false).await.is_err());
    let deleted = delete_volumes(&provider, &[VOL_A.to_string()], true).await.unwrap();
    assert_eq!(deleted, vec![VOL_A.to_string()]);
}

#[tokio::test]
async fn test_delete_unknown_volume() {
    let mut provider = MockProvider::new();
    provider.expect_volumes().returning(|| Ok(Vec::new()));
    provider.expect_delete_volume().never();

    let err = delete_volumes(&provider, &[VOL_A.to_string()], false).await.unwrap_err();
    assert!(matches!(err, SpotctlError::ResourceNotFound { .. }));
}

fn open_request(id: &str, created_hours: i64) -> SpotRequestSummary {
    SpotRequestSummary {
        request_id: id.to_string(),
        create_time: Some(
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::hours(created_hours),
        ),
        spot_price: Some(0.13),
        instance_id: None,
        valid_until: None,
        state: "open".to_string(),
        status_code: Some("pending-evaluation".to_string()),
        status_message: None,
        availability_zone: Some("us-east-1b".to_string()),
    }
}

#[tokio::test]
async fn test_list_spot_requests_by_creation() {
    let mut provider = MockProvider::new();
    provider
        .expect_spot_requests()
        .returning(|| Ok(vec![open_request("sir-0000000b", 3), open_request("sir-0000000a", 1)]));

    let ids: Vec<String> = list_spot_requests(&provider)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.request_id)
        .collect();
    assert_eq!(ids, vec!["sir-0000000a", "sir-0000000b"]);
}

#[tokio::test]
async fn test_resolve_zones() {
    let mut provider = MockProvider::new();
    provider
        .expect_availability_zones()
        .times(1)
        .returning(|| Ok(vec!["us-east-1a".to_string(), "us-east-1b".to_string()]));

    assert_eq!(resolve_zones(&provider, &[]).await.unwrap().len(), 2);

    let requested = vec!["us-east-1c".to_string(), "us-east-1a".to_string(), "us-east-1c".to_string()];
    assert_eq!(
        resolve_zones(&provider, &requested).await.unwrap(),
        vec!["us-east-1a", "us-east-1c"]
    );
    assert!(resolve_zones(&provider, &["nowhere".to_string()]).await.is_err());
}

/// Three zones: 1a spikes once, 1b is steady at 0.12-0.13, 1c has no data
fn price_provider() -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_availability_zones().returning(|| {
        Ok(vec![
            "us-east-1a".to_string(),
            "us-east-1b".to_string(),
            "us-east-1c".to_string(),
        ])
    });
    provider
        .expect_spot_price_history()
        .withf(|query, _| query.instance_type == "c5.xlarge" && query.product == "Linux/UNIX")
        .returning(|query, zone| {
            let prices: &[f64] = match zone {
                "us-east-1a" => &[0.10, 0.10, 0.90, 0.10, 0.10],
                "us-east-1b" => &[0.12, 0.13, 0.12, 0.13, 0.12],
                _ => &[],
            };
            Ok(prices
                .iter()
                .enumerate()
                .map(|(i, p)| PriceObservation::new(*p, query.start_time + Duration::hours(i as i64)))
                .collect())
        });
    provider
}

#[tokio::test]
async fn test_price_history_drops_empty_zones() {
    let provider = price_provider();
    let config = Config::example();

    let report = price_history(&provider, &config, "default", Some(12), &[], OutputFormat::Json)
        .await
        .unwrap();

    let zones: Vec<&str> = report.zones.iter().map(|z| z.zone.as_str()).collect();
    assert_eq!(zones, vec!["us-east-1a", "us-east-1b"]);
    assert_eq!(report.query.end_time - report.query.start_time, Duration::hours(12));
    assert!(report.recommendation.is_none());

    let spiky = &report.zones[0];
    assert_eq!(spiky.max, 0.90);
    assert_eq!(spiky.points, 5);
}

#[tokio::test]
async fn test_price_recommendation_prefers_steady_zone() {
    let provider = price_provider();
    let config = Config::example();

    let report = price_recommendation(&provider, &config, "default", None, &[], OutputFormat::Json)
        .await
        .unwrap();
    let rec = report.recommendation.unwrap();
    assert_eq!(rec.zone, "us-east-1b");
    assert!(rec.price == 0.12 || rec.price == 0.13);
    assert_eq!(
        report.query.end_time - report.query.start_time,
        Duration::hours(i64::from(config.pricing.lookback_hours))
    );
}

#[tokio::test]
async fn test_recommendation_without_data_is_invalid_input() {
    let mut provider = MockProvider::new();
    provider.expect_spot_price_history().returning(|_, _| Ok(Vec::new()));

    let err = price_recommendation(
        &provider,
        &Config::example(),
        "default",
        None,
        &["us-east-1a".to_string()],
        OutputFormat::Json,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SpotctlError::InvalidInput(_)));
}

#[tokio::test]
async fn test_unknown_profile_fails_before_fetch() {
    let mut provider = MockProvider::new();
    provider.expect_availability_zones().never();
    provider.expect_spot_price_history().never();

    let err = price_history(&provider, &Config::example(), "gpu", None, &[], OutputFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, SpotctlError::ProfileNotFound { .. }));
}

#[test]
fn test_launch_spec_from_recommendation() {
    let config = Config::example();
    let profile = config.profile("default").unwrap();
    let spec = build_launch_spec(profile, "us-east-1b", 0.13, 3, Some(2), Utc::now()).unwrap();
    assert_eq!(spec.image_id, profile.image_id);
    assert_eq!(spec.count, 3);
    assert!(spec.valid_until.is_some());
}
