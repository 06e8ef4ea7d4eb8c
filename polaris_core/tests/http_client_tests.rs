//! End-to-end tests of the HTTP client against the mock server.

#![cfg(all(feature = "http-client", feature = "mock-server"))]

mod support;

use std::sync::Arc;

use polaris_core::client::{ClientError, HttpProposalToolApi, LocalProposalToolApi, ProposalToolApi};
use polaris_core::models::{
    AllocatedBlock, AllocatedProposalId, CycleId, FieldKind, ObservationConfiguration,
    ObservationKey, PolarisMode, SkyCondition, TelescopeTime, TimeUnit, UserType,
};
use polaris_core::services::{ConfigurationSession, FormInput, NotificationLog};

const CYCLE: CycleId = CycleId(1);
const PROPOSAL: AllocatedProposalId = AllocatedProposalId(21);

async fn serve(api: &LocalProposalToolApi) -> HttpProposalToolApi {
    let base_url = support::spawn_mock_server(api.clone()).await;
    HttpProposalToolApi::with_base_url(base_url).unwrap()
}

#[tokio::test]
async fn test_reference_data() {
    let local = LocalProposalToolApi::with_default_catalog().unwrap();
    local.set_polaris_mode(PolarisMode::Optical);
    let client = serve(&local).await;

    assert_eq!(client.polaris_mode().await.unwrap(), PolarisMode::Optical);

    let names = client.telescope_names().await.unwrap();
    assert_eq!(names.len(), 14);
    assert_eq!(names[2], "TNG");

    let catalog = client.telescope_schemas().await.unwrap();
    let dolores = catalog.instrument("TNG", "DOLORES").unwrap();
    assert_eq!(dolores.field("instrumentComments").unwrap().kind, FieldKind::Text);
    assert_eq!(
        catalog.instrument("LT", "IOI").unwrap().field("telescopeHours").unwrap().kind,
        FieldKind::Boolean
    );
}

#[tokio::test]
async fn test_configuration_round_trip() {
    let local = LocalProposalToolApi::with_default_catalog().unwrap();
    let client = serve(&local).await;
    let key = ObservationKey::new(101, 7);

    assert_eq!(client.load_configuration(key).await.unwrap(), None);

    let mut configuration = ObservationConfiguration::new(key, "TNG", "DOLORES")
        .with_element("instrumentMode", "Spectroscopy")
        .with_element("instrumentComments", "");
    configuration.telescope_time = Some(TelescopeTime::new(2.5, TimeUnit::Nights).unwrap());
    configuration.condition = Some(SkyCondition::GrayMoon);
    configuration.user_type = Some(UserType::Visitor);

    assert!(client.save_configuration(&configuration).await.unwrap());
    assert_eq!(local.configuration(key), Some(configuration.clone()));
    assert_eq!(client.load_configuration(key).await.unwrap(), Some(configuration));

    assert!(client.delete_configuration(key).await.unwrap());
    assert_eq!(client.load_configuration(key).await.unwrap(), None);
}

#[tokio::test]
async fn test_allocation_endpoints() {
    let local = LocalProposalToolApi::new();
    let block = local.insert_block(
        CYCLE,
        PROPOSAL,
        AllocatedBlock::new("observing hours", 4.0, "Imaging", "A"),
    );
    local.insert_block(
        CYCLE,
        PROPOSAL,
        AllocatedBlock::new("observing hours", 2.0, "Spectroscopy", "B"),
    );
    local.set_remaining(CYCLE, "observing hours", 10.0);
    let client = serve(&local).await;

    let blocks = client.allocated_blocks(CYCLE, PROPOSAL).await.unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].id, Some(block));

    let totals = client.observing_time_totals(CYCLE).await.unwrap();
    assert_eq!(totals.len(), 2);

    client
        .update_resource_amount(CYCLE, PROPOSAL, block, 9.5)
        .await
        .unwrap();
    assert_eq!(client.allocated_blocks(CYCLE, PROPOSAL).await.unwrap()[0].amount, 9.5);
    assert_eq!(
        client.resource_remaining(CYCLE, "observing hours").await.unwrap(),
        4.5
    );

    let err = client
        .update_resource_amount(CYCLE, PROPOSAL, block, 50.0)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.user_message().contains("exceeds"));
}

#[tokio::test]
async fn test_backend_errors_are_decoded() {
    let local = LocalProposalToolApi::with_default_catalog().unwrap();
    let client = serve(&local).await;

    let err = client.resource_remaining(CYCLE, "dome time").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), "Unknown resource 'dome time' in cycle 1");

    local.inject_failure("telescope_names", 500, "database down");
    let err = client.telescope_names().await.unwrap_err();
    assert!(matches!(err, ClientError::Http { status: 500, .. }));
    assert_eq!(err.user_message(), "database down");
    assert_eq!(err.context().operation.as_deref(), Some("telescope_names"));
}

#[tokio::test]
async fn test_resource_names_with_reserved_characters() {
    let local = LocalProposalToolApi::new();
    local.set_remaining(CYCLE, "fibre/hours?#1", 3.5);
    let client = serve(&local).await;

    assert_eq!(
        client.resource_remaining(CYCLE, "fibre/hours?#1").await.unwrap(),
        3.5
    );
    let err = client.resource_remaining(CYCLE, "fibre").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpProposalToolApi::with_base_url(format!("http://{}", addr)).unwrap();
    let err = client.telescope_names().await.unwrap_err();
    assert!(matches!(err, ClientError::Network { .. }));
    assert!(err.user_message().starts_with("Network error"));
}

#[tokio::test]
async fn test_session_over_http() {
    let local = LocalProposalToolApi::with_default_catalog().unwrap();
    let client = serve(&local).await;
    let key = ObservationKey::new(5, 1);
    let log = NotificationLog::new();

    let mut session = ConfigurationSession::open(Arc::new(client), Arc::new(log.clone()), key).await;
    assert!(session.apply_input(FormInput::Telescope(Some("LT".to_string()))));
    assert!(session.apply_input(FormInput::Instrument(Some("IOI".to_string()))));
    assert!(session.save().await);

    let stored = local.configuration(key).unwrap();
    assert_eq!(stored.instrument_name, "IOI");
    assert_eq!(stored.elements["telescopeHours"], "false");
    assert_eq!(log.last().unwrap().title, "Telescopes data Updated");
}
