//! Optical telescope form, from opening a session to reopening the saved
//! configuration.

#![cfg(feature = "local-api")]

use std::sync::Arc;
use std::time::Duration;

use polaris_core::client::{ClientFactory, LocalProposalToolApi};
use polaris_core::config::ClientConfig;
use polaris_core::models::{ObservationKey, SkyCondition, TimeUnit, UserType};
use polaris_core::services::{
    delete_observation_configuration, Control, ConfigurationSession, FieldInput, FieldState,
    FormInput, NotificationLog,
};

const KEY: ObservationKey = ObservationKey::new(44, 2);

#[tokio::test]
async fn test_fill_save_and_reopen() {
    let api = LocalProposalToolApi::with_default_catalog().unwrap();
    let log = NotificationLog::new();

    let mut session = ConfigurationSession::open(Arc::new(api.clone()), Arc::new(log.clone()), KEY).await;
    let inputs = [
        FormInput::Telescope(Some("TNG".to_string())),
        FormInput::Instrument(Some("DOLORES".to_string())),
        FormInput::Field {
            name: "instrumentMode".to_string(),
            input: FieldInput::Select(Some("Spectroscopy".to_string())),
        },
        FormInput::Field {
            name: "instrumentComments".to_string(),
            input: FieldInput::Text("blue arm only".to_string()),
        },
        FormInput::TelescopeTime {
            value: 3.0,
            unit: TimeUnit::Hours,
        },
        FormInput::Condition(SkyCondition::DarkMoon),
        FormInput::UserType(UserType::Servicer),
    ];
    for input in inputs {
        assert!(session.apply_input(input));
    }

    let form = session.render();
    let comments = form.field("instrumentComments").unwrap();
    assert_eq!(comments.state, FieldState::UserEdited);
    match &comments.control {
        Control::TextArea { remaining, .. } => assert_eq!(*remaining, 255 - 13),
        other => panic!("unexpected control {:?}", other),
    }
    assert_eq!(form.timing.condition.value.as_deref(), Some("Dark Moon"));

    assert!(session.save().await);
    session.dispose();

    let reopened = ConfigurationSession::open(Arc::new(api.clone()), Arc::new(log.clone()), KEY).await;
    let draft = reopened.draft();
    assert_eq!(draft.telescope(), Some("TNG"));
    assert_eq!(draft.instrument(), Some("DOLORES"));
    assert_eq!(draft.elements()["instrumentMode"], "Spectroscopy");
    assert_eq!(draft.elements()["instrumentComments"], "blue arm only");
    assert_eq!(draft.field_state("instrumentMode"), FieldState::Defaulted);
    assert_eq!(draft.condition(), Some(SkyCondition::DarkMoon));
    assert_eq!(draft.user_type(), Some(UserType::Servicer));
    assert!(!draft.is_dirty());

    assert_eq!(log.errors().len(), 0);
}

#[tokio::test]
async fn test_checkbox_survives_save_and_reopen() {
    let api = LocalProposalToolApi::with_default_catalog().unwrap();
    let log = NotificationLog::new();
    let key = ObservationKey::new(45, 1);

    let mut session = ConfigurationSession::open(Arc::new(api.clone()), Arc::new(log.clone()), key).await;
    session.select_telescope(Some("LT"));
    session.select_instrument(Some("IOI"));
    assert!(session.apply_input(FormInput::Field {
        name: "telescopeHours".to_string(),
        input: FieldInput::Checkbox(true),
    }));
    let before = session.draft().elements();
    assert_eq!(before["telescopeHours"], "true");
    assert!(session.save().await);
    session.dispose();

    assert_eq!(api.configuration(key).unwrap().elements["telescopeHours"], "true");

    let reopened = ConfigurationSession::open(Arc::new(api.clone()), Arc::new(log.clone()), key).await;
    assert_eq!(reopened.draft().elements(), before);
    match &reopened.render().field("telescopeHours").unwrap().control {
        Control::Checkbox { checked } => assert!(*checked),
        other => panic!("unexpected control {:?}", other),
    }
    assert!(log.errors().is_empty());
}

#[tokio::test]
async fn test_unreachable_catalog_degrades_to_empty_form() {
    let api = LocalProposalToolApi::with_default_catalog().unwrap();
    api.inject_failure("telescope_names", 502, "gateway");
    api.inject_failure("telescope_schemas", 502, "gateway");
    let log = NotificationLog::new();

    let session = ConfigurationSession::open(Arc::new(api), Arc::new(log.clone()), KEY).await;
    let form = session.render();
    assert_eq!(form.telescope.options, vec!["None"]);
    assert!(form.fields.is_empty());

    let titles: Vec<String> = log.errors().into_iter().map(|n| n.title).collect();
    assert_eq!(
        titles,
        vec!["Failed to load telescope names", "Failed to load telescope data"]
    );
}

#[tokio::test]
async fn test_factory_client_drives_session() {
    let api = ClientFactory::create_local().unwrap();
    let log = NotificationLog::new();
    let mut session = ConfigurationSession::open(api, Arc::new(log.clone()), KEY).await;

    session.select_telescope(Some("SALT"));
    session.select_instrument(Some("RSS"));
    assert!(session.draft().can_save());
    assert!(session.save().await);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_during_slow_load() {
    let api = LocalProposalToolApi::with_default_catalog().unwrap();
    let log = NotificationLog::new();
    let mut session = ConfigurationSession::open(Arc::new(api.clone()), Arc::new(log.clone()), KEY).await;
    session.select_telescope(Some("TNG"));
    session.select_instrument(Some("DOLORES"));

    api.set_latency(Some(Duration::from_secs(5)));
    let token = session.scope().token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    assert!(!session.save().await);
    assert!(api.configuration(KEY).is_none());
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_observation_delete_cascade() {
    let api = LocalProposalToolApi::with_default_catalog().unwrap();
    let log = NotificationLog::new();
    let mut session = ConfigurationSession::open(Arc::new(api.clone()), Arc::new(log.clone()), KEY).await;
    session.select_telescope(Some("TNG"));
    session.select_instrument(Some("DOLORES"));
    assert!(session.save().await);

    assert!(delete_observation_configuration(&api, &log, KEY).await);
    assert!(api.configuration(KEY).is_none());
    assert!(!delete_observation_configuration(&api, &log, KEY).await);
}

#[tokio::test]
async fn test_configured_text_limit() {
    let config: ClientConfig = toml::from_str("[editor]\nmax_text_chars = 10\n").unwrap();
    let api = LocalProposalToolApi::with_default_catalog().unwrap();
    let log = NotificationLog::new();
    let mut session = ConfigurationSession::open_with_text_limit(
        Arc::new(api),
        Arc::new(log.clone()),
        KEY,
        config.editor.max_text_chars,
    )
    .await;
    session.select_telescope(Some("TNG"));
    session.select_instrument(Some("DOLORES"));

    let comments = |text: &str| FormInput::Field {
        name: "instrumentComments".to_string(),
        input: FieldInput::Text(text.to_string()),
    };
    assert!(!session.apply_input(comments("blue arm only")));
    assert_eq!(log.last().unwrap().title, "Invalid value");

    assert!(session.apply_input(comments("blue")));
    match &session.render().field("instrumentComments").unwrap().control {
        Control::TextArea { remaining, .. } => assert_eq!(*remaining, 6),
        other => panic!("unexpected control {:?}", other),
    }
}
