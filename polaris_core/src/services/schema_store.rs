//! Instrument schema store.
//!
//! Telescope names and the telescope → instrument → field schema are fetched
//! at most once per form session and kept in memory. A failed fetch is
//! reported, degrades to "no data", and is not cached, so the next call
//! retries.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::notifications::{notify_failure, Notifier};
use super::scope::ViewScope;
use crate::client::{ClientError, ProposalToolApi};
use crate::models::{Instrument, PolarisMode, TelescopeCatalog};

pub struct SchemaStore {
    api: Arc<dyn ProposalToolApi>,
    notifier: Arc<dyn Notifier>,
    mode: OnceCell<PolarisMode>,
    names: OnceCell<Vec<String>>,
    catalog: OnceCell<Arc<TelescopeCatalog>>,
}

impl SchemaStore {
    pub fn new(api: Arc<dyn ProposalToolApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            mode: OnceCell::new(),
            names: OnceCell::new(),
            catalog: OnceCell::new(),
        }
    }

    /// Whether the deployment offers the optical telescope form at all.
    /// An unknown mode counts as "not offered".
    pub async fn optical_form_offered(&self, scope: &ViewScope) -> bool {
        let result = self
            .mode
            .get_or_try_init(|| async {
                let mode = scope.run(self.api.polaris_mode()).await?;
                debug!(%mode, "loaded polaris mode");
                Ok::<_, ClientError>(mode)
            })
            .await;

        match result {
            Ok(mode) => mode.includes_optical(),
            Err(err) => {
                notify_failure(self.notifier.as_ref(), "Failed to load polaris mode", &err);
                false
            }
        }
    }

    /// Telescope names; empty when the backend could not be reached.
    pub async fn load_telescope_names(&self, scope: &ViewScope) -> Vec<String> {
        let result = self
            .names
            .get_or_try_init(|| async {
                let names = scope.run(self.api.telescope_names()).await?;
                info!(count = names.len(), "loaded telescope names");
                Ok::<_, ClientError>(names)
            })
            .await;

        match result {
            Ok(names) => names.clone(),
            Err(err) => {
                notify_failure(self.notifier.as_ref(), "Failed to load telescope names", &err);
                Vec::new()
            }
        }
    }

    /// Full schema; an empty catalog when the backend could not be reached.
    pub async fn load_telescope_schemas(&self, scope: &ViewScope) -> Arc<TelescopeCatalog> {
        let result = self
            .catalog
            .get_or_try_init(|| async {
                let catalog = scope.run(self.api.telescope_schemas()).await?;
                info!(telescopes = catalog.len(), "loaded telescope schemas");
                Ok::<_, ClientError>(Arc::new(catalog))
            })
            .await;

        match result {
            Ok(catalog) => Arc::clone(catalog),
            Err(err) => {
                notify_failure(self.notifier.as_ref(), "Failed to load telescope data", &err);
                Arc::new(TelescopeCatalog::new())
            }
        }
    }

    /// Cached catalog, if it has been loaded successfully.
    pub fn catalog(&self) -> Option<Arc<TelescopeCatalog>> {
        self.catalog.get().cloned()
    }

    /// Narrow the cached schema to one instrument's field set.
    pub fn instrument(&self, telescope: &str, instrument: &str) -> Option<Instrument> {
        let found = self
            .catalog
            .get()
            .and_then(|c| c.instrument(telescope, instrument).cloned());
        if found.is_none() {
            debug!(telescope, instrument, "no schema for selection");
        }
        found
    }
}

#[cfg(all(test, feature = "local-api"))]
mod tests {
    use super::*;
    use crate::client::LocalProposalToolApi;
    use crate::services::notifications::NotificationLog;

    fn store(api: &LocalProposalToolApi, log: &NotificationLog) -> SchemaStore {
        SchemaStore::new(Arc::new(api.clone()), Arc::new(log.clone()))
    }

    #[tokio::test]
    async fn test_names_fetched_once() {
        let api = LocalProposalToolApi::with_default_catalog().unwrap();
        let log = NotificationLog::new();
        let store = store(&api, &log);
        let scope = ViewScope::new();

        let first = store.load_telescope_names(&scope).await;
        let second = store.load_telescope_names(&scope).await;
        assert_eq!(first, second);
        assert_eq!(api.request_count("telescope_names"), 1);
    }

    #[tokio::test]
    async fn test_optical_form_gated_by_mode() {
        let api = LocalProposalToolApi::new();
        let log = NotificationLog::new();
        let scope = ViewScope::new();

        api.set_polaris_mode(PolarisMode::Radio);
        assert!(!store(&api, &log).optical_form_offered(&scope).await);

        api.set_polaris_mode(PolarisMode::Both);
        let store = store(&api, &log);
        assert!(store.optical_form_offered(&scope).await);
        assert!(store.optical_form_offered(&scope).await);
        assert_eq!(api.request_count("polaris_mode"), 2);

        api.inject_failure("polaris_mode", 500, "down");
        let fresh = SchemaStore::new(Arc::new(api.clone()), Arc::new(log.clone()));
        assert!(!fresh.optical_form_offered(&scope).await);
        assert_eq!(log.last().unwrap().title, "Failed to load polaris mode");
    }

    #[tokio::test]
    async fn test_failure_degrades_and_is_not_cached() {
        let api = LocalProposalToolApi::with_default_catalog().unwrap();
        let log = NotificationLog::new();
        let store = store(&api, &log);
        let scope = ViewScope::new();

        api.inject_failure("telescope_schemas", 500, "database down");
        let catalog = store.load_telescope_schemas(&scope).await;
        assert!(catalog.is_empty());
        assert!(store.catalog().is_none());
        assert_eq!(log.errors().len(), 1);
        assert_eq!(log.last().unwrap().message, "database down");

        api.clear_failure("telescope_schemas");
        let catalog = store.load_telescope_schemas(&scope).await;
        assert!(!catalog.is_empty());
        assert!(store.instrument("SALT", "RSS").is_some());
        assert_eq!(api.request_count("telescope_schemas"), 2);
    }
}
