//! In-memory implementation of [`ProposalToolApi`].
//!
//! Stores saved configurations and allocated blocks in memory and derives the
//! mode/grade totals from the stored blocks. Used by tests, by the mock
//! server, and for offline front-end development. Calls are recorded in a
//! bounded request log; failures can be injected per operation.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::error::{ClientError, ClientResult, ErrorContext};
use super::proposal_tool::ProposalToolApi;
use crate::api::{catalog_from_wire, ErrorPayload, TelescopeSchemasResponse};
use crate::models::{
    AllocatedBlock, AllocatedBlockId, AllocatedProposalId, CycleId, ModeGradeTotal,
    ObservationConfiguration, ObservationKey, PolarisMode, TelescopeCatalog,
};

const OPTICAL_TELESCOPES_JSON: &str = include_str!("fixtures/optical_telescopes.json");

/// Telescope names in the order the backend lists them.
pub const DEFAULT_TELESCOPE_NAMES: [&str; 14] = [
    "TCS",
    "LT",
    "TNG",
    "SALT",
    "CFHT",
    "NOT",
    "CAHA35",
    "AAT",
    "LCO",
    "REM",
    "CAHA22",
    "OHP193",
    "Aristarchos",
    "TBL",
];

/// Default number of calls kept in the request log; older entries are dropped.
pub const DEFAULT_REQUEST_LOG_LIMIT: usize = 1024;

/// One call made against the local backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub operation: String,
    pub payload: Option<serde_json::Value>,
}

/// In-memory proposal tool backend.
#[derive(Clone)]
pub struct LocalProposalToolApi {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    mode: PolarisMode,
    telescope_names: Vec<String>,
    catalog: TelescopeCatalog,
    saved: BTreeMap<ObservationKey, ObservationConfiguration>,
    blocks: BTreeMap<(CycleId, AllocatedProposalId), Vec<AllocatedBlock>>,
    remaining: HashMap<(CycleId, String), f64>,
    next_block_id: i64,

    // Test hooks
    failures: HashMap<String, ClientError>,
    latency: Option<Duration>,
    requests: VecDeque<RecordedRequest>,
    request_limit: usize,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            mode: PolarisMode::Both,
            telescope_names: Vec::new(),
            catalog: TelescopeCatalog::new(),
            saved: BTreeMap::new(),
            blocks: BTreeMap::new(),
            remaining: HashMap::new(),
            next_block_id: 1,
            failures: HashMap::new(),
            latency: None,
            requests: VecDeque::new(),
            request_limit: DEFAULT_REQUEST_LOG_LIMIT,
        }
    }
}

impl Default for LocalProposalToolApi {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalProposalToolApi {
    /// Create an empty backend: no telescopes, no saved data.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a backend seeded with the bundled optical telescope catalog.
    pub fn with_default_catalog() -> ClientResult<Self> {
        let body: TelescopeSchemasResponse = serde_json::from_str(OPTICAL_TELESCOPES_JSON)
            .map_err(|e| {
                ClientError::configuration(format!("Bundled telescope catalog is invalid: {}", e))
            })?;
        let api = Self::new();
        api.set_catalog(
            DEFAULT_TELESCOPE_NAMES.iter().map(|s| s.to_string()).collect(),
            catalog_from_wire(body),
        );
        Ok(api)
    }

    /// Replace the telescope names and schemas.
    pub fn set_catalog(&self, names: Vec<String>, catalog: TelescopeCatalog) {
        let mut data = self.data.write();
        data.telescope_names = names;
        data.catalog = catalog;
    }

    pub fn set_polaris_mode(&self, mode: PolarisMode) {
        self.data.write().mode = mode;
    }

    /// Store a configuration directly, bypassing the request log.
    pub fn insert_configuration(&self, configuration: ObservationConfiguration) {
        self.data
            .write()
            .saved
            .insert(configuration.key, configuration);
    }

    pub fn configuration(&self, key: ObservationKey) -> Option<ObservationConfiguration> {
        self.data.read().saved.get(&key).cloned()
    }

    /// Add a block to an allocated proposal.
    ///
    /// # Returns
    /// The ID assigned to the block (an existing `id` is kept)
    pub fn insert_block(
        &self,
        cycle: CycleId,
        allocated_proposal: AllocatedProposalId,
        mut block: AllocatedBlock,
    ) -> AllocatedBlockId {
        let mut data = self.data.write();
        let id = match block.id {
            Some(id) => id,
            None => {
                let id = AllocatedBlockId(data.next_block_id);
                data.next_block_id += 1;
                id
            }
        };
        block.id = Some(id);
        data.blocks
            .entry((cycle, allocated_proposal))
            .or_default()
            .push(block);
        id
    }

    pub fn set_remaining(&self, cycle: CycleId, resource_name: impl Into<String>, amount: f64) {
        self.data
            .write()
            .remaining
            .insert((cycle, resource_name.into()), amount);
    }

    /// Make every subsequent call of `operation` fail with an HTTP error until
    /// [`clear_failure`](Self::clear_failure) is called.
    pub fn inject_failure(&self, operation: &str, status: u16, message: impl Into<String>) {
        self.fail_with(
            operation,
            ClientError::http(status, ErrorPayload::from_message(message)),
        );
    }

    pub fn fail_with(&self, operation: &str, error: ClientError) {
        self.data
            .write()
            .failures
            .insert(operation.to_string(), error);
    }

    pub fn clear_failure(&self, operation: &str) {
        self.data.write().failures.remove(operation);
    }

    /// Delay every call by `latency`, to exercise cancellation.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.data.write().latency = latency;
    }

    /// Keep at most `limit` calls in the request log (0 disables recording).
    pub fn set_request_log_limit(&self, limit: usize) {
        let mut data = self.data.write();
        data.request_limit = limit;
        let excess = data.requests.len().saturating_sub(limit);
        data.requests.drain(..excess);
    }

    /// Most recent calls, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.data.read().requests.iter().cloned().collect()
    }

    pub fn request_count(&self, operation: &str) -> usize {
        self.data
            .read()
            .requests
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }

    /// Record the call, apply latency and any injected failure.
    async fn enter<P: Serialize + Sync>(&self, operation: &str, payload: Option<&P>) -> ClientResult<()> {
        let latency = {
            let mut data = self.data.write();
            if data.request_limit > 0 {
                if data.requests.len() >= data.request_limit {
                    data.requests.pop_front();
                }
                data.requests.push_back(RecordedRequest {
                    operation: operation.to_string(),
                    payload: payload.and_then(|p| serde_json::to_value(p).ok()),
                });
            }
            data.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        debug!(operation, "local backend call");
        match self.data.read().failures.get(operation) {
            Some(error) => Err(error.clone().with_operation(operation)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProposalToolApi for LocalProposalToolApi {
    async fn polaris_mode(&self) -> ClientResult<PolarisMode> {
        self.enter::<()>("polaris_mode", None).await?;
        Ok(self.data.read().mode)
    }

    async fn telescope_names(&self) -> ClientResult<Vec<String>> {
        self.enter::<()>("telescope_names", None).await?;
        Ok(self.data.read().telescope_names.clone())
    }

    async fn telescope_schemas(&self) -> ClientResult<TelescopeCatalog> {
        self.enter::<()>("telescope_schemas", None).await?;
        Ok(self.data.read().catalog.clone())
    }

    async fn load_configuration(
        &self,
        key: ObservationKey,
    ) -> ClientResult<Option<ObservationConfiguration>> {
        self.enter("load_configuration", Some(&key.to_string()))
            .await?;
        Ok(self.data.read().saved.get(&key).cloned())
    }

    async fn save_configuration(
        &self,
        configuration: &ObservationConfiguration,
    ) -> ClientResult<bool> {
        let body = crate::api::SaveTelescopeRequest::from(configuration);
        self.enter("save_configuration", Some(&body)).await?;
        self.data
            .write()
            .saved
            .insert(configuration.key, configuration.clone());
        Ok(true)
    }

    async fn delete_configuration(&self, key: ObservationKey) -> ClientResult<bool> {
        self.enter("delete_configuration", Some(&key.to_string()))
            .await?;
        Ok(self.data.write().saved.remove(&key).is_some())
    }

    async fn observing_time_totals(&self, cycle: CycleId) -> ClientResult<Vec<ModeGradeTotal>> {
        self.enter("observing_time_totals", Some(&cycle)).await?;
        let data = self.data.read();
        let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
        for block in data
            .blocks
            .iter()
            .filter(|((c, _), _)| *c == cycle)
            .flat_map(|(_, blocks)| blocks.iter())
        {
            *totals
                .entry((block.mode.clone(), block.grade.clone()))
                .or_insert(0.0) += block.amount;
        }
        Ok(totals
            .into_iter()
            .map(|((mode, grade), total)| ModeGradeTotal::new(mode, grade, total))
            .collect())
    }

    async fn allocated_blocks(
        &self,
        cycle: CycleId,
        allocated_proposal: AllocatedProposalId,
    ) -> ClientResult<Vec<AllocatedBlock>> {
        self.enter("allocated_blocks", Some(&(cycle, allocated_proposal)))
            .await?;
        Ok(self
            .data
            .read()
            .blocks
            .get(&(cycle, allocated_proposal))
            .cloned()
            .unwrap_or_default())
    }

    async fn update_resource_amount(
        &self,
        cycle: CycleId,
        allocated_proposal: AllocatedProposalId,
        block: AllocatedBlockId,
        amount: f64,
    ) -> ClientResult<()> {
        let operation = "update_resource_amount";
        self.enter(operation, Some(&amount)).await?;
        let context = || {
            ErrorContext::new(operation)
                .with_entity("allocated_block")
                .with_entity_id(block)
        };

        if !amount.is_finite() || amount < 0.0 {
            return Err(ClientError::validation_with_context(
                format!("Resource amount must be a non-negative number, got {}", amount),
                context(),
            ));
        }

        let mut data = self.data.write();
        let LocalData {
            blocks, remaining, ..
        } = &mut *data;
        let stored = blocks
            .get_mut(&(cycle, allocated_proposal))
            .and_then(|blocks| blocks.iter_mut().find(|b| b.id == Some(block)))
            .ok_or_else(|| {
                ClientError::not_found_with_context(
                    format!("Allocated block {} not found", block),
                    context(),
                )
            })?;

        if let Some(left) = remaining.get_mut(&(cycle, stored.resource_type.clone())) {
            let delta = amount - stored.amount;
            if delta > *left {
                return Err(ClientError::validation_with_context(
                    format!(
                        "Requested {} exceeds the {} {} remaining",
                        amount,
                        *left + stored.amount,
                        stored.resource_type
                    ),
                    context(),
                ));
            }
            *left -= delta;
        }
        stored.amount = amount;
        Ok(())
    }

    async fn resource_remaining(&self, cycle: CycleId, resource_name: &str) -> ClientResult<f64> {
        self.enter("resource_remaining", Some(&resource_name))
            .await?;
        self.data
            .read()
            .remaining
            .get(&(cycle, resource_name.to_string()))
            .copied()
            .ok_or_else(|| {
                ClientError::not_found_with_context(
                    format!("Unknown resource '{}' in cycle {}", resource_name, cycle),
                    ErrorContext::new("resource_remaining").with_entity("available_resource"),
                )
            })
    }
}
