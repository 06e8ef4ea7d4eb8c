//! Debounced editing of an allocated block's resource amount.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::debounce::Debouncer;
use super::notifications::{notify_failure, Notification, Notifier};
use super::scope::ViewScope;
use crate::client::{ClientError, ClientResult, ErrorContext, ProposalToolApi};
use crate::models::{AllocatedBlock, AllocatedBlockId, AllocatedProposalId, CycleId};

#[derive(Debug, Clone, Copy)]
struct AmountState {
    /// Last amount the backend accepted.
    committed: f64,
    /// Latest amount entered, committed or not.
    entered: f64,
    /// Unallocated amount of the resource, once known.
    remaining: Option<f64>,
}

struct CommitTarget {
    api: Arc<dyn ProposalToolApi>,
    notifier: Arc<dyn Notifier>,
    cycle: CycleId,
    allocated_proposal: AllocatedProposalId,
    block: AllocatedBlockId,
    state: Arc<Mutex<AmountState>>,
}

impl CommitTarget {
    async fn commit(&self, scope: ViewScope, amount: f64) {
        let result = scope
            .run(self.api.update_resource_amount(
                self.cycle,
                self.allocated_proposal,
                self.block,
                amount,
            ))
            .await;

        match result {
            Ok(()) => {
                {
                    let mut guard = self.state.lock();
                    let state = &mut *guard;
                    if let Some(left) = state.remaining.as_mut() {
                        *left -= amount - state.committed;
                    }
                    state.committed = amount;
                }
                info!(block = %self.block, amount, "resource amount updated");
                self.notifier.notify(Notification::success(
                    "Updated",
                    format!("The resource amount changed to {}", amount),
                ));
            }
            Err(err) => {
                debug!(block = %self.block, error = %err, "resource amount update failed");
                notify_failure(self.notifier.as_ref(), "Failed to update resource amount", &err);
            }
        }
    }
}

/// Editor for the amount of one allocated block.
///
/// Valid entries are debounced; only the last value of a burst is sent.
/// Dropping the editor disposes it: pending and in-flight updates are
/// abandoned without notification. Use [`close`](Self::close) to commit a
/// pending entry first.
pub struct ResourceAmountEditor {
    api: Arc<dyn ProposalToolApi>,
    notifier: Arc<dyn Notifier>,
    cycle: CycleId,
    resource_type: String,
    block: AllocatedBlockId,
    state: Arc<Mutex<AmountState>>,
    debouncer: Debouncer<f64>,
    scope: ViewScope,
}

impl ResourceAmountEditor {
    /// Bind an editor to a stored block. Must be called within a Tokio
    /// runtime.
    ///
    /// # Errors
    /// `ClientError::Validation` when the block has no ID yet
    pub fn new(
        api: Arc<dyn ProposalToolApi>,
        notifier: Arc<dyn Notifier>,
        cycle: CycleId,
        allocated_proposal: AllocatedProposalId,
        block: &AllocatedBlock,
        delay: Duration,
    ) -> ClientResult<Self> {
        let block_id = block.id.ok_or_else(|| {
            ClientError::validation_with_context(
                "Allocated block has not been saved",
                ErrorContext::new("edit_resource_amount").with_entity("allocated_block"),
            )
        })?;

        let scope = ViewScope::new();
        let state = Arc::new(Mutex::new(AmountState {
            committed: block.amount,
            entered: block.amount,
            remaining: None,
        }));
        let target = Arc::new(CommitTarget {
            api: Arc::clone(&api),
            notifier: Arc::clone(&notifier),
            cycle,
            allocated_proposal,
            block: block_id,
            state: Arc::clone(&state),
        });

        let parent = scope.token();
        let debouncer = Debouncer::with_token(delay, parent.child_token(), move |amount: f64| {
            let target = Arc::clone(&target);
            let scope = ViewScope::child_of_token(&parent);
            async move { target.commit(scope, amount).await }
        });

        Ok(Self {
            api,
            notifier,
            cycle,
            resource_type: block.resource_type.clone(),
            block: block_id,
            state,
            debouncer,
            scope,
        })
    }

    pub fn block(&self) -> AllocatedBlockId {
        self.block
    }

    /// Latest entered amount.
    pub fn amount(&self) -> f64 {
        self.state.lock().entered
    }

    pub fn committed_amount(&self) -> f64 {
        self.state.lock().committed
    }

    /// Unallocated amount of this block's resource, if loaded.
    pub fn remaining(&self) -> Option<f64> {
        self.state.lock().remaining
    }

    /// Fetch how much of the resource is still unallocated; used to bound
    /// further entries. Failures are notified and leave the bound unknown.
    pub async fn load_remaining(&self) -> Option<f64> {
        let result = self
            .scope
            .run(self.api.resource_remaining(self.cycle, &self.resource_type))
            .await;
        match result {
            Ok(left) => {
                self.state.lock().remaining = Some(left);
                Some(left)
            }
            Err(err) => {
                notify_failure(
                    self.notifier.as_ref(),
                    "Failed to load remaining resource",
                    &err,
                );
                None
            }
        }
    }

    fn check(&self, amount: f64) -> ClientResult<()> {
        let context = || {
            ErrorContext::new("edit_resource_amount")
                .with_entity("allocated_block")
                .with_entity_id(self.block)
        };
        if !amount.is_finite() || amount < 0.0 {
            return Err(ClientError::validation_with_context(
                "The amount must be a non-negative number",
                context(),
            ));
        }
        let state = *self.state.lock();
        if let Some(left) = state.remaining {
            let available = left + state.committed;
            if amount > available {
                return Err(ClientError::validation_with_context(
                    format!(
                        "The amount exceeds the {} {} available",
                        available, self.resource_type
                    ),
                    context(),
                ));
            }
        }
        Ok(())
    }

    /// Enter a new amount. A valid amount is queued for a debounced commit;
    /// an invalid one is notified and dropped.
    ///
    /// # Returns
    /// `true` if the amount was queued
    pub fn set_amount(&self, amount: f64) -> bool {
        if self.scope.is_cancelled() {
            return false;
        }
        if let Err(err) = self.check(amount) {
            notify_failure(self.notifier.as_ref(), "Invalid resource amount", &err);
            return false;
        }
        self.state.lock().entered = amount;
        self.debouncer.push(amount);
        true
    }

    /// Send a pending entry without waiting for the debounce delay.
    pub fn flush(&self) {
        self.debouncer.flush();
    }

    /// Abandon pending and in-flight updates.
    pub fn dispose(&self) {
        self.scope.cancel();
    }

    /// Commit any pending entry and wait for it to finish.
    pub async fn close(self) {
        let Self {
            debouncer, scope, ..
        } = self;
        debouncer.close().await;
        drop(scope);
    }
}

#[cfg(all(test, feature = "local-api"))]
mod tests {
    use super::*;
    use crate::client::LocalProposalToolApi;
    use crate::services::debounce::DEFAULT_DEBOUNCE_DELAY;
    use crate::services::notifications::{NotificationLevel, NotificationLog};

    const CYCLE: CycleId = CycleId(2);
    const PROPOSAL: AllocatedProposalId = AllocatedProposalId(40);

    fn setup(amount: f64) -> (LocalProposalToolApi, NotificationLog, AllocatedBlock) {
        let api = LocalProposalToolApi::new();
        let mut block = AllocatedBlock::new("observing hours", amount, "Imaging", "A");
        block.id = Some(api.insert_block(CYCLE, PROPOSAL, block.clone()));
        (api, NotificationLog::new(), block)
    }

    fn editor(api: &LocalProposalToolApi, log: &NotificationLog, block: &AllocatedBlock) -> ResourceAmountEditor {
        ResourceAmountEditor::new(
            Arc::new(api.clone()),
            Arc::new(log.clone()),
            CYCLE,
            PROPOSAL,
            block,
            DEFAULT_DEBOUNCE_DELAY,
        )
        .unwrap()
    }

    async fn stored_amount(api: &LocalProposalToolApi) -> f64 {
        api.allocated_blocks(CYCLE, PROPOSAL).await.unwrap()[0].amount
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_sends_one_update() {
        let (api, log, block) = setup(10.0);
        let editor = editor(&api, &log, &block);

        assert!(editor.set_amount(11.0));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(editor.set_amount(12.0));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(editor.set_amount(30.0));
        assert_eq!(editor.amount(), 30.0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.request_count("update_resource_amount"), 1);
        assert_eq!(stored_amount(&api).await, 30.0);
        assert_eq!(editor.committed_amount(), 30.0);

        let last = log.last().unwrap();
        assert_eq!(last.level, NotificationLevel::Success);
        assert_eq!(last.title, "Updated");
        assert_eq!(last.message, "The resource amount changed to 30");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_amounts_are_rejected_locally() {
        let (api, log, block) = setup(4.0);
        api.set_remaining(CYCLE, "observing hours", 6.0);
        let editor = editor(&api, &log, &block);
        assert_eq!(editor.load_remaining().await, Some(6.0));

        assert!(!editor.set_amount(-1.0));
        assert!(!editor.set_amount(f64::NAN));
        assert!(!editor.set_amount(10.5));
        assert!(editor.set_amount(10.0));
        assert_eq!(log.errors().len(), 3);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.request_count("update_resource_amount"), 1);
        assert_eq!(editor.remaining(), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_update_is_notified() {
        let (api, log, block) = setup(1.0);
        api.inject_failure("update_resource_amount", 500, "write conflict");
        let editor = editor(&api, &log, &block);

        editor.set_amount(2.0);
        tokio::time::sleep(Duration::from_secs(1)).await;

        let last = log.last().unwrap();
        assert_eq!(last.title, "Failed to update resource amount");
        assert_eq!(last.message, "write conflict");
        assert_eq!(editor.committed_amount(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_abandons_pending_entry() {
        let (api, log, block) = setup(1.0);
        let editor = editor(&api, &log, &block);

        editor.set_amount(5.0);
        editor.dispose();
        assert!(!editor.set_amount(6.0));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(api.request_count("update_resource_amount"), 0);
        assert!(log.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_commits_pending_entry() {
        let (api, log, block) = setup(1.0);
        let editor = editor(&api, &log, &block);

        editor.set_amount(3.0);
        editor.close().await;
        assert_eq!(stored_amount(&api).await, 3.0);
    }

    #[tokio::test]
    async fn test_unsaved_block_is_rejected() {
        let block = AllocatedBlock::new("observing hours", 1.0, "Imaging", "A");
        let result = ResourceAmountEditor::new(
            Arc::new(LocalProposalToolApi::new()),
            Arc::new(NotificationLog::new()),
            CYCLE,
            PROPOSAL,
            &block,
            DEFAULT_DEBOUNCE_DELAY,
        );
        assert!(matches!(result, Err(ClientError::Validation { .. })));
    }
}
