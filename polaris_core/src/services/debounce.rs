//! Trailing-edge debounce for edits that are committed to the backend.
//!
//! Values pushed within the delay window collapse into a single commit of the
//! latest one. The commit runs on a background task owned by the debouncer.

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

type CommitFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

enum Command<T> {
    Push(T),
    Flush,
}

/// Handle to a debounced commit loop.
///
/// * `push` replaces the pending value and restarts the delay
/// * `cancel` discards the pending value and stops the loop
/// * dropping the handle (or `close`) commits the pending value immediately
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
    token: CancellationToken,
    task: JoinHandle<()>,
    delay: Duration,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the commit loop on the current runtime.
    pub fn new<F, Fut>(delay: Duration, commit: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::with_token(delay, CancellationToken::new(), commit)
    }

    /// Like [`Debouncer::new`], cancelled together with `token`.
    pub fn with_token<F, Fut>(delay: Duration, token: CancellationToken, commit: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let commit: CommitFn<T> = Arc::new(move |value| commit(value).boxed());
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_loop(rx, delay, commit, token.clone()));
        Self {
            tx,
            token,
            task,
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value; ignored once cancelled.
    pub fn push(&self, value: T) {
        if self.token.is_cancelled() {
            return;
        }
        let _ = self.tx.send(Command::Push(value));
    }

    /// Commit the pending value now instead of waiting for the delay.
    pub fn flush(&self) {
        let _ = self.tx.send(Command::Flush);
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Commit whatever is pending and wait for the loop to finish.
    pub async fn close(self) {
        let Self { tx, task, .. } = self;
        drop(tx);
        if let Err(err) = task.await {
            debug!(error = %err, "debounce loop ended abnormally");
        }
    }
}

async fn run_loop<T>(
    mut rx: mpsc::UnboundedReceiver<Command<T>>,
    delay: Duration,
    commit: CommitFn<T>,
    token: CancellationToken,
) {
    let mut pending: Option<T> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        let at = deadline;
        let timer = async move {
            match at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                if pending.take().is_some() {
                    debug!("pending edit discarded");
                }
                break;
            }
            command = rx.recv() => match command {
                Some(Command::Push(value)) => {
                    trace!("edit queued");
                    pending = Some(value);
                    deadline = Some(Instant::now() + delay);
                }
                Some(Command::Flush) => {
                    deadline = None;
                    if let Some(value) = pending.take() {
                        commit(value).await;
                    }
                }
                None => {
                    if let Some(value) = pending.take() {
                        trace!("flushing pending edit on close");
                        commit(value).await;
                    }
                    break;
                }
            },
            _ = timer => {
                deadline = None;
                if let Some(value) = pending.take() {
                    commit(value).await;
                }
            }
        }
    }
}
