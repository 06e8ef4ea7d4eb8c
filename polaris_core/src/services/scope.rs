//! Cancellation scope tied to the lifetime of a view.
//!
//! Every backend call a view makes runs through its [`ViewScope`]. Once the
//! view is disposed (explicitly or by dropping the scope), in-flight calls
//! resolve to [`ClientError::Cancelled`] and late results are refused.

use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A scope cancelled whenever `parent` is.
    pub fn child_of(parent: &ViewScope) -> Self {
        Self {
            token: parent.token.child_token(),
        }
    }

    /// A scope cancelled whenever `parent` is; dropping it leaves the
    /// parent untouched.
    pub fn child_of_token(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
        }
    }

    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!("view scope cancelled");
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Handle that can cancel this scope from elsewhere.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Race `fut` against cancellation.
    pub async fn run<T, F>(&self, fut: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        if self.token.is_cancelled() {
            return Err(ClientError::cancelled());
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ClientError::cancelled()),
            result = fut => self.apply(result),
        }
    }

    /// Refuse a result that arrives after the scope was cancelled.
    pub fn apply<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if self.token.is_cancelled() {
            Err(ClientError::cancelled())
        } else {
            result
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let scope = ViewScope::new();
        let value = scope.run(async { Ok::<_, ClientError>(5) }).await.unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_in_flight_call() {
        let scope = ViewScope::new();
        let token = scope.token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let result = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, ClientError>(())
            })
            .await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_drop_cancels_children() {
        let parent = ViewScope::new();
        let child = ViewScope::child_of(&parent);
        drop(parent);
        assert!(child.is_cancelled());
        assert!(child.apply(Ok::<_, ClientError>(1)).is_err());
    }
}
