use std::future::Future;

use tokio::task::JoinSet;
use tracing::warn;

/// Completion token carried by every lifecycle event.
///
/// Work the worker starts without awaiting (the background refresh of a
/// stale-while-revalidate hit) is registered here. The host keeps the token
/// until `settle` returns. Dropping the token aborts whatever is still
/// running, the same as the host terminating the worker between events.
#[derive(Default)]
pub struct WaitUntil {
    tasks: JoinSet<()>,
}

impl WaitUntil {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(work);
    }

    /// Number of registered tasks that have not been collected yet
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every registered task to finish. Returns how many ran.
    pub async fn settle(mut self) -> usize {
        let mut settled = 0;
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Background task did not complete");
            }
            settled += 1;
        }
        settled
    }
}
