use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error};

/// Work started by a request that must outlive the request itself.
///
/// A webhook sender hanging up drops its handler future; the spawned task
/// keeps running and `drain` lets shutdown wait for it.
#[derive(Default)]
pub struct InFlight {
    tasks: Mutex<JoinSet<()>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` on its own task. The receiver yields its output, or an
    /// error if the task panicked.
    pub fn spawn<T, F>(
        &self,
        work: F,
    ) -> oneshot::Receiver<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let mut tasks = self.tasks();
        while let Some(finished) = tasks.try_join_next() {
            log_join(finished);
        }
        tasks.spawn(async move {
            if tx.send(work.await).is_err() {
                debug!("Requester left before the work finished");
            }
        });
        rx
    }

    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits for every task spawned so far.
    pub async fn drain(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks());
        while let Some(finished) = tasks.join_next().await {
            log_join(finished);
        }
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_join(finished: Result<(), JoinError>) {
    if let Err(err) = finished {
        error!(error = %err, "In-flight task did not complete");
    }
}
