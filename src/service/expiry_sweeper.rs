//! Background expiry sweeper.
//!
//! A single tokio task that soft-deletes expired announcements on a fixed
//! interval. The first pass runs as soon as the task starts. A failed pass is
//! logged and the loop keeps going; only the cancellation token ends it.
//!
//! ```text
//! ExpirySweeper
//!     │
//!     ├─► sweep_expired (one UPDATE)
//!     ├─► log count / error
//!     └─► wait interval  ◄── CancellationToken interrupts the wait
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::repository::AnnouncementRepository;

/// Run one expiry pass against the store.
pub async fn sweep_expired(repo: &dyn AnnouncementRepository) -> Result<u64> {
    repo.soft_delete_expired(Utc::now()).await
}

/// Lifecycle of the sweeper as seen by its owner.
#[derive(Default)]
pub enum SweeperState {
    #[default]
    Stopped,
    Running(ExpirySweeper),
}

impl SweeperState {
    pub fn is_running(&self) -> bool {
        match self {
            SweeperState::Stopped => false,
            SweeperState::Running(sweeper) => !sweeper.is_finished(),
        }
    }
}

/// Handle to a spawned sweeper task. Dropping the handle cancels the task.
pub struct ExpirySweeper {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
    _cancel_on_drop: DropGuard,
}

impl ExpirySweeper {
    /// Spawn the sweeper loop on the current tokio runtime.
    pub fn spawn(repo: Arc<dyn AnnouncementRepository>, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            run(repo, interval, token).await;
        });

        info!(interval_secs = interval.as_secs_f64(), "expiry sweeper started");

        Self {
            _cancel_on_drop: shutdown.clone().drop_guard(),
            shutdown,
            handle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the loop to stop and wait up to `timeout` for it to exit. A pass
    /// already in progress is allowed to finish; if it outlives the timeout
    /// the task is aborted.
    pub async fn shutdown(mut self, timeout: Duration) {
        self.shutdown.cancel();

        match tokio::time::timeout(timeout, &mut self.handle).await {
            Ok(Ok(())) => info!("expiry sweeper stopped"),
            Ok(Err(e)) => warn!(error = %e, "expiry sweeper task ended abnormally"),
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs_f64(), "expiry sweeper did not stop in time, aborting");
                self.handle.abort();
            }
        }
    }
}

async fn run(repo: Arc<dyn AnnouncementRepository>, interval: Duration, shutdown: CancellationToken) {
    loop {
        if shutdown.is_cancelled() {
            break;
        }

        match sweep_expired(repo.as_ref()).await {
            Ok(0) => debug!("no expired announcements"),
            Ok(count) => info!(count, "soft-deleted expired announcements"),
            Err(e) => error!(error = %e, "expiry sweep failed"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!("expiry sweeper loop exited");
}
