//! Background recomputation of target summaries.
//!
//! Handlers submit a target id after a write that may change the target's
//! open-issue counts and return immediately. A single worker drains the
//! queue, retrying failed recomputes with linear backoff. Failures are only
//! logged; jobs still queued when the process exits are lost.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use api_types::TargetSummary;
use sqlx::SqlitePool;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::SummaryConfig,
    db::targets::{TargetError, TargetRepository},
};

#[derive(Clone)]
pub struct SummaryQueue {
    tx: mpsc::UnboundedSender<Uuid>,
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl SummaryQueue {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(pool: SqlitePool, config: SummaryConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let idle = Arc::new(Notify::new());

        info!(
            retry_attempts = config.retry_attempts,
            retry_backoff_ms = config.retry_backoff.as_millis() as u64,
            "starting target summary worker"
        );

        tokio::spawn(run_worker(pool, config, rx, pending.clone(), idle.clone()));

        Self { tx, pending, idle }
    }

    pub fn submit(&self, target_id: Uuid) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(target_id).is_err() {
            warn!(%target_id, "summary worker is gone, dropping recompute");
            complete(&self.pending, &self.idle);
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Resolves once every submitted job has been processed.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

fn complete(pending: &AtomicUsize, idle: &Notify) {
    if pending.fetch_sub(1, Ordering::SeqCst) == 1 {
        idle.notify_waiters();
    }
}

async fn run_worker(
    pool: SqlitePool,
    config: SummaryConfig,
    mut rx: mpsc::UnboundedReceiver<Uuid>,
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
) {
    while let Some(target_id) = rx.recv().await {
        recompute_with_retry(&pool, config, target_id).await;
        complete(&pending, &idle);
    }
}

#[instrument(name = "summary.recompute", skip(pool, config))]
async fn recompute_with_retry(pool: &SqlitePool, config: SummaryConfig, target_id: Uuid) {
    for attempt in 1..=config.retry_attempts {
        match recompute(pool, target_id).await {
            Ok(summary) => {
                debug!(open = summary.total(), "target summary updated");
                return;
            }
            Err(TargetError::NotFound) => {
                warn!("target no longer exists, skipping summary");
                return;
            }
            Err(error) if attempt < config.retry_attempts => {
                warn!(?error, attempt, "target summary update failed, retrying");
                tokio::time::sleep(config.retry_backoff * attempt).await;
            }
            Err(error) => {
                error!(?error, attempt, "giving up on target summary update");
            }
        }
    }
}

async fn recompute(pool: &SqlitePool, target_id: Uuid) -> Result<TargetSummary, TargetError> {
    let mut tx = pool.begin().await?;
    let summary = TargetRepository::update_summary(&mut tx, target_id).await?;
    tx.commit().await?;
    Ok(summary)
}
