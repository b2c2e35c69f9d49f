use sqlx::SqlitePool;

use crate::{config::IssueServerConfig, routes::pagination::Paginator, summary::SummaryQueue};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: IssueServerConfig,
    paginator: Paginator,
    summaries: SummaryQueue,
}

impl AppState {
    /// Builds the state and starts the target summary worker on the current runtime.
    pub fn new(pool: SqlitePool, config: IssueServerConfig) -> Self {
        let paginator = Paginator::new(config.pagination);
        let summaries = SummaryQueue::spawn(pool.clone(), config.summary);

        Self {
            pool,
            config,
            paginator,
            summaries,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &IssueServerConfig {
        &self.config
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn summaries(&self) -> &SummaryQueue {
        &self.summaries
    }
}
