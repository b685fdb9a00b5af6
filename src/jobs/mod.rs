use crate::metrics::record_background_job;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        if self.context.config.jobs.reconcile_enabled {
            tokio::spawn(Self::friendship_reconcile_job(Arc::clone(&self)));
        } else {
            info!("Friendship reconciliation disabled");
        }

        // Spawn monitoring tasks
        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Repair friendships missing for accepted requests (interval from config)
    async fn friendship_reconcile_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(
            scheduler.context.config.jobs.reconcile_interval_secs,
        ));

        loop {
            interval.tick().await;
            info!("Running friendship reconciliation");

            let started = Instant::now();
            match tasks::reconcile_friendships(&scheduler.context).await {
                Ok(count) => {
                    record_background_job(
                        "friendship_reconcile",
                        "success",
                        started.elapsed().as_secs_f64(),
                    );
                    if count > 0 {
                        info!("Repaired {} missing friendships", count);
                    } else {
                        info!("Friendship reconciliation: nothing to repair");
                    }
                }
                Err(e) => {
                    record_background_job(
                        "friendship_reconcile",
                        "error",
                        started.elapsed().as_secs_f64(),
                    );
                    error!("Failed to reconcile friendships: {}", e);
                }
            }
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300)); // Every 5 minutes

        loop {
            interval.tick().await;

            match tasks::health_check(&scheduler.context).await {
                Ok(_) => {
                    // Silent success - the store is answering queries
                }
                Err(e) => error!("Health check failed: {}", e),
            }
        }
    }
}
