use sqlx::PgPool;
use std::collections::HashSet;
use tokio::time::{Duration, interval};
use uuid::Uuid;

use crate::{
    error::Result,
    models::TargetType,
    services::{notification_service, reputation_service, vote_service},
};

#[derive(Clone)]
pub struct BackgroundJobsService {
    db: PgPool,
}

impl BackgroundJobsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Start all background jobs
    pub async fn start_all_jobs(&self) {
        let jobs_service = self.clone();

        // Reconcile derived vote aggregates every 15 minutes
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(900));
            loop {
                interval.tick().await;
                if let Err(e) = jobs_service.reconcile_vote_aggregates().await {
                    tracing::error!("Failed to reconcile vote aggregates: {}", e);
                }
            }
        });

        let jobs_service = self.clone();

        // Cleanup old notifications every hour
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                if let Err(e) = jobs_service.cleanup_old_notifications().await {
                    tracing::error!("Failed to cleanup old notifications: {}", e);
                }
            }
        });

        tracing::info!("Background jobs started successfully");
    }

    /// Re-derive tallies and reputation for targets with recent vote
    /// activity. Recomputation is idempotent, so this repairs any drift a
    /// failed post-vote update left behind.
    async fn reconcile_vote_aggregates(&self) -> Result<()> {
        let targets: Vec<(TargetType, Uuid)> = sqlx::query_as(
            "SELECT DISTINCT target_type, target_id FROM votes WHERE updated_at > NOW() - INTERVAL '1 hour'",
        )
        .fetch_all(&self.db)
        .await?;

        let mut authors = HashSet::new();
        for (target_type, target_id) in &targets {
            if let Err(e) = vote_service::recompute_tally(&self.db, *target_type, *target_id).await
            {
                tracing::warn!(
                    "Failed to reconcile tally for {:?} {}: {}",
                    target_type,
                    target_id,
                    e
                );
                continue;
            }

            if let Some(author_id) =
                vote_service::target_author(&self.db, *target_type, *target_id).await?
            {
                authors.insert(author_id);
            }
        }

        for author_id in authors {
            if let Err(e) = reputation_service::recompute_reputation(&self.db, author_id).await {
                tracing::warn!("Failed to reconcile reputation for {}: {}", author_id, e);
            }
        }

        if !targets.is_empty() {
            tracing::debug!("Reconciled {} vote targets", targets.len());
        }

        Ok(())
    }

    /// Cleanup old notifications (older than 30 days)
    async fn cleanup_old_notifications(&self) -> Result<()> {
        let cleaned = notification_service::cleanup_old_notifications(&self.db, 30).await?;
        if cleaned > 0 {
            tracing::info!("Cleaned up {} old notifications", cleaned);
        }
        Ok(())
    }
}
