/// Background task implementations
use crate::{context::AppContext, error::SyncResult, social::FRIENDSHIPS_COLLECTION, store::Query};

/// Repair friendships missing for accepted requests
pub async fn reconcile_friendships(ctx: &AppContext) -> SyncResult<usize> {
    ctx.social.reconcile_accepted_requests().await
}

/// Health check - verify the document store answers queries
pub async fn health_check(ctx: &AppContext) -> SyncResult<()> {
    ctx.store
        .query(&Query::collection(FRIENDSHIPS_COLLECTION))
        .await?;

    // All checks passed
    Ok(())
}
