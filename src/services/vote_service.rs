use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{TargetType, VoteAction, VoteOutcome, VoteTally},
    services::reputation_service,
};

pub const UPVOTE: i16 = 1;
pub const DOWNVOTE: i16 = -1;

/// Resolve what a requested vote does to the voter's current vote on a
/// target. Re-casting the same direction toggles the vote off.
fn transition(existing: Option<i16>, requested: i16) -> (VoteAction, i16) {
    match existing {
        None => (VoteAction::Created, requested),
        Some(current) if current == requested => (VoteAction::Removed, 0),
        Some(_) => (VoteAction::Changed, requested),
    }
}

/// Cast, change, or remove a vote on a topic or comment.
///
/// The vote row is the primary effect. Tally and reputation recomputation
/// run afterwards without a surrounding transaction; if either fails the
/// cast still succeeds and the counters heal on the next recomputation.
pub async fn cast_vote(
    db: &PgPool,
    user_id: Uuid,
    target_type: TargetType,
    target_id: Uuid,
    vote_type: i16,
) -> Result<VoteOutcome> {
    if vote_type != UPVOTE && vote_type != DOWNVOTE {
        return Err(AppError::BadRequest("Invalid vote type".to_string()));
    }

    // Target must exist before any mutation; its author attributes reputation
    let author_id = target_author(db, target_type, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Target not found".to_string()))?;

    let existing = sqlx::query_scalar::<_, i16>(
        "SELECT vote_type FROM votes WHERE user_id = $1 AND target_type = $2 AND target_id = $3",
    )
    .bind(user_id)
    .bind(target_type)
    .bind(target_id)
    .fetch_optional(db)
    .await?;

    let (action, vote) = transition(existing, vote_type);

    match action {
        VoteAction::Removed => {
            sqlx::query(
                "DELETE FROM votes WHERE user_id = $1 AND target_type = $2 AND target_id = $3",
            )
            .bind(user_id)
            .bind(target_type)
            .bind(target_id)
            .execute(db)
            .await?;
        }
        VoteAction::Changed => {
            sqlx::query(
                r#"
                UPDATE votes SET vote_type = $4, updated_at = $5
                WHERE user_id = $1 AND target_type = $2 AND target_id = $3
                "#,
            )
            .bind(user_id)
            .bind(target_type)
            .bind(target_id)
            .bind(vote_type)
            .bind(chrono::Utc::now())
            .execute(db)
            .await?;
        }
        VoteAction::Created => {
            sqlx::query(
                r#"
                INSERT INTO votes (id, user_id, target_type, target_id, vote_type, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(target_type)
            .bind(target_id)
            .bind(vote_type)
            .bind(chrono::Utc::now())
            .execute(db)
            .await?;
        }
    }

    // Best-effort from here on: the vote is committed, derived counters
    // are eventually consistent
    if let Err(e) = recompute_tally(db, target_type, target_id).await {
        tracing::warn!(
            "Failed to recompute tally for {:?} {}: {}",
            target_type,
            target_id,
            e
        );
    }

    // Self-votes never touch the author's reputation
    if author_id != user_id {
        if let Err(e) = reputation_service::recompute_reputation(db, author_id).await {
            tracing::warn!("Failed to recompute reputation for {}: {}", author_id, e);
        }
    }

    Ok(VoteOutcome { action, vote })
}

/// Recompute a target's vote counters from the votes table and write all
/// three onto the target row. Always a full recount, never a delta, so any
/// prior drift is corrected here.
pub async fn recompute_tally(
    db: &PgPool,
    target_type: TargetType,
    target_id: Uuid,
) -> Result<VoteTally> {
    let (upvotes, downvotes) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE vote_type = 1),
            COUNT(*) FILTER (WHERE vote_type = -1)
        FROM votes
        WHERE target_type = $1 AND target_id = $2
        "#,
    )
    .bind(target_type)
    .bind(target_id)
    .fetch_one(db)
    .await?;

    let tally = VoteTally {
        upvotes: upvotes as i32,
        downvotes: downvotes as i32,
        vote_score: (upvotes - downvotes) as i32,
    };

    sqlx::query(&format!(
        "UPDATE {} SET upvotes = $1, downvotes = $2, vote_score = $3 WHERE id = $4",
        target_type.content_table()
    ))
    .bind(tally.upvotes)
    .bind(tally.downvotes)
    .bind(tally.vote_score)
    .bind(target_id)
    .execute(db)
    .await?;

    Ok(tally)
}

/// The viewer's vote on a target: -1, 0, or 1.
pub async fn get_user_vote(
    db: &PgPool,
    user_id: Uuid,
    target_type: TargetType,
    target_id: Uuid,
) -> Result<i16> {
    let vote = sqlx::query_scalar::<_, i16>(
        "SELECT vote_type FROM votes WHERE user_id = $1 AND target_type = $2 AND target_id = $3",
    )
    .bind(user_id)
    .bind(target_type)
    .bind(target_id)
    .fetch_optional(db)
    .await?;

    Ok(vote.unwrap_or(0))
}

pub async fn target_author(
    db: &PgPool,
    target_type: TargetType,
    target_id: Uuid,
) -> Result<Option<Uuid>> {
    let author_id = sqlx::query_scalar::<_, Uuid>(&format!(
        "SELECT author_id FROM {} WHERE id = $1",
        target_type.content_table()
    ))
    .bind(target_id)
    .fetch_optional(db)
    .await?;

    Ok(author_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cast_creates_the_vote() {
        assert_eq!(transition(None, UPVOTE), (VoteAction::Created, UPVOTE));
        assert_eq!(transition(None, DOWNVOTE), (VoteAction::Created, DOWNVOTE));
    }

    #[test]
    fn recasting_same_direction_toggles_off() {
        let (action, vote) = transition(None, UPVOTE);
        assert_eq!(action, VoteAction::Created);

        let (action, vote) = transition(Some(vote), UPVOTE);
        assert_eq!(action, VoteAction::Removed);
        assert_eq!(vote, 0);
    }

    #[test]
    fn opposite_direction_changes_in_place() {
        let (action, vote) = transition(Some(UPVOTE), DOWNVOTE);
        assert_eq!(action, VoteAction::Changed);
        assert_eq!(vote, DOWNVOTE);

        let (action, vote) = transition(Some(DOWNVOTE), UPVOTE);
        assert_eq!(action, VoteAction::Changed);
        assert_eq!(vote, UPVOTE);
    }

    #[test]
    fn cast_after_toggle_off_starts_fresh() {
        // up, up (off), up again lands back on a created upvote
        let (_, vote) = transition(None, UPVOTE);
        let (_, vote) = transition(Some(vote), UPVOTE);
        assert_eq!(vote, 0);

        let (action, vote) = transition(None, UPVOTE);
        assert_eq!(action, VoteAction::Created);
        assert_eq!(vote, UPVOTE);
    }
}
