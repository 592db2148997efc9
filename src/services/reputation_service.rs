use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::LeaderboardEntry,
    services::{badge_service, notification_service},
};

// Point weights per vote received, by content type and direction
const TOPIC_UPVOTE_POINTS: i64 = 10;
const TOPIC_DOWNVOTE_POINTS: i64 = 2;
const COMMENT_UPVOTE_POINTS: i64 = 5;
const COMMENT_DOWNVOTE_POINTS: i64 = 1;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReputationSummary {
    pub reputation: i32,
    pub votes_received: i32,
}

fn weighted_points(topic_up: i64, topic_down: i64, comment_up: i64, comment_down: i64) -> i64 {
    topic_up * TOPIC_UPVOTE_POINTS - topic_down * TOPIC_DOWNVOTE_POINTS
        + comment_up * COMMENT_UPVOTE_POINTS
        - comment_down * COMMENT_DOWNVOTE_POINTS
}

/// Reputation never goes negative, however lopsided the downvotes.
fn reputation_from_counts(
    topic_up: i64,
    topic_down: i64,
    comment_up: i64,
    comment_down: i64,
) -> i64 {
    weighted_points(topic_up, topic_down, comment_up, comment_down).max(0)
}

/// Recompute a user's reputation and received-vote count from every vote
/// on content they authored, excluding their own votes, then persist both
/// and run badge evaluation.
pub async fn recompute_reputation(db: &PgPool, user_id: Uuid) -> Result<ReputationSummary> {
    let (topic_up, topic_down) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE v.vote_type = 1),
            COUNT(*) FILTER (WHERE v.vote_type = -1)
        FROM votes v
        JOIN topics t ON v.target_id = t.id AND v.target_type = 'topic'
        WHERE t.author_id = $1 AND v.user_id != $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    let (comment_up, comment_down) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE v.vote_type = 1),
            COUNT(*) FILTER (WHERE v.vote_type = -1)
        FROM votes v
        JOIN comments c ON v.target_id = c.id AND v.target_type = 'comment'
        WHERE c.author_id = $1 AND v.user_id != $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    let reputation = reputation_from_counts(topic_up, topic_down, comment_up, comment_down);
    // Upvotes only; used for badge criteria and display
    let votes_received = topic_up + comment_up;

    sqlx::query("UPDATE users SET reputation = $1, votes_received = $2 WHERE id = $3")
        .bind(reputation as i32)
        .bind(votes_received as i32)
        .bind(user_id)
        .execute(db)
        .await?;

    let awarded = badge_service::evaluate_badges(db, user_id).await?;
    for badge in &awarded {
        if let Err(e) = notification_service::notify_badge_earned(db, user_id, badge).await {
            tracing::warn!(
                "Failed to notify user {} of badge {}: {}",
                user_id,
                badge.name,
                e
            );
        }
    }

    Ok(ReputationSummary {
        reputation: reputation as i32,
        votes_received: votes_received as i32,
    })
}

/// Top users by reputation, ties broken by received votes. Users at zero
/// reputation never rank.
pub async fn get_leaderboard(
    db: &PgPool,
    limit: u32,
    offset: u32,
) -> Result<Vec<LeaderboardEntry>> {
    let users = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT
            u.id, u.username, u.display_name, u.avatar_url,
            u.reputation, u.votes_received,
            (SELECT COUNT(*) FROM topics WHERE author_id = u.id) AS topic_count,
            (SELECT COUNT(*) FROM comments WHERE author_id = u.id) AS comment_count,
            (SELECT COUNT(*) FROM user_badges WHERE user_id = u.id) AS badge_count
        FROM users u
        WHERE u.reputation > 0
        ORDER BY u.reputation DESC, u.votes_received DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(db)
    .await?;

    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_upvote_is_worth_ten() {
        assert_eq!(reputation_from_counts(1, 0, 0, 0), 10);
    }

    #[test]
    fn comment_votes_weigh_less_than_topic_votes() {
        assert_eq!(reputation_from_counts(0, 0, 1, 0), 5);
        assert_eq!(weighted_points(0, 1, 0, 0), -2);
        assert_eq!(weighted_points(0, 0, 0, 1), -1);
    }

    #[test]
    fn mixed_votes_sum_per_weight_table() {
        // 2 topic ups, 1 topic down, 3 comment ups, 2 comment downs
        assert_eq!(reputation_from_counts(2, 1, 3, 2), 20 - 2 + 15 - 2);
    }

    #[test]
    fn reputation_clamps_at_zero() {
        // A single downvoted topic would be -2 raw
        assert_eq!(reputation_from_counts(0, 1, 0, 0), 0);
        // Heavy downvoting still cannot go negative
        assert_eq!(reputation_from_counts(1, 40, 0, 0), 0);
    }
}
