use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{AwardedBadge, Badge, BadgeCriteria},
};

/// The stats a badge criterion can be checked against, captured at
/// evaluation time.
#[derive(Debug, Clone, Copy)]
pub struct UserStatSnapshot {
    pub reputation: i64,
    pub votes_received: i64,
    pub topic_count: i64,
    pub comment_count: i64,
    pub account_age_days: i64,
}

impl UserStatSnapshot {
    fn stat(&self, criteria: BadgeCriteria) -> i64 {
        match criteria {
            BadgeCriteria::Reputation => self.reputation,
            BadgeCriteria::Topics => self.topic_count,
            BadgeCriteria::Comments => self.comment_count,
            BadgeCriteria::VotesReceived => self.votes_received,
            BadgeCriteria::AccountAgeDays => self.account_age_days,
        }
    }
}

fn meets_criterion(snapshot: &UserStatSnapshot, badge: &Badge) -> bool {
    snapshot.stat(badge.criteria_type) >= badge.criteria_value as i64
}

/// Award every catalog badge whose threshold the user now meets and does
/// not already hold. Returns only the badges inserted by this call, so a
/// re-run with unchanged stats awards nothing.
pub async fn evaluate_badges(db: &PgPool, user_id: Uuid) -> Result<Vec<Badge>> {
    let row = sqlx::query_as::<_, (i32, i32, i64, i64, DateTime<Utc>)>(
        r#"
        SELECT
            u.reputation,
            u.votes_received,
            (SELECT COUNT(*) FROM topics WHERE author_id = u.id),
            (SELECT COUNT(*) FROM comments WHERE author_id = u.id),
            u.created_at
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    let Some((reputation, votes_received, topic_count, comment_count, created_at)) = row else {
        return Ok(Vec::new());
    };

    let snapshot = UserStatSnapshot {
        reputation: reputation as i64,
        votes_received: votes_received as i64,
        topic_count,
        comment_count,
        account_age_days: (Utc::now() - created_at).num_days(),
    };

    let candidates = sqlx::query_as::<_, Badge>(
        r#"
        SELECT * FROM badges
        WHERE id NOT IN (SELECT badge_id FROM user_badges WHERE user_id = $1)
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let mut awarded = Vec::new();
    for badge in candidates {
        if !meets_criterion(&snapshot, &badge) {
            continue;
        }

        // Insert-if-absent keyed on (user_id, badge_id); a concurrent
        // evaluation racing us simply loses the conflict
        let result = sqlx::query(
            r#"
            INSERT INTO user_badges (user_id, badge_id, awarded_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(badge.id)
        .bind(Utc::now())
        .execute(db)
        .await?;

        if result.rows_affected() > 0 {
            awarded.push(badge);
        }
    }

    Ok(awarded)
}

pub async fn get_user_badges(db: &PgPool, user_id: Uuid) -> Result<Vec<AwardedBadge>> {
    let badges = sqlx::query_as::<_, AwardedBadge>(
        r#"
        SELECT b.id, b.name, b.description, b.tier, b.criteria_type, b.criteria_value,
               ub.awarded_at
        FROM badges b
        JOIN user_badges ub ON b.id = ub.badge_id
        WHERE ub.user_id = $1
        ORDER BY ub.awarded_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(badges)
}

pub async fn list_badges(db: &PgPool) -> Result<Vec<Badge>> {
    let badges = sqlx::query_as::<_, Badge>(
        r#"
        SELECT * FROM badges
        ORDER BY
            CASE tier
                WHEN 'bronze' THEN 1
                WHEN 'silver' THEN 2
                WHEN 'gold' THEN 3
                WHEN 'platinum' THEN 4
            END,
            criteria_value ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(badges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BadgeTier;

    fn snapshot() -> UserStatSnapshot {
        UserStatSnapshot {
            reputation: 50,
            votes_received: 10,
            topic_count: 5,
            comment_count: 20,
            account_age_days: 30,
        }
    }

    fn badge(criteria_type: BadgeCriteria, criteria_value: i32) -> Badge {
        Badge {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            description: "test".to_string(),
            tier: BadgeTier::Bronze,
            criteria_type,
            criteria_value,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn criterion_met_at_exact_threshold() {
        assert!(meets_criterion(
            &snapshot(),
            &badge(BadgeCriteria::Reputation, 50)
        ));
    }

    #[test]
    fn criterion_not_met_below_threshold() {
        assert!(!meets_criterion(
            &snapshot(),
            &badge(BadgeCriteria::Reputation, 51)
        ));
    }

    #[test]
    fn each_criteria_type_reads_its_own_stat() {
        let s = snapshot();
        assert!(meets_criterion(&s, &badge(BadgeCriteria::Topics, 5)));
        assert!(!meets_criterion(&s, &badge(BadgeCriteria::Topics, 6)));
        assert!(meets_criterion(&s, &badge(BadgeCriteria::Comments, 20)));
        assert!(meets_criterion(&s, &badge(BadgeCriteria::VotesReceived, 10)));
        assert!(meets_criterion(&s, &badge(BadgeCriteria::AccountAgeDays, 30)));
        assert!(!meets_criterion(&s, &badge(BadgeCriteria::AccountAgeDays, 365)));
    }
}
