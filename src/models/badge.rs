use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "badge_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Which user stat a badge threshold is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "badge_criteria", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BadgeCriteria {
    Reputation,
    Topics,
    Comments,
    VotesReceived,
    AccountAgeDays,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub tier: BadgeTier,
    pub criteria_type: BadgeCriteria,
    pub criteria_value: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserBadge {
    pub user_id: Uuid,
    pub badge_id: Uuid,
    pub awarded_at: DateTime<Utc>,
}

// Badge joined with its award timestamp, for profile and badge listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AwardedBadge {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub tier: BadgeTier,
    pub criteria_type: BadgeCriteria,
    pub criteria_value: i32,
    pub awarded_at: DateTime<Utc>,
}
