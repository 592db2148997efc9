use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What a vote points at. Anything else is rejected at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vote_target", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Topic,
    Comment,
}

impl TargetType {
    /// Table holding the voted-on content rows.
    pub fn content_table(&self) -> &'static str {
        match self {
            TargetType::Topic => "topics",
            TargetType::Comment => "comments",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_type: TargetType,
    pub target_id: Uuid,
    pub vote_type: i16, // -1 for downvote, 1 for upvote
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a cast did to the voter's existing vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Created,
    Changed,
    Removed,
}

/// Result of casting a vote: the action taken and the vote that remains
/// (-1, 0 after a toggle-off, or 1).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoteOutcome {
    pub action: VoteAction,
    pub vote: i16,
}

// Vote request
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote_type: i16, // -1 for downvote, 1 for upvote
}

/// Denormalized counters cached on the target row, always recomputed
/// from the votes table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoteTally {
    pub upvotes: i32,
    pub downvotes: i32,
    pub vote_score: i32,
}

// Vote response
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub success: bool,
    pub action: VoteAction,
    pub vote: i16,
    pub upvotes: i32,
    pub downvotes: i32,
    pub vote_score: i32,
}
