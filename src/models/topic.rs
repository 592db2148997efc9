use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::CommentResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub category: String,
    pub author_id: Uuid,
    pub upvotes: i32,
    pub downvotes: i32,
    pub vote_score: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicSort {
    New,
    Old,
    Top,
}

impl Default for TopicSort {
    fn default() -> Self {
        TopicSort::New
    }
}

// Create topic request
#[derive(Debug, Validate, Deserialize)]
pub struct CreateTopicRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(length(min = 1, max = 40000))]
    pub body: String,
    #[validate(length(max = 50))]
    pub category: Option<String>,
}

// Update topic request
#[derive(Debug, Validate, Deserialize)]
pub struct UpdateTopicRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 40000))]
    pub body: Option<String>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTopicsQuery {
    pub query: Option<String>,
    #[serde(default)]
    pub sort: TopicSort,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TopicAuthor {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub reputation: i32,
}

// List view: no body, no comments
#[derive(Debug, Serialize)]
pub struct TopicListResponse {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub author: TopicAuthor,
    pub upvotes: i32,
    pub downvotes: i32,
    pub vote_score: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub user_vote: Option<i16>,
}

// Detail view with comments embedded
#[derive(Debug, Serialize)]
pub struct TopicResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub category: String,
    pub author: TopicAuthor,
    pub upvotes: i32,
    pub downvotes: i32,
    pub vote_score: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_vote: Option<i16>,
    pub is_bookmarked: bool,
    pub comments: Vec<CommentResponse>,
}
