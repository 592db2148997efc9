pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod redis;
pub mod services;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, post, put},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, redis::RedisClient};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: Arc<RedisClient>,
    pub config: Arc<Config>,
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origins
                .iter()
                .map(|origin| origin.parse::<HeaderValue>().unwrap())
                .collect::<Vec<_>>(),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/topics", get(handlers::topics::list_topics))
        .route("/api/topics/{topic_id}", get(handlers::topics::get_topic))
        .route(
            "/api/topics/{topic_id}/vote",
            get(handlers::topics::get_topic_votes),
        )
        .route(
            "/api/topics/{topic_id}/comments",
            get(handlers::comments::get_topic_comments),
        )
        .route("/api/leaderboard", get(handlers::users::get_leaderboard))
        .route("/api/badges", get(handlers::users::list_badges))
        .route(
            "/api/users/{username}",
            get(handlers::users::get_user_by_username),
        );

    // Protected routes
    let protected_routes = Router::new()
        // Topic routes
        .route("/api/topics", post(handlers::topics::create_topic))
        .route("/api/topics/{topic_id}", put(handlers::topics::update_topic))
        .route(
            "/api/topics/{topic_id}",
            delete(handlers::topics::delete_topic),
        )
        .route(
            "/api/topics/{topic_id}/vote",
            post(handlers::topics::vote_topic),
        )
        .route(
            "/api/topics/{topic_id}/bookmark",
            post(handlers::topics::bookmark_topic),
        )
        .route(
            "/api/topics/{topic_id}/bookmark",
            delete(handlers::topics::unbookmark_topic),
        )
        .route(
            "/api/topics/{topic_id}/report",
            post(handlers::topics::report_topic),
        )
        .route("/api/users/me/bookmarks", get(handlers::topics::get_bookmarks))
        // Comment routes
        .route(
            "/api/topics/{topic_id}/comments",
            post(handlers::comments::create_comment),
        )
        .route(
            "/api/comments/{comment_id}",
            put(handlers::comments::update_comment),
        )
        .route(
            "/api/comments/{comment_id}",
            delete(handlers::comments::delete_comment),
        )
        .route(
            "/api/comments/{comment_id}/vote",
            post(handlers::comments::vote_comment),
        )
        .route(
            "/api/comments/{comment_id}/report",
            post(handlers::comments::report_comment),
        )
        // Notification routes
        .route(
            "/api/notifications",
            get(handlers::notifications::get_notifications),
        )
        .route(
            "/api/notifications/unread-count",
            get(handlers::notifications::unread_count),
        )
        .route(
            "/api/notifications/read",
            put(handlers::notifications::mark_read),
        )
        .route(
            "/api/notifications",
            delete(handlers::notifications::delete_notifications),
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
