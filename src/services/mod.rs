pub mod background_jobs;
pub mod badge_service;
pub mod comment_service;
pub mod moderation_service;
pub mod notification_service;
pub mod reputation_service;
pub mod topic_service;
pub mod vote_service;
