use regex::Regex;
use sqlx::PgPool;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{Badge, Notification, NotificationListResponse, NotificationType},
};

pub async fn create_notification(
    db: &PgPool,
    user_id: Uuid,
    notification_type: NotificationType,
    title: &str,
    body: Option<&str>,
    link: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, notification_type, title, body, link, is_read, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(notification_type)
    .bind(title)
    .bind(body)
    .bind(link)
    .bind(chrono::Utc::now())
    .execute(db)
    .await?;

    Ok(())
}

pub async fn notify_topic_reply(
    db: &PgPool,
    topic_author_id: Uuid,
    commenter_username: &str,
    topic_id: Uuid,
    topic_title: &str,
) -> Result<()> {
    create_notification(
        db,
        topic_author_id,
        NotificationType::TopicReply,
        &format!("{} commented on your topic", commenter_username),
        Some(topic_title),
        Some(&format!("/topics/{}", topic_id)),
    )
    .await
}

pub async fn notify_badge_earned(db: &PgPool, user_id: Uuid, badge: &Badge) -> Result<()> {
    create_notification(
        db,
        user_id,
        NotificationType::BadgeEarned,
        &format!("You earned the {} badge", badge.name),
        Some(&badge.description),
        Some("/badges"),
    )
    .await
}

/// Notify every user @mentioned in `text`, except the sender.
pub async fn notify_mentions(
    db: &PgPool,
    text: &str,
    sender_username: &str,
    link: &str,
) -> Result<()> {
    let mentions = parse_mentions(text);
    if mentions.is_empty() {
        return Ok(());
    }

    let mentioned = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, username FROM users WHERE LOWER(username) = ANY($1)",
    )
    .bind(&mentions)
    .fetch_all(db)
    .await?;

    for (user_id, username) in mentioned {
        if username.eq_ignore_ascii_case(sender_username) {
            continue;
        }
        create_notification(
            db,
            user_id,
            NotificationType::Mention,
            &format!("{} mentioned you", sender_username),
            None,
            Some(link),
        )
        .await?;
    }

    Ok(())
}

pub async fn get_notifications(
    db: &PgPool,
    user_id: Uuid,
    limit: u32,
    offset: u32,
    unread_only: bool,
) -> Result<NotificationListResponse> {
    let mut sql = "SELECT * FROM notifications WHERE user_id = $1".to_string();
    if unread_only {
        sql.push_str(" AND is_read = FALSE");
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT $2 OFFSET $3");

    let notifications = sqlx::query_as::<_, Notification>(&sql)
        .bind(user_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(db)
        .await?;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    let unread = unread_count(db, user_id).await?;

    Ok(NotificationListResponse {
        notifications,
        total,
        unread,
    })
}

pub async fn unread_count(db: &PgPool, user_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    Ok(count)
}

/// Mark the given notifications read, or all of them when no ids are given.
pub async fn mark_read(db: &PgPool, user_id: Uuid, ids: Option<&[Uuid]>) -> Result<u64> {
    let result = match ids {
        Some(ids) if !ids.is_empty() => {
            sqlx::query(
                "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND id = ANY($2)",
            )
            .bind(user_id)
            .bind(ids)
            .execute(db)
            .await?
        }
        _ => {
            sqlx::query(
                "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
            )
            .bind(user_id)
            .execute(db)
            .await?
        }
    };

    Ok(result.rows_affected())
}

pub async fn delete_notifications(db: &PgPool, user_id: Uuid, ids: &[Uuid]) -> Result<u64> {
    let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND id = ANY($2)")
        .bind(user_id)
        .bind(ids)
        .execute(db)
        .await?;

    Ok(result.rows_affected())
}

pub async fn cleanup_old_notifications(db: &PgPool, days: i32) -> Result<u64> {
    let result =
        sqlx::query("DELETE FROM notifications WHERE created_at < NOW() - make_interval(days => $1)")
            .bind(days)
            .execute(db)
            .await?;

    Ok(result.rows_affected())
}

/// Extract @mentions from text: 3-20 word characters, lowercased, deduplicated.
pub fn parse_mentions(text: &str) -> Vec<String> {
    static MENTION_RE: OnceLock<Regex> = OnceLock::new();
    let re = MENTION_RE.get_or_init(|| Regex::new(r"@(\w{3,20})").unwrap());

    let mut mentions = Vec::new();
    for cap in re.captures_iter(text) {
        let name = cap[1].to_lowercase();
        if !mentions.contains(&name) {
            mentions.push(name);
        }
    }

    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mentions_from_text() {
        assert_eq!(
            parse_mentions("thanks @alice and @bob_42!"),
            vec!["alice".to_string(), "bob_42".to_string()]
        );
    }

    #[test]
    fn mentions_are_lowercased_and_deduplicated() {
        assert_eq!(
            parse_mentions("@Alice @alice @ALICE"),
            vec!["alice".to_string()]
        );
    }

    #[test]
    fn short_handles_are_not_mentions() {
        assert!(parse_mentions("hi @ab, email me at x@y.z").is_empty());
    }

    #[test]
    fn no_mentions_in_plain_text() {
        assert!(parse_mentions("nothing to see here").is_empty());
    }
}
