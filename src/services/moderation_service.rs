use regex::Regex;
use sqlx::PgPool;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{ReportStatus, TargetType},
    services::vote_service,
};

const SPAM_THRESHOLD: u32 = 50;

fn spam_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)\b(viagra|cialis|pharmacy)\b",
            r"(?i)\b(casino|poker|gambling)\b",
            r"(?i)\bmake money (fast|quick|online)\b",
            r"(?i)\b(click here|download now)\b",
            r"[A-Z]{10,}",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

#[derive(Debug)]
pub struct SpamVerdict {
    pub is_spam: bool,
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Score content against spam heuristics: keyword patterns, URL stuffing,
/// shouting, and character flooding.
pub fn detect_spam(content: &str) -> SpamVerdict {
    let mut score = 0;
    let mut reasons = Vec::new();

    for pattern in spam_patterns() {
        if pattern.is_match(content) {
            score += 30;
            reasons.push(format!("Matched spam pattern: {}", pattern.as_str()));
        }
    }

    let url_count = content.matches("http://").count() + content.matches("https://").count();
    if url_count >= 3 {
        score += 25;
        reasons.push(format!("Excessive URLs: {}", url_count));
    }

    if content.len() > 20 {
        let caps = content.chars().filter(|c| c.is_ascii_uppercase()).count();
        let ratio = caps as f64 / content.chars().count() as f64;
        if ratio > 0.5 {
            score += 20;
            reasons.push(format!("Excessive capitals: {:.0}%", ratio * 100.0));
        }
    }

    if longest_char_run(content) >= 10 {
        score += 20;
        reasons.push("Repeated character flooding".to_string());
    }

    SpamVerdict {
        is_spam: score >= SPAM_THRESHOLD,
        score,
        reasons,
    }
}

/// Reject a submission that scores past the spam threshold.
pub fn reject_if_spam(content: &str) -> Result<()> {
    let verdict = detect_spam(content);
    if verdict.is_spam {
        tracing::info!(
            "Rejected submission (spam score {}): {:?}",
            verdict.score,
            verdict.reasons
        );
        return Err(AppError::Validation(
            "Content was flagged as spam".to_string(),
        ));
    }
    Ok(())
}

fn longest_char_run(text: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    let mut last: Option<char> = None;

    for c in text.chars() {
        if Some(c) == last {
            run += 1;
        } else {
            run = 1;
            last = Some(c);
        }
        longest = longest.max(run);
    }

    longest
}

/// File a user report against a topic or comment. One report per
/// (reporter, target).
pub async fn create_report(
    db: &PgPool,
    reporter_id: Uuid,
    target_type: TargetType,
    target_id: Uuid,
    reason: &str,
    details: Option<&str>,
) -> Result<()> {
    vote_service::target_author(db, target_type, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Target not found".to_string()))?;

    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM reports WHERE reporter_id = $1 AND target_type = $2 AND target_id = $3",
    )
    .bind(reporter_id)
    .bind(target_type)
    .bind(target_id)
    .fetch_optional(db)
    .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Already reported".to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO reports (id, reporter_id, target_type, target_id, reason, details, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(reporter_id)
    .bind(target_type)
    .bind(target_id)
    .bind(reason)
    .bind(details)
    .bind(ReportStatus::Pending)
    .bind(chrono::Utc::now())
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_text_is_clean() {
        let verdict = detect_spam("I ran into a borrow checker error with this lifetime.");
        assert!(!verdict.is_spam);
        assert_eq!(verdict.score, 0);
    }

    #[test]
    fn url_stuffing_alone_is_suspect_but_not_spam() {
        let verdict = detect_spam("see https://a.com https://b.com https://c.com");
        assert!(!verdict.is_spam);
        assert_eq!(verdict.score, 25);
    }

    #[test]
    fn keywords_plus_urls_cross_the_threshold() {
        let verdict = detect_spam(
            "make money fast! click here https://a.com https://b.com https://c.com",
        );
        assert!(verdict.is_spam);
        assert!(verdict.score >= SPAM_THRESHOLD);
    }

    #[test]
    fn shouting_and_flooding_cross_the_threshold() {
        let verdict = detect_spam("BUYNOWBUYNOWBUYNOWBUYNOW!!!!!!!!!!!!");
        assert!(verdict.is_spam);
    }

    #[test]
    fn longest_run_counts_consecutive_characters() {
        assert_eq!(longest_char_run("aaabbbbcc"), 4);
        assert_eq!(longest_char_run(""), 0);
    }
}
