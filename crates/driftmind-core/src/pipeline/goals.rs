//! Goal tracker (C10).
//!
//! Evaluates existing active goals against this sleep's completed threads,
//! then proposes new goals from in-progress threads left over, deduped
//! against what is already active.

use std::collections::HashSet;

use chrono::Utc;

use crate::config::GoalConfig;
use crate::error::Result;
use crate::ids::new_id;
use crate::model::{Goal, GoalStatus};
use crate::storage::Storage;

const STOPWORDS: &[&str] = &["the", "a", "an", "and", "or", "to", "of", "in", "on", "is", "it", "for", "with"];

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2 && !STOPWORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Abandons stale active goals (older than `stale_days` with no
/// corroborating thread-completed memory this sleep) and completes any
/// whose tokens overlap a freshly completed thread by at least two words.
pub fn evaluate_goals(storage: &Storage, completed_thread_summaries: &[String], config: &GoalConfig) -> Result<(usize, usize)> {
    let active = storage.list_goals(GoalStatus::Active)?;
    let now = Utc::now();
    let completed_tokens: Vec<HashSet<String>> = completed_thread_summaries.iter().map(|s| tokenize(s)).collect();

    let mut completed_count = 0;
    let mut abandoned_count = 0;

    for goal in active {
        let goal_tokens = tokenize(&goal.text);
        let matched = completed_tokens.iter().any(|tokens| goal_tokens.intersection(tokens).count() >= 2);

        if matched {
            storage.update_goal_status(&goal.id, GoalStatus::Completed)?;
            completed_count += 1;
            continue;
        }

        let age_days = (now - goal.created).num_days();
        if age_days >= config.stale_days {
            storage.update_goal_status(&goal.id, GoalStatus::Abandoned)?;
            abandoned_count += 1;
        }
    }

    Ok((completed_count, abandoned_count))
}

/// Proposes up to `max_new_per_sleep` goals from in-progress thread
/// summaries, skipping any within `dedup_jaccard_threshold` of an
/// existing active goal.
pub fn generate_goals(storage: &Storage, in_progress_thread_summaries: &[String], config: &GoalConfig) -> Result<usize> {
    let active = storage.list_goals(GoalStatus::Active)?;
    let active_tokens: Vec<HashSet<String>> = active.iter().map(|g| tokenize(&g.text)).collect();

    let mut created = 0;
    for summary in in_progress_thread_summaries {
        if created >= config.max_new_per_sleep {
            break;
        }
        let tokens = tokenize(summary);
        let is_duplicate = active_tokens.iter().any(|existing| jaccard(existing, &tokens) >= config.dedup_jaccard_threshold);
        if is_duplicate {
            continue;
        }

        storage.insert_goal(&Goal {
            id: new_id(),
            text: summary.clone(),
            status: GoalStatus::Active,
            created: now_or_fallback(),
            evaluated_at: None,
        })?;
        created += 1;
    }

    Ok(created)
}

fn now_or_fallback() -> chrono::DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaccard_identical_sets_is_one() {
        let a: HashSet<String> = ["auth", "refresh"].iter().map(|s| s.to_string()).collect();
        assert_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn jaccard_disjoint_sets_is_zero() {
        let a: HashSet<String> = ["auth"].iter().map(|s| s.to_string()).collect();
        let b: HashSet<String> = ["billing"].iter().map(|s| s.to_string()).collect();
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn tokenize_drops_short_and_stop_words() {
        let tokens = tokenize("fix the auth refresh flow");
        assert!(!tokens.contains("the"));
        assert!(tokens.contains("auth"));
        assert!(tokens.contains("refresh"));
    }
}
