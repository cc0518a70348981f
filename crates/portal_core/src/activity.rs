use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audit line: who did what, and when the sink recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub user_email: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCount {
    pub action: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivitySummary {
    pub total: usize,
    pub distinct_users: usize,
    /// Highest count first, then by action text.
    pub action_counts: Vec<ActionCount>,
    pub most_common: Option<ActionCount>,
    /// Newest first.
    pub recent: Vec<ActivityRecord>,
}

/// Summarizes the log newest to oldest. On a tie, the most common action is
/// the one that reached the count first in that scan.
pub fn summarize(records: &[ActivityRecord], recent_limit: usize) -> ActivitySummary {
    let mut ordered: Vec<&ActivityRecord> = records.iter().collect();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut users = HashSet::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut most_common: Option<ActionCount> = None;

    for record in ordered.iter().copied() {
        users.insert(record.user_email.as_str());
        let count = counts.entry(record.action.as_str()).or_default();
        *count += 1;
        if most_common.as_ref().map_or(true, |best| *count > best.count) {
            most_common = Some(ActionCount {
                action: record.action.clone(),
                count: *count,
            });
        }
    }

    let mut action_counts: Vec<ActionCount> = counts
        .into_iter()
        .map(|(action, count)| ActionCount {
            action: action.to_string(),
            count,
        })
        .collect();
    action_counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.action.cmp(&b.action)));

    ActivitySummary {
        total: ordered.len(),
        distinct_users: users.len(),
        action_counts,
        most_common,
        recent: ordered.into_iter().take(recent_limit).cloned().collect(),
    }
}
