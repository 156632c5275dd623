//! Task data model — normalized records, snapshots, and the user directory.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::remote::{RemoteTask, RemoteUser};

/// A single normalized task, as cached by a fetcher.
///
/// Immutable within a fetch cycle; the whole cache is replaced on the next
/// successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Remote task ID.
    pub id: i64,
    /// Task title.
    pub title: String,
    /// Starred tasks are always shown in summarized lists.
    pub starred: bool,
    /// Optional due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Assignee user ID, resolved against the user directory at display
    /// time, not at fetch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    /// ID of the list this task belongs to.
    pub list_id: i64,
}

impl From<RemoteTask> for TaskRecord {
    fn from(task: RemoteTask) -> Self {
        Self {
            id: task.id,
            title: task.title,
            starred: task.starred,
            due_date: task.due_date,
            assignee_id: task.assignee_id,
            list_id: task.list_id,
        }
    }
}

/// Normalize a raw remote response into cache-ready records, preserving
/// the remote API's order.
pub fn normalize_tasks(raw: Vec<RemoteTask>) -> Vec<TaskRecord> {
    raw.into_iter().map(TaskRecord::from).collect()
}

/// Consumer-facing view of all fetcher caches: list display name → items.
///
/// A pure projection rebuilt on demand; it has no identity of its own.
/// BTreeMap so broadcasts list the lists in a stable order.
pub type Snapshot = BTreeMap<String, Vec<TaskRecord>>;

/// Mapping from user ID to a single-character display initial.
///
/// Fetched on demand rather than on an interval; consumers tolerate
/// staleness.
pub type UserDirectory = BTreeMap<i64, String>;

/// Derive the user directory from raw remote users.
///
/// Prefers the first character of the name, falls back to the first
/// character of the email; users with neither are omitted.
pub fn build_user_directory(users: Vec<RemoteUser>) -> UserDirectory {
    users
        .into_iter()
        .filter_map(|user| {
            let initial = user
                .name
                .as_deref()
                .and_then(|n| n.chars().next())
                .or_else(|| user.email.as_deref().and_then(|e| e.chars().next()))?;
            Some((user.id, initial.to_string()))
        })
        .collect()
}
