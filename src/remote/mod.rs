//! Remote task-list API integration.
//!
//! The remote service is an external collaborator behind the
//! [`RemoteTaskService`] trait: the coordinator and fetchers depend only on
//! the trait, production wiring injects [`HttpTaskService`], and tests
//! inject stubs.

mod http;

pub use http::HttpTaskService;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::RemoteError;

/// A task list as reported by the remote API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteList {
    pub id: i64,
    pub title: String,
}

/// A user as reported by the remote API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUser {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A raw task as reported by the remote API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTask {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    pub list_id: i64,
}

/// Abstract remote task-list service.
///
/// Errors carry an opaque code; no retry contract is assumed from the
/// remote side. A shared outbound-request limiter across fetchers would
/// live behind this trait if one is ever added.
#[async_trait]
pub trait RemoteTaskService: Send + Sync {
    /// Fetch every list visible to the configured credentials.
    async fn list_all_lists(&self) -> Result<Vec<RemoteList>, RemoteError>;

    /// Fetch every user visible to the configured credentials.
    async fn list_all_users(&self) -> Result<Vec<RemoteUser>, RemoteError>;

    /// Fetch the tasks of one list, in the remote API's order.
    async fn list_tasks(&self, list_id: i64) -> Result<Vec<RemoteTask>, RemoteError>;
}
