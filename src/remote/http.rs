//! HTTP implementation of [`RemoteTaskService`] using reqwest.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::error::RemoteError;

use super::{RemoteList, RemoteTask, RemoteTaskService, RemoteUser};

/// Production remote service: JSON over HTTP with header-based auth.
pub struct HttpTaskService {
    client: reqwest::Client,
    base_url: String,
    access_token: SecretString,
    client_id: String,
}

impl HttpTaskService {
    pub fn new(base_url: impl Into<String>, access_token: SecretString, client_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
            client_id: client_id.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, RemoteError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .header("X-Access-Token", self.access_token.expose_secret())
            .header("X-Client-ID", &self.client_id)
            .query(query)
            .send()
            .await
            .map_err(|e| RemoteError::RequestFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                endpoint: endpoint.to_string(),
                code: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl RemoteTaskService for HttpTaskService {
    async fn list_all_lists(&self) -> Result<Vec<RemoteList>, RemoteError> {
        self.get_json("lists", &[]).await
    }

    async fn list_all_users(&self) -> Result<Vec<RemoteUser>, RemoteError> {
        self.get_json("users", &[]).await
    }

    async fn list_tasks(&self, list_id: i64) -> Result<Vec<RemoteTask>, RemoteError> {
        self.get_json("tasks", &[("list_id", list_id.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let svc = HttpTaskService::new(
            "https://api.example.com/v1/",
            SecretString::from("t"),
            "c",
        );
        assert_eq!(svc.base_url, "https://api.example.com/v1");
    }
}
