//! Data source for directory users.
//!
//! [`UserSource`] is the seam the state engines fetch through; the HTTP
//! implementation talks to a JSONPlaceholder-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::model::User;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

#[async_trait]
pub trait UserSource: Send + Sync {
    /// `GET /users`: the whole collection.
    async fn fetch_users(&self) -> Result<Vec<User>, FetchError>;

    /// `GET /users/{id}`: one record.
    async fn fetch_user(&self, id: u64) -> Result<User, FetchError>;
}

#[derive(Clone, Debug)]
pub struct HttpUserSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpUserSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await.map_err(|e| {
            warn!(%url, error = %e, "request failed");
            FetchError::Transport(format!("Failed to fetch {what}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "non-success status");
            return Err(if status == StatusCode::NOT_FOUND {
                FetchError::NotFound
            } else {
                FetchError::Status(status.as_u16())
            });
        }

        response.json::<T>().await.map_err(|e| {
            warn!(%url, error = %e, "invalid response body");
            FetchError::Parse(format!("Failed to fetch {what}: {e}"))
        })
    }
}

impl Default for HttpUserSource {
    fn default() -> Self {
        Self::with_client(reqwest::Client::new(), DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl UserSource for HttpUserSource {
    async fn fetch_users(&self) -> Result<Vec<User>, FetchError> {
        self.get_json("/users", "users").await
    }

    async fn fetch_user(&self, id: u64) -> Result<User, FetchError> {
        self.get_json(&format!("/users/{id}"), "user").await
    }
}
