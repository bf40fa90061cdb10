//! Minimal client for the Life OS backend

use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum LifeOsError {
    #[error("not found")]
    NotFound,

    /// Non-success status other than 404
    #[error("{}", .0.as_u16())]
    Status(StatusCode),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct LifeOsClient {
    base_url: String,
    http: reqwest::Client,
}

impl LifeOsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /life_os/tasks` with the given query filters
    pub async fn list_tasks(&self, query: &[(&str, String)]) -> Result<Vec<Value>, LifeOsError> {
        let url = format!("{}/life_os/tasks", self.base_url);
        debug!("GET {} {:?}", url, query);
        let response = self
            .http
            .get(&url)
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let response = check(response)?;
        Ok(response.json().await?)
    }

    pub async fn get_task(&self, id: &str) -> Result<Value, LifeOsError> {
        let url = format!("{}/life_os/tasks/{}", self.base_url, id);
        debug!("GET {}", url);
        let response = self.http.get(&url).timeout(REQUEST_TIMEOUT).send().await?;
        let response = check(response)?;
        Ok(response.json().await?)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), LifeOsError> {
        let url = format!("{}/life_os/tasks/{}", self.base_url, id);
        debug!("DELETE {}", url);
        let response = self.http.delete(&url).timeout(REQUEST_TIMEOUT).send().await?;
        check(response)?;
        Ok(())
    }

    /// `GET /health`; anything other than 200 is an error
    pub async fn health(&self) -> Result<(), LifeOsError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url).timeout(HEALTH_TIMEOUT).send().await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(LifeOsError::Status(status)),
        }
    }
}

fn check(response: reqwest::Response) -> Result<reqwest::Response, LifeOsError> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(LifeOsError::NotFound),
        status if status.is_success() => Ok(response),
        status => Err(LifeOsError::Status(status)),
    }
}
