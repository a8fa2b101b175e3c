//! Microsoft Graph REST calls.

use chosei_core::directory::DirectoryUser;
use reqwest::Response;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{GraphError, GraphResult};
use crate::session::AccessToken;
use crate::types::{CreatedEvent, GraphEvent};

const USER_SELECT: &str = "id,displayName,userPrincipalName";

#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
}

impl GraphClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.graph_base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /me/events`
    pub async fn create_event(
        &self,
        token: &AccessToken,
        event: &GraphEvent,
    ) -> GraphResult<CreatedEvent> {
        debug!(
            payload = %serde_json::to_string(event).unwrap_or_default(),
            "Creating meeting"
        );

        let response = self
            .http
            .post(self.url("/me/events"))
            .bearer_auth(&token.secret)
            .json(event)
            .send()
            .await?;

        let created: CreatedEvent = check_status(response).await?.json().await?;
        debug!(id = %created.id, "Meeting created");
        Ok(created)
    }

    /// `GET /users`, first page only.
    pub async fn list_users(&self, token: &AccessToken) -> GraphResult<Vec<DirectoryUser>> {
        let response = self
            .http
            .get(self.url("/users"))
            .bearer_auth(&token.secret)
            .query(&[("$select", USER_SELECT)])
            .send()
            .await?;

        let body: serde_json::Value = check_status(response).await?.json().await?;

        let records = body
            .get("value")
            .and_then(|v| v.as_array())
            .ok_or_else(|| GraphError::UnexpectedFormat("missing `value` array".into()))?;

        // One malformed record shouldn't hide the rest of the directory.
        let users = records
            .iter()
            .filter_map(|record| match DirectoryUser::deserialize(record) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(%record, "Skipping directory entry: {e}");
                    None
                }
            })
            .collect();
        Ok(users)
    }
}

async fn check_status(response: Response) -> GraphResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %body, "Graph request failed");
    Err(GraphError::Status {
        status: status.as_u16(),
        body,
    })
}
