use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, RequestBuilder, Response,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::ids::{StateId, TicketId};
use crate::domain::ticket::{Ticket, WorkflowState};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

/// Client for the Daily Grind REST API.
pub struct RestClient {
    http: Client,
    base_url: Option<String>,
    credentials: Option<(String, String)>,
}

impl RestClient {
    pub fn new(base_url: Option<String>, user: Option<String>, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            credentials: user.zip(token),
        }
    }

    fn base_url(&self) -> AppResult<&str> {
        self.base_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("API base URL not configured".to_string()))
    }

    fn auth_header(user: &str, token: &str) -> String {
        let credentials = format!("{user}:{token}");
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }

    fn tickets_endpoint(base_url: &str) -> String {
        format!("{}/api/tickets", base_url.trim_end_matches('/'))
    }

    fn ticket_endpoint(base_url: &str, ticket: &TicketId) -> String {
        format!("{}/{}", Self::tickets_endpoint(base_url), ticket.as_str())
    }

    fn statuses_endpoint(base_url: &str) -> String {
        format!("{}/api/statuses", base_url.trim_end_matches('/'))
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, "application/json");
        match &self.credentials {
            Some((user, token)) => request.header(AUTHORIZATION, Self::auth_header(user, token)),
            None => request,
        }
    }

    async fn send(request: RequestBuilder, action: &str) -> AppResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|err| AppError::IssueTracker(format!("failed to {action}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::IssueTracker(format!(
                "API responded with {status} while trying to {action}: {body}"
            )));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String, action: &str) -> AppResult<T> {
        tracing::debug!(%url, "GET");
        let response = Self::send(self.with_headers(self.http.get(url)), action).await?;
        response.json().await.map_err(|err| {
            AppError::IssueTracker(format!("failed to parse response to {action}: {err}"))
        })
    }

    async fn put_json<B: Serialize + Sync>(&self, url: String, body: &B, action: &str) -> AppResult<()> {
        tracing::debug!(%url, "PUT");
        let request = self
            .with_headers(self.http.put(url))
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        Self::send(request, action).await?;
        Ok(())
    }
}

#[async_trait]
impl IssueTrackerService for RestClient {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>> {
        let url = Self::tickets_endpoint(self.base_url()?);
        self.get_json(url, "list tickets").await
    }

    async fn list_workflow_states(&self) -> AppResult<Vec<WorkflowState>> {
        let url = Self::statuses_endpoint(self.base_url()?);
        self.get_json(url, "list workflow states").await
    }

    async fn update_ticket_state(&self, ticket: &TicketId, state: &StateId) -> AppResult<()> {
        let url = Self::ticket_endpoint(self.base_url()?, ticket);
        let body = StateUpdate { state_id: state };
        self.put_json(url, &body, &format!("update ticket {ticket}"))
            .await
    }

    async fn update_ticket_parent(
        &self,
        ticket: &TicketId,
        parent: Option<&TicketId>,
    ) -> AppResult<()> {
        let url = Self::ticket_endpoint(self.base_url()?, ticket);
        let body = ParentUpdate {
            parent_ticket_id: parent,
        };
        self.put_json(url, &body, &format!("update ticket {ticket}"))
            .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateUpdate<'a> {
    state_id: &'a StateId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParentUpdate<'a> {
    parent_ticket_id: Option<&'a TicketId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoints_without_double_slashes() {
        assert_eq!(
            RestClient::tickets_endpoint("http://localhost:5000/"),
            "http://localhost:5000/api/tickets"
        );
        assert_eq!(
            RestClient::ticket_endpoint("http://localhost:5000", &TicketId::from("7")),
            "http://localhost:5000/api/tickets/7"
        );
        assert_eq!(
            RestClient::statuses_endpoint("https://grind.example.com"),
            "https://grind.example.com/api/statuses"
        );
    }

    #[test]
    fn encodes_basic_credentials() {
        assert_eq!(
            RestClient::auth_header("ada", "secret"),
            "Basic YWRhOnNlY3JldA=="
        );
    }

    #[test]
    fn update_bodies_use_api_field_names() {
        let state = StateId::well_known(5);
        let body = serde_json::to_value(StateUpdate { state_id: &state }).unwrap();
        assert_eq!(body, serde_json::json!({ "stateId": "5" }));

        let body = serde_json::to_value(ParentUpdate {
            parent_ticket_id: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "parentTicketId": null }));
    }

    #[tokio::test]
    async fn requires_base_url() {
        let client = RestClient::new(None, None, None);
        let err = client.list_tickets().await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
