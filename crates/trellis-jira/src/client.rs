//! Jira REST client -- the blocking HTTP implementation of [`TicketService`].
//!
//! Talks to the v2 REST API with basic auth. Everything the reflection
//! driver needs from the remote side goes through the [`TicketService`]
//! trait, so tests can substitute an in-memory fake.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use trellis_config::config::JiraConfig;

/// Errors from the remote ticket service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The credentials were rejected (401).
    #[error("invalid credentials: Jira returned 401 Unauthorized")]
    Unauthorized,

    /// The account lacks permission for the request (403).
    #[error("missing permission: Jira returned 403 Forbidden")]
    Forbidden,

    /// Any other non-success status code.
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The request never produced a response.
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("failed to parse Jira response: {0}")]
    Parse(String),
}

/// A ticket ready to be created on the remote instance.
///
/// Field ids for the epic name and epic link vary per Jira installation;
/// the client fills them in from its [`JiraConfig`], so the ticket only
/// carries the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// Remote id (not key) of the target project.
    pub project_id: String,
    /// Issue type label as the remote instance spells it.
    pub type_label: String,
    pub summary: String,
    pub description: Option<String>,
    /// Epic name, set on epics only.
    pub epic_name: Option<String>,
    /// Key of the epic this ticket belongs to.
    pub epic_link: Option<String>,
    /// Key of the direct parent, for subtask types.
    pub parent_key: Option<String>,
}

/// Remote side of the reflection driver.
pub trait TicketService {
    /// Project keys valid on the remote instance, mapped to their ids.
    fn list_projects(&mut self) -> Result<BTreeMap<String, String>, ServiceError>;

    /// Creates a ticket and returns its remote key.
    fn create_ticket(&mut self, ticket: &NewTicket) -> Result<String, ServiceError>;

    /// Deletes the ticket with the given key.
    fn delete_ticket(&mut self, key: &str) -> Result<(), ServiceError>;
}

/// A project as returned by `GET /rest/api/2/project`.
#[derive(Debug, Deserialize)]
struct ProjectResponse {
    /// Numeric project id, serialized as a string by Jira.
    id: String,
    /// Short project key, e.g. `OPS`.
    key: String,
}

/// Response to a successful `POST /rest/api/2/issue`.
#[derive(Debug, Deserialize)]
struct CreatedResponse {
    key: String,
}

/// Blocking client for a single Jira instance.
pub struct JiraApi {
    base_url: String,
    auth_header: String,
    epic_name_field: String,
    epic_link_field: String,
}

impl JiraApi {
    pub fn new(config: &JiraConfig, token: &str) -> Self {
        let credentials = STANDARD.encode(format!("{}:{}", config.user, token));
        Self {
            base_url: config.base_url(),
            auth_header: format!("Basic {credentials}"),
            epic_name_field: config.epic_name_field.clone(),
            epic_link_field: config.epic_link_field.clone(),
        }
    }

    /// Builds the `fields` payload for an issue creation request.
    ///
    /// Optional members are omitted rather than sent as null, since some
    /// Jira screens reject fields they do not show.
    fn issue_payload(&self, ticket: &NewTicket) -> serde_json::Value {
        let mut fields = serde_json::Map::new();
        fields.insert("project".into(), json!({ "id": ticket.project_id }));
        fields.insert("issuetype".into(), json!({ "name": ticket.type_label }));
        fields.insert("summary".into(), json!(ticket.summary));
        if let Some(description) = &ticket.description {
            fields.insert("description".into(), json!(description));
        }
        if let Some(epic_name) = &ticket.epic_name {
            fields.insert(self.epic_name_field.clone(), json!(epic_name));
        }
        if let Some(epic_link) = &ticket.epic_link {
            fields.insert(self.epic_link_field.clone(), json!(epic_link));
        }
        if let Some(parent_key) = &ticket.parent_key {
            fields.insert("parent".into(), json!({ "key": parent_key }));
        }
        json!({ "fields": fields })
    }
}

impl TicketService for JiraApi {
    fn list_projects(&mut self) -> Result<BTreeMap<String, String>, ServiceError> {
        let url = format!("{}/rest/api/2/project", self.base_url);
        tracing::debug!(%url, "listing remote projects");

        let response = ureq::get(&url)
            .set("Authorization", &self.auth_header)
            .set("Accept", "application/json")
            .call();

        match response {
            Ok(resp) => {
                let projects: Vec<ProjectResponse> = resp
                    .into_json()
                    .map_err(|e| ServiceError::Parse(e.to_string()))?;
                Ok(projects.into_iter().map(|p| (p.key, p.id)).collect())
            }
            Err(err) => Err(service_error(err)),
        }
    }

    fn create_ticket(&mut self, ticket: &NewTicket) -> Result<String, ServiceError> {
        let url = format!("{}/rest/api/2/issue", self.base_url);
        let payload = self.issue_payload(ticket);
        tracing::debug!(summary = %ticket.summary, "creating ticket");

        let response = ureq::post(&url)
            .set("Authorization", &self.auth_header)
            .set("Accept", "application/json")
            .send_json(payload);

        match response {
            Ok(resp) => {
                let created: CreatedResponse = resp
                    .into_json()
                    .map_err(|e| ServiceError::Parse(e.to_string()))?;
                Ok(created.key)
            }
            Err(err) => Err(service_error(err)),
        }
    }

    fn delete_ticket(&mut self, key: &str) -> Result<(), ServiceError> {
        let url = format!("{}/rest/api/2/issue/{key}", self.base_url);
        tracing::debug!(%key, "deleting ticket");

        let response = ureq::delete(&url)
            .set("Authorization", &self.auth_header)
            .call();

        match response {
            Ok(_) => Ok(()),
            Err(err) => Err(service_error(err)),
        }
    }
}

fn service_error(err: ureq::Error) -> ServiceError {
    match err {
        ureq::Error::Status(401, _) => ServiceError::Unauthorized,
        ureq::Error::Status(403, _) => ServiceError::Forbidden,
        ureq::Error::Status(code, resp) => ServiceError::Status {
            code,
            body: resp.into_string().unwrap_or_default(),
        },
        other => ServiceError::Transport(other.to_string()),
    }
}
