//! `reqwest`-backed gateway talking to the Scout REST API.

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{GatewayError, GatewayResult, RemoteGateway, SendOutcome};
use crate::config::ClientConfig;
use crate::models::{EntryId, PicklistTeam, PitScoutingEntry, ScoutingEntry};
use crate::util::compact_text;

/// HTTP implementation of `RemoteGateway`.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct PasswordBody<'a> {
    password: &'a str,
}

#[derive(Serialize)]
struct DeleteIdsBody<'a> {
    ids: &'a [EntryId],
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteTeamsBody<'a> {
    team_numbers: &'a [u32],
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddPicklistBody {
    team_number: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateEventKeyBody<'a> {
    event_key: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventKeyResponse {
    event_key: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> crate::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: config.api_base_url.clone(),
            client: builder.build()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send_record<B: Serialize + Sync>(&self, path: &str, body: &B) -> SendOutcome {
        let response = match self.client.post(self.url(path)).json(body).send().await {
            Ok(response) => response,
            Err(error) => return SendOutcome::Unavailable(error.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            return SendOutcome::Accepted;
        }
        let body = response.text().await.unwrap_or_default();
        SendOutcome::from_status(status.as_u16(), parse_api_error(status, &body))
    }

    async fn request<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> GatewayResult<Response> {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        ensure_success(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        let response = self.request::<()>(Method::GET, path, None).await?;
        response
            .json::<T>()
            .await
            .map_err(|error| GatewayError::InvalidPayload(error.to_string()))
    }
}

async fn ensure_success(response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized),
        StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
        _ => {
            let body = response.text().await.unwrap_or_default();
            let message = parse_api_error(status, &body);
            if status.is_server_error() {
                Err(GatewayError::Unavailable(message))
            } else {
                Err(GatewayError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error.or(payload.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn send_entry(&self, entry: &ScoutingEntry) -> SendOutcome {
        self.send_record("/entries", entry).await
    }

    async fn send_pit_entry(&self, entry: &PitScoutingEntry) -> SendOutcome {
        self.send_record("/pit", entry).await
    }

    async fn fetch_entries(&self) -> GatewayResult<Vec<ScoutingEntry>> {
        self.get_json("/entries").await
    }

    async fn fetch_team_entries(&self, team_number: u32) -> GatewayResult<Vec<ScoutingEntry>> {
        self.get_json(&format!("/entries/team/{team_number}")).await
    }

    async fn delete_entry(&self, id: &EntryId, password: &str) -> GatewayResult<()> {
        let path = format!("/entries/{id}");
        self.request(Method::DELETE, &path, Some(&PasswordBody { password }))
            .await?;
        Ok(())
    }

    async fn delete_entries(&self, ids: &[EntryId], password: &str) -> GatewayResult<()> {
        self.request(
            Method::POST,
            "/entries/delete-batch",
            Some(&DeleteIdsBody { ids, password }),
        )
        .await?;
        Ok(())
    }

    async fn delete_team_entries(
        &self,
        team_numbers: &[u32],
        password: &str,
    ) -> GatewayResult<()> {
        self.request(
            Method::POST,
            "/entries/delete-batch-teams",
            Some(&DeleteTeamsBody {
                team_numbers,
                password,
            }),
        )
        .await?;
        Ok(())
    }

    async fn fetch_pit_entries(&self) -> GatewayResult<Vec<PitScoutingEntry>> {
        self.get_json("/pit").await
    }

    async fn fetch_team_pit_entry(
        &self,
        team_number: u32,
    ) -> GatewayResult<Option<PitScoutingEntry>> {
        match self.get_json(&format!("/pit/team/{team_number}")).await {
            Ok(entry) => Ok(Some(entry)),
            Err(GatewayError::NotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn delete_team_pit_entries(
        &self,
        team_numbers: &[u32],
        password: &str,
    ) -> GatewayResult<()> {
        self.request(
            Method::POST,
            "/pit/delete-batch-teams",
            Some(&DeleteTeamsBody {
                team_numbers,
                password,
            }),
        )
        .await?;
        Ok(())
    }

    async fn fetch_picklist(&self) -> GatewayResult<Vec<PicklistTeam>> {
        self.get_json("/picklist").await
    }

    async fn replace_picklist(&self, picklist: &[PicklistTeam]) -> GatewayResult<()> {
        self.request(Method::PUT, "/picklist", Some(&picklist))
            .await?;
        Ok(())
    }

    async fn add_picklist_team(&self, team_number: u32) -> GatewayResult<()> {
        self.request(
            Method::POST,
            "/picklist",
            Some(&AddPicklistBody { team_number }),
        )
        .await?;
        Ok(())
    }

    async fn remove_picklist_team(&self, team_number: u32, password: &str) -> GatewayResult<()> {
        let path = format!("/picklist/{team_number}");
        self.request(Method::DELETE, &path, Some(&PasswordBody { password }))
            .await?;
        Ok(())
    }

    async fn fetch_event_key(&self) -> GatewayResult<String> {
        let payload: EventKeyResponse = self.get_json("/config/event-key").await?;
        payload
            .event_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GatewayError::InvalidPayload("response did not include eventKey".into()))
    }

    async fn update_event_key(&self, event_key: &str, password: &str) -> GatewayResult<()> {
        self.request(
            Method::POST,
            "/config/event-key",
            Some(&UpdateEventKeyBody {
                event_key,
                password,
            }),
        )
        .await?;
        Ok(())
    }
}
