//! HTTP simulation backend

use async_trait::async_trait;
use oncall_api::{
    Company, Incident, IncidentRequest, ResolutionOutcome, ResolutionRequest, UserRating,
    WorkdaySession,
};
use oncall_backend::{BackendError, BackendResult, SimulationBackend};
use oncall_util::{CompanyId, WorkdayId};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{LoginRequest, RefreshRequest, RefreshResponse, TokenPair, TokenStore};

/// Simulation service client speaking JSON over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl HttpBackend {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, timeout_secs = timeout.as_secs(), "HTTP backend initialized");

        Ok(Self {
            client,
            base_url,
            tokens: TokenStore::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Use a pre-issued access token
    pub async fn set_access_token(&self, token: impl Into<String>) {
        self.tokens.set_access(token.into()).await;
    }

    /// Exchange credentials for an access/refresh token pair
    pub async fn login(&self, email: &str, password: &str) -> BackendResult<()> {
        let response = self
            .client
            .post(self.url("/auth/jwt/create/"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(transport_error)?;

        let pair: TokenPair = decode(check_status(response).await?).await?;
        self.tokens.set_pair(pair).await;

        info!(email, "Logged in");
        Ok(())
    }

    /// Trade the refresh token for a new access token. Clears both tokens on failure.
    async fn refresh(&self) -> BackendResult<()> {
        let Some(refresh) = self.tokens.refresh_token().await else {
            return Err(BackendError::Unauthorized);
        };

        let result = async {
            let response = self
                .client
                .post(self.url("/auth/jwt/refresh/"))
                .json(&RefreshRequest { refresh: &refresh })
                .send()
                .await
                .map_err(transport_error)?;
            decode::<RefreshResponse>(check_status(response).await?).await
        }
        .await;

        match result {
            Ok(response) => {
                self.tokens.apply_refresh(response).await;
                debug!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing tokens");
                self.tokens.clear().await;
                Err(BackendError::Unauthorized)
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> BackendResult<Response> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = self.tokens.access().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(transport_error)
    }

    /// Send a request, refreshing the access token and retrying once on 401
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> BackendResult<Response> {
        debug!(method = %method, path, "Sending request");

        let response = self.send_once(method.clone(), path, body.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED
            || self.tokens.refresh_token().await.is_none()
        {
            return check_status(response).await;
        }

        debug!(path, "Access token rejected, refreshing");
        self.refresh().await?;

        let retry = self.send_once(method, path, body.as_ref()).await?;
        check_status(retry).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        decode(self.send(Method::GET, path, None).await?).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> BackendResult<T> {
        decode(self.send(Method::POST, path, Some(body)).await?).await
    }
}

fn to_body<B: Serialize>(body: &B) -> BackendResult<Value> {
    serde_json::to_value(body).map_err(|e| BackendError::Decode(e.to_string()))
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_decode() {
        BackendError::Decode(e.to_string())
    } else {
        BackendError::Network(e.to_string())
    }
}

async fn check_status(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(BackendError::Unavailable(body));
    }

    Err(BackendError::Http {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl SimulationBackend for HttpBackend {
    async fn start_workday(&self, company_id: CompanyId) -> BackendResult<WorkdaySession> {
        self.post_json(
            "/api/simulation/workday/start/",
            json!({ "company_id": company_id }),
        )
        .await
    }

    async fn generate_incident(&self, request: IncidentRequest) -> BackendResult<Incident> {
        self.post_json("/api/simulation/incident/generate/", to_body(&request)?)
            .await
    }

    async fn resolve_incident(
        &self,
        request: ResolutionRequest,
    ) -> BackendResult<ResolutionOutcome> {
        self.post_json("/api/simulation/incident/resolve/", to_body(&request)?)
            .await
    }

    async fn complete_workday(&self, workday_id: &WorkdayId) -> BackendResult<()> {
        let path = format!("/api/simulation/workday/{}/complete/", workday_id);
        self.send(Method::POST, &path, None).await?;
        Ok(())
    }

    async fn get_company(&self, company_id: CompanyId) -> BackendResult<Company> {
        self.get_json(&format!("/api/companies/{}/", company_id))
            .await
    }

    async fn user_rating(&self) -> BackendResult<UserRating> {
        self.get_json("/api/user/rating/").await
    }
}
