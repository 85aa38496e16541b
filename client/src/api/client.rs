use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::{
    api::types::{RefreshRequest, RefreshResponse},
    config,
    error::ApiError,
    session::{default_store, token, SessionManager, SessionState, SessionStore},
};

/// Executes a fully built request. The seam tests use to stand in for the
/// network.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: reqwest::Request) -> Result<Response, ApiError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: reqwest::Request) -> Result<Response, ApiError> {
        self.client.execute(request).await.map_err(ApiError::from)
    }
}

#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

/// A multipart body kept as plain data so the request can be sent twice.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<(String, FormValue)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormValue::Text(value.into())));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormValue::File {
                file_name: file_name.into(),
                mime_type: mime_type.into(),
                bytes,
            },
        ));
        self
    }

    pub fn parts(&self) -> &[(String, FormValue)] {
        &self.parts
    }

    fn to_form(&self) -> Result<reqwest::multipart::Form, ApiError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &self.parts {
            form = match value {
                FormValue::Text(text) => form.text(name.clone(), text.clone()),
                FormValue::File {
                    file_name,
                    mime_type,
                    bytes,
                } => {
                    let part = reqwest::multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(mime_type)
                        .map_err(|_| {
                            ApiError::InvalidRequest(format!("Invalid MIME type {}", mime_type))
                        })?;
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// Raw bytes; any caller content-type is kept.
    Binary(Vec<u8>),
    /// The HTTP runtime sets the content-type with its boundary.
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Binary and multipart bodies never get a JSON content-type.
    pub fn is_form_payload(&self) -> bool {
        matches!(self, RequestBody::Binary(_) | RequestBody::Multipart(_))
    }
}

/// An outbound call: url, method, headers, body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn binary(mut self, bytes: Vec<u8>) -> Self {
        self.body = RequestBody::Binary(bytes);
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    transport: Arc<dyn Transport>,
    session: Arc<SessionManager>,
    base_url: Option<String>,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    pub fn new() -> Self {
        let http = Client::new();
        Self {
            transport: Arc::new(ReqwestTransport::new(http.clone())),
            http,
            session: Arc::new(SessionManager::new(default_store())),
            base_url: None,
        }
    }

    pub fn new_with_base_url(base_url: impl Into<String>) -> Self {
        Self::new().with_base_url(base_url)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(config::normalize_base_url(&base_url.into()));
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_store(self, store: Arc<dyn SessionStore>) -> Self {
        self.with_session(Arc::new(SessionManager::new(store)))
    }

    /// Shares one session (and its refresh lock) between clients.
    pub fn with_session(mut self, session: Arc<SessionManager>) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub(crate) async fn resolved_base_url(&self) -> String {
        if let Some(base) = &self.base_url {
            base.clone()
        } else {
            config::await_api_base_url().await
        }
    }

    pub(crate) async fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.resolved_base_url().await, path)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated_at(token::now_secs())
    }

    pub fn is_token_expiring_soon(&self) -> bool {
        self.session.is_token_expiring_soon_at(token::now_secs())
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state_at(token::now_secs())
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Joins a refresh that is already in flight instead of starting another.
    pub async fn refresh_token(&self) -> Result<String, ApiError> {
        let mut seen = self.session.attempts();
        self.session
            .refresh_with(&mut seen, |refresh| self.request_refresh(refresh))
            .await
    }

    async fn request_refresh(&self, refresh: String) -> Result<RefreshResponse, ApiError> {
        let url = self.endpoint("/token/refresh/").await;
        let request = ApiRequest::post(url).json(&RefreshRequest { refresh })?;
        let response = self.send_public(&request).await?;
        let status = response.status();
        if status.is_success() {
            response
                .json::<RefreshResponse>()
                .await
                .map_err(|e| ApiError::RefreshFailed(format!("Failed to parse response: {}", e)))
        } else {
            let body = response.json::<Value>().await.ok();
            Err(ApiError::RefreshFailed(
                ApiError::from_status(status, body).to_string(),
            ))
        }
    }

    /// Sends `request` with the current bearer token.
    ///
    /// Refreshes first when the token is about to expire (failures there
    /// are only logged), and on a 401 refreshes once and retries once. If
    /// that refresh fails the session is cleared and `SessionExpired` is
    /// returned. Any other response, including a second 401, is returned
    /// untouched.
    pub async fn authenticated_request(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let grant = self.session.grant()?.ok_or(ApiError::NotAuthenticated)?;
        let mut seen = grant.seen_attempt;
        let mut access = grant.token;

        if token::is_expiring_at(&access, token::now_secs()) {
            match self
                .session
                .refresh_with(&mut seen, |refresh| self.request_refresh(refresh))
                .await
            {
                Ok(fresh) => access = fresh,
                Err(err) => log::warn!(
                    "Proactive token refresh failed, continuing with current token: {}",
                    err
                ),
            }
        }

        let response = self.send_with_token(&request, &access).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        log::debug!("{} {} returned 401, refreshing", request.method, request.url);
        match self
            .session
            .refresh_with(&mut seen, |refresh| self.request_refresh(refresh))
            .await
        {
            Ok(fresh) => self.send_with_token(&request, &fresh).await,
            Err(err) => {
                log::warn!("Token refresh after 401 failed, logging out: {}", err);
                self.session.clear();
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn send_with_token(
        &self,
        request: &ApiRequest,
        access: &str,
    ) -> Result<Response, ApiError> {
        let built = self.build_request(request, Some(access))?;
        log::debug!("{} {}", request.method, request.url);
        self.transport.execute(built).await
    }

    /// Sends without credentials (login, registration, refresh, ...).
    pub(crate) async fn send_public(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let built = self.build_request(request, None)?;
        log::debug!("{} {}", request.method, request.url);
        self.transport.execute(built).await
    }

    pub(crate) fn build_request(
        &self,
        request: &ApiRequest,
        access: Option<&str>,
    ) -> Result<reqwest::Request, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(access) = access {
            let value = HeaderValue::from_str(&format!("Bearer {}", access))
                .map_err(|_| ApiError::InvalidRequest("Invalid token format".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.extend(request.headers.clone());

        match &request.body {
            RequestBody::Multipart(_) => {
                headers.remove(CONTENT_TYPE);
            }
            RequestBody::Binary(_) => {}
            RequestBody::Empty | RequestBody::Json(_) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
        }

        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", request.url, e)))?;
        let builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers);
        let builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(
                serde_json::to_vec(value)
                    .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?,
            ),
            RequestBody::Binary(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(form) => builder.multipart(form.to_form()?),
        };
        builder.build().map_err(ApiError::from)
    }

    /// Authenticated call decoding a JSON success body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.authenticated_request(request).await?;
        self.map_json_response(response).await
    }

    pub(crate) async fn public_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ApiError> {
        let response = self.send_public(&request).await?;
        self.map_json_response(response).await
    }

    pub(crate) async fn map_json_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))
        } else {
            let body = response.json::<Value>().await.ok();
            Err(ApiError::from_status(status, body))
        }
    }
}
