// src/api/client.rs
//! HTTP transport for the Notion API.
//!
//! A thin wrapper around reqwest that owns the resilience concerns: every
//! call gets a hard deadline, transient failures are retried with backoff,
//! and each retry goes out under a rotated identity. Non-transient failure
//! statuses are handed back to the caller untouched.

use super::identity::{IdentityProvider, RotatingIdentity};
use super::types::{ApiRequest, ApiResponse};
use super::NotionTransport;
use crate::constants::{API_BASE_URL, DEFAULT_CALL_TIMEOUT, NOTION_VERSION};
use crate::error::{AppError, NotionErrorCode};
use crate::error_recovery::{retry_with_backoff, RetryPolicy};
use reqwest::{header, Client, Method, Response};
use std::sync::Arc;
use std::time::Duration;

/// Knobs of the resilience wrapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSettings {
    pub retry: RetryPolicy,
    /// Hard deadline for one attempt, body included.
    pub call_timeout: Duration,
    /// Honor proxy settings from the process environment.
    pub trust_env: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            trust_env: false,
        }
    }
}

/// A reqwest-backed [`NotionTransport`].
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
    identity: Arc<dyn IdentityProvider>,
    settings: TransportSettings,
}

impl NotionHttpClient {
    /// Creates a new HTTP client drawing credentials from `identity`.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        settings: TransportSettings,
    ) -> Result<Self, AppError> {
        let mut builder = Client::builder()
            .default_headers(Self::create_headers())
            .timeout(settings.call_timeout);
        if !settings.trust_env {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            base_url: API_BASE_URL.to_string(),
            identity,
            settings,
        })
    }

    /// Points the client at another API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        headers
    }

    /// One attempt at `request` under the current identity.
    async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse<String>, AppError> {
        let identity = self.identity.current();
        let url = format!("{}/{}", self.base_url, request.endpoint);
        log::debug!("{} {}", request.method, url);

        let authorization = header::HeaderValue::from_str(&identity.bearer()).map_err(|e| {
            AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
        })?;
        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(header::AUTHORIZATION, authorization)
            .header(header::USER_AGENT, identity.user_agent.as_str());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = self
            .with_deadline(&url, async {
                let response = builder.send().await?;
                extract_response_text(response).await
            })
            .await?;

        if !response.is_success() {
            let code = NotionErrorCode::from_response(response.status.as_u16(), &response.data);
            log::debug!(
                "{} {} answered {} ({})",
                request.method,
                url,
                response.status,
                code
            );
            if code.is_retryable()
                || NotionErrorCode::HttpStatus(response.status.as_u16()).is_retryable()
            {
                return Err(AppError::transport(
                    response.status.as_u16(),
                    response.data,
                    response.url,
                ));
            }
        }

        Ok(response)
    }

    async fn download_once(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let identity = self.identity.current();
        log::debug!("GET {}", url);

        self.with_deadline(url, async {
            let response = self
                .client
                .request(Method::GET, url)
                .header(header::USER_AGENT, identity.user_agent.as_str())
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::transport(status.as_u16(), body, url));
            }
            Ok(response.bytes().await?.to_vec())
        })
        .await
    }

    async fn with_deadline<T>(
        &self,
        endpoint: &str,
        call: impl std::future::Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        let after = self.settings.call_timeout;
        tokio::time::timeout(after, call)
            .await
            .map_err(|_| AppError::Timeout {
                endpoint: endpoint.to_string(),
                after,
            })?
    }

    fn rotate_identity(&self, retry: u32, error: &AppError) {
        let identity = self.identity.rotate();
        log::info!(
            "Retry {} after '{}' using token {}",
            retry,
            error,
            identity.token
        );
    }
}

#[async_trait::async_trait]
impl NotionTransport for NotionHttpClient {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse<String>, AppError> {
        retry_with_backoff(
            || self.send_once(request),
            &self.settings.retry,
            |retry, error| self.rotate_identity(retry, error),
        )
        .await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError> {
        retry_with_backoff(
            || self.download_once(url),
            &self.settings.retry,
            |retry, error| self.rotate_identity(retry, error),
        )
        .await
    }

    fn child_session(&self) -> Result<Arc<dyn NotionTransport>, AppError> {
        let identity = RotatingIdentity::new(vec![self.identity.current().token])?;
        Ok(Arc::new(Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            identity: Arc::new(identity),
            settings: self.settings,
        }))
    }
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}
