//! GA4 Data API v1beta client over HTTPS.

use std::time::Duration;

use async_trait::async_trait;
use insights_core::config::Ga4Config;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::client::{ClientError, ReportClient, RunReportRequest, RunReportResponse};
use crate::credentials::AccessToken;

pub struct Ga4Client {
    http: reqwest::Client,
    base_url: String,
    token: AccessToken,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

impl Ga4Client {
    pub fn new(
        base_url: impl Into<String>,
        token: AccessToken,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build from settings, resolving the access token once.
    pub fn from_config(config: &Ga4Config) -> Result<Self, ClientError> {
        let token = AccessToken::resolve(&config.credentials_path)?;
        Self::new(
            config.api_base_url.clone(),
            token,
            config.request_timeout_ms.map(Duration::from_millis),
        )
    }

    pub fn report_url(&self, property: &str) -> String {
        format!("{}/{}:runReport", self.base_url, property)
    }
}

#[async_trait]
impl ReportClient for Ga4Client {
    async fn run_report(&self, request: &RunReportRequest) -> Result<RunReportResponse, ClientError> {
        let url = self.report_url(&request.property);
        debug!(url = %url, "Sending runReport");

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.token.bearer())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(decode_error(status, &body));
        }
        parse_report(&body)
    }
}

pub(crate) fn parse_report(body: &str) -> Result<RunReportResponse, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Turn a non-2xx response into a [`ClientError`], preferring the message
/// from Google's error envelope over the raw body.
pub(crate) fn decode_error(status: StatusCode, body: &str) -> ClientError {
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.status, envelope.error.message),
        Err(_) => (String::new(), body.trim().to_string()),
    };
    let code = if code.is_empty() {
        status.canonical_reason().unwrap_or("UNKNOWN").to_string()
    } else {
        code
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth {
            status: status.as_u16(),
            message,
        },
        _ => ClientError::Status {
            status: status.as_u16(),
            code,
            message,
        },
    }
}
