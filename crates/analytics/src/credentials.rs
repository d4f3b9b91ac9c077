//! Bearer token for the GA4 Data API.
//!
//! Minting tokens from a service-account key happens outside this crate; we
//! only read a token that has already been issued.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::client::ClientError;

pub const TOKEN_ENV_VAR: &str = "GA4_ACCESS_TOKEN";

#[derive(Clone)]
pub struct AccessToken(String);

#[derive(Deserialize)]
struct TokenFile {
    access_token: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Result<Self, ClientError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(ClientError::Credentials("access token is empty".into()));
        }
        Ok(Self(token))
    }

    /// `GA4_ACCESS_TOKEN` if set, otherwise the credentials file.
    pub fn resolve(credentials_path: impl AsRef<Path>) -> Result<Self, ClientError> {
        match std::env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => {
                debug!(source = TOKEN_ENV_VAR, "Using access token from environment");
                Self::new(token)
            }
            _ => Self::from_file(credentials_path),
        }
    }

    /// Read a token file: either the raw token, or JSON with `access_token`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "Using access token from credentials file");
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ClientError> {
        let content = content.trim();
        if !content.starts_with('{') {
            return Self::new(content);
        }

        let file: TokenFile = serde_json::from_str(content)
            .map_err(|e| ClientError::Credentials(format!("invalid token file: {e}")))?;
        match (file.access_token, file.kind.as_deref()) {
            (Some(token), _) => Self::new(token),
            (None, Some("service_account")) => Err(ClientError::Credentials(
                "service account key given; exchange it for an access token first".into(),
            )),
            (None, _) => Err(ClientError::Credentials(
                "token file has no 'access_token' field".into(),
            )),
        }
    }

    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}
