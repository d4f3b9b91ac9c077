use serde::Deserialize;

/// Root application settings. Loaded from an optional TOML file and
/// environment variables with the prefix `ECOMM_INSIGHTS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_properties_path")]
    pub properties_path: String,
    #[serde(default)]
    pub ga4: Ga4Config,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ga4Config {
    /// File holding an OAuth2 access token (raw or `{"access_token": ...}`).
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout. Unset means the HTTP client default.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_row_limit")]
    pub row_limit: u64,
    /// Number of properties queried at once. 1 keeps the fan-out sequential.
    #[serde(default = "default_max_concurrent_properties")]
    pub max_concurrent_properties: usize,
    #[serde(default = "default_start_date")]
    pub start_date: String,
    #[serde(default = "default_end_date")]
    pub end_date: String,
}

pub const DEFAULT_ROW_LIMIT: u64 = 10_000;

fn default_properties_path() -> String {
    "ga4_properties.json".to_string()
}
fn default_credentials_path() -> String {
    "ga4_token.json".to_string()
}
fn default_api_base_url() -> String {
    "https://analyticsdata.googleapis.com/v1beta".to_string()
}
fn default_row_limit() -> u64 {
    DEFAULT_ROW_LIMIT
}
fn default_max_concurrent_properties() -> usize {
    1
}
fn default_start_date() -> String {
    "30daysAgo".to_string()
}
fn default_end_date() -> String {
    "yesterday".to_string()
}

impl Default for Ga4Config {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            api_base_url: default_api_base_url(),
            request_timeout_ms: None,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            row_limit: default_row_limit(),
            max_concurrent_properties: default_max_concurrent_properties(),
            start_date: default_start_date(),
            end_date: default_end_date(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            properties_path: default_properties_path(),
            ga4: Ga4Config::default(),
            query: QueryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load settings from an optional TOML file, then environment variables.
    /// Environment values win over the file.
    pub fn load(file: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("ECOMM_INSIGHTS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
