//! GA4 retrieval: the report client seam, the Data API HTTP client, and the
//! single- and multi-property query paths.

pub mod client;
pub mod credentials;
pub mod ga4;
pub mod orchestrator;
pub mod query;

pub use client::{ClientError, ReportClient, SharedClient};
pub use credentials::AccessToken;
pub use ga4::Ga4Client;
pub use orchestrator::{query_multi_country, MultiPropertyQuery};
pub use query::{query_property, query_rows};
