//! Report client seam and the GA4 Data API `runReport` wire format.
//!
//! The orchestrator only talks to [`ReportClient`]; [`crate::ga4::Ga4Client`]
//! is the HTTP implementation.

use std::sync::Arc;

use async_trait::async_trait;
use insights_core::QuerySpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GA4 API returned {status} {code}: {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("GA4 authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Unexpected GA4 response: {0}")]
    Decode(String),

    #[error("Credentials error: {0}")]
    Credentials(String),
}

/// Executes one report request against one property.
#[async_trait]
pub trait ReportClient: Send + Sync {
    async fn run_report(&self, request: &RunReportRequest) -> Result<RunReportResponse, ClientError>;
}

pub type SharedClient = Arc<dyn ReportClient>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedField {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDateRange {
    pub start_date: String,
    pub end_date: String,
}

/// Body of `POST /v1beta/{property}:runReport`. The property is part of the
/// URL, not the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    #[serde(skip)]
    pub property: String,
    pub dimensions: Vec<NamedField>,
    pub metrics: Vec<NamedField>,
    pub date_ranges: Vec<ApiDateRange>,
    pub limit: u64,
}

impl RunReportRequest {
    pub fn from_spec(property: &str, spec: &QuerySpec) -> Self {
        let named = |names: &[String]| -> Vec<NamedField> {
            names
                .iter()
                .map(|name| NamedField { name: name.clone() })
                .collect()
        };
        Self {
            property: property.to_string(),
            dimensions: named(&spec.dimensions),
            metrics: named(&spec.metrics),
            date_ranges: vec![ApiDateRange {
                start_date: spec.date_range.start.to_string(),
                end_date: spec.date_range.end.to_string(),
            }],
            limit: spec.limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CellValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRow {
    #[serde(default)]
    pub dimension_values: Vec<CellValue>,
    #[serde(default)]
    pub metric_values: Vec<CellValue>,
}

impl ApiRow {
    /// Convenience for stubs and fixtures.
    pub fn new<D, M>(dimensions: D, metrics: M) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        let wrap = |v: String| CellValue { value: v };
        Self {
            dimension_values: dimensions.into_iter().map(|d| wrap(d.into())).collect(),
            metric_values: metrics.into_iter().map(|m| wrap(m.into())).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub rows: Vec<ApiRow>,
    /// Total matching rows, independent of `limit`. Omitted by the API when
    /// the report is empty.
    #[serde(default)]
    pub row_count: Option<u64>,
}
