//! End-to-end flow over the public crates: property config file → fan-out
//! through a stub client → summary ratios → export.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use insights_analytics::client::{
    ApiRow, ClientError, ReportClient, RunReportRequest, RunReportResponse,
};
use insights_analytics::{query_multi_country, SharedClient};
use insights_core::{DateRange, InsightsError, QuerySpec, LABEL_COLUMN};
use insights_reporting::{render, ExportFormat, ReportRunner, ReportType};

struct CountingClient {
    rows: HashMap<&'static str, Vec<ApiRow>>,
    calls: AtomicUsize,
}

impl CountingClient {
    fn new() -> Self {
        let mut rows = HashMap::new();
        rows.insert("src/1", vec![ApiRow::new(["mobile"], ["120", "4"])]);
        rows.insert("src/2", vec![ApiRow::new(["mobile"], ["80", "(not set)"])]);
        Self {
            rows,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReportClient for CountingClient {
    async fn run_report(&self, request: &RunReportRequest) -> Result<RunReportResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows = self
            .rows
            .get(request.property.as_str())
            .cloned()
            .unwrap_or_default();
        Ok(RunReportResponse {
            row_count: Some(rows.len() as u64),
            rows,
        })
    }
}

fn write_config(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("ga4-{name}-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"US": "src/1", "UK": "src/2"}"#).unwrap();
    path
}

fn spec() -> QuerySpec {
    QuerySpec::new(
        ["deviceCategory"],
        ["sessions", "conversions"],
        DateRange::parse("2024-01-01", "2024-01-31").unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn multi_country_query_from_file() {
    let path = write_config("query");
    let stub = Arc::new(CountingClient::new());

    let table = query_multi_country(stub.clone(), &path, spec(), None, true)
        .await
        .unwrap();

    assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        table.column_names(),
        vec![LABEL_COLUMN, "deviceCategory", "sessions", "conversions"]
    );
    let csv = render(&table, ExportFormat::Csv).unwrap();
    assert_eq!(
        csv,
        "country_label,deviceCategory,sessions,conversions\nUS,mobile,120,4\nUK,mobile,80,\n"
    );

    let stub_again = Arc::new(CountingClient::new());
    let err = query_multi_country(
        stub_again.clone(),
        &path,
        spec(),
        Some(vec!["US".into(), "FR".into()]),
        true,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, InsightsError::LabelNotFound { ref missing } if missing == &["FR"]));
    assert_eq!(stub_again.calls.load(Ordering::SeqCst), 0);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn report_runner_dispatches_templates() {
    let path = write_config("report");
    let client: SharedClient = Arc::new(CountingClient::new());
    let runner = ReportRunner::from_config_file(client, &path).unwrap();
    std::fs::remove_file(&path).ok();

    let table = runner
        .run_named(
            "device_category",
            DateRange::parse("30daysAgo", "yesterday").unwrap(),
            Some(vec!["UK".into()]),
            100,
        )
        .await
        .unwrap();
    assert_eq!(table.len(), 1);
    let names = table.column_names();
    assert_eq!(names[0], LABEL_COLUMN);
    assert_eq!(names[1], ReportType::DeviceCategory.dimensions()[0]);
    assert_eq!(
        &names[2..],
        ReportType::DeviceCategory.metrics()
    );
}
