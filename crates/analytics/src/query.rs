//! Single-property query.

use insights_core::{InsightsError, InsightsResult, QuerySpec, ResultRow, ResultTable};
use tracing::{debug, info, warn};

use crate::client::{ReportClient, RunReportRequest};

/// Run one report against one property and normalise its rows. Column order
/// follows `spec`; metric values that are not numbers become missing.
///
/// Any transport, auth or API failure is returned as
/// [`InsightsError::SourceQuery`] naming `property_id`. No rows are returned on
/// failure.
pub async fn query_rows(
    client: &dyn ReportClient,
    property_id: &str,
    spec: &QuerySpec,
) -> InsightsResult<Vec<ResultRow>> {
    let request = RunReportRequest::from_spec(property_id, spec);
    debug!(
        property_id,
        dimensions = ?spec.dimensions,
        metrics = ?spec.metrics,
        start = %spec.date_range.start,
        end = %spec.date_range.end,
        limit = spec.limit,
        "Querying GA4 property"
    );
    metrics::counter!("ga4.queries").increment(1);

    let response = client.run_report(&request).await.map_err(|e| {
        metrics::counter!("ga4.query_failures").increment(1);
        InsightsError::source_query(property_id, e)
    })?;

    let rows: Vec<ResultRow> = response
        .rows
        .into_iter()
        .map(|row| {
            let dimensions: Vec<String> =
                row.dimension_values.into_iter().map(|v| v.value).collect();
            let metric_values: Vec<String> =
                row.metric_values.into_iter().map(|v| v.value).collect();
            ResultRow::from_raw(spec, &dimensions, &metric_values)
        })
        .collect();

    let unparsed = rows
        .iter()
        .flat_map(|row| &row.metrics)
        .filter(|cell| cell.is_missing())
        .count();
    if unparsed > 0 {
        debug!(property_id, unparsed, "Non-numeric metric values kept as missing");
    }

    if let Some(total) = response.row_count {
        if total > rows.len() as u64 {
            warn!(
                property_id,
                returned = rows.len(),
                total,
                "Report truncated by row limit"
            );
        }
    }
    metrics::counter!("ga4.rows").increment(rows.len() as u64);
    info!(property_id, rows = rows.len(), "GA4 property queried");

    Ok(rows)
}

/// [`query_rows`] as an unlabelled table.
pub async fn query_property(
    client: &dyn ReportClient,
    property_id: &str,
    spec: &QuerySpec,
) -> InsightsResult<ResultTable> {
    let rows = query_rows(client, property_id, spec).await?;
    Ok(ResultTable::from_rows(spec, None, rows))
}
