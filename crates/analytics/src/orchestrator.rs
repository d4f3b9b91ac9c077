//! Multi-country fan-out: query every selected property, tag rows with the
//! property's country label and concatenate into one table.
//!
//! The call is all-or-nothing. Unknown labels fail before any query is sent,
//! and the first failing property aborts the whole call.

use std::path::Path;
use std::sync::Arc;

use insights_core::{
    InsightsError, InsightsResult, PropertyConfig, QuerySpec, ResultRow, ResultTable,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::client::SharedClient;
use crate::query::query_rows;

/// A multi-property query over a [`PropertyConfig`].
#[derive(Debug, Clone)]
pub struct MultiPropertyQuery {
    properties: PropertyConfig,
    spec: QuerySpec,
    labels: Option<Vec<String>>,
    attach_label: bool,
    max_concurrent: usize,
}

impl MultiPropertyQuery {
    pub fn new(properties: PropertyConfig, spec: QuerySpec) -> Self {
        Self {
            properties,
            spec,
            labels: None,
            attach_label: true,
            max_concurrent: 1,
        }
    }

    /// Load the property config from `path` (re-read on every call).
    pub fn from_config_file(path: impl AsRef<Path>, spec: QuerySpec) -> InsightsResult<Self> {
        Ok(Self::new(PropertyConfig::load(path)?, spec))
    }

    /// Restrict to these labels, queried in this order.
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn maybe_labels(mut self, labels: Option<Vec<String>>) -> Self {
        self.labels = labels;
        self
    }

    pub fn attach_label(mut self, attach: bool) -> Self {
        self.attach_label = attach;
        self
    }

    /// Properties queried at once. Values below 2 keep the fan-out sequential.
    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Resolve labels and query each property. Output rows are grouped by
    /// label in resolved order; within a label, rows keep source order.
    pub async fn run(&self, client: SharedClient) -> InsightsResult<ResultTable> {
        let targets: Vec<(String, String)> = self
            .properties
            .resolve(self.labels.as_deref())?
            .into_iter()
            .map(|(label, id)| (label.to_string(), id.to_string()))
            .collect();

        let mut table = ResultTable::for_query(&self.spec, self.attach_label);
        if targets.is_empty() {
            info!("No properties selected, returning empty table");
            return Ok(table);
        }

        let span = info_span!(
            "multi_property_query",
            run_id = %Uuid::new_v4(),
            properties = targets.len(),
            concurrency = self.max_concurrent,
        );
        let per_label = async {
            if self.max_concurrent > 1 && targets.len() > 1 {
                self.fetch_concurrent(client, &targets).await
            } else {
                self.fetch_sequential(client, &targets).await
            }
        }
        .instrument(span)
        .await?;

        for ((label, _), rows) in targets.iter().zip(per_label) {
            let label = self.attach_label.then_some(label.as_str());
            table.append(ResultTable::from_rows(&self.spec, label, rows));
        }
        info!(
            properties = targets.len(),
            rows = table.len(),
            "Multi-property query complete"
        );
        Ok(table)
    }

    async fn fetch_sequential(
        &self,
        client: SharedClient,
        targets: &[(String, String)],
    ) -> InsightsResult<Vec<Vec<ResultRow>>> {
        let mut results = Vec::with_capacity(targets.len());
        for (label, property_id) in targets {
            let rows = query_rows(client.as_ref(), property_id, &self.spec)
                .await
                .map_err(|e| e.with_label(label))?;
            results.push(rows);
        }
        Ok(results)
    }

    async fn fetch_concurrent(
        &self,
        client: SharedClient,
        targets: &[(String, String)],
    ) -> InsightsResult<Vec<Vec<ResultRow>>> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let spec = Arc::new(self.spec.clone());
        let mut set = JoinSet::new();

        for (idx, (label, property_id)) in targets.iter().cloned().enumerate() {
            let client = client.clone();
            let spec = spec.clone();
            let permits = permits.clone();
            set.spawn(
                async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| InsightsError::Internal(e.to_string()))?;
                    let rows = query_rows(client.as_ref(), &property_id, &spec)
                        .await
                        .map_err(|e| e.with_label(&label))?;
                    Ok::<_, InsightsError>((idx, rows))
                }
                .in_current_span(),
            );
        }

        let mut slots: Vec<Option<Vec<ResultRow>>> = vec![None; targets.len()];
        while let Some(joined) = set.join_next().await {
            // Returning early drops the set, which aborts the queries still
            // in flight.
            let (idx, rows) = joined.map_err(|e| InsightsError::Internal(e.to_string()))??;
            slots[idx] = Some(rows);
        }

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| InsightsError::Internal("missing property result".into())))
            .collect()
    }
}

/// Load `config_path` and run one multi-property query.
pub async fn query_multi_country(
    client: SharedClient,
    config_path: impl AsRef<Path>,
    spec: QuerySpec,
    labels: Option<Vec<String>>,
    attach_label: bool,
) -> InsightsResult<ResultTable> {
    MultiPropertyQuery::from_config_file(config_path, spec)?
        .maybe_labels(labels)
        .attach_label(attach_label)
        .run(client)
        .await
}
