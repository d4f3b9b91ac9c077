//! Pre-built GA4 reports for multi-country setups, where each property is one
//! country's storefront (yoursite.co.uk, yoursite.de, ...).
//!
//! Reports never use GA4's `country` dimension: that tracks visitor location,
//! while the `country_label` column tracks which property was queried.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use insights_analytics::{MultiPropertyQuery, SharedClient};
use insights_core::{DateRange, InsightsError, InsightsResult, PropertyConfig, QuerySpec, ResultTable};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::derived::{append_derived, DerivedMetric};

// ─── Types ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Traffic,
    Acquisition,
    Ecommerce,
    Pages,
    Devices,
    SourceMedium,
    LandingPages,
    DeviceCategory,
    EcommerceOverview,
    ProductPerformance,
    ConversionFunnel,
    Summary,
}

impl ReportType {
    pub const ALL: [ReportType; 12] = [
        Self::Traffic,
        Self::Acquisition,
        Self::Ecommerce,
        Self::Pages,
        Self::Devices,
        Self::SourceMedium,
        Self::LandingPages,
        Self::DeviceCategory,
        Self::EcommerceOverview,
        Self::ProductPerformance,
        Self::ConversionFunnel,
        Self::Summary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Traffic => "traffic",
            Self::Acquisition => "acquisition",
            Self::Ecommerce => "ecommerce",
            Self::Pages => "pages",
            Self::Devices => "devices",
            Self::SourceMedium => "source_medium",
            Self::LandingPages => "landing_pages",
            Self::DeviceCategory => "device_category",
            Self::EcommerceOverview => "ecommerce_overview",
            Self::ProductPerformance => "product_performance",
            Self::ConversionFunnel => "conversion_funnel",
            Self::Summary => "summary",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|r| r.name()).collect()
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Traffic => "Basic traffic metrics by date",
            Self::Acquisition => "User acquisition by source, medium and campaign",
            Self::Ecommerce => "Item-level e-commerce performance by date",
            Self::Pages => "Page performance by title and path",
            Self::Devices => "Traffic by device category and operating system",
            Self::SourceMedium => "Traffic by acquisition channel",
            Self::LandingPages => "Landing page performance",
            Self::DeviceCategory => "Desktop / mobile / tablet breakdown",
            Self::EcommerceOverview => "Daily transactions and revenue",
            Self::ProductPerformance => "Product-level funnel by name, brand and category",
            Self::ConversionFunnel => "Conversion funnel by source and medium",
            Self::Summary => "One row per property with headline metrics",
        }
    }

    pub fn dimensions(self) -> &'static [&'static str] {
        match self {
            Self::Traffic | Self::EcommerceOverview => &["date"],
            Self::Acquisition => &["sessionSource", "sessionMedium", "sessionCampaignName"],
            Self::Ecommerce => &["date", "itemName"],
            Self::Pages => &["pageTitle", "pagePath"],
            Self::Devices => &["deviceCategory", "operatingSystem"],
            Self::SourceMedium | Self::ConversionFunnel => &["sessionSource", "sessionMedium"],
            Self::LandingPages => &["landingPage"],
            Self::DeviceCategory => &["deviceCategory"],
            Self::ProductPerformance => &["itemName", "itemBrand", "itemCategory"],
            // No dimensions: GA4 aggregates over the whole property.
            Self::Summary => &[],
        }
    }

    pub fn metrics(self) -> &'static [&'static str] {
        match self {
            Self::Traffic => &[
                "sessions",
                "totalUsers",
                "newUsers",
                "screenPageViews",
                "averageSessionDuration",
                "bounceRate",
            ],
            Self::Acquisition | Self::SourceMedium => &[
                "sessions",
                "totalUsers",
                "newUsers",
                "conversions",
                "engagementRate",
            ],
            Self::Ecommerce => &[
                "itemRevenue",
                "itemsViewed",
                "itemsPurchased",
                "itemsAddedToCart",
                "transactions",
                "totalRevenue",
            ],
            Self::Pages => &[
                "screenPageViews",
                "totalUsers",
                "averageSessionDuration",
                "bounceRate",
            ],
            Self::Devices | Self::DeviceCategory => {
                &["sessions", "totalUsers", "conversions", "engagementRate"]
            }
            Self::LandingPages => &[
                "sessions",
                "totalUsers",
                "bounceRate",
                "conversions",
                "engagementRate",
            ],
            Self::EcommerceOverview => &[
                "transactions",
                "totalRevenue",
                "averagePurchaseRevenue",
                "ecommercePurchases",
                "itemsViewed",
                "addToCarts",
            ],
            Self::ProductPerformance => &[
                "itemRevenue",
                "itemsViewed",
                "itemsPurchased",
                "itemsAddedToCart",
                "cartToViewRate",
                "purchaseToViewRate",
            ],
            Self::ConversionFunnel => &[
                "sessions",
                "engagedSessions",
                "conversions",
                "transactions",
                "totalRevenue",
                "engagementRate",
            ],
            Self::Summary => &[
                "sessions",
                "totalUsers",
                "newUsers",
                "screenPageViews",
                "averageSessionDuration",
                "bounceRate",
                "engagementRate",
                "conversions",
                "transactions",
                "totalRevenue",
                "averagePurchaseRevenue",
            ],
        }
    }

    pub fn query_spec(self, date_range: DateRange, limit: u64) -> InsightsResult<QuerySpec> {
        QuerySpec::new(
            self.dimensions().iter().copied(),
            self.metrics().iter().copied(),
            date_range,
        )?
        .with_limit(limit)
    }
}

impl FromStr for ReportType {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| InsightsError::UnknownReportType {
                name: s.to_string(),
                available: Self::names(),
            })
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Report Runner ──────────────────────────────────────────────────────────

/// Dispatches report templates into the multi-property query. The country
/// label column is always attached.
pub struct ReportRunner {
    client: SharedClient,
    properties: PropertyConfig,
    max_concurrent: usize,
}

impl ReportRunner {
    pub fn new(client: SharedClient, properties: PropertyConfig) -> Self {
        Self {
            client,
            properties,
            max_concurrent: 1,
        }
    }

    pub fn from_config_file(client: SharedClient, path: impl AsRef<Path>) -> InsightsResult<Self> {
        Ok(Self::new(client, PropertyConfig::load(path)?))
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    pub fn properties(&self) -> &PropertyConfig {
        &self.properties
    }

    pub async fn run(
        &self,
        report: ReportType,
        date_range: DateRange,
        labels: Option<Vec<String>>,
        limit: u64,
    ) -> InsightsResult<ResultTable> {
        info!(report = %report, "Running report");
        let spec = report.query_spec(date_range, limit)?;
        MultiPropertyQuery::new(self.properties.clone(), spec)
            .maybe_labels(labels)
            .attach_label(true)
            .max_concurrent(self.max_concurrent)
            .run(self.client.clone())
            .await
    }

    /// Look up a report by name, then run it.
    pub async fn run_named(
        &self,
        name: &str,
        date_range: DateRange,
        labels: Option<Vec<String>>,
        limit: u64,
    ) -> InsightsResult<ResultTable> {
        let report: ReportType = name.parse()?;
        self.run(report, date_range, labels, limit).await
    }

    /// One row per property with headline metrics plus every derived ratio.
    pub async fn multi_country_summary(
        &self,
        date_range: DateRange,
        labels: Option<Vec<String>>,
        limit: u64,
    ) -> InsightsResult<ResultTable> {
        let table = self.run(ReportType::Summary, date_range, labels, limit).await?;
        append_derived(table, &DerivedMetric::ALL)
    }
}
