//! Query definition: date range, ordered dimensions and metrics, row limit.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_ROW_LIMIT;
use crate::error::{InsightsError, InsightsResult};

/// One end of a report date range, in the forms the GA4 Data API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    Date(NaiveDate),
    Today,
    Yesterday,
    DaysAgo(u32),
}

impl DateSpec {
    /// Resolve against a reference day. `None` when the offset falls outside
    /// the representable calendar.
    pub fn resolve(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Today => Some(today),
            Self::Yesterday => today.checked_sub_days(Days::new(1)),
            Self::DaysAgo(n) => today.checked_sub_days(Days::new(u64::from(*n))),
        }
    }

    pub fn is_relative(&self) -> bool {
        !matches!(self, Self::Date(_))
    }
}

impl FromStr for DateSpec {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        match token {
            "today" => return Ok(Self::Today),
            "yesterday" => return Ok(Self::Yesterday),
            _ => {}
        }
        if let Some(n) = token.strip_suffix("daysAgo") {
            if n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
                return Err(InsightsError::InvalidQuery(format!("invalid relative date '{s}'")));
            }
            return n
                .parse::<u32>()
                .map(Self::DaysAgo)
                .map_err(|_| InsightsError::InvalidQuery(format!("invalid relative date '{s}'")));
        }
        NaiveDate::parse_from_str(token, "%Y-%m-%d")
            .map(Self::Date)
            .map_err(|_| {
                InsightsError::InvalidQuery(format!(
                    "invalid date '{s}': expected YYYY-MM-DD, 'today', 'yesterday' or 'NdaysAgo'"
                ))
            })
    }
}

impl fmt::Display for DateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Today => f.write_str("today"),
            Self::Yesterday => f.write_str("yesterday"),
            Self::DaysAgo(n) => write!(f, "{n}daysAgo"),
        }
    }
}

impl Serialize for DateSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateSpec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateSpec,
    pub end: DateSpec,
}

impl DateRange {
    /// Rejects a range whose start falls after its end. Mixed absolute and
    /// relative ends depend on the run day and are left to the API.
    pub fn new(start: DateSpec, end: DateSpec) -> InsightsResult<Self> {
        if start.is_relative() == end.is_relative() {
            let today = Local::now().date_naive();
            let resolved = start.resolve(today).zip(end.resolve(today));
            let Some((s, e)) = resolved else {
                return Err(InsightsError::InvalidQuery(format!(
                    "date range {start}..{end} is out of range"
                )));
            };
            if s > e {
                return Err(InsightsError::InvalidQuery(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> InsightsResult<Self> {
        Self::new(start.parse()?, end.parse()?)
    }
}

/// Dimension and metric order here is the column order of every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub date_range: DateRange,
    pub limit: u64,
}

impl QuerySpec {
    pub fn new<D, M>(dimensions: D, metrics: M, date_range: DateRange) -> InsightsResult<Self>
    where
        D: IntoIterator,
        D::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        let spec = Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            metrics: metrics.into_iter().map(Into::into).collect(),
            date_range,
            limit: DEFAULT_ROW_LIMIT,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn with_limit(mut self, limit: u64) -> InsightsResult<Self> {
        self.limit = limit;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> InsightsResult<()> {
        if self.metrics.is_empty() {
            return Err(InsightsError::InvalidQuery(
                "at least one metric is required".into(),
            ));
        }
        if let Some(blank) = self
            .dimensions
            .iter()
            .chain(&self.metrics)
            .find(|name| name.trim().is_empty())
        {
            return Err(InsightsError::InvalidQuery(format!(
                "empty dimension or metric name '{blank}'"
            )));
        }
        if self.limit == 0 {
            return Err(InsightsError::InvalidQuery("row limit must be positive".into()));
        }
        Ok(())
    }
}
