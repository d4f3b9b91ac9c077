use thiserror::Error;

pub type InsightsResult<T> = Result<T, InsightsError>;

/// Boxed transport-level cause carried by [`InsightsError::SourceQuery`].
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Property config not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Invalid property config {path}: {reason}")]
    ConfigParse { path: String, reason: String },

    #[error("Labels not found in property config: {}", .missing.join(", "))]
    LabelNotFound { missing: Vec<String> },

    #[error("Query failed for {}: {source}", describe_source(.label, .property_id))]
    SourceQuery {
        label: Option<String>,
        property_id: String,
        #[source]
        source: SourceError,
    },

    #[error("Unknown report type '{name}'. Available types: {}", .available.join(", "))]
    UnknownReportType {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Column '{column}' required by '{derived}' is not present")]
    MissingColumn { column: String, derived: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn describe_source(label: &Option<String>, property_id: &str) -> String {
    match label {
        Some(label) => format!("{label} (property {property_id})"),
        None => format!("property {property_id}"),
    }
}

impl InsightsError {
    /// Wrap a transport failure for `property_id`.
    pub fn source_query(property_id: impl Into<String>, source: impl Into<SourceError>) -> Self {
        Self::SourceQuery {
            label: None,
            property_id: property_id.into(),
            source: source.into(),
        }
    }

    /// Attach the country label to a [`InsightsError::SourceQuery`]; other
    /// variants are returned untouched.
    pub fn with_label(self, label: &str) -> Self {
        match self {
            Self::SourceQuery {
                property_id,
                source,
                ..
            } => Self::SourceQuery {
                label: Some(label.to_string()),
                property_id,
                source,
            },
            other => other,
        }
    }

    /// Property id of a failed source query, if this is one.
    pub fn property_id(&self) -> Option<&str> {
        match self {
            Self::SourceQuery { property_id, .. } => Some(property_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_not_found_lists_labels() {
        let err = InsightsError::LabelNotFound {
            missing: vec!["FR".into(), "IT".into()],
        };
        assert_eq!(
            err.to_string(),
            "Labels not found in property config: FR, IT"
        );
    }

    #[test]
    fn test_source_query_message_with_and_without_label() {
        let err = InsightsError::source_query("properties/1", "connection reset");
        assert_eq!(
            err.to_string(),
            "Query failed for property properties/1: connection reset"
        );

        let err = err.with_label("UK");
        assert_eq!(
            err.to_string(),
            "Query failed for UK (property properties/1): connection reset"
        );
        assert_eq!(err.property_id(), Some("properties/1"));
    }
}
