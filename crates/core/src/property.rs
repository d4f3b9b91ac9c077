//! Country label → GA4 property mapping.
//!
//! The file is a flat JSON object:
//!
//! ```json
//! { "US": "properties/123456789", "UK": "properties/987654321" }
//! ```
//!
//! The label comes from which property is queried, not from visitor location:
//! every visitor to the UK property is labelled `UK`.

use std::fmt;
use std::path::Path;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use tracing::debug;

use crate::error::{InsightsError, InsightsResult};

/// Ordered label → property id mapping. Iteration follows file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyConfig {
    entries: Vec<(String, String)>,
}

impl PropertyConfig {
    /// Build from in-memory pairs. Fails on a repeated label.
    pub fn from_pairs<I, L, P>(pairs: I) -> InsightsResult<Self>
    where
        I: IntoIterator<Item = (L, P)>,
        L: Into<String>,
        P: Into<String>,
    {
        let mut config = Self::default();
        for (label, property_id) in pairs {
            let label = label.into();
            if config.contains(&label) {
                return Err(InsightsError::ConfigParse {
                    path: "<memory>".into(),
                    reason: format!("duplicate label '{label}'"),
                });
            }
            config.entries.push((label, property_id.into()));
        }
        Ok(config)
    }

    /// Read and parse the config file. The file is re-read on every call.
    pub fn load(path: impl AsRef<Path>) -> InsightsResult<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(InsightsError::ConfigNotFound { path: shown });
            }
            Err(e) => return Err(InsightsError::Io(e)),
        };

        let config = Self::parse(&content, &shown)?;
        debug!(path = %shown, properties = config.len(), "Property config loaded");
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> InsightsResult<Self> {
        Self::parse(content.as_bytes(), "<memory>")
    }

    /// Any content failure, including invalid UTF-8, is a parse error.
    fn parse(content: &[u8], path: &str) -> InsightsResult<Self> {
        serde_json::from_slice(content).map_err(|e| InsightsError::ConfigParse {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, id)| id.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, id)| (l.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the labels to query. `None` selects every configured label in
    /// config order. An explicit list is validated as a whole: every label
    /// missing from the config is reported together, in request order.
    pub fn resolve<'a>(
        &'a self,
        requested: Option<&[String]>,
    ) -> InsightsResult<Vec<(&'a str, &'a str)>> {
        let Some(requested) = requested else {
            return Ok(self.iter().collect());
        };

        let mut missing: Vec<String> = Vec::new();
        let mut resolved = Vec::with_capacity(requested.len());
        for label in requested {
            match self.entries.iter().find(|(l, _)| l == label) {
                Some((l, id)) => resolved.push((l.as_str(), id.as_str())),
                None if !missing.contains(label) => missing.push(label.clone()),
                None => {}
            }
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(InsightsError::LabelNotFound { missing })
        }
    }
}

impl<'de> Deserialize<'de> for PropertyConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ConfigVisitor;

        impl<'de> Visitor<'de> for ConfigVisitor {
            type Value = PropertyConfig;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a flat object mapping labels to property id strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, String)> = Vec::new();
                while let Some((label, property_id)) = map.next_entry::<String, String>()? {
                    if entries.iter().any(|(l, _)| *l == label) {
                        return Err(de::Error::custom(format!("duplicate label '{label}'")));
                    }
                    entries.push((label, property_id));
                }
                Ok(PropertyConfig { entries })
            }
        }

        deserializer.deserialize_map(ConfigVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: impl AsRef<[u8]>) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("ga4-props-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_preserves_file_order() {
        let path = write_temp(r#"{"US": "properties/1", "UK": "properties/2", "DE": "properties/3"}"#);
        let config = PropertyConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.labels().collect::<Vec<_>>(), vec!["US", "UK", "DE"]);
        assert_eq!(config.get("UK"), Some("properties/2"));
    }

    #[test]
    fn test_missing_file() {
        let err = PropertyConfig::load("/nonexistent/ga4_properties.json").unwrap_err();
        assert!(matches!(err, InsightsError::ConfigNotFound { .. }));
        assert!(err.to_string().contains("/nonexistent/ga4_properties.json"));
    }

    #[test]
    fn test_invalid_json() {
        let path = write_temp("{not json");
        let err = PropertyConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, InsightsError::ConfigParse { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let path = write_temp(b"{\"US\": \"properties/\xff\xfe\"}");
        let err = PropertyConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        match err {
            InsightsError::ConfigParse { path: shown, .. } => assert!(shown.ends_with(".json")),
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_nested_and_duplicate_values() {
        let err = PropertyConfig::from_json_str(r#"{"US": {"id": 1}}"#).unwrap_err();
        assert!(matches!(err, InsightsError::ConfigParse { .. }));

        let err = PropertyConfig::from_json_str(r#"{"US": "a", "US": "b"}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate label 'US'"));

        let err = PropertyConfig::from_json_str(r#"["US"]"#).unwrap_err();
        assert!(matches!(err, InsightsError::ConfigParse { .. }));
    }

    #[test]
    fn test_identifiers_are_opaque() {
        let config = PropertyConfig::from_json_str(r#"{"US": "  weird id/with spaces "}"#).unwrap();
        assert_eq!(config.get("US"), Some("  weird id/with spaces "));
    }

    #[test]
    fn test_resolve_all_and_subset() {
        let config = PropertyConfig::from_pairs([("US", "src/1"), ("UK", "src/2")]).unwrap();

        let all = config.resolve(None).unwrap();
        assert_eq!(all, vec![("US", "src/1"), ("UK", "src/2")]);

        let subset = config.resolve(Some(&["UK".to_string(), "US".to_string()])).unwrap();
        assert_eq!(subset, vec![("UK", "src/2"), ("US", "src/1")]);
    }

    #[test]
    fn test_resolve_reports_every_missing_label() {
        let config = PropertyConfig::from_pairs([("US", "src/1"), ("UK", "src/2")]).unwrap();
        let requested = vec!["US".to_string(), "FR".to_string(), "IT".to_string()];
        match config.resolve(Some(&requested)) {
            Err(InsightsError::LabelNotFound { missing }) => {
                assert_eq!(missing, vec!["FR".to_string(), "IT".to_string()]);
            }
            other => panic!("expected LabelNotFound, got {other:?}"),
        }
    }
}
