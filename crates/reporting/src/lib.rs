//! Multi-country GA4 reports: named templates, derived ratio metrics and
//! table export.

pub mod derived;
pub mod export;
pub mod templates;

pub use derived::{append_derived, DerivedMetric};
pub use export::{render, ExportFormat};
pub use templates::{ReportRunner, ReportType};
