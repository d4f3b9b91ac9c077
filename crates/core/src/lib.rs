pub mod config;
pub mod error;
pub mod property;
pub mod query;
pub mod table;

pub use config::AppConfig;
pub use error::{InsightsError, InsightsResult};
pub use property::PropertyConfig;
pub use query::{DateRange, DateSpec, QuerySpec};
pub use table::{Cell, Column, ColumnKind, ResultRow, ResultTable, LABEL_COLUMN};
