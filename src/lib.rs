//! datalens: dataset exploration on top of Polars
//!
//! Given a typed table, this library suggests business KPIs from column
//! names (sums, means, distinct counts, date ranges, category breakdowns),
//! summarizes each column with descriptive statistics, and runs exploratory
//! analytics on the numeric columns: a correlation heatmap,
//! isolation-forest outlier detection and k-means clustering.

pub mod agent;
pub mod cli;
pub mod data;
pub mod error;
pub mod format;
pub mod forest;
pub mod kpi;
pub mod logging;
pub mod model;
pub mod rules;
pub mod stats;
pub mod table;
pub mod viz;

// Re-export public items for easier access
pub use agent::{AgentConfig, DataExplorer};
pub use cli::Args;
pub use data::load_table;
pub use error::{ExplorerError, Result};
pub use kpi::{KpiAnalyzer, KpiDetail, KpiMetric};
pub use model::{fit_kmeans, KMeansModel, KMeansSettings};
pub use rules::RuleBook;
pub use stats::{describe, ColumnSummary};
pub use table::ColumnKind;
