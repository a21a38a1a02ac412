//! Per-column descriptive statistics for the overview command.
//!
//! Numeric columns get count, mean, sample standard deviation and range.
//! Categorical columns get their distinct count and most frequent value.
//! Datetime columns get their earliest and latest date.

use chrono::NaiveDate;
use polars::prelude::*;

use crate::format::format_number;
use crate::kpi::value_counts;
use crate::table::{self, ColumnKind};

/// Summary of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: Option<ColumnKind>,
    /// Non-missing values. NaN counts as missing.
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; needs at least two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub distinct: Option<usize>,
    /// Most frequent value and its occurrences.
    pub top: Option<(String, i64)>,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

impl ColumnSummary {
    fn empty(column: &Column) -> Self {
        Self {
            name: column.name().to_string(),
            kind: table::column_kind(column),
            count: column.len() - column.null_count(),
            missing: column.null_count(),
            mean: None,
            std: None,
            min: None,
            max: None,
            distinct: None,
            top: None,
            earliest: None,
            latest: None,
        }
    }
}

/// Summaries of every column of `df`, in table order.
pub fn describe(df: &DataFrame) -> crate::Result<Vec<ColumnSummary>> {
    df.get_columns().iter().map(summarize).collect()
}

fn summarize(column: &Column) -> crate::Result<ColumnSummary> {
    let mut summary = ColumnSummary::empty(column);

    match summary.kind {
        Some(ColumnKind::Numeric) => {
            let values = table::present_floats(column)?;
            summary.count = values.len();
            summary.missing = column.len() - values.len();
            if !values.is_empty() {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                summary.mean = Some(mean);
                if values.len() > 1 {
                    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
                    summary.std = Some((ss / (n - 1.0)).sqrt());
                }
                summary.min = values.iter().copied().reduce(f64::min);
                summary.max = values.iter().copied().reduce(f64::max);
            }
        }
        Some(ColumnKind::Categorical) => {
            let counts = value_counts(&table::present_strings(column)?);
            summary.distinct = Some(counts.len());
            summary.top = counts.into_iter().next();
        }
        Some(ColumnKind::Datetime) => {
            let dates = table::present_dates(column)?;
            summary.earliest = dates.iter().min().copied();
            summary.latest = dates.iter().max().copied();
        }
        None => {}
    }

    Ok(summary)
}

/// Render summaries as a printable table, one row per column.
pub fn summary_table(summaries: &[ColumnSummary]) -> PolarsResult<DataFrame> {
    let text = |value: Option<String>| value.unwrap_or_default();
    let date = |value: Option<NaiveDate>| value.map(|d| d.format("%Y-%m-%d").to_string());

    let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
    let kinds: Vec<&str> = summaries
        .iter()
        .map(|s| s.kind.map_or("other", ColumnKind::as_str))
        .collect();
    let counts: Vec<u64> = summaries.iter().map(|s| s.count as u64).collect();
    let missing: Vec<u64> = summaries.iter().map(|s| s.missing as u64).collect();
    let means: Vec<Option<f64>> = summaries.iter().map(|s| s.mean).collect();
    let stds: Vec<Option<f64>> = summaries.iter().map(|s| s.std).collect();
    let mins: Vec<String> = summaries
        .iter()
        .map(|s| text(s.min.map(|v| format_number(Some(v), 2)).or_else(|| date(s.earliest))))
        .collect();
    let maxs: Vec<String> = summaries
        .iter()
        .map(|s| text(s.max.map(|v| format_number(Some(v), 2)).or_else(|| date(s.latest))))
        .collect();
    let distinct: Vec<Option<u64>> = summaries
        .iter()
        .map(|s| s.distinct.map(|d| d as u64))
        .collect();
    let tops: Vec<String> = summaries
        .iter()
        .map(|s| text(s.top.as_ref().map(|(value, n)| format!("{value} ({n})"))))
        .collect();

    DataFrame::new(vec![
        Column::new("colonne".into(), names),
        Column::new("type".into(), kinds),
        Column::new("valeurs".into(), counts),
        Column::new("manquantes".into(), missing),
        Column::new("moyenne".into(), means),
        Column::new("écart-type".into(), stds),
        Column::new("min".into(), mins),
        Column::new("max".into(), maxs),
        Column::new("distinctes".into(), distinct),
        Column::new("plus fréquente".into(), tops),
    ])
}
