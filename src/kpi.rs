//! KPI suggestions driven by column names.
//!
//! [`KpiAnalyzer::suggest`] runs a fixed pipeline over a DataFrame:
//!
//! 1. base metrics (row and column counts)
//! 2. numeric keyword metrics, with mean/sum fallback when no rule matches
//! 3. categorical keyword metrics (distinct counts)
//! 4. datetime metrics (latest and earliest date)
//! 5. frequency tables for low-cardinality categorical columns
//!
//! Metrics from stages 1-4 are then deduplicated on `(label, column)`.
//! Nothing here returns an error: a column that cannot be read is skipped.

use std::collections::{HashMap, HashSet};

use polars::prelude::*;
use tracing::{debug, info};

use crate::format::{format_count, format_number};
use crate::rules::{describe, RuleBook};
use crate::table::{self, ColumnKind};

/// Largest number of distinct values for which a frequency table is built.
pub const MAX_DETAIL_CATEGORIES: usize = 25;

/// Name of the count column in frequency tables.
pub const OCCURRENCES_COLUMN: &str = "Occurrences";

/// A single formatted headline value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiMetric {
    label: String,
    value: String,
    column: Option<String>,
    description: Option<String>,
}

impl KpiMetric {
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
        column: Option<&str>,
        description: Option<String>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            column: column.map(str::to_string),
            description,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Pre-formatted display value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Source column, `None` for table-wide metrics.
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Identity used for deduplication.
    pub fn key(&self) -> (&str, Option<&str>) {
        (self.label(), self.column())
    }
}

/// A supplementary table shown alongside the headline metrics.
#[derive(Debug, Clone)]
pub struct KpiDetail {
    pub title: String,
    pub table: DataFrame,
    pub description: Option<String>,
}

/// Suggests KPIs for a DataFrame.
pub struct KpiAnalyzer<'a> {
    df: &'a DataFrame,
    rules: &'a RuleBook,
    numeric: Vec<&'a Column>,
    categorical: Vec<&'a Column>,
    datetime: Vec<&'a Column>,
}

impl<'a> KpiAnalyzer<'a> {
    /// Analyzer using the builtin rule book.
    pub fn new(df: &'a DataFrame) -> Self {
        Self::with_rules(df, RuleBook::builtin())
    }

    pub fn with_rules(df: &'a DataFrame, rules: &'a RuleBook) -> Self {
        Self {
            df,
            rules,
            numeric: table::columns_of_kind(df, ColumnKind::Numeric),
            categorical: table::columns_of_kind(df, ColumnKind::Categorical),
            datetime: table::columns_of_kind(df, ColumnKind::Datetime),
        }
    }

    /// Compute headline metrics and detail tables.
    pub fn suggest(&self) -> (Vec<KpiMetric>, Vec<KpiDetail>) {
        let mut metrics = self.base_metrics();
        metrics.extend(self.numeric_keyword_metrics());
        metrics.extend(self.categorical_metrics());
        metrics.extend(self.datetime_metrics());

        let metrics = dedupe_metrics(metrics);
        let details = self.category_details();

        info!(
            metrics = metrics.len(),
            details = details.len(),
            "KPI suggestions computed"
        );
        (metrics, details)
    }

    fn base_metrics(&self) -> Vec<KpiMetric> {
        vec![
            KpiMetric::new(
                "Lignes disponibles",
                format_count(self.df.height()),
                None,
                Some("Nombre total d'enregistrements dans le fichier.".to_string()),
            ),
            KpiMetric::new(
                "Colonnes disponibles",
                format_count(self.df.width()),
                None,
                Some("Nombre total de colonnes détectées.".to_string()),
            ),
        ]
    }

    fn numeric_keyword_metrics(&self) -> Vec<KpiMetric> {
        let mut metrics = Vec::new();

        for column in &self.numeric {
            let name = column.name().as_str();
            let values = match table::present_floats(column) {
                Ok(values) if !values.is_empty() => values,
                Ok(_) => continue,
                Err(err) => {
                    debug!(column = name, error = %err, "skipping unreadable numeric column");
                    continue;
                }
            };

            match self.rules.numeric_rule(name) {
                Some(rule) => metrics.push(KpiMetric::new(
                    format!("{} ({name})", rule.label),
                    rule.format.render(rule.aggregation.apply(&values)),
                    Some(name),
                    Some(describe(&rule.description, name)),
                )),
                None => {
                    let sum: f64 = values.iter().sum();
                    let mean = sum / values.len() as f64;
                    metrics.push(KpiMetric::new(
                        format!("Moyenne ({name})"),
                        format_number(Some(mean), 2),
                        Some(name),
                        Some(format!("Valeur moyenne observée pour {name}.")),
                    ));
                    metrics.push(KpiMetric::new(
                        format!("Somme ({name})"),
                        format_number(Some(sum), 2),
                        Some(name),
                        Some(format!("Somme totale des valeurs de {name}.")),
                    ));
                }
            }
        }

        metrics
    }

    fn categorical_metrics(&self) -> Vec<KpiMetric> {
        let mut metrics = Vec::new();

        for column in &self.categorical {
            let name = column.name().as_str();
            let Some(rule) = self.rules.categorical_rule(name) else {
                continue;
            };
            let values = match table::present_strings(column) {
                Ok(values) if !values.is_empty() => values,
                Ok(_) => continue,
                Err(err) => {
                    debug!(column = name, error = %err, "skipping unreadable categorical column");
                    continue;
                }
            };

            let distinct: HashSet<&str> = values.iter().map(String::as_str).collect();
            metrics.push(KpiMetric::new(
                format!("{} ({name})", rule.label),
                format_count(distinct.len()),
                Some(name),
                Some(describe(&rule.description, name)),
            ));
        }

        metrics
    }

    fn datetime_metrics(&self) -> Vec<KpiMetric> {
        let mut metrics = Vec::new();

        for column in &self.datetime {
            let name = column.name().as_str();
            let dates = match table::present_dates(column) {
                Ok(dates) => dates,
                Err(err) => {
                    debug!(column = name, error = %err, "skipping unreadable datetime column");
                    continue;
                }
            };
            let (Some(latest), Some(earliest)) = (dates.iter().max(), dates.iter().min()) else {
                continue;
            };

            metrics.push(KpiMetric::new(
                format!("Date la plus récente ({name})"),
                latest.format("%Y-%m-%d").to_string(),
                Some(name),
                Some(format!("Dernière date disponible dans {name}.")),
            ));
            metrics.push(KpiMetric::new(
                format!("Date la plus ancienne ({name})"),
                earliest.format("%Y-%m-%d").to_string(),
                Some(name),
                Some(format!("Première date disponible dans {name}.")),
            ));
        }

        metrics
    }

    fn category_details(&self) -> Vec<KpiDetail> {
        let mut details = Vec::new();

        for column in &self.categorical {
            let name = column.name().as_str();
            let values = match table::present_strings(column) {
                Ok(values) => values,
                Err(err) => {
                    debug!(column = name, error = %err, "skipping unreadable categorical column");
                    continue;
                }
            };

            let counts = value_counts(&values);
            if counts.is_empty() || counts.len() > MAX_DETAIL_CATEGORIES {
                continue;
            }

            let (categories, occurrences): (Vec<String>, Vec<i64>) = counts.into_iter().unzip();
            let frame = DataFrame::new(vec![
                Column::new(name.into(), categories),
                Column::new(OCCURRENCES_COLUMN.into(), occurrences),
            ]);
            match frame {
                Ok(table) => details.push(KpiDetail {
                    title: format!("Répartition de {name}"),
                    table,
                    description: Some(
                        "Top catégories pour aider à identifier les segments dominants."
                            .to_string(),
                    ),
                }),
                Err(err) => {
                    debug!(column = name, error = %err, "could not build frequency table");
                }
            }
        }

        details
    }
}

/// Keep the first metric for each `(label, column)` pair, in emission order.
pub fn dedupe_metrics(metrics: Vec<KpiMetric>) -> Vec<KpiMetric> {
    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    metrics
        .into_iter()
        .filter(|metric| {
            seen.insert((
                metric.label().to_string(),
                metric.column().map(str::to_string),
            ))
        })
        .collect()
}

/// Occurrences per distinct value, most frequent first; ties keep the order
/// in which values first appear.
pub(crate) fn value_counts(values: &[String]) -> Vec<(String, i64)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, i64)> = Vec::new();

    for value in values {
        match positions.get(value.as_str()) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                positions.insert(value.as_str(), counts.len());
                counts.push((value.clone(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
