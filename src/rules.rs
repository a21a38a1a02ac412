//! Keyword rules that turn column names into KPI recipes.
//!
//! Rules are declarative data: the builtin rule book is an embedded JSON
//! document parsed once on first use. Matching is a case-insensitive
//! substring test of each keyword against the column name, and within a
//! list the first matching rule wins.

use std::sync::LazyLock;

use serde::Deserialize;

use crate::format::{format_number, format_percent};

const BUILTIN_RULES: &str = include_str!("../assets/kpi_rules.json");

// Compiled into the binary; `test_builtin_rule_book_loads` keeps it parseable.
static BUILTIN: LazyLock<RuleBook> = LazyLock::new(|| {
    RuleBook::from_json(BUILTIN_RULES).expect("embedded KPI rule book is valid JSON")
});

/// How a numeric rule reduces a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Mean,
}

impl Aggregation {
    /// Apply to non-missing values. The mean of nothing is `None`; the sum of
    /// nothing is zero.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Self::Sum => Some(values.iter().sum()),
            Self::Mean if values.is_empty() => None,
            Self::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
        }
    }
}

/// Display format of a numeric rule's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    #[default]
    Number,
    Percent,
}

impl ValueFormat {
    pub fn render(self, value: Option<f64>) -> String {
        match self {
            Self::Number => format_number(value, 2),
            Self::Percent => format_percent(value, 1),
        }
    }
}

/// Rule for numeric columns.
#[derive(Debug, Clone, Deserialize)]
pub struct NumericRule {
    pub keywords: Vec<String>,
    pub label: String,
    pub aggregation: Aggregation,
    /// Template with a `{column}` placeholder.
    pub description: String,
    #[serde(default)]
    pub format: ValueFormat,
}

/// Rule for categorical columns; always counts distinct values.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalRule {
    pub keywords: Vec<String>,
    pub label: String,
    /// Template with a `{column}` placeholder.
    pub description: String,
}

/// Ordered rule lists for numeric and categorical columns.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleBook {
    pub numeric: Vec<NumericRule>,
    pub categorical: Vec<CategoricalRule>,
}

impl RuleBook {
    /// The rule book shipped with the crate.
    pub fn builtin() -> &'static RuleBook {
        &BUILTIN
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// First numeric rule matching `column`.
    pub fn numeric_rule(&self, column: &str) -> Option<&NumericRule> {
        let name = column.to_lowercase();
        self.numeric
            .iter()
            .find(|rule| matches_any(&rule.keywords, &name))
    }

    /// First categorical rule matching `column`.
    pub fn categorical_rule(&self, column: &str) -> Option<&CategoricalRule> {
        let name = column.to_lowercase();
        self.categorical
            .iter()
            .find(|rule| matches_any(&rule.keywords, &name))
    }
}

/// Expand the `{column}` placeholder of a description template.
pub fn describe(template: &str, column: &str) -> String {
    template.replace("{column}", column)
}

fn matches_any(keywords: &[String], lowered_name: &str) -> bool {
    keywords
        .iter()
        .any(|keyword| lowered_name.contains(keyword.to_lowercase().as_str()))
}
