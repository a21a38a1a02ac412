//! Exploratory analytics over the numeric part of a table.
//!
//! [`DataExplorer`] keeps a copy of the numeric columns only and offers a
//! correlation heatmap, isolation-forest outlier detection and k-means
//! clustering. Models see missing values as 0; results are reported against
//! the original rows.

use std::io::Cursor;

use ndarray::Array2;
use polars::prelude::*;
use tracing::info;

use crate::error::ExplorerError;
use crate::forest::{flag_outliers, IsolationForest};
use crate::model::{fit_kmeans, KMeansModel, KMeansSettings};
use crate::table::{self, ColumnKind};
use crate::viz::render_correlation_heatmap;

/// Name of the column carrying source row positions in outlier results.
pub const ROW_INDEX_COLUMN: &str = "row_index";

/// Name of the cluster label series.
pub const CLUSTER_COLUMN: &str = "cluster";

/// Tuning knobs for the analytics agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Seed of the isolation forest.
    pub seed: u64,
    pub n_trees: usize,
    /// Rows drawn per isolation tree.
    pub max_samples: usize,
    pub kmeans: KMeansSettings,
    /// Heatmap width and height in pixels.
    pub heatmap_size: (u32, u32),
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_trees: 100,
            max_samples: 256,
            kmeans: KMeansSettings::default(),
            heatmap_size: (800, 600),
        }
    }
}

/// Analytics over the numeric columns of a table.
#[derive(Debug, Clone)]
pub struct DataExplorer {
    columns: Vec<Column>,
    height: usize,
    config: AgentConfig,
}

impl DataExplorer {
    pub fn new(df: &DataFrame) -> Self {
        Self::with_config(df, AgentConfig::default())
    }

    pub fn with_config(df: &DataFrame, config: AgentConfig) -> Self {
        let columns: Vec<Column> = table::columns_of_kind(df, ColumnKind::Numeric)
            .into_iter()
            .cloned()
            .collect();
        let height = if columns.is_empty() { 0 } else { df.height() };
        Self {
            columns,
            height,
            config,
        }
    }

    /// Names of the retained numeric columns.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.name().to_string())
            .collect()
    }

    /// True when there is no numeric row to analyze.
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.columns.is_empty()
    }

    /// Pairwise Pearson correlations over pairwise-complete observations.
    /// Pairs with fewer than two observations or zero variance are NaN.
    pub fn correlation_matrix(&self) -> crate::Result<(Vec<String>, Array2<f64>)> {
        let values = self
            .columns
            .iter()
            .map(table::float_values)
            .collect::<PolarsResult<Vec<_>>>()?;

        let n = values.len();
        let mut matrix = Array2::from_elem((n, n), f64::NAN);
        for i in 0..n {
            for j in i..n {
                let r = pearson(&values[i], &values[j]);
                matrix[[i, j]] = r;
                matrix[[j, i]] = r;
            }
        }

        Ok((self.column_names(), matrix))
    }

    /// PNG heatmap of the correlation matrix, positioned at the start.
    pub fn correlation_heatmap(&self) -> crate::Result<Cursor<Vec<u8>>> {
        let (names, matrix) = self.correlation_matrix()?;
        let png = render_correlation_heatmap(&names, &matrix, self.config.heatmap_size)?;
        info!(columns = names.len(), bytes = png.len(), "correlation heatmap rendered");
        Ok(Cursor::new(png))
    }

    /// Rows flagged by an isolation forest, with their original values.
    ///
    /// `contamination` is the expected share of outliers, in (0, 0.5]. The
    /// result starts with a [`ROW_INDEX_COLUMN`] holding each row's position
    /// in the source table, followed by the numeric columns.
    pub fn detect_outliers(&self, contamination: f64) -> crate::Result<DataFrame> {
        if self.is_empty() {
            return Ok(DataFrame::empty());
        }
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(ExplorerError::InvalidContamination {
                value: contamination,
            });
        }

        let records = self.filled_records()?;
        let forest = IsolationForest::fit(
            &records,
            self.config.n_trees,
            self.config.max_samples,
            self.config.seed,
        );
        let flags = flag_outliers(&forest.score_samples(&records), contamination);

        let mask = BooleanChunked::from_slice("outlier".into(), &flags);
        let outliers = DataFrame::new(self.columns.clone())?
            .with_row_index(ROW_INDEX_COLUMN.into(), None)?
            .filter(&mask)?;

        info!(
            rows = self.height,
            outliers = outliers.height(),
            contamination,
            "outlier detection finished"
        );
        Ok(outliers)
    }

    /// One cluster label per source row, in row order.
    pub fn cluster(&self, n_clusters: usize) -> crate::Result<Series> {
        if self.is_empty() {
            return Ok(Series::new_empty(CLUSTER_COLUMN.into(), &DataType::UInt32));
        }

        let model = self.cluster_model(n_clusters)?;
        let labels: Vec<u32> = model.labels.iter().map(|&label| label as u32).collect();
        Ok(Series::new(CLUSTER_COLUMN.into(), labels))
    }

    /// Fitted k-means model over the filled numeric rows.
    pub fn cluster_model(&self, n_clusters: usize) -> crate::Result<KMeansModel> {
        let records = self.filled_records()?;
        let model = fit_kmeans(&records, n_clusters, &self.config.kmeans)?;
        info!(
            n_clusters,
            rows = records.nrows(),
            inertia = model.inertia,
            "clustering finished"
        );
        Ok(model)
    }

    /// Numeric rows as a dense matrix with missing values replaced by 0.
    ///
    /// Infinite values are rejected rather than filled.
    fn filled_records(&self) -> crate::Result<Array2<f64>> {
        let mut records = Array2::zeros((self.height, self.columns.len()));
        for (j, column) in self.columns.iter().enumerate() {
            for (i, value) in table::float_values(column)?.into_iter().enumerate() {
                let value = value.unwrap_or(0.0);
                if !value.is_finite() {
                    return Err(ExplorerError::NonFiniteValue {
                        column: column.name().to_string(),
                        row: i,
                        value,
                    });
                }
                records[[i, j]] = value;
            }
        }
        Ok(records)
    }
}

fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df! {
            "x" => &[1.0, 2.0, 3.0, 4.0],
            "y" => &[2.0, 4.0, 6.0, 8.0],
            "z" => &[4.0, 3.0, 2.0, 1.0],
            "label" => &["a", "b", "c", "d"],
        }
        .unwrap()
    }

    #[test]
    fn test_keeps_numeric_columns_only() {
        let explorer = DataExplorer::new(&sample_frame());
        assert_eq!(explorer.column_names(), vec!["x", "y", "z"]);
        assert!(!explorer.is_empty());
    }

    #[test]
    fn test_correlation_matrix() {
        let (names, matrix) = DataExplorer::new(&sample_frame()).correlation_matrix().unwrap();

        assert_eq!(names.len(), 3);
        assert!((matrix[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((matrix[[0, 2]] + 1.0).abs() < 1e-12);
        assert_eq!(matrix[[1, 2]], matrix[[2, 1]]);
        assert!((matrix[[2, 2]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate_inputs() {
        assert!(pearson(&[Some(1.0), Some(1.0)], &[Some(1.0), Some(2.0)]).is_nan());
        assert!(pearson(&[Some(1.0), None], &[Some(1.0), Some(2.0)]).is_nan());
        let r = pearson(
            &[Some(1.0), None, Some(2.0), Some(3.0)],
            &[Some(1.0), Some(100.0), Some(2.0), Some(3.0)],
        );
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_outliers_on_zero_rows() {
        let df = df! { "x" => Vec::<f64>::new() }.unwrap();
        let outliers = DataExplorer::new(&df).detect_outliers(0.05).unwrap();
        assert_eq!(outliers.height(), 0);
        assert_eq!(outliers.width(), 0);
    }

    #[test]
    fn test_outliers_without_numeric_columns() {
        let df = df! { "city" => &["Paris", "Lyon"] }.unwrap();
        let explorer = DataExplorer::new(&df);
        assert!(explorer.is_empty());
        assert_eq!(explorer.detect_outliers(0.05).unwrap().height(), 0);
        assert_eq!(explorer.cluster(3).unwrap().len(), 0);
    }

    #[test]
    fn test_invalid_contamination() {
        let explorer = DataExplorer::new(&sample_frame());
        assert!(matches!(
            explorer.detect_outliers(0.0),
            Err(ExplorerError::InvalidContamination { .. })
        ));
        assert!(explorer.detect_outliers(0.8).is_err());
    }

    #[test]
    fn test_outliers_report_original_values() {
        let mut x: Vec<Option<f64>> = (0..20).map(|i| Some((i % 5) as f64)).collect();
        x.push(Some(500.0));
        x[3] = None;
        let y: Vec<f64> = (0..21).map(|i| if i == 20 { 500.0 } else { (i / 5) as f64 }).collect();
        let df = df! { "x" => x, "y" => y }.unwrap();

        let outliers = DataExplorer::new(&df).detect_outliers(0.05).unwrap();
        assert_eq!(outliers.height(), 1);

        let index = outliers.column(ROW_INDEX_COLUMN).unwrap().u32().unwrap().get(0);
        assert_eq!(index, Some(20));
        let x_value = outliers.column("x").unwrap().f64().unwrap().get(0);
        assert_eq!(x_value, Some(500.0));
    }

    #[test]
    fn test_outliers_reject_infinite_values() {
        let df = df! {
            "x" => &[1.0, 2.0, f64::INFINITY, 3.0],
            "y" => &[1.0, 2.0, 3.0, 4.0],
        }
        .unwrap();
        let explorer = DataExplorer::new(&df);

        match explorer.detect_outliers(0.05) {
            Err(ExplorerError::NonFiniteValue { column, row, .. }) => {
                assert_eq!(column, "x");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            explorer.cluster(2),
            Err(ExplorerError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn test_outliers_on_extreme_finite_range() {
        let mut x: Vec<f64> = (0..20).map(|i| (i % 5) as f64).collect();
        x.push(1e308);
        x[0] = -1e308;
        let df = df! { "x" => x }.unwrap();

        let outliers = DataExplorer::new(&df).detect_outliers(0.1).unwrap();
        assert!(outliers.height() <= 3);
    }

    #[test]
    fn test_cluster_labels_align_with_rows() {
        let df = df! {
            "a" => &[0.0, 0.1, 10.0, 10.1, 0.05, 10.05],
            "b" => &[Some(0.0), None, Some(10.0), Some(10.0), Some(0.1), Some(10.1)],
        }
        .unwrap();

        let labels = DataExplorer::new(&df).cluster(2).unwrap();
        assert_eq!(labels.len(), df.height());
        assert_eq!(labels.name().as_str(), CLUSTER_COLUMN);

        let labels: Vec<u32> = labels.u32().unwrap().into_no_null_iter().collect();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[4]);
        assert_eq!(labels[2], labels[3]);
        assert_eq!(labels[2], labels[5]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_cluster_with_too_few_rows() {
        let df = df! { "a" => &[1.0] }.unwrap();
        let result = DataExplorer::new(&df).cluster(3);
        assert!(matches!(result, Err(ExplorerError::TooFewRows { .. })));
    }

    #[test]
    fn test_heatmap_buffer_starts_at_zero() {
        let buffer = DataExplorer::new(&sample_frame()).correlation_heatmap().unwrap();
        assert_eq!(buffer.position(), 0);
        assert!(buffer.get_ref().starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
