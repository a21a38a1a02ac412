//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Explore a tabular dataset: suggested KPIs, correlations, outliers and clusters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show column types, descriptive statistics and the first rows
    Overview {
        /// Path to the input file (CSV, JSON or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Number of rows to preview
        #[arg(short = 'n', long, default_value = "10")]
        rows: usize,
    },

    /// Suggest KPIs from column names
    Kpi {
        /// Path to the input file (CSV, JSON or Parquet)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Render the correlation heatmap of numeric columns to a PNG file
    Heatmap {
        /// Path to the input file (CSV, JSON or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the heatmap
        #[arg(short, long, default_value = "correlation_heatmap.png")]
        output: PathBuf,
    },

    /// Detect outlying rows with an isolation forest
    Outliers {
        /// Path to the input file (CSV, JSON or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Expected share of outliers, in (0, 0.5]
        #[arg(short, long, default_value = "0.05", value_parser = parse_contamination)]
        contamination: f64,
    },

    /// Assign every row to a k-means cluster
    Cluster {
        /// Path to the input file (CSV, JSON or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Number of clusters
        #[arg(short = 'k', long, default_value = "3", value_parser = clap::value_parser!(u8).range(2..=10))]
        clusters: u8,
    },
}

/// Parse a contamination fraction
/// Expected format: a decimal in (0, 0.5], e.g. "0.05"
pub fn parse_contamination(value: &str) -> Result<f64, String> {
    let contamination: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid contamination value: {value}"))?;

    if contamination > 0.0 && contamination <= 0.5 {
        Ok(contamination)
    } else {
        Err(format!("Contamination must be in (0, 0.5], got {contamination}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_contamination() {
        assert_eq!(parse_contamination("0.05"), Ok(0.05));
        assert_eq!(parse_contamination(" 0.5 "), Ok(0.5));
        assert!(parse_contamination("0").is_err());
        assert!(parse_contamination("0.7").is_err());
        assert!(parse_contamination("invalid").is_err());
    }

    #[test]
    fn test_cluster_count_range() {
        let args = Args::try_parse_from(["datalens", "cluster", "-i", "data.csv", "-k", "4"]).unwrap();
        match args.command {
            Command::Cluster { clusters, .. } => assert_eq!(clusters, 4),
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Args::try_parse_from(["datalens", "cluster", "-i", "data.csv", "-k", "1"]).is_err());
        assert!(Args::try_parse_from(["datalens", "cluster", "-i", "data.csv", "-k", "11"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["datalens", "-v", "outliers", "-i", "data.csv"]).unwrap();
        assert!(args.verbose);
        match args.command {
            Command::Outliers { contamination, .. } => assert_eq!(contamination, 0.05),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
