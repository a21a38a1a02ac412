//! datalens: dataset explorer CLI
//!
//! Loads a table, then runs one analysis and prints the result.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use datalens::agent::{CLUSTER_COLUMN, ROW_INDEX_COLUMN};
use datalens::cli::{Args, Command};
use datalens::logging::init_logging;
use datalens::stats::{describe, summary_table};
use datalens::table::column_kind;
use datalens::{load_table, DataExplorer, KpiAnalyzer};
use polars::prelude::*;
use tracing::debug;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose).context("failed to initialize logging")?;

    let start_time = Instant::now();
    match &args.command {
        Command::Overview { input, rows } => run_overview(input, *rows)?,
        Command::Kpi { input } => run_kpi(input)?,
        Command::Heatmap { input, output } => run_heatmap(input, output)?,
        Command::Outliers {
            input,
            contamination,
        } => run_outliers(input, *contamination)?,
        Command::Cluster { input, clusters } => run_cluster(input, usize::from(*clusters))?,
    }
    debug!(
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "command finished"
    );

    Ok(())
}

fn load(input: &Path) -> Result<DataFrame> {
    let df = load_table(input).with_context(|| format!("failed to load {}", input.display()))?;
    println!(
        "✓ Fichier {} chargé : {} lignes × {} colonnes\n",
        input.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Print column types, descriptive statistics and a preview of the first rows
fn run_overview(input: &Path, rows: usize) -> Result<()> {
    let df = load(input)?;

    println!("=== Types de colonnes ===");
    for column in df.get_columns() {
        let kind = column_kind(column).map_or("other", |kind| kind.as_str());
        println!("  {:<30} {:<12} {}", column.name(), kind, column.dtype());
    }

    let summaries = describe(&df).context("failed to compute descriptive statistics")?;
    println!("\n=== Statistiques descriptives ===");
    println!("{}", summary_table(&summaries)?);

    println!("\n=== Aperçu des données ===");
    println!("{}", df.head(Some(rows)));
    Ok(())
}

/// Print suggested KPIs, then the category breakdowns
fn run_kpi(input: &Path) -> Result<()> {
    let df = load(input)?;
    let (metrics, details) = KpiAnalyzer::new(&df).suggest();

    println!("=== KPI suggérés ===");
    for metric in &metrics {
        println!("{}: {}", metric.label(), metric.value());
        if let Some(description) = metric.description() {
            println!("  {description}");
        }
        if let Some(column) = metric.column() {
            println!("  Colonne source : {column}");
        }
    }

    if !details.is_empty() {
        println!("\n=== Analyses complémentaires ===");
    }
    for detail in &details {
        println!("\n{}", detail.title);
        if let Some(description) = &detail.description {
            println!("  {description}");
        }
        println!("{}", detail.table);
    }
    Ok(())
}

/// Write the correlation heatmap to `output`
fn run_heatmap(input: &Path, output: &Path) -> Result<()> {
    let df = load(input)?;
    let heatmap = DataExplorer::new(&df)
        .correlation_heatmap()
        .context("failed to render correlation heatmap")?;

    fs::write(output, heatmap.into_inner())
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("✓ Heatmap de corrélation enregistrée : {}", output.display());
    Ok(())
}

/// Print rows flagged as outliers
fn run_outliers(input: &Path, contamination: f64) -> Result<()> {
    let df = load(input)?;
    let outliers = DataExplorer::new(&df)
        .detect_outliers(contamination)
        .context("outlier detection failed")?;

    if outliers.height() == 0 {
        println!("Aucune valeur aberrante détectée");
    } else {
        println!(
            "=== {} valeur(s) aberrante(s) (colonne {ROW_INDEX_COLUMN} = ligne source) ===",
            outliers.height()
        );
        println!("{outliers}");
    }
    Ok(())
}

/// Print the table with a cluster label per row, then cluster sizes
fn run_cluster(input: &Path, n_clusters: usize) -> Result<()> {
    let df = load(input)?;
    let explorer = DataExplorer::new(&df);
    if explorer.is_empty() {
        println!("Aucune donnée numérique à clusteriser");
        return Ok(());
    }

    let model = explorer
        .cluster_model(n_clusters)
        .context("clustering failed")?;
    let labels: Vec<u32> = model.labels.iter().map(|&label| label as u32).collect();

    let mut clustered = df.clone();
    clustered.with_column(Series::new(CLUSTER_COLUMN.into(), labels))?;
    println!("{clustered}");

    println!("\n=== Statistiques des clusters ===");
    for (i, &size) in model.cluster_sizes().iter().enumerate() {
        let percentage = (size as f64 / df.height() as f64) * 100.0;
        println!("Cluster {}: {} lignes ({:.1}%)", i, size, percentage);
    }
    println!("Inertie intra-cluster : {:.2}", model.inertia);
    Ok(())
}
