//! Table loading using Polars
//!
//! Types come from Polars' own inference; CSV files additionally get date
//! parsing so date-like text columns arrive as `Date`/`Datetime`.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::ExplorerError;

/// File formats the loader can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
    Parquet,
}

impl TableFormat {
    /// Detect the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Load a CSV, JSON or Parquet file into a DataFrame
///
/// # Arguments
/// * `path` - Path to the file; the extension selects the reader
///
/// # Returns
/// * The loaded DataFrame
pub fn load_table(path: &Path) -> crate::Result<DataFrame> {
    let format = TableFormat::from_path(path).ok_or_else(|| ExplorerError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let df = match format {
        TableFormat::Csv => CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        TableFormat::Json => JsonReader::new(open(path)?).finish()?,
        TableFormat::Parquet => ParquetReader::new(open(path)?).finish()?,
    };

    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "table loaded"
    );
    Ok(df)
}

fn open(path: &Path) -> crate::Result<File> {
    File::open(path).map_err(|source| ExplorerError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}
