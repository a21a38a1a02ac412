//! Column classification and value extraction over Polars DataFrames.
//!
//! The loader hands over a DataFrame whose dtypes are already inferred. This
//! module maps those dtypes onto the three semantic kinds the analyzers care
//! about and pulls plain Rust values out of columns.

use chrono::NaiveDate;
use polars::prelude::*;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Datetime,
}

impl ColumnKind {
    /// Classify a Polars dtype. Returns `None` for dtypes no analysis uses
    /// (booleans, lists, structs, durations, ...).
    pub fn of(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => Some(Self::Numeric),
            DataType::String | DataType::Categorical(..) | DataType::Enum(..) => {
                Some(Self::Categorical)
            }
            DataType::Date | DataType::Datetime(..) => Some(Self::Datetime),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Datetime => "datetime",
        }
    }
}

/// Kind of a column, if it has one.
pub fn column_kind(column: &Column) -> Option<ColumnKind> {
    ColumnKind::of(column.dtype())
}

/// Columns of `df` with the given kind, in table order.
pub fn columns_of_kind(df: &DataFrame, kind: ColumnKind) -> Vec<&Column> {
    df.get_columns()
        .iter()
        .filter(|column| column_kind(column) == Some(kind))
        .collect()
}

/// Numeric values of a column as `f64`; null and NaN both map to `None`.
pub fn float_values(column: &Column) -> PolarsResult<Vec<Option<f64>>> {
    let casted = column.cast(&DataType::Float64)?;
    let values = casted
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect();
    Ok(values)
}

/// Non-missing numeric values of a column.
pub fn present_floats(column: &Column) -> PolarsResult<Vec<f64>> {
    Ok(float_values(column)?.into_iter().flatten().collect())
}

/// Non-null values of a column rendered as strings, in row order.
pub fn present_strings(column: &Column) -> PolarsResult<Vec<String>> {
    let casted = column.cast(&DataType::String)?;
    let values = casted
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    Ok(values)
}

/// Non-null calendar dates of a date or datetime column, in row order.
///
/// Days outside chrono's range are dropped. Polars' own `as_date_iter`
/// panics on those.
pub fn present_dates(column: &Column) -> PolarsResult<Vec<NaiveDate>> {
    let days = column.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    let dates = days
        .i32()?
        .into_iter()
        .flatten()
        .filter_map(|day| {
            day.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
                .and_then(NaiveDate::from_num_days_from_ce_opt)
        })
        .collect();
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_kinds() {
        let df = df! {
            "amount" => &[1.5, 2.5],
            "count" => &[1i64, 2],
            "city" => &["Paris", "Lyon"],
            "flag" => &[true, false],
        }
        .unwrap();

        let kinds: Vec<Option<ColumnKind>> = df.get_columns().iter().map(column_kind).collect();
        assert_eq!(
            kinds,
            vec![
                Some(ColumnKind::Numeric),
                Some(ColumnKind::Numeric),
                Some(ColumnKind::Categorical),
                None,
            ]
        );
        assert_eq!(columns_of_kind(&df, ColumnKind::Numeric).len(), 2);
    }

    #[test]
    fn test_datetime_kind() {
        let dates = Column::new("day".into(), &[0i32, 1]).cast(&DataType::Date).unwrap();
        assert_eq!(column_kind(&dates), Some(ColumnKind::Datetime));
    }

    #[test]
    fn test_float_values_treat_nan_as_missing() {
        let column = Column::new("x".into(), &[Some(1.0), None, Some(f64::NAN), Some(4.0)]);
        assert_eq!(
            float_values(&column).unwrap(),
            vec![Some(1.0), None, None, Some(4.0)]
        );
        assert_eq!(present_floats(&column).unwrap(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_present_dates_from_epoch_days() {
        let column = Column::new("day".into(), &[Some(0i32), None, Some(19_723)])
            .cast(&DataType::Date)
            .unwrap();
        let dates = present_dates(&column).unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn test_present_dates_drop_out_of_range_days() {
        let column = Column::new("day".into(), &[Some(i32::MAX - 10), Some(19_723), Some(i32::MIN)])
            .cast(&DataType::Date)
            .unwrap();
        let dates = present_dates(&column).unwrap();
        assert_eq!(dates, vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()]);
    }

    #[test]
    fn test_present_strings_skip_nulls() {
        let column = Column::new("city".into(), &[Some("Paris"), None, Some("Lyon")]);
        assert_eq!(present_strings(&column).unwrap(), vec!["Paris", "Lyon"]);
    }
}
