//! Feature preparation
//!
//! Turns a raw churn dataset into a numeric feature table: identifier columns
//! are dropped, string columns are one-hot encoded with the first category
//! dropped, and anything that survives as non-numeric is reported as an error.

use std::path::Path;

use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::info;

use tracing::warn;

use crate::data::{ID_COLUMNS, LABEL_COLUMN};
use crate::error::{ChurnError, Result};

/// Drop known identifier columns if present.
pub fn drop_id_columns(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;
    for col in ID_COLUMNS {
        if df.column(col).is_ok() {
            df = df.drop(col)?;
        }
    }
    Ok(df)
}

/// One-hot encode all string columns, dropping the first category of each.
///
/// Categories are sorted so the generated `{col}_{category}` columns are
/// stable across runs. A column with k categories yields k-1 indicator
/// columns; the original column is removed.
pub fn one_hot_encode(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;

    let string_cols: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| matches!(c.dtype(), DataType::String))
        .map(|c| c.name().to_string())
        .collect();

    for col in string_cols {
        let series = df.column(&col)?.clone();
        let ca = series.str()?;

        let categories: BTreeSet<String> = ca
            .into_iter()
            .flatten()
            .map(|v| v.to_string())
            .collect();

        // Drop the first category: it is implied by all indicators being zero
        for category in categories.iter().skip(1) {
            let values: Vec<i32> = ca
                .into_iter()
                .map(|v| (v == Some(category.as_str())) as i32)
                .collect();
            let name = format!("{}_{}", col, category);
            df.with_column(Series::new(name.into(), values))?;
        }

        df = df.drop(&col)?;
    }

    Ok(df)
}

/// Verify that every non-label column is numeric.
///
/// Returns the offending column names in a single error so the caller sees
/// everything that needs fixing at once.
pub fn validate_numeric(df: &DataFrame) -> Result<()> {
    let offenders: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| c.name().as_str() != LABEL_COLUMN)
        .filter(|c| matches!(c.dtype(), DataType::String))
        .map(|c| c.name().to_string())
        .collect();

    if offenders.is_empty() {
        Ok(())
    } else {
        Err(ChurnError::NonNumericFeature(offenders))
    }
}

/// Full preprocessing stage: drop identifiers, one-hot encode, validate.
pub fn preprocess(df: DataFrame) -> Result<DataFrame> {
    let df = drop_id_columns(df)?;
    let df = one_hot_encode(df)?;
    validate_numeric(&df)?;
    Ok(df)
}

/// Preprocess a CSV file end to end and write the result.
pub fn preprocess_file(input: &Path, output: &Path) -> Result<DataFrame> {
    let df = crate::data::loader::load_csv(input)?;
    let mut processed = preprocess(df)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::File::create(output)?;
    CsvWriter::new(&mut file).finish(&mut processed)?;

    info!(
        rows = processed.height(),
        cols = processed.width(),
        "wrote {}",
        output.display()
    );

    Ok(processed)
}

/// Extract the label column and all remaining columns as a feature matrix.
///
/// The label must hold only 0/1 values; features must already be numeric.
pub fn to_matrix(df: &DataFrame) -> Result<(Array2<f64>, Array1<f64>, Vec<String>)> {
    if df.column(LABEL_COLUMN).is_err() {
        return Err(ChurnError::MissingColumn(LABEL_COLUMN.to_string()));
    }

    validate_numeric(df)?;

    let feature_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != LABEL_COLUMN)
        .map(|s| s.to_string())
        .collect();

    let y = label_array(df)?;
    let x = columns_to_array2(df, &feature_names)?;

    Ok((x, y, feature_names))
}

/// Extract the label column as a 0/1 array.
pub fn label_array(df: &DataFrame) -> Result<Array1<f64>> {
    let series = df
        .column(LABEL_COLUMN)
        .map_err(|_| ChurnError::MissingColumn(LABEL_COLUMN.to_string()))?;

    let series_f64 = series
        .cast(&DataType::Float64)
        .map_err(|e| ChurnError::DataError(e.to_string()))?;

    let y: Array1<f64> = series_f64
        .f64()
        .map_err(|e| ChurnError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();

    for (i, &v) in y.iter().enumerate() {
        if v != 0.0 && v != 1.0 {
            return Err(ChurnError::DataError(format!(
                "label column '{}' must be binary 0/1, row {} has {}",
                LABEL_COLUMN, i, v
            )));
        }
    }

    Ok(y)
}

/// Extract a named set of columns as a row-major feature matrix.
///
/// Used at evaluation time to select exactly the columns the model was
/// trained on. A stored column absent from the frame is filled with zeros:
/// a category unseen in the evaluation data leaves its indicator column
/// unencoded, and all-zeros is exactly what encoding would have produced.
/// Filled columns are reported at warn level.
pub fn select_features(df: &DataFrame, feature_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let mut missing: Vec<String> = Vec::new();

    let col_data: Vec<Vec<f64>> = feature_names
        .iter()
        .map(|col_name| match df.column(col_name) {
            Ok(series) => column_to_f64(series),
            Err(_) => {
                missing.push(col_name.clone());
                Ok(vec![0.0; n_rows])
            }
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    if !missing.is_empty() {
        warn!(
            "columns absent from the data, filled with zeros: {:?}",
            missing
        );
    }

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn(
        (n_rows, feature_names.len()),
        |(r, c)| col_refs[c][r],
    ))
}

/// Extract named columns from a DataFrame into a row-major Array2<f64>.
/// A missing column is a hard error.
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| ChurnError::MissingColumn(col_name.clone()))?;
            column_to_f64(series)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

fn column_to_f64(series: &Column) -> Result<Vec<f64>> {
    let series_f64 = series
        .cast(&DataType::Float64)
        .map_err(|e| ChurnError::DataError(e.to_string()))?;
    let values = series_f64
        .f64()
        .map_err(|e| ChurnError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame() -> DataFrame {
        df!(
            "customer_id" => &[1i64, 2, 3, 4],
            "tenure" => &[12i64, 3, 24, 7],
            "contract" => &["monthly", "yearly", "monthly", "two_year"],
            "churn" => &[0i64, 1, 0, 1],
        )
        .unwrap()
    }

    #[test]
    fn test_drop_id_columns() {
        let df = drop_id_columns(raw_frame()).unwrap();
        assert!(df.column("customer_id").is_err());
        assert!(df.column("tenure").is_ok());
    }

    #[test]
    fn test_one_hot_drops_first_category() {
        let df = one_hot_encode(raw_frame()).unwrap();
        // three categories -> two indicator columns, sorted order drops "monthly"
        assert!(df.column("contract").is_err());
        assert!(df.column("contract_monthly").is_err());
        assert!(df.column("contract_two_year").is_ok());
        assert!(df.column("contract_yearly").is_ok());
    }

    #[test]
    fn test_one_hot_values() {
        let df = one_hot_encode(raw_frame()).unwrap();
        let yearly: Vec<i32> = df
            .column("contract_yearly")
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect();
        assert_eq!(yearly, vec![0, 1, 0, 0]);
    }

    #[test]
    fn test_validate_numeric_lists_offenders() {
        let df = drop_id_columns(raw_frame()).unwrap();
        let result = validate_numeric(&df);
        match result {
            Err(ChurnError::NonNumericFeature(cols)) => {
                assert_eq!(cols, vec!["contract".to_string()]);
            }
            other => panic!("expected NonNumericFeature, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_to_matrix_shapes() {
        let df = preprocess(raw_frame()).unwrap();
        let (x, y, names) = to_matrix(&df).unwrap();
        assert_eq!(x.nrows(), 4);
        assert_eq!(x.ncols(), names.len());
        assert_eq!(y.len(), 4);
        assert!(!names.contains(&"churn".to_string()));
    }

    #[test]
    fn test_to_matrix_requires_label() {
        let df = df!("tenure" => &[1i64, 2]).unwrap();
        let result = to_matrix(&df);
        assert!(matches!(result, Err(ChurnError::MissingColumn(_))));
    }

    #[test]
    fn test_label_must_be_binary() {
        let df = df!(
            "tenure" => &[1i64, 2],
            "churn" => &[0i64, 2],
        )
        .unwrap();
        let result = to_matrix(&df);
        assert!(matches!(result, Err(ChurnError::DataError(_))));
    }

    #[test]
    fn test_select_features_zero_fills_missing_columns() {
        let df = df!(
            "tenure" => &[12i64, 24],
            "churn" => &[0i64, 1],
        )
        .unwrap();

        let names = vec!["tenure".to_string(), "contract_yearly".to_string()];
        let x = select_features(&df, &names).unwrap();

        assert_eq!(x.column(0).to_vec(), vec![12.0, 24.0]);
        assert_eq!(x.column(1).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_preprocess_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        let output = dir.path().join("out/processed.csv");

        let mut df = raw_frame();
        let mut file = std::fs::File::create(&input).unwrap();
        CsvWriter::new(&mut file).finish(&mut df).unwrap();
        drop(file);

        let processed = preprocess_file(&input, &output).unwrap();
        assert!(output.exists());
        assert!(processed.column("customer_id").is_err());
        assert!(processed.column("contract_yearly").is_ok());
    }
}
