//! CSV dataset loading
//!
//! Loads a CSV file into a DataFrame and lowercases its column names so the
//! rest of the pipeline can rely on canonical names.

use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::{ChurnError, Result};

/// Load a CSV dataset and normalize its column names.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(ChurnError::InputNotFound(path.to_path_buf()));
    }

    let mut df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    normalize_columns(&mut df)?;

    info!(
        rows = df.height(),
        cols = df.width(),
        "loaded {}",
        path.display()
    );

    Ok(df)
}

/// Lowercase all column names in place.
pub fn normalize_columns(df: &mut DataFrame) -> Result<()> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for name in names {
        let lower = name.to_lowercase();
        if lower != name {
            df.rename(&name, lower.into())?;
        }
    }

    Ok(())
}
