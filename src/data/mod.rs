//! Dataset loading and feature preparation

pub mod loader;
pub mod prepare;

/// Canonical label column name after column normalization.
pub const LABEL_COLUMN: &str = "churn";

/// Identifier columns dropped during preprocessing.
pub const ID_COLUMNS: &[&str] = &["customer_id", "customerid", "id"];

pub use loader::load_csv;
pub use prepare::{
    label_array, one_hot_encode, preprocess, preprocess_file, select_features, to_matrix,
};
