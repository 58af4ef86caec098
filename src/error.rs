//! Unified error model for field lookup, recipe evaluation, merging and
//! dataframe projection, plus the configuration layer.
//!
//! Every variant carries a stable machine-readable code (see `code_str`) so
//! callers can branch on the failure class without matching message text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldError {
    /// Alias-resolved key matches no child container, field or recipe.
    #[error("key_not_found: unknown field '{key}'")]
    KeyNotFound { key: String },
    /// Recipe built with neither (or both) of a generator and a precomputed array.
    #[error("invalid_recipe: {message}")]
    InvalidRecipe { message: String },
    /// `merge` called with something that is not a container.
    #[error("merge_type: {message}")]
    MergeType { message: String },
    /// Key resolved to a container where an array was expected, or vice versa.
    #[error("type_mismatch: {message}")]
    TypeMismatch { message: String },
    /// Dataframe projection: missing field, more than two dimensions or a bad column index.
    #[error("dimension: {message}")]
    Dimension { message: String },
    /// Non-derived lookup requested but only a recipe exists for the key.
    #[error("derived_forbidden: field '{key}' is derived (allow_derived=false)")]
    DerivedForbidden { key: String },
    /// A recipe needed its own field while still computing it.
    #[error("recursive_derivation: field '{key}' depends on itself")]
    RecursiveDerivation { key: String },
    #[error("config: {message}")]
    Config { message: String },
    /// Failure raised by a recipe generator itself.
    #[error("generator: {message}")]
    Generator { message: String },
    #[error("polars: {message}")]
    Polars { message: String },
}

impl FieldError {
    pub fn code_str(&self) -> &'static str {
        match self {
            FieldError::KeyNotFound { .. } => "key_not_found",
            FieldError::InvalidRecipe { .. } => "invalid_recipe",
            FieldError::MergeType { .. } => "merge_type",
            FieldError::TypeMismatch { .. } => "type_mismatch",
            FieldError::Dimension { .. } => "dimension",
            FieldError::DerivedForbidden { .. } => "derived_forbidden",
            FieldError::RecursiveDerivation { .. } => "recursive_derivation",
            FieldError::Config { .. } => "config",
            FieldError::Generator { .. } => "generator",
            FieldError::Polars { .. } => "polars",
        }
    }

    pub fn message(&self) -> String {
        match self {
            FieldError::KeyNotFound { key } => format!("unknown field '{}'", key),
            FieldError::DerivedForbidden { key } => format!("field '{}' is derived (allow_derived=false)", key),
            FieldError::RecursiveDerivation { key } => format!("field '{}' depends on itself", key),
            FieldError::InvalidRecipe { message }
            | FieldError::MergeType { message }
            | FieldError::TypeMismatch { message }
            | FieldError::Dimension { message }
            | FieldError::Config { message }
            | FieldError::Generator { message }
            | FieldError::Polars { message } => message.clone(),
        }
    }

    pub fn is_not_found(&self) -> bool { matches!(self, FieldError::KeyNotFound { .. }) }

    pub fn not_found<S: Into<String>>(key: S) -> Self { FieldError::KeyNotFound { key: key.into() } }
    pub fn invalid_recipe<S: Into<String>>(msg: S) -> Self { FieldError::InvalidRecipe { message: msg.into() } }
    pub fn merge_type<S: Into<String>>(msg: S) -> Self { FieldError::MergeType { message: msg.into() } }
    pub fn type_mismatch<S: Into<String>>(msg: S) -> Self { FieldError::TypeMismatch { message: msg.into() } }
    pub fn dimension<S: Into<String>>(msg: S) -> Self { FieldError::Dimension { message: msg.into() } }
    pub fn derived_forbidden<S: Into<String>>(key: S) -> Self { FieldError::DerivedForbidden { key: key.into() } }
    pub fn recursive_derivation<S: Into<String>>(key: S) -> Self { FieldError::RecursiveDerivation { key: key.into() } }
    pub fn config<S: Into<String>>(msg: S) -> Self { FieldError::Config { message: msg.into() } }
    pub fn generator<S: Into<String>>(msg: S) -> Self { FieldError::Generator { message: msg.into() } }
}

pub type FieldResult<T> = Result<T, FieldError>;

impl From<anyhow::Error> for FieldError {
    fn from(err: anyhow::Error) -> Self {
        // Generators commonly bubble anyhow errors; treat them as generator failures
        FieldError::Generator { message: err.to_string() }
    }
}

impl From<polars::prelude::PolarsError> for FieldError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        FieldError::Polars { message: err.to_string() }
    }
}

impl From<ndarray::ShapeError> for FieldError {
    fn from(err: ndarray::ShapeError) -> Self {
        FieldError::Dimension { message: err.to_string() }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
