use std::path::{Path, PathBuf};

use thiserror::Error;

/// Convenience result type used across the crate.
pub type DataResult<T> = Result<T, DataError>;

/// Why [`crate::types::DataSet::append`] rejected a candidate dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncompatibleCause {
    /// The two headers have a different number of columns.
    Length { host: usize, candidate: usize },
    /// The host column at `index` does not appear anywhere in the candidate header.
    MissingColumn { index: usize, name: String },
}

impl std::fmt::Display for IncompatibleCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Length { host, candidate } => write!(
                f,
                "headers are of different length: host:{host} candidate:{candidate}"
            ),
            Self::MissingColumn { index, name } => {
                write!(f, "mismatch at idx:{index} (column '{name}')")
            }
        }
    }
}

/// Error type returned by every fallible operation in the crate.
///
/// Upstream errors (I/O, CSV, workbook decoding) keep their original value and are wrapped in
/// [`DataError::Source`] with the path they came from when one is known.
#[derive(Debug, Error)]
pub enum DataError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook decoding error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Delimited-text decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// An upstream error annotated with the source it was raised for.
    #[error("source '{}': {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: Box<DataError>,
    },

    /// The source cannot be read as tabular data (unknown format, no sheets, ...).
    #[error("unsupported source: {message}")]
    UnsupportedSource { message: String },

    /// A row's width does not match the number of columns.
    #[error("mismatch between row and dataset format: {message} (expected {expected} cells, found {found})")]
    Shape {
        expected: usize,
        found: usize,
        message: String,
    },

    /// There is no row to derive or check columns against.
    #[error("dataset has no rows")]
    EmptyDataset,

    /// A later source's header disagrees with the header established by an earlier one.
    #[error("another header was found after one had been selected; original:{original:?}; mismatch:{mismatch:?}")]
    HeaderMismatch {
        original: Vec<String>,
        mismatch: Vec<String>,
    },

    /// A projection referenced columns absent from the dataset.
    #[error("not all required columns were found; required:{required:?}; available:{available:?}")]
    ColumnsNotFound {
        available: Vec<String>,
        required: Vec<String>,
    },

    /// [`crate::types::DataSet::append`] was given a structurally incompatible dataset.
    #[error("incompatible datasets: {0}")]
    IncompatibleDatasets(IncompatibleCause),

    /// A row position outside the dataset.
    #[error("bad row index: {index} (dataset has {len} rows)")]
    BadIndex { index: usize, len: usize },

    /// A cell could not be coerced into the kind of the field it hydrates.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// Invalid glob pattern given to a [`crate::discovery::FileFilter`].
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A path matched by a glob could not be inspected.
    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// [`crate::discovery::FileFilter::filter`] was called without any directory.
    #[error("attempted to filter but no directories were provided")]
    NoDirectories,

    /// [`crate::store::SimpleStore::add`] refused to overwrite an existing key.
    #[error("item already in store; key:{key}")]
    KeyExists { key: String },

    /// The requested key is not present in a [`crate::store::SimpleStore`].
    #[error("requested item not found; key:{key}")]
    KeyNotFound { key: String },

    /// A configuration document could not be decoded.
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl DataError {
    /// Attach `path` to upstream errors; dataset-level errors are returned unchanged.
    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            #[cfg(feature = "excel")]
            err @ DataError::Excel(_) => DataError::Source {
                path: path.to_path_buf(),
                source: Box::new(err),
            },
            err @ (DataError::Io(_) | DataError::Csv(_) | DataError::UnsupportedSource { .. }) => {
                DataError::Source {
                    path: path.to_path_buf(),
                    source: Box::new(err),
                }
            }
            other => other,
        }
    }

    /// Innermost error, looking through [`DataError::Source`] wrappers.
    pub fn root(&self) -> &DataError {
        match self {
            DataError::Source { source, .. } => source.root(),
            other => other,
        }
    }
}
