//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`LoadedRows`] (from [`loader`]) which:
//!
//! - loads raw rows from a byte buffer ([`LoadedRows::from_bytes`]) or an ordered list of files
//!   ([`LoadedRows::from_files`]), reconciling headers across files
//! - finalizes columns into an in-memory [`crate::types::DataSet`]
//! - optionally reports per-source success/failure/alerts to an [`IngestionObserver`]
//!
//! Sources are read through the [`TabularSource`] contract in [`source`].

pub mod loader;
pub mod observability;
mod reconcile;
pub mod source;

pub use loader::{ColumnNaming, IngestionOptions, LoadedRows, DEFAULT_HEADER_MARKER};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    StdErrObserver,
};
#[cfg(feature = "excel")]
pub use source::WorkbookSource;
pub use source::{open_source, ByteSource, DelimitedFileSource, RowCursor, SourceFormat, TabularSource};
