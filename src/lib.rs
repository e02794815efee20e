//! `tabular-ingest` loads rows from one or more tabular sources (delimited byte buffers, CSV/TSV
//! files, spreadsheet workbooks) into an in-memory [`types::DataSet`] of string cells, checks
//! that multiple source files share the same header before merging them, and hydrates rows into
//! caller-defined records.
//!
//! ## Loading
//!
//! Construction happens in two phases: [`ingestion::LoadedRows`] gathers raw rows, then its
//! columns are finalized into a [`types::DataSet`].
//!
//! ```
//! use tabular_ingest::ingestion::LoadedRows;
//!
//! let ds = LoadedRows::from_bytes(b"a,b,c\n1,2,3\n4,5,6", "\n", ",", None)
//!     .interpret_columns()
//!     .unwrap();
//! assert_eq!(ds.header(), vec!["a", "b", "c"]);
//! assert_eq!(ds.rows()[1], vec!["4", "5", "6"]);
//! ```
//!
//! Multiple files are merged in order. The first row containing a `date` cell establishes the
//! header, and every later file must start with that same header:
//!
//! ```no_run
//! use tabular_ingest::ingestion::LoadedRows;
//! use tabular_ingest::types::{Normalizer, Record};
//!
//! # fn main() -> Result<(), tabular_ingest::DataError> {
//! let trim = Normalizer::new(|r: Record| r.into_iter().map(|c| c.trim().to_string()).collect());
//! let ds = LoadedRows::from_files(&["january.xlsx", "february.csv"], Some(trim))?
//!     .interpret_columns()?;
//! println!("rows={}", ds.row_count());
//! # Ok(())
//! # }
//! ```
//!
//! **Formats (auto-detected by extension):**
//!
//! - **Delimited text**: `.csv`, `.txt` (comma), `.tsv` (tab)
//! - **Workbooks** (requires the Cargo feature `excel`, on by default): `.xlsx`, `.xls`,
//!   `.xlsm`, `.xlsb`, `.ods`
//!
//! ## Modules
//!
//! - [`types`]: columns, records, normalizers and dataset operations
//! - [`ingestion`]: sources, header reconciliation and two-phase loading
//! - [`hydrate`]: conversion of rows into typed records
//! - [`discovery`]: glob/age file selection
//! - [`store`]: keyed store without silent overwrites
//! - [`config`]: YAML settings
//! - [`error`]: the error type shared by all of the above

pub mod config;
pub mod discovery;
pub mod error;
pub mod hydrate;
pub mod ingestion;
pub mod store;
pub mod types;

pub use error::{DataError, DataResult, IncompatibleCause};
