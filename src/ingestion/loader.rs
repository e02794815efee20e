//! Two-phase dataset construction.
//!
//! Phase one loads raw rows into a [`LoadedRows`] (from a byte buffer, a list of files, or
//! already opened sources). Phase two finalizes the columns and yields a
//! [`crate::types::DataSet`]:
//!
//! - [`LoadedRows::interpret_columns`] names the columns after the first row and removes it
//! - [`LoadedRows::provide_columns`] uses caller-supplied names and keeps every row
//!
//! ```
//! use tabular_ingest::ingestion::LoadedRows;
//!
//! let ds = LoadedRows::from_bytes(b"a,b,c\n1,2,3\n4,5,6", "\n", ",", None)
//!     .interpret_columns()
//!     .unwrap();
//! assert_eq!(ds.header(), vec!["a", "b", "c"]);
//! assert_eq!(ds.row_count(), 2);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{DataError, DataResult};
use crate::types::{columns_from_names, DataSet, Normalizer, Record};

use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::reconcile::Reconciler;
use super::source::{open_source, split_records, SourceFormat, TabularSource};

/// Default header marker used to detect the header row across sources.
pub const DEFAULT_HEADER_MARKER: &str = "date";

/// Options controlling multi-source ingestion.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, infer each file's format from its extension.
    pub format: Option<SourceFormat>,
    /// Cell value (case-insensitive) that identifies the header row.
    pub header_marker: String,
    /// Optional observer for per-source logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("header_marker", &self.header_marker)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            header_marker: DEFAULT_HEADER_MARKER.to_string(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// How the columns of a dataset are named when it is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnNaming {
    /// Use the first row as the header and remove it (default).
    #[default]
    Interpreted,
    /// Use the given names; no row is removed.
    Provided(Vec<String>),
}

/// Rows loaded from one or more sources whose columns are not yet known.
#[derive(Debug, Clone)]
pub struct LoadedRows {
    rows: Vec<Record>,
    header: Option<Record>,
    normalizer: Normalizer,
}

struct PendingSource<'s> {
    label: String,
    path: Option<PathBuf>,
    format: Option<SourceFormat>,
    opened: DataResult<Box<dyn TabularSource + 's>>,
}

impl LoadedRows {
    /// Split `data` into records on `record_sep` and cells on `value_sep`.
    ///
    /// Never fails: whatever the split yields is kept, one row per record, after running the
    /// normalizer (identity when `None`). Rows the normalizer empties are kept as well. There is
    /// no quoting model, so a value containing `value_sep` is split.
    pub fn from_bytes(
        data: &[u8],
        record_sep: &str,
        value_sep: &str,
        normalizer: Option<Normalizer>,
    ) -> Self {
        let normalizer = normalizer.unwrap_or_default();
        let rows = split_records(data, record_sep, value_sep)
            .map(|record| normalizer.apply(record))
            .collect();
        Self {
            rows,
            header: None,
            normalizer,
        }
    }

    /// Load the first sheet of every file in `paths`, in order, with default options.
    pub fn from_files<P: AsRef<Path>>(paths: &[P], normalizer: Option<Normalizer>) -> DataResult<Self> {
        Self::from_files_with_options(paths, normalizer, &IngestionOptions::default())
    }

    /// Load the first sheet of every file in `paths`, in order.
    ///
    /// Each file is opened, drained and closed before the next one is opened. Blank rows are
    /// skipped and rows the normalizer empties are dropped. Every file after the first must
    /// open with the header established by an earlier file, otherwise the whole load fails
    /// with [`DataError::HeaderMismatch`].
    pub fn from_files_with_options<P: AsRef<Path>>(
        paths: &[P],
        normalizer: Option<Normalizer>,
        options: &IngestionOptions,
    ) -> DataResult<Self> {
        let pending = paths.iter().map(|path| {
            let path = path.as_ref();
            let (format, opened) = match options.format.map(Ok).unwrap_or_else(|| SourceFormat::from_path(path)) {
                Ok(format) => (Some(format), open_source(path, format)),
                Err(e) => (None, Err(e)),
            };
            PendingSource {
                label: path.display().to_string(),
                path: Some(path.to_path_buf()),
                format,
                opened,
            }
        });
        Self::load(pending, normalizer.unwrap_or_default(), options)
    }

    /// Load already opened sources, in order, with the same rules as
    /// [`LoadedRows::from_files_with_options`].
    pub fn from_sources<'s, I>(
        sources: I,
        normalizer: Option<Normalizer>,
        options: &IngestionOptions,
    ) -> DataResult<Self>
    where
        I: IntoIterator<Item = Box<dyn TabularSource + 's>>,
    {
        let pending = sources.into_iter().map(|source| PendingSource {
            label: source.describe(),
            path: None,
            format: None,
            opened: Ok(source),
        });
        Self::load(pending, normalizer.unwrap_or_default(), options)
    }

    fn load<'s, I>(pending: I, normalizer: Normalizer, options: &IngestionOptions) -> DataResult<Self>
    where
        I: Iterator<Item = PendingSource<'s>>,
    {
        let mut reconciler = Reconciler::new(normalizer.clone(), &options.header_marker);

        for (position, source) in pending.enumerate() {
            let ctx = IngestionContext {
                source: source.label,
                format: source.format,
                position,
            };
            let result = source
                .opened
                .and_then(|mut opened| reconciler.ingest(position, opened.as_mut()));
            let result = match (&source.path, result) {
                (Some(path), Err(e)) => Err(e.with_path(path)),
                (_, result) => result,
            };
            report(options, &ctx, &result);
            result?;
        }

        let header = reconciler.header().cloned();
        Ok(Self {
            rows: reconciler.into_rows(),
            header,
            normalizer,
        })
    }

    /// Rows loaded so far.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Header detected through the header marker during file ingestion, if any.
    pub fn detected_header(&self) -> Option<&Record> {
        self.header.as_ref()
    }

    /// Finalize the columns according to `naming`.
    pub fn finalize(self, naming: ColumnNaming) -> DataResult<DataSet> {
        match naming {
            ColumnNaming::Interpreted => self.interpret_columns(),
            ColumnNaming::Provided(names) => self.provide_columns(&names),
        }
    }

    /// Name the columns after the first row (lower-cased, spaces removed) and remove that row.
    pub fn interpret_columns(mut self) -> DataResult<DataSet> {
        if self.rows.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        let first = self.rows.remove(0);
        Ok(DataSet::from_parts(
            columns_from_names(&first),
            self.rows,
            self.normalizer,
        ))
    }

    /// Name the columns with `names`; every loaded row is kept.
    ///
    /// Unlike [`LoadedRows::interpret_columns`] this does not remove a header row; drop it
    /// beforehand (for example with a normalizer) if the source had one.
    pub fn provide_columns<S: AsRef<str>>(self, names: &[S]) -> DataResult<DataSet> {
        let first = self.rows.first().ok_or(DataError::EmptyDataset)?;
        if names.len() != first.len() {
            return Err(DataError::Shape {
                expected: first.len(),
                found: names.len(),
                message: format!(
                    "provided {} column names but the first row has {} cells",
                    names.len(),
                    first.len()
                ),
            });
        }
        Ok(DataSet::from_parts(
            columns_from_names(names),
            self.rows,
            self.normalizer,
        ))
    }
}

fn report(options: &IngestionOptions, ctx: &IngestionContext, result: &DataResult<usize>) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(rows) => obs.on_success(ctx, IngestionStats { rows: *rows }),
        Err(e) => {
            let sev = IngestionSeverity::for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}
