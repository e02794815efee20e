//! Row sources: the single contract ingestion reads through.
//!
//! A [`TabularSource`] exposes "list sheets" and "iterate the rows of one sheet as string
//! cells". Three implementations are provided:
//!
//! - [`ByteSource`]: an in-memory buffer split on caller-declared separators
//! - [`DelimitedFileSource`]: CSV/TSV text files, read with the `csv` crate
//! - [`WorkbookSource`]: spreadsheet workbooks, read with `calamine` (feature `excel`)

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};
use crate::types::Record;

/// Lazy sequence of raw rows produced by a source.
pub type RowCursor<'a> = Box<dyn Iterator<Item = DataResult<Record>> + 'a>;

/// Anything that can list its sheets and yield the rows of one of them.
pub trait TabularSource {
    /// Sheet names, in source order. Ingestion only ever reads the first one.
    fn sheet_names(&self) -> Vec<String>;

    /// Iterate the rows of `sheet`.
    fn rows(&mut self, sheet: &str) -> DataResult<RowCursor<'_>>;

    /// Whether a row read as one cell holding comma-separated text should be split into cells.
    ///
    /// Only sources that cannot parse delimited text themselves opt in; a quoted CSV value
    /// containing a comma must reach ingestion intact.
    fn expands_collapsed_rows(&self) -> bool {
        false
    }

    /// Short label used in observer callbacks.
    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

/// File formats understood by [`open_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Delimited text (`.csv`, `.tsv`, `.txt`).
    Delimited,
    /// Spreadsheet workbooks (feature-gated behind `excel`).
    Workbook,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Delimited),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }

    /// Infer the format of `path` from its extension.
    pub fn from_path(path: &Path) -> DataResult<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| DataError::UnsupportedSource {
                message: format!(
                    "cannot infer format: path has no extension ({})",
                    path.display()
                ),
            })?;

        Self::from_extension(ext).ok_or_else(|| DataError::UnsupportedSource {
            message: format!(
                "cannot infer format from extension '{ext}' for path ({})",
                path.display()
            ),
        })
    }
}

/// Open `path` as a [`TabularSource`] of the given format.
pub fn open_source(path: &Path, format: SourceFormat) -> DataResult<Box<dyn TabularSource>> {
    match format {
        SourceFormat::Delimited => Ok(Box::new(DelimitedFileSource::open(path)?)),
        SourceFormat::Workbook => open_workbook(path),
    }
}

fn open_workbook(path: &Path) -> DataResult<Box<dyn TabularSource>> {
    #[cfg(feature = "excel")]
    {
        Ok(Box::new(WorkbookSource::open(path)?))
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = path;
        Err(DataError::UnsupportedSource {
            message: "workbook ingestion not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

/// Split `data` into records on `record_sep`, then each record into cells on `value_sep`.
///
/// There is no quoting model: a cell containing `value_sep` is split like any other. An empty
/// separator means "do not split at that level". Invalid UTF-8 is replaced lossily.
pub fn split_records<'a>(
    data: &'a [u8],
    record_sep: &'a str,
    value_sep: &'a str,
) -> impl Iterator<Item = Record> + 'a {
    split_bytes(data, record_sep.as_bytes()).map(move |record| {
        split_bytes(record, value_sep.as_bytes())
            .map(|cell| String::from_utf8_lossy(cell).into_owned())
            .collect()
    })
}

fn split_bytes<'a>(data: &'a [u8], sep: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
    let mut rest = Some(data);
    std::iter::from_fn(move || {
        let current = rest?;
        if sep.is_empty() {
            rest = None;
            return Some(current);
        }
        match current.windows(sep.len()).position(|w| w == sep) {
            Some(pos) => {
                rest = Some(&current[pos + sep.len()..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// In-memory delimited buffer exposed as a single-sheet source.
#[derive(Debug, Clone)]
pub struct ByteSource<'a> {
    data: &'a [u8],
    record_sep: &'a str,
    value_sep: &'a str,
}

impl<'a> ByteSource<'a> {
    /// Name of the only sheet of a byte source.
    pub const SHEET: &'static str = "data";

    pub fn new(data: &'a [u8], record_sep: &'a str, value_sep: &'a str) -> Self {
        Self {
            data,
            record_sep,
            value_sep,
        }
    }
}

impl TabularSource for ByteSource<'_> {
    fn sheet_names(&self) -> Vec<String> {
        vec![Self::SHEET.to_string()]
    }

    fn rows(&mut self, sheet: &str) -> DataResult<RowCursor<'_>> {
        check_sheet(Self::SHEET, sheet)?;
        Ok(Box::new(
            split_records(self.data, self.record_sep, self.value_sep).map(Ok),
        ))
    }
}

/// Delimited text file (CSV, TSV) with a single sheet named after the file stem.
///
/// No header handling is done here; every line is yielded as a row, and rows may differ in
/// width.
#[derive(Debug)]
pub struct DelimitedFileSource {
    path: PathBuf,
    sheet: String,
    reader: csv::Reader<File>,
}

impl DelimitedFileSource {
    /// Open `path`, using a tab delimiter for `.tsv` files and a comma otherwise.
    pub fn open(path: &Path) -> DataResult<Self> {
        let is_tsv = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
        Self::open_with_delimiter(path, if is_tsv { b'\t' } else { b',' })
    }

    pub fn open_with_delimiter(path: &Path, delimiter: u8) -> DataResult<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_path(path)?;
        let sheet = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("sheet1")
            .to_string();
        Ok(Self {
            path: path.to_path_buf(),
            sheet,
            reader,
        })
    }
}

impl TabularSource for DelimitedFileSource {
    fn sheet_names(&self) -> Vec<String> {
        vec![self.sheet.clone()]
    }

    fn rows(&mut self, sheet: &str) -> DataResult<RowCursor<'_>> {
        check_sheet(&self.sheet, sheet)?;
        Ok(Box::new(self.reader.records().map(|result| {
            result
                .map(|record| record.iter().map(str::to_owned).collect())
                .map_err(DataError::from)
        })))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn check_sheet(expected: &str, requested: &str) -> DataResult<()> {
    if expected != requested {
        return Err(DataError::UnsupportedSource {
            message: format!("no sheet named '{requested}' (available: '{expected}')"),
        });
    }
    Ok(())
}

#[cfg(feature = "excel")]
pub use workbook::WorkbookSource;

#[cfg(feature = "excel")]
mod workbook {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};

    use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader, Sheets};

    use super::{RowCursor, TabularSource};
    use crate::error::DataResult;
    use crate::types::Record;

    /// Spreadsheet workbook (`.xlsx`, `.xls`, `.ods`, ...) opened with `calamine`.
    pub struct WorkbookSource {
        path: PathBuf,
        workbook: Sheets<BufReader<File>>,
    }

    impl std::fmt::Debug for WorkbookSource {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("WorkbookSource")
                .field("path", &self.path)
                .finish()
        }
    }

    impl WorkbookSource {
        pub fn open(path: &Path) -> DataResult<Self> {
            let workbook = open_workbook_auto(path)?;
            Ok(Self {
                path: path.to_path_buf(),
                workbook,
            })
        }
    }

    impl TabularSource for WorkbookSource {
        fn sheet_names(&self) -> Vec<String> {
            self.workbook.sheet_names().to_vec()
        }

        fn rows(&mut self, sheet: &str) -> DataResult<RowCursor<'_>> {
            let range = self.workbook.worksheet_range(sheet)?;
            let rows: Vec<Record> = range
                .rows()
                .map(|row| row.iter().map(cell_to_string).collect())
                .collect();
            Ok(Box::new(rows.into_iter().map(Ok)))
        }

        fn expands_collapsed_rows(&self) -> bool {
            true
        }

        fn describe(&self) -> String {
            self.path.display().to_string()
        }
    }

    fn cell_to_string(c: &Data) -> String {
        match c {
            Data::String(s) => s.clone(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => float_to_string(*f),
            Data::Bool(b) => b.to_string(),
            Data::DateTime(d) => excel_datetime_to_string(d),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
            Data::Error(e) => format!("{e:?}"),
            Data::Empty => String::new(),
        }
    }

    /// ISO text for date cells so workbook dates line up with the same values read from CSV.
    /// Durations and serials outside chrono's range keep the raw serial.
    fn excel_datetime_to_string(d: &ExcelDateTime) -> String {
        if d.is_duration() {
            return d.to_string();
        }
        match d.as_datetime() {
            Some(dt) if dt.date().and_hms_opt(0, 0, 0) == Some(dt) => dt.date().to_string(),
            Some(dt) => dt.to_string(),
            None => d.to_string(),
        }
    }

    /// Integral floats print without a fraction while they are exactly representable.
    pub(super) fn float_to_string(f: f64) -> String {
        if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGRAL {
            (f as i64).to_string()
        } else {
            f.to_string()
        }
    }

    /// 2^53: above this not every integer has an `f64` representation.
    const MAX_EXACT_INTEGRAL: f64 = 9_007_199_254_740_992.0;
}
