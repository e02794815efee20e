//! Header reconciliation for multi-source ingestion.
//!
//! Rows from every source are merged into one list. The first accepted row that contains the
//! header marker (a cell equal to `"date"` by default, case-insensitive) becomes the
//! established header. Each source after the first must open with the same header (after
//! normalization); that leading header row is consumed instead of being merged again.

use crate::error::{DataError, DataResult};
use crate::types::{Normalizer, Record};

use super::source::TabularSource;

/// Accumulates rows across sources while checking that their headers agree.
#[derive(Debug)]
pub(crate) struct Reconciler {
    normalizer: Normalizer,
    marker: String,
    header: Option<Record>,
    rows: Vec<Record>,
}

impl Reconciler {
    pub(crate) fn new(normalizer: Normalizer, marker: &str) -> Self {
        Self {
            normalizer,
            marker: marker.to_string(),
            header: None,
            rows: Vec::new(),
        }
    }

    /// Header established so far, if any.
    pub(crate) fn header(&self) -> Option<&Record> {
        self.header.as_ref()
    }

    /// Drain the first sheet of `source` into the accumulated rows.
    ///
    /// `position` is the index of the source in the ingestion order; only sources after the
    /// first are checked against the established header. Returns the number of rows added.
    pub(crate) fn ingest(&mut self, position: usize, source: &mut dyn TabularSource) -> DataResult<usize> {
        let sheet = source
            .sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| DataError::UnsupportedSource {
                message: "source has no sheets".to_string(),
            })?;
        let expand = source.expands_collapsed_rows();
        let mut cursor = source.rows(&sheet)?;
        let before = self.rows.len();

        if position != 0 {
            for raw in cursor.by_ref() {
                let raw = if expand { expand_collapsed(raw?) } else { raw? };
                if is_blank(&raw) {
                    continue;
                }
                self.check_header(raw)?;
                break;
            }
        }

        for raw in cursor {
            let raw = if expand { expand_collapsed(raw?) } else { raw? };
            if is_blank(&raw) {
                continue;
            }
            let record = self.normalizer.apply(raw);
            if record.is_empty() {
                continue;
            }
            if self.header.is_none() && contains_marker(&record, &self.marker) {
                self.header = Some(record.clone());
            }
            self.rows.push(record);
        }

        Ok(self.rows.len() - before)
    }

    fn check_header(&self, raw: Record) -> DataResult<()> {
        let Some(header) = &self.header else {
            return Ok(());
        };
        let candidate = self.normalizer.apply(raw);
        if !candidate.is_empty() && &candidate != header {
            return Err(DataError::HeaderMismatch {
                original: header.clone(),
                mismatch: candidate,
            });
        }
        Ok(())
    }

    pub(crate) fn into_rows(self) -> Vec<Record> {
        self.rows
    }
}

/// A workbook row read as one cell holding comma-separated text is split into its cells.
fn expand_collapsed(raw: Record) -> Record {
    match raw.as_slice() {
        [only] if only.contains(',') => only.split(',').map(str::to_owned).collect(),
        _ => raw,
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.is_empty())
}

fn contains_marker(row: &[String], marker: &str) -> bool {
    let marker = marker.to_lowercase();
    row.iter().any(|c| c.to_lowercase() == marker)
}
