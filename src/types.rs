//! Core data model: [`Column`], [`Record`], [`Normalizer`] and the in-memory [`DataSet`].
//!
//! A [`DataSet`] is produced by [`crate::ingestion::LoadedRows`] once its columns are finalized.
//! Every row held by a dataset should have exactly as many cells as the dataset has columns.
//! The mutating operations ([`DataSet::set_record`], [`DataSet::append`]) enforce this; rows
//! loaded before columns were finalized are not re-checked, and reads treat a missing cell as
//! an empty string.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{DataError, DataResult, IncompatibleCause};

/// One row of string cells, in source order.
pub type Record = Vec<String>;

/// A named column bound to a fixed position in every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    ordinal: usize,
}

impl Column {
    /// Create a column; `name` is lower-cased and stripped of spaces.
    pub fn new(name: &str, ordinal: usize) -> Self {
        Self {
            name: normalize_column_name(name),
            ordinal,
        }
    }

    /// Normalized column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-based position of the column within each row.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

/// Lower-case `name` and remove every space.
pub fn normalize_column_name(name: &str) -> String {
    name.replace(' ', "").to_lowercase()
}

/// Case-insensitive exact comparison used for column lookups.
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Caller-supplied row filter/transform run before a row is accepted.
///
/// A normalizer may shrink, reorder or empty a row. An empty result means "drop this row"
/// wherever rows are merged ([`DataSet::append`], file ingestion).
#[derive(Clone)]
pub struct Normalizer(Arc<dyn Fn(Record) -> Record + Send + Sync>);

impl Normalizer {
    /// Wrap a row transform.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Record) -> Record + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Normalizer that returns rows unchanged.
    pub fn identity() -> Self {
        Self::new(|r| r)
    }

    /// Run the normalizer on `record`.
    pub fn apply(&self, record: Record) -> Record {
        (self.0)(record)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Normalizer(..)")
    }
}

/// In-memory tabular dataset of string cells.
///
/// Rows keep insertion order, which is the order they were read from their sources. The
/// normalizer given at construction is kept for the lifetime of the dataset and applied to
/// rows merged in through [`DataSet::append`].
#[derive(Debug, Clone)]
pub struct DataSet {
    columns: Vec<Column>,
    rows: Vec<Record>,
    normalizer: Normalizer,
}

impl PartialEq for DataSet {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.rows == other.rows
    }
}

impl DataSet {
    /// Build a dataset from column names and rows, checking every row's width.
    pub fn try_new<S: AsRef<str>>(
        header: &[S],
        rows: Vec<Record>,
        normalizer: Normalizer,
    ) -> DataResult<Self> {
        let columns = columns_from_names(header);
        for row in &rows {
            check_width(columns.len(), row.len())?;
        }
        Ok(Self::from_parts(columns, rows, normalizer))
    }

    /// Assemble a dataset whose shape has already been established by the caller.
    pub(crate) fn from_parts(columns: Vec<Column>, rows: Vec<Record>, normalizer: Normalizer) -> Self {
        Self {
            columns,
            rows,
            normalizer,
        }
    }

    /// Columns in ordinal order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// All rows, in insertion order.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Row at `index`, if present.
    pub fn row(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The normalizer this dataset was built with.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Column names in ordinal order.
    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Position of the column named `name` (case-insensitive), if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|c| names_match(&c.name, name))
            .map(|c| c.ordinal)
    }

    /// Delete the contiguous span of rows between the smallest and the largest of `indices`,
    /// both ends included.
    ///
    /// This is **not** "delete each listed index": `drop_rows(&[1, 3])` removes rows 1, 2 and 3.
    /// Rows left empty afterwards are removed as well. An empty `indices` is a no-op.
    pub fn drop_rows(&mut self, indices: &[usize]) -> DataResult<()> {
        let sorted: BTreeSet<usize> = indices.iter().copied().collect();
        let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
            return Ok(());
        };
        if last >= self.rows.len() {
            return Err(DataError::BadIndex {
                index: last,
                len: self.rows.len(),
            });
        }

        self.rows.drain(first..=last);
        self.rows.retain(|row| !row.is_empty());
        Ok(())
    }

    /// Copy row `row`, optionally projected onto `columns`, into a new one-row dataset.
    ///
    /// With no column names the copy keeps every column. Otherwise the projected cells are
    /// returned in dataset column order (not argument order), and every requested name must
    /// match exactly one column, case-insensitively.
    pub fn get<S: AsRef<str>>(&self, row: usize, columns: &[S]) -> DataResult<DataSet> {
        let record = self.rows.get(row).ok_or(DataError::BadIndex {
            index: row,
            len: self.rows.len(),
        })?;

        if columns.is_empty() {
            return Ok(Self::from_parts(
                self.columns.clone(),
                vec![record.clone()],
                self.normalizer.clone(),
            ));
        }

        let mut projected_columns = Vec::new();
        let mut projected = Record::new();
        for column in &self.columns {
            if columns.iter().any(|c| names_match(c.as_ref(), &column.name)) {
                projected.push(record.get(column.ordinal).cloned().unwrap_or_default());
                projected_columns.push(Column {
                    name: column.name.clone(),
                    ordinal: projected_columns.len(),
                });
            }
        }

        if projected_columns.len() != columns.len() {
            return Err(DataError::ColumnsNotFound {
                available: self.header(),
                required: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            });
        }

        Ok(Self::from_parts(
            projected_columns,
            vec![projected],
            self.normalizer.clone(),
        ))
    }

    /// Replace the row at `row` with `record`.
    pub fn set_record(&mut self, row: usize, record: Record) -> DataResult<()> {
        let len = self.rows.len();
        let width = self.columns.len();
        let slot = self
            .rows
            .get_mut(row)
            .ok_or(DataError::BadIndex { index: row, len })?;
        check_width(width, record.len())?;
        *slot = record;
        Ok(())
    }

    /// Merge every row of `other` onto this dataset.
    ///
    /// The headers must have the same length and every column of this dataset must appear
    /// somewhere in `other`'s header; column order is not compared. Rows from `other` are run
    /// through this dataset's normalizer and dropped if they come back empty.
    pub fn append(&mut self, other: &DataSet) -> DataResult<&mut Self> {
        compare_headers(&self.header(), &other.header()).map_err(DataError::IncompatibleDatasets)?;

        let width = self.columns.len();
        let mut accepted = Vec::with_capacity(other.rows.len());
        for row in &other.rows {
            let row = self.normalizer.apply(row.clone());
            if row.is_empty() {
                continue;
            }
            check_width(width, row.len())?;
            accepted.push(row);
        }
        self.rows.append(&mut accepted);
        Ok(self)
    }
}

pub(crate) fn columns_from_names<S: AsRef<str>>(names: &[S]) -> Vec<Column> {
    names
        .iter()
        .enumerate()
        .map(|(idx, name)| Column::new(name.as_ref(), idx))
        .collect()
}

fn check_width(expected: usize, found: usize) -> DataResult<()> {
    if expected != found {
        return Err(DataError::Shape {
            expected,
            found,
            message: format!(
                "record length:{found} does not match dataset header length:{expected}"
            ),
        });
    }
    Ok(())
}

fn compare_headers(host: &[String], candidate: &[String]) -> Result<(), IncompatibleCause> {
    if host.len() != candidate.len() {
        return Err(IncompatibleCause::Length {
            host: host.len(),
            candidate: candidate.len(),
        });
    }
    match host.iter().position(|name| !candidate.contains(name)) {
        Some(index) => Err(IncompatibleCause::MissingColumn {
            index,
            name: host[index].clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Record> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn five_rows() -> DataSet {
        DataSet::try_new(
            &["id", "name"],
            rows(&[
                &["0", "a"],
                &["1", "b"],
                &["2", "c"],
                &["3", "d"],
                &["4", "e"],
            ]),
            Normalizer::identity(),
        )
        .unwrap()
    }

    #[test]
    fn column_names_are_lowercased_and_stripped() {
        let col = Column::new("Trade Date", 3);
        assert_eq!(col.name(), "tradedate");
        assert_eq!(col.ordinal(), 3);
    }

    #[test]
    fn try_new_rejects_ragged_rows() {
        let err = DataSet::try_new(&["a", "b"], rows(&[&["1"]]), Normalizer::identity())
            .unwrap_err();
        assert!(matches!(err, DataError::Shape { expected: 2, found: 1, .. }));
    }

    #[test]
    fn drop_removes_the_inclusive_span() {
        let mut ds = five_rows();
        ds.drop_rows(&[3, 1]).unwrap();
        assert_eq!(ds.rows(), rows(&[&["0", "a"], &["4", "e"]]).as_slice());
    }

    #[test]
    fn drop_single_index_removes_one_row() {
        let mut ds = five_rows();
        ds.drop_rows(&[2]).unwrap();
        assert_eq!(ds.row_count(), 4);
        assert_eq!(ds.row(2).unwrap()[0], "3");
    }

    #[test]
    fn drop_with_no_indices_is_a_noop() {
        let mut ds = five_rows();
        ds.drop_rows(&[]).unwrap();
        assert_eq!(ds.row_count(), 5);
    }

    #[test]
    fn drop_out_of_range_is_rejected() {
        let mut ds = five_rows();
        let err = ds.drop_rows(&[1, 5]).unwrap_err();
        assert!(matches!(err, DataError::BadIndex { index: 5, len: 5 }));
        assert_eq!(ds.row_count(), 5);
    }

    #[test]
    fn get_projection_follows_dataset_order() {
        let ds = five_rows();
        let out = ds.get(2, &["NAME", "id"]).unwrap();
        assert_eq!(out.header(), vec!["id", "name"]);
        assert_eq!(out.rows(), rows(&[&["2", "c"]]).as_slice());
        assert_eq!(out.columns()[1].ordinal(), 1);
    }

    #[test]
    fn get_out_of_range_row_is_rejected() {
        let ds = five_rows();
        let err = ds.get::<&str>(9, &[]).unwrap_err();
        assert!(matches!(err, DataError::BadIndex { index: 9, .. }));
    }

    #[test]
    fn set_record_checks_index_then_width() {
        let mut ds = five_rows();
        assert!(matches!(
            ds.set_record(5, vec!["x".into(), "y".into()]),
            Err(DataError::BadIndex { index: 5, .. })
        ));
        assert!(matches!(
            ds.set_record(0, vec!["x".into()]),
            Err(DataError::Shape { .. })
        ));
        ds.set_record(0, vec!["x".into(), "y".into()]).unwrap();
        assert_eq!(ds.row(0).unwrap(), &vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn compare_headers_reports_first_missing_index() {
        let host = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            compare_headers(&host, &["x".to_string(), "a".to_string()]),
            Err(IncompatibleCause::MissingColumn {
                index: 1,
                name: "b".to_string()
            })
        );
        assert_eq!(
            compare_headers(&host, &["q".to_string(), "r".to_string()]),
            Err(IncompatibleCause::MissingColumn {
                index: 0,
                name: "a".to_string()
            })
        );
        assert_eq!(compare_headers(&host, &["b".to_string(), "a".to_string()]), Ok(()));
    }

    #[test]
    fn append_drops_rows_emptied_by_the_normalizer() {
        let skip_blank = Normalizer::new(|r: Record| {
            if r.iter().all(|c| c.is_empty()) {
                Vec::new()
            } else {
                r
            }
        });
        let mut host = DataSet::try_new(&["a", "b"], rows(&[&["1", "2"]]), skip_blank).unwrap();
        let other = DataSet::try_new(
            &["b", "a"],
            rows(&[&["", ""], &["3", "4"]]),
            Normalizer::identity(),
        )
        .unwrap();

        host.append(&other).unwrap();
        assert_eq!(host.rows(), rows(&[&["1", "2"], &["3", "4"]]).as_slice());
    }
}
