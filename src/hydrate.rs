//! Conversion of dataset rows into caller-defined records.
//!
//! A record type implements [`FromRecord`] by listing one [`FieldBinding`] per field it wants
//! populated. Each binding names the source column (its tag, matched case-insensitively) and
//! the field's kind, which decides how the cell text is coerced:
//!
//! | kind | coercion |
//! |------|----------|
//! | [`FieldKind::Text`] | cell copied verbatim |
//! | [`FieldKind::Float`] | base-10 `f64` |
//! | [`FieldKind::Signed`] | base-10 `i64` |
//! | [`FieldKind::Unsigned`] | base-10 `u64` |
//! | [`FieldKind::Other`] | never set |
//!
//! ```
//! use tabular_ingest::hydrate::{as_structs, FieldBinding, FromRecord};
//! use tabular_ingest::ingestion::LoadedRows;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Trade {
//!     symbol: String,
//!     price: f64,
//!     qty: i64,
//! }
//!
//! impl FromRecord for Trade {
//!     fn bindings() -> Vec<FieldBinding<Self>> {
//!         vec![
//!             FieldBinding::text("Symbol", |t: &mut Self, v| t.symbol = v),
//!             FieldBinding::float("price", |t: &mut Self, v| t.price = v),
//!             FieldBinding::signed("qty", |t: &mut Self, v| t.qty = v),
//!         ]
//!     }
//! }
//!
//! let ds = LoadedRows::from_bytes(b"symbol,price,qty\nABC,1.5,10", "\n", ",", None)
//!     .interpret_columns()
//!     .unwrap();
//! let trades: Vec<Trade> = as_structs(&ds).unwrap();
//! assert_eq!(trades, vec![Trade { symbol: "ABC".into(), price: 1.5, qty: 10 }]);
//! ```

use std::fmt;

use crate::error::{DataError, DataResult};
use crate::types::DataSet;

/// Tag value that marks a field as explicitly not populated.
pub const SKIP_TAG: &str = "-";

/// Scalar kind of a hydrated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Float,
    Signed,
    Unsigned,
    /// Any other kind; such fields keep their default value.
    Other,
}

enum Setter<T> {
    Text(fn(&mut T, String)),
    Float(fn(&mut T, f64)),
    Signed(fn(&mut T, i64)),
    Unsigned(fn(&mut T, u64)),
    Other,
}

/// Binds one field of `T` to a column tag.
pub struct FieldBinding<T> {
    tag: String,
    setter: Setter<T>,
}

impl<T> fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("tag", &self.tag)
            .field("kind", &self.kind())
            .finish()
    }
}

impl<T> FieldBinding<T> {
    fn new(tag: &str, setter: Setter<T>) -> Self {
        Self {
            tag: tag.to_lowercase(),
            setter,
        }
    }

    /// String field, assigned verbatim.
    pub fn text(tag: &str, set: fn(&mut T, String)) -> Self {
        Self::new(tag, Setter::Text(set))
    }

    /// Floating-point field.
    pub fn float(tag: &str, set: fn(&mut T, f64)) -> Self {
        Self::new(tag, Setter::Float(set))
    }

    /// Signed integer field.
    pub fn signed(tag: &str, set: fn(&mut T, i64)) -> Self {
        Self::new(tag, Setter::Signed(set))
    }

    /// Unsigned integer field.
    pub fn unsigned(tag: &str, set: fn(&mut T, u64)) -> Self {
        Self::new(tag, Setter::Unsigned(set))
    }

    /// Field of a kind the hydrator does not coerce; it is left at its default.
    pub fn other(tag: &str) -> Self {
        Self::new(tag, Setter::Other)
    }

    /// Lower-cased column tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> FieldKind {
        match self.setter {
            Setter::Text(_) => FieldKind::Text,
            Setter::Float(_) => FieldKind::Float,
            Setter::Signed(_) => FieldKind::Signed,
            Setter::Unsigned(_) => FieldKind::Unsigned,
            Setter::Other => FieldKind::Other,
        }
    }

    fn is_recognized(&self) -> bool {
        !self.tag.is_empty() && self.tag != SKIP_TAG
    }

    fn assign(&self, target: &mut T, raw: &str) -> Result<(), String> {
        match self.setter {
            Setter::Text(set) => set(target, raw.to_string()),
            Setter::Float(set) => set(target, raw.parse::<f64>().map_err(|e| e.to_string())?),
            Setter::Signed(set) => set(target, raw.parse::<i64>().map_err(|e| e.to_string())?),
            Setter::Unsigned(set) => set(target, raw.parse::<u64>().map_err(|e| e.to_string())?),
            Setter::Other => {}
        }
        Ok(())
    }
}

/// A record type that can be hydrated from dataset rows.
///
/// Fields without a binding, with an empty tag, or tagged [`SKIP_TAG`] keep their
/// [`Default`] value, as do fields whose tag names no column of the dataset.
pub trait FromRecord: Default {
    fn bindings() -> Vec<FieldBinding<Self>>;
}

/// Convert every row of `dataset` into a `T`, in row order.
///
/// A single cell that fails to parse aborts the whole conversion and no records are returned.
pub fn as_structs<T: FromRecord>(dataset: &DataSet) -> DataResult<Vec<T>> {
    // Resolve each binding to its column once for the whole batch.
    let resolved: Vec<(FieldBinding<T>, usize)> = T::bindings()
        .into_iter()
        .filter(FieldBinding::is_recognized)
        .filter_map(|b| {
            let idx = dataset.columns().iter().find(|c| c.name() == b.tag)?.ordinal();
            Some((b, idx))
        })
        .collect();

    let mut out = Vec::with_capacity(dataset.row_count());
    for (row_idx, row) in dataset.rows().iter().enumerate() {
        let mut record = T::default();
        for (binding, idx) in &resolved {
            let raw = row.get(*idx).map(String::as_str).unwrap_or("");
            binding
                .assign(&mut record, raw)
                .map_err(|message| DataError::ParseError {
                    row: row_idx,
                    column: binding.tag.clone(),
                    raw: raw.to_string(),
                    message,
                })?;
        }
        out.push(record);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::LoadedRows;

    #[derive(Debug, Default, PartialEq)]
    struct Reading {
        station: String,
        value: f64,
        delta: i64,
        count: u64,
        note: Option<String>,
        unused: String,
    }

    impl FromRecord for Reading {
        fn bindings() -> Vec<FieldBinding<Self>> {
            vec![
                FieldBinding::text("STATION", |r: &mut Self, v| r.station = v),
                FieldBinding::float("value", |r: &mut Self, v| r.value = v),
                FieldBinding::signed("delta", |r: &mut Self, v| r.delta = v),
                FieldBinding::unsigned("count", |r: &mut Self, v| r.count = v),
                FieldBinding::other("note"),
                FieldBinding::text(SKIP_TAG, |r: &mut Self, v| r.unused = v),
                FieldBinding::text("missing", |r: &mut Self, v| r.unused = v),
            ]
        }
    }

    fn dataset(body: &str) -> DataSet {
        LoadedRows::from_bytes(body.as_bytes(), "\n", ",", None)
            .interpret_columns()
            .unwrap()
    }

    #[test]
    fn hydrates_each_kind() {
        let ds = dataset("station,value,delta,count,note,-\nnorth,1.25,-3,7,hi,x\nsouth,2e1,+4,0,,y");
        let out: Vec<Reading> = as_structs(&ds).unwrap();
        assert_eq!(
            out,
            vec![
                Reading {
                    station: "north".into(),
                    value: 1.25,
                    delta: -3,
                    count: 7,
                    ..Default::default()
                },
                Reading {
                    station: "south".into(),
                    value: 20.0,
                    delta: 4,
                    count: 0,
                    ..Default::default()
                },
            ]
        );
    }

    #[test]
    fn absent_columns_leave_defaults() {
        let ds = dataset("station\neast");
        let out: Vec<Reading> = as_structs(&ds).unwrap();
        assert_eq!(out[0].station, "east");
        assert_eq!(out[0].value, 0.0);
        assert_eq!(out[0].unused, "");
    }

    #[test]
    fn negative_unsigned_is_a_parse_error() {
        let ds = dataset("station,count\nwest,-1");
        let err = as_structs::<Reading>(&ds).unwrap_err();
        match err {
            DataError::ParseError { row, column, raw, .. } => {
                assert_eq!(row, 0);
                assert_eq!(column, "count");
                assert_eq!(raw, "-1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_signed_is_a_parse_error() {
        let ds = dataset("station,delta\nnorth,1\nsouth,up");
        let err = as_structs::<Reading>(&ds).unwrap_err();
        match err {
            DataError::ParseError { row, column, raw, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "delta");
                assert_eq!(raw, "up");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_is_not_trimmed() {
        let ds = dataset("station\n  padded ");
        let out: Vec<Reading> = as_structs(&ds).unwrap();
        assert_eq!(out[0].station, "  padded ");
    }
}
