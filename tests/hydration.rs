use tabular_ingest::hydrate::{as_structs, FieldBinding, FromRecord};
use tabular_ingest::ingestion::LoadedRows;
use tabular_ingest::DataError;

#[derive(Debug, Default, PartialEq)]
struct Settlement {
    date: String,
    region: String,
    price: f64,
    volume: u64,
}

impl FromRecord for Settlement {
    fn bindings() -> Vec<FieldBinding<Self>> {
        vec![
            FieldBinding::text("Date", |s: &mut Self, v| s.date = v),
            FieldBinding::text("region", |s: &mut Self, v| s.region = v),
            FieldBinding::float("price", |s: &mut Self, v| s.price = v),
            FieldBinding::unsigned("volume", |s: &mut Self, v| s.volume = v),
        ]
    }
}

#[test]
fn hydrates_rows_in_order() {
    let ds = LoadedRows::from_bytes(
        b"Date,Region,Price,Volume\n2024-01-01,NSW,41.5,100\n2024-01-02,VIC,39.0,80",
        "\n",
        ",",
        None,
    )
    .interpret_columns()
    .unwrap();

    let out: Vec<Settlement> = as_structs(&ds).unwrap();
    assert_eq!(
        out,
        vec![
            Settlement {
                date: "2024-01-01".into(),
                region: "NSW".into(),
                price: 41.5,
                volume: 100,
            },
            Settlement {
                date: "2024-01-02".into(),
                region: "VIC".into(),
                price: 39.0,
                volume: 80,
            },
        ]
    );
}

#[test]
fn one_bad_cell_fails_the_whole_batch() {
    let ds = LoadedRows::from_bytes(
        b"date,region,price\n2024-01-01,NSW,41.5\n2024-01-02,VIC,n/a\n2024-01-03,QLD,12",
        "\n",
        ",",
        None,
    )
    .interpret_columns()
    .unwrap();
    assert_eq!(ds.row_count(), 3);

    let err = as_structs::<Settlement>(&ds).unwrap_err();
    match err {
        DataError::ParseError { row, column, raw, .. } => {
            assert_eq!(row, 1);
            assert_eq!(column, "price");
            assert_eq!(raw, "n/a");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn provided_columns_hydrate_without_header_row() {
    let ds = LoadedRows::from_bytes(b"2024-01-01|SA|50", "\n", "|", None)
        .provide_columns(&["date", "region", "volume"])
        .unwrap();

    let out: Vec<Settlement> = as_structs(&ds).unwrap();
    assert_eq!(out[0].region, "SA");
    assert_eq!(out[0].volume, 50);
    assert_eq!(out[0].price, 0.0);
}
