mod common;

use common::{TestWorkspace, fixture_path};
use csv_loader::{
    config::Config,
    error::LoaderError,
    infer::{InferOptions, RowPolicy},
    io_utils::CsvSource,
    store::{count_rows, open_database, store_csv},
};

#[test]
fn loads_fixture_into_new_table() {
    let workspace = TestWorkspace::new();
    let mut conn = open_database(&workspace.path().join("nested").join("warehouse.db"))
        .expect("open database");
    let source = CsvSource::from_path(fixture_path("people.csv"));
    let summary =
        store_csv(&mut conn, &source, "people", &InferOptions::default(), false).expect("store");
    assert_eq!(summary.rows_loaded, 3);
    assert_eq!(summary.schema.len(), 5);

    let declared: Vec<(String, String)> = conn
        .prepare("SELECT name, type FROM pragma_table_info('people') ORDER BY cid")
        .expect("prepare")
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("collect");
    assert_eq!(
        declared,
        vec![
            ("id".to_string(), "INTEGER".to_string()),
            ("name".to_string(), "VARCHAR(18)".to_string()),
            ("joined".to_string(), "DATE".to_string()),
            ("active".to_string(), "BOOLEAN".to_string()),
            ("score".to_string(), "REAL".to_string()),
        ]
    );

    let name: String = conn
        .query_row("SELECT name FROM people WHERE id = 2", [], |row| row.get(0))
        .expect("quoted field");
    assert_eq!(name, "Bartholomew, Jr.");
    let score: f64 = conn
        .query_row("SELECT score FROM people WHERE id = 2", [], |row| row.get(0))
        .expect("score");
    assert_eq!(score, 78.0);
}

#[test]
fn second_load_is_refused_with_row_count() {
    let workspace = TestWorkspace::new();
    let db = workspace.path().join("warehouse.db");
    let source = CsvSource::from_path(fixture_path("people.csv"));

    let mut conn = open_database(&db).expect("open");
    store_csv(&mut conn, &source, "people", &InferOptions::default(), false).expect("first load");

    let err = store_csv(&mut conn, &source, "people", &InferOptions::default(), false)
        .expect_err("second load must fail");
    assert_eq!(err.to_string(), "Table people is already having 3 rows");
    assert!(matches!(err, LoaderError::AlreadyLoaded { rows: 3, ref table } if table == "people"));
    assert_eq!(count_rows(&conn, "people").expect("count"), 3);
}

#[test]
fn header_only_file_creates_nothing() {
    let workspace = TestWorkspace::new();
    let db = workspace.path().join("warehouse.db");
    let mut conn = open_database(&db).expect("open");
    let source = CsvSource::from_path(fixture_path("header_only.csv"));
    let err = store_csv(&mut conn, &source, "empty", &InferOptions::default(), false).unwrap_err();
    assert!(matches!(err, LoaderError::InsufficientData));
    let tables: i64 = conn
        .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'", [], |row| {
            row.get(0)
        })
        .expect("tables");
    assert_eq!(tables, 0);
}

#[test]
fn lenient_load_pads_short_rows_and_drops_extra_fields() {
    let workspace = TestWorkspace::new();
    let mut conn = open_database(&workspace.path().join("warehouse.db")).expect("open");
    let source = CsvSource::from_path(fixture_path("ragged.csv"));
    let lenient = InferOptions {
        row_policy: RowPolicy::Lenient,
        ..InferOptions::default()
    };
    let summary = store_csv(&mut conn, &source, "codes", &lenient, false).expect("lenient load");
    assert_eq!(summary.rows_loaded, 3);

    let rows: Vec<(String, String)> = conn
        .prepare("SELECT code, label FROM codes ORDER BY rowid")
        .expect("prepare")
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("collect");
    assert_eq!(
        rows,
        vec![
            ("A1".to_string(), "first".to_string()),
            ("B2".to_string(), String::new()),
            ("C3".to_string(), "third".to_string()),
        ]
    );
}

#[test]
fn strict_load_of_ragged_file_stores_nothing() {
    let workspace = TestWorkspace::new();
    let mut conn = open_database(&workspace.path().join("warehouse.db")).expect("open");
    let source = CsvSource::from_path(fixture_path("ragged.csv"));
    let err = store_csv(&mut conn, &source, "codes", &InferOptions::default(), false).unwrap_err();
    assert!(matches!(err, LoaderError::MalformedRow { line: 3, .. }));
}

#[test]
fn config_resolves_database_next_to_file() {
    let workspace = TestWorkspace::new();
    let config_path = workspace.write_config("data/warehouse.db", "inference:\n  sample_rows: 0\n");
    let config = Config::load(&config_path).expect("load config");
    assert_eq!(
        config.database_path().expect("database path"),
        std::path::absolute(workspace.path().join("data").join("warehouse.db")).expect("abs")
    );
    assert_eq!(config.infer_options().sample_rows, 0);
}

#[test]
fn malformed_config_is_a_config_error() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("config.yaml", "inference: [not, a, map]\n");
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, LoaderError::Config { .. }));
    assert!(err.to_string().contains("config.yaml"));
}
