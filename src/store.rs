//! Table creation and guarded bulk load into a SQLite database.
//!
//! The emptiness check and the load share one `IMMEDIATE` transaction, so a
//! concurrent writer cannot slip rows in between the check and the insert,
//! and a failed load leaves the table exactly as it was.

use std::{fs, path::Path};

use log::{debug, info};
use rusqlite::{Connection, TransactionBehavior, params_from_iter, types::Value};

use crate::{
    classify::{ColumnType, float_value, integer_value},
    dialect::Dialect,
    error::{LoaderError, Result},
    infer::{InferOptions, RowPolicy, Schema, infer_schema},
    io_utils::CsvSource,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: String,
    pub rows_loaded: u64,
    pub rows_cleared: u64,
    pub schema: Schema,
}

/// Opens (creating if needed) the database file and its parent directory.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    debug!("Opening database {path:?}");
    Ok(Connection::open(path)?)
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
    let sql = Dialect::Sqlite.count_rows(table);
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Infers the schema of `source` and loads it into `table`.
pub fn store_csv(
    conn: &mut Connection,
    source: &CsvSource,
    table: &str,
    options: &InferOptions,
    clean_table: bool,
) -> Result<LoadSummary> {
    let schema = infer_schema(source, options)?;
    load_rows(conn, source, table, schema, options.row_policy, clean_table)
}

/// Creates `table` when missing, refuses to touch it when it already holds
/// rows (unless `clean_table`), then inserts every data row of `source`.
pub fn load_rows(
    conn: &mut Connection,
    source: &CsvSource,
    table: &str,
    schema: Schema,
    policy: RowPolicy,
    clean_table: bool,
) -> Result<LoadSummary> {
    let dialect = Dialect::Sqlite;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let ddl = dialect.create_table(table, &schema);
    debug!("Query> {ddl}");
    tx.execute(&ddl, [])?;

    debug!("Check whether table {table:?} is empty");
    let existing = count_rows(&tx, table)?;
    let rows_cleared = if existing == 0 {
        0
    } else if clean_table {
        tx.execute(&dialect.delete_rows(table), [])?;
        info!("Cleared {existing} existing row(s) from {table}");
        existing
    } else {
        return Err(LoaderError::AlreadyLoaded {
            table: table.to_string(),
            rows: existing,
        });
    };

    debug!("Store data from {}", source.describe());
    let rows_loaded = {
        let insert = dialect.insert_row(table, &schema);
        debug!("Query> {insert}");
        let mut statement = tx.prepare(&insert)?;
        let mut reader = source.open()?;
        reader.next_record()?.ok_or(LoaderError::EmptySource)?;
        let mut loaded = 0u64;
        while let Some((line, mut row)) = reader.next_record()? {
            policy.check(line, schema.len(), row.len())?;
            row.resize(schema.len(), String::new());
            let values = schema
                .columns
                .iter()
                .zip(&row)
                .map(|(column, token)| bind_value(column.column_type, token));
            statement.execute(params_from_iter(values))?;
            loaded += 1;
        }
        loaded
    };
    tx.commit()?;

    info!("Stored {rows_loaded} row(s) into {table}");
    Ok(LoadSummary {
        table: table.to_string(),
        rows_loaded,
        rows_cleared,
        schema,
    })
}

/// Converts a raw token into the value bound for a column of `column_type`.
/// Tokens that do not fit the column's type are bound as text unchanged.
pub fn bind_value(column_type: ColumnType, token: &str) -> Value {
    let converted = match column_type {
        ColumnType::Integer => integer_value(token).map(Value::Integer),
        ColumnType::Float => float_value(token)
            .or_else(|| integer_value(token).map(|v| v as f64))
            .map(Value::Real),
        ColumnType::Boolean => match token.trim() {
            t if t.eq_ignore_ascii_case("true") => Some(Value::Integer(1)),
            t if t.eq_ignore_ascii_case("false") => Some(Value::Integer(0)),
            _ => None,
        },
        ColumnType::Date => Some(Value::Text(token.trim().to_string())),
        ColumnType::Varchar(_) | ColumnType::Text => None,
    };
    converted.unwrap_or_else(|| Value::Text(token.to_string()))
}
