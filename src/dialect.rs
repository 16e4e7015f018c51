//! Rendering inferred column types as DDL for a target database.

use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{classify::ColumnType, infer::Schema};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    MySql,
}

impl Dialect {
    pub fn type_name(self, column_type: ColumnType) -> String {
        match (self, column_type) {
            (_, ColumnType::Date) => "DATE".to_string(),
            (Dialect::Sqlite, ColumnType::Boolean) => "BOOLEAN".to_string(),
            (Dialect::MySql, ColumnType::Boolean) => "BIT".to_string(),
            (Dialect::Sqlite, ColumnType::Integer) => "INTEGER".to_string(),
            (Dialect::MySql, ColumnType::Integer) => "INT".to_string(),
            (Dialect::Sqlite, ColumnType::Float) => "REAL".to_string(),
            (Dialect::MySql, ColumnType::Float) => "FLOAT".to_string(),
            (_, ColumnType::Varchar(width)) => format!("VARCHAR({width})"),
            (_, ColumnType::Text) => "TEXT".to_string(),
        }
    }

    /// Wraps `name` verbatim in the dialect's identifier quotes.
    pub fn quote_identifier(self, name: &str) -> String {
        let quote = match self {
            Dialect::Sqlite => '"',
            Dialect::MySql => '`',
        };
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    pub fn create_table(self, table: &str, schema: &Schema) -> String {
        let columns = schema
            .columns
            .iter()
            .map(|c| {
                format!(
                    "{} {}",
                    self.quote_identifier(&c.name),
                    self.type_name(c.column_type)
                )
            })
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({columns})",
            self.quote_identifier(table)
        )
    }

    pub fn count_rows(self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", self.quote_identifier(table))
    }

    pub fn delete_rows(self, table: &str) -> String {
        format!("DELETE FROM {}", self.quote_identifier(table))
    }

    pub fn insert_row(self, table: &str, schema: &Schema) -> String {
        let names = schema
            .columns
            .iter()
            .map(|c| self.quote_identifier(&c.name))
            .join(", ");
        let placeholders = (0..schema.len()).map(|_| "?").join(", ");
        format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders})",
            self.quote_identifier(table)
        )
    }
}
