use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{config::DEFAULT_CONFIG_FILE, dialect::Dialect, infer::RowPolicy};

#[derive(Debug, Parser)]
#[command(author, version, about = "Load CSV files into database tables with an inferred schema", long_about = None)]
pub struct Cli {
    /// Emit debug-level logs
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer a schema, create the table, and bulk load the file into it
    Load(LoadArgs),
    /// Print the schema inferred for a CSV file
    Infer(InferArgs),
    /// Print the CREATE TABLE statement for a CSV file
    Ddl(DdlArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of data rows sampled for type votes (0 means every row)
    #[arg(long = "sample-rows")]
    pub sample_rows: Option<usize>,
    /// Handling of rows whose field count differs from the header
    #[arg(long = "row-policy", value_enum)]
    pub row_policy: Option<RowPolicy>,
    /// Configuration file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Target table name
    #[arg(short = 't', long = "table")]
    pub table: String,
    /// CSV file to load
    #[arg(short = 'f', long = "csv-file")]
    pub csv_file: PathBuf,
    /// Delete existing rows from the table before loading
    #[arg(long = "clean-table")]
    pub clean_table: bool,
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Debug, Args)]
pub struct InferArgs {
    /// CSV file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output format for the inferred schema
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
    #[command(flatten)]
    pub source: InputArgs,
}

#[derive(Debug, Args)]
pub struct DdlArgs {
    /// CSV file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Table name used in the statement
    #[arg(short = 't', long = "table")]
    pub table: String,
    /// SQL dialect for column types and identifier quoting
    #[arg(long, value_enum, default_value = "sqlite")]
    pub dialect: Dialect,
    #[command(flatten)]
    pub source: InputArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() || first == '"' {
                return Err("Delimiter must be an ASCII character other than '\"'".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_delimiter_accepts_names_and_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("#"), Ok(b'#'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("\"").is_err());
    }

    #[test]
    fn load_accepts_original_flags() {
        let cli = Cli::try_parse_from([
            "csv-loader",
            "load",
            "-t",
            "species",
            "-f",
            "data.csv",
            "-c",
            "settings.yaml",
            "--clean-table",
        ])
        .expect("parse");
        let Commands::Load(args) = cli.command else {
            panic!("expected load command");
        };
        assert_eq!(args.table, "species");
        assert!(args.clean_table);
        assert_eq!(args.input.config, PathBuf::from("settings.yaml"));
    }
}
