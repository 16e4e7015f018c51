pub mod classify;
pub mod cli;
pub mod config;
pub mod dialect;
pub mod error;
pub mod infer;
pub mod io_utils;
pub mod store;
pub mod table;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, parser::ValueSource};
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, InputArgs, OutputFormat},
    config::Config,
    infer::InferOptions,
    io_utils::CsvSource,
};

pub use crate::{
    classify::{ColumnType, TypeClassifier, classify},
    error::LoaderError,
    infer::{Schema, SchemaEntry, infer_schema},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(verbose: bool) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            let level = if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            builder.filter_module("csv_loader", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    init_logging(cli.verbose);
    debug!("Arguments passed: {cli:?}");
    let config_explicit = matches
        .subcommand()
        .map(|(_, sub)| sub.value_source("config") == Some(ValueSource::CommandLine))
        .unwrap_or(false);
    match &cli.command {
        Commands::Load(args) => handle_load(args, config_explicit),
        Commands::Infer(args) => handle_infer(args, config_explicit),
        Commands::Ddl(args) => handle_ddl(args, config_explicit),
    }
}

fn load_config(input: &InputArgs, explicit: bool) -> Result<Config> {
    Config::load_or_default(&input.config, explicit)
        .with_context(|| format!("Reading config from {:?}", input.config))
}

fn resolve_options(config: &Config, input: &InputArgs) -> InferOptions {
    let mut options = config.infer_options();
    if let Some(rows) = input.sample_rows {
        options.sample_rows = rows;
    }
    if let Some(policy) = input.row_policy {
        options.row_policy = policy;
    }
    options
}

fn build_source(path: &Path, input: &InputArgs) -> Result<CsvSource> {
    let encoding = io_utils::resolve_encoding(input.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(path, input.delimiter);
    let path = std::path::absolute(path).with_context(|| format!("Resolving {path:?}"))?;
    Ok(CsvSource::from_path(path)
        .with_delimiter(delimiter)
        .with_encoding(encoding))
}

fn handle_load(args: &cli::LoadArgs, config_explicit: bool) -> Result<()> {
    let config = load_config(&args.input, config_explicit)?;
    let options = resolve_options(&config, &args.input);
    let source = build_source(&args.csv_file, &args.input)?;
    let database = config.database_path()?;
    info!(
        "Loading '{}' into table '{}' of {:?} with delimiter '{}'",
        source.describe(),
        args.table,
        database,
        printable_delimiter(source.delimiter())
    );
    let mut conn = store::open_database(&database)
        .with_context(|| format!("Opening database {database:?}"))?;
    let summary = store::store_csv(&mut conn, &source, &args.table, &options, args.clean_table)
        .with_context(|| format!("Loading {:?} into {}", args.csv_file, args.table))?;
    info!(
        "Finished storing {} row(s) across {} column(s) into {}",
        summary.rows_loaded,
        summary.schema.len(),
        summary.table
    );
    Ok(())
}

fn handle_infer(args: &cli::InferArgs, config_explicit: bool) -> Result<()> {
    let config = load_config(&args.source, config_explicit)?;
    let options = resolve_options(&config, &args.source);
    let source = build_source(&args.input, &args.source)?;
    let schema = infer_schema(&source, &options)
        .with_context(|| format!("Inferring schema from {:?}", args.input))?;
    let rendered = match args.format {
        OutputFormat::Table => table::render_schema(&schema),
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&schema)?),
        OutputFormat::Yaml => serde_yaml::to_string(&schema)?,
    };
    print!("{rendered}");
    Ok(())
}

fn handle_ddl(args: &cli::DdlArgs, config_explicit: bool) -> Result<()> {
    let config = load_config(&args.source, config_explicit)?;
    let options = resolve_options(&config, &args.source);
    let source = build_source(&args.input, &args.source)?;
    let schema = infer_schema(&source, &options)
        .with_context(|| format!("Inferring schema from {:?}", args.input))?;
    println!("{};", args.dialect.create_table(&args.table, &schema));
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
