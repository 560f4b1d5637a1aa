pub mod batch;
pub mod cli;
pub mod data;
pub mod error;
pub mod ingest;
pub mod io_utils;
pub mod normalize;
pub mod schema;
pub mod store;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    schema::RecordKind,
    store::{Store, StoreConfig},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("kbo_ingest", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => handle_init(&args),
        Commands::Ingest(args) => ingest::execute(&args),
        Commands::Normalize(args) => normalize::execute(&args),
        Commands::Count(args) => handle_count(&args),
    }
}

fn handle_init(args: &cli::InitArgs) -> Result<()> {
    let store = Store::open(&StoreConfig::file(&args.database))
        .with_context(|| format!("Opening database {:?}", args.database))?;
    store
        .create_tables()
        .context("Creating destination tables")?;
    info!("Created destination tables in {:?}", args.database);
    Ok(())
}

fn handle_count(args: &cli::CountArgs) -> Result<()> {
    let store = Store::open(&StoreConfig::file(&args.database))
        .with_context(|| format!("Opening database {:?}", args.database))?;
    let mut rows = Vec::with_capacity(RecordKind::ALL.len());
    for kind in RecordKind::ALL {
        let count = store
            .count_for_year(kind, args.year)
            .with_context(|| format!("Counting {kind} rows for {}", args.year))?;
        rows.push(vec![kind.table_name().to_string(), count.to_string()]);
    }
    let headers = vec!["table".to_string(), "rows".to_string()];
    table::print_table(&headers, &rows);
    Ok(())
}
