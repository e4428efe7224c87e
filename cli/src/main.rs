use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use mason_core::{SchemaCache, SchemaLayout, SqlOptions, TableSnapshot, ValueQuoting};
use mason_sqlite::SchemaSync;
use rusqlite::Connection;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Output format for `sync`.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SyncFormat {
    Json,
    Sql,
}

#[derive(Debug, Parser)]
#[command(name = "sqlite-mason")]
#[command(about = "Render, commit, and mirror SQLite table schemas")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print CREATE TABLE and INSERT statements for a layout file.
    Render(RenderArgs),
    /// Apply a layout file and commit its tables and records to a database.
    Commit(CommitArgs),
    /// Mirror a database into the cache and print it.
    Sync(SyncArgs),
    /// List the tables of a database with their row counts.
    Status(StatusArgs),
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Layout YAML file.
    #[arg(long)]
    layout: PathBuf,
    /// Only render this table.
    #[arg(long)]
    table: Option<String>,
    /// Double single quotes inside text values, overriding the layout.
    #[arg(long)]
    escape_quotes: bool,
}

#[derive(Debug, Args)]
struct CommitArgs {
    /// Layout YAML file.
    #[arg(long)]
    layout: PathBuf,
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
}

#[derive(Debug, Args)]
struct SyncArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Output format.
    #[arg(long, default_value = "sql")]
    format: SyncFormat,
}

#[derive(Debug, Args)]
struct StatusArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Render(args) => run_render(args),
        Command::Commit(args) => run_commit(args),
        Command::Sync(args) => run_sync(args),
        Command::Status(args) => run_status(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_cache(path: &Path, escape_quotes: bool) -> Result<SchemaCache, String> {
    let layout = SchemaLayout::load(path)
        .map_err(|e| format!("Failed to load layout '{}': {e}", path.display()))?;
    let mut cache = layout
        .build_cache()
        .map_err(|e| format!("Invalid layout '{}': {e}", path.display()))?;
    if escape_quotes {
        cache.set_options(SqlOptions {
            quoting: ValueQuoting::Escaped,
        });
    }
    Ok(cache)
}

fn open_database(path: &Path) -> Result<Connection, String> {
    Connection::open(path).map_err(|e| format!("Failed to open database '{}': {e}", path.display()))
}

fn run_render(args: RenderArgs) -> Result<(), String> {
    let cache = load_cache(&args.layout, args.escape_quotes)?;

    let names: Vec<&str> = match &args.table {
        Some(table) if cache.contains_table(table) => vec![table.as_str()],
        Some(table) => return Err(format!("Table '{table}' is not defined in the layout")),
        None => cache.table_names().collect(),
    };

    print!("{}", render_tables(&cache, &names));
    Ok(())
}

fn run_commit(args: CommitArgs) -> Result<(), String> {
    let cache = load_cache(&args.layout, false)?;
    let conn = open_database(&args.db)?;

    let report = SchemaSync::new(&conn)
        .commit_all(&cache)
        .map_err(|e| format!("Commit failed: {e}"))?;
    info!(db = %args.db.display(), "commit finished");

    println!("Commit complete:");
    println!("  Tables created: {}", report.schemas_committed);
    println!("  Tables with records: {}", report.tables_with_records);
    println!("  Records written: {}", report.records_committed);
    Ok(())
}

fn run_sync(args: SyncArgs) -> Result<(), String> {
    let conn = open_database(&args.db)?;
    let mut cache = SchemaCache::new();
    SchemaSync::new(&conn)
        .synchronize_from_database(&mut cache)
        .map_err(|e| format!("Sync failed: {e}"))?;

    match args.format {
        SyncFormat::Json => {
            let snapshots: Vec<TableSnapshot> = cache
                .table_names()
                .filter_map(|name| cache.export_table_snapshot(name))
                .collect();
            let json = serde_json::to_string_pretty(&snapshots)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            println!("{json}");
        }
        SyncFormat::Sql => {
            let names: Vec<&str> = cache.table_names().collect();
            print!("{}", render_tables(&cache, &names));
        }
    }
    Ok(())
}

fn run_status(args: StatusArgs) -> Result<(), String> {
    let conn = open_database(&args.db)?;
    let sync = SchemaSync::new(&conn);
    let tables = sync
        .list_tables()
        .map_err(|e| format!("Failed to list tables: {e}"))?;

    println!("Database Status:");
    println!("  Tables: {}", tables.len());
    for table in &tables {
        let count = sync
            .row_count(table)
            .map_err(|e| format!("Failed to count rows in '{table}': {e}"))?;
        println!("  {table}: {count} rows");
    }
    Ok(())
}

/// Renders each table's CREATE statement, followed by its INSERT statement
/// when it has records, with a blank line between tables.
fn render_tables(cache: &SchemaCache, names: &[&str]) -> String {
    let blocks: Vec<String> = names
        .iter()
        .map(|name| {
            let mut block = cache.create_table_sql(name);
            let insert = cache.bulk_insert_sql(name, None);
            if !insert.is_empty() {
                block.push('\n');
                block.push_str(&insert);
            }
            block.push('\n');
            block
        })
        .collect();
    blocks.join("\n")
}
