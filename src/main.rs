use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{CommandFactory, Parser};
use serde_json::{Value, json};
use svbase::import::{self, ImportError, ImportOptions};
use svbase::query::stats;
use svbase::store::SvStore;

const DB_FILE_DEFAULT: &str = "sv_samples.db";

#[derive(Debug)]
struct CliError {
    code: &'static str,
    message: String,
}

impl CliError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn io(code: &'static str, err: std::io::Error) -> Self {
        Self::new(code, err.to_string())
    }
}

impl From<rusqlite::Error> for CliError {
    fn from(value: rusqlite::Error) -> Self {
        Self::new("sqlite_error", value.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::new("json_error", value.to_string())
    }
}

impl From<ImportError> for CliError {
    fn from(value: ImportError) -> Self {
        let code = match &value {
            ImportError::Io(_) => "io_error",
            ImportError::Table(_) => "table_error",
            ImportError::Store(_) => "sqlite_error",
            ImportError::BadAnnotationMode { .. } => "bad_annotation_mode",
        };
        Self::new(code, value.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "svbase")]
#[command(about = "Normalizes AnnotSV annotation tables into a relational SQLite store")]
struct Cli {
    /// Provision the schema at the target store; safe to repeat.
    #[arg(long)]
    create: bool,
    /// Import an AnnotSV tab-separated export into the store.
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,
    /// Store location.
    #[arg(long, value_name = "PATH", default_value = DB_FILE_DEFAULT)]
    db: PathBuf,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let payload = json!({
                "error": {
                    "code": err.code,
                    "message": err.message,
                }
            });
            eprintln!("{payload}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    if cli.create {
        return cmd_create(&cli.db);
    }
    if let Some(file) = cli.import.as_deref() {
        return cmd_import(&cli.db, file);
    }
    Cli::command()
        .print_help()
        .map_err(|err| CliError::io("help_error", err))
}

fn cmd_create(db: &Path) -> Result<(), CliError> {
    let _ = SvStore::create(db)?;
    print_json(&json!({
        "status": "ok",
        "action": "create",
        "db": db,
    }))
}

fn cmd_import(db: &Path, file: &Path) -> Result<(), CliError> {
    if !file.exists() {
        return Err(CliError::new(
            "input_not_found",
            format!("input file not found: {}", file.display()),
        ));
    }
    if !db.exists() {
        return Err(CliError::new(
            "store_not_found",
            format!("no store at {}; run `svbase --create` first", db.display()),
        ));
    }

    let store = SvStore::open(db)?;
    let counts = import::run(&store, file, &ImportOptions::default())?;
    let report = stats::collect(&store)?;
    let stats = serde_json::to_value(&report)?;

    print_json(&json!({
        "status": "ok",
        "action": "import",
        "db": db,
        "file": file,
        "rows": {
            "total": counts.rows,
            "full": counts.full_rows,
            "split": counts.split_rows,
            "skipped": counts.skipped_rows,
            "defaulted_coordinates": counts.defaulted_coordinates,
        },
        "new": {
            "samples": counts.new_samples,
            "genes": counts.new_genes,
            "svs": counts.new_svs,
            "sample_links": counts.new_sample_links,
            "gene_links": counts.new_gene_links,
            "tx_links": counts.new_tx_links,
        },
        "stats": stats,
        "finished_at": now_iso8601(),
    }))
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string(value)?;
    println!("{rendered}");
    Ok(())
}
