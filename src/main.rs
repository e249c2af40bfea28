use product_admin::{
    api::{auth::TokenKeys, ApiServer},
    config::Config,
    engine::Engine,
    has_csv_extension,
    logging::init_tracing,
    store::{ProductStore, SqliteStore},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{stdout, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "product-admin", version, about = "Product catalogue import and reporting")]
struct Cli {
    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bulk import products from a CSV file
    Import {
        /// Path to the CSV file
        file: PathBuf,
    },
    /// Write the per-category summary report
    Report {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the HTTP API
    Serve,
    /// Mint an access token for the HTTP API
    Token {
        /// Identity to put in the token
        subject: String,
        /// Lifetime in seconds (default: TOKEN_TTL_SECS)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("info")?;

    let mut config = Config::from_env()?;
    if let Some(path) = cli.database {
        config.database_path = path;
    }

    match cli.command {
        Command::Import { file } => import(&config, &file),
        Command::Report { output } => report(&config, output.as_deref()),
        Command::Serve => serve(&config).await,
        Command::Token { subject, ttl_secs } => {
            let keys = TokenKeys::new(config.require_secret()?);
            let token = keys.issue(&subject, ttl_secs.unwrap_or(config.token_ttl_secs))?;
            println!("{}", token);
            Ok(())
        }
    }
}

fn open_engine(config: &Config) -> Result<Engine<SqliteStore>> {
    let store = SqliteStore::open(&config.database_path).with_context(|| {
        format!(
            "Failed to open database {}",
            config.database_path.display()
        )
    })?;
    Ok(Engine::new(store))
}

fn validate_csv_file(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("File '{}' does not exist", path.display());
    }

    if !has_csv_extension(path) {
        bail!("File '{}' is not a CSV file", path.display());
    }

    Ok(())
}

fn import(config: &Config, path: &Path) -> Result<()> {
    validate_csv_file(path)?;
    tracing::info!(file = %path.display(), "Importing products");

    let engine = open_engine(config)?;
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let summary = engine.import_csv(BufReader::new(file))?;

    println!(
        "Imported {} rows: {} created, {} updated",
        summary.rows, summary.created, summary.updated
    );
    Ok(())
}

fn report(config: &Config, output: Option<&Path>) -> Result<()> {
    let engine = open_engine(config)?;

    match output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            engine.dump_summary(file)?;
            tracing::info!(file = %path.display(), "Summary report written");
        }
        None => engine.dump_summary(stdout())?,
    }
    Ok(())
}

async fn serve(config: &Config) -> Result<()> {
    let server = ApiServer::from_config(config)?;
    let store: Arc<dyn ProductStore> = Arc::new(
        SqliteStore::open(&config.database_path).with_context(|| {
            format!(
                "Failed to open database {}",
                config.database_path.display()
            )
        })?,
    );

    server.run(Engine::new(store)).await
}
