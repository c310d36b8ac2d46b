mod commands;
mod output;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "stockingest")]
#[command(about = "Ingest daily stock prices from Financial Modeling Prep into SQLite")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run ingestion now over the stored universe or the given tickers
    Ingest(commands::ingest::IngestArgs),
    /// Add tickers to the universe from the FMP screener or by symbol
    Seed(commands::seed::SeedArgs),
    /// Run the weekday scheduler and the admin HTTP endpoint
    Serve(commands::serve::ServeArgs),
    /// List the ticker universe with metadata and price coverage
    Tickers(commands::tickers::TickersArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stockingest=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    match &cli.command {
        Commands::Ingest(args) => commands::ingest::run(args, &format).await?,
        Commands::Seed(args) => commands::seed::run(args, &format).await?,
        Commands::Serve(args) => commands::serve::run(args).await?,
        Commands::Tickers(args) => commands::tickers::run(args, &format)?,
    }

    Ok(())
}
