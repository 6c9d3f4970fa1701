use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use charity_data::database::DatabaseManager;
use charity_data::models::Config;
use charity_data::tools::{all_commands, find_command, run_logged, ImportFlags};

#[derive(Parser)]
#[command(
    name = "charity-data",
    about = "📦 Import UK company, charity and geography datasets",
    long_about = "Downloads the Companies House, Charity Commission and ONS datasets and upserts them into SQLite."
)]
struct Cli {
    /// Path to the SQLite database (defaults to DATABASE_PATH)
    #[arg(long = "db", global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the Companies House basic company data
    #[command(alias = "import_companies")]
    ImportCompanies(ImportFlags),

    /// Import the ONS Code History Database
    #[command(alias = "import_chd")]
    ImportChd(ImportFlags),

    /// Import the Charity Commission for Northern Ireland register
    #[command(alias = "import_ccni")]
    ImportCcni(ImportFlags),

    /// Import the Charity Commission for England & Wales extract
    #[command(alias = "import_ccew")]
    ImportCcew(ImportFlags),

    /// Run an import command and save its log output
    Log {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Print the source metadata of every dataset as JSON
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("charity_data=info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    let (name, flags) = match cli.command {
        Commands::Sources => {
            let sources: Vec<_> = all_commands(&config).iter().map(|c| c.source()).collect();
            println!("{}", serde_json::to_string_pretty(&sources)?);
            return Ok(());
        }
        Commands::Log { command } => {
            let db = DatabaseManager::new(&config.database_path).await?;
            let run = run_logged(&db, &config, &command).await;
            db.close().await;
            let run = run.context("Logged command failed")?;
            info!("📝 Saved command log {} ({})", run.id, run.status.as_str());
            return Ok(());
        }
        Commands::ImportCompanies(flags) => ("import-companies", flags),
        Commands::ImportChd(flags) => ("import-chd", flags),
        Commands::ImportCcni(flags) => ("import-ccni", flags),
        Commands::ImportCcew(flags) => ("import-ccew", flags),
    };

    let command = find_command(&config, name)?;
    let options = flags.resolve(config.debug);
    let db = DatabaseManager::new(&config.database_path).await?;

    let summary = command
        .handle(&db, options)
        .await
        .with_context(|| format!("{} failed", name))?;
    db.close().await;

    for (model, count) in &summary.saved {
        info!("{}: {} saved", model, count);
    }
    for (model, count) in &summary.deleted {
        info!("{}: {} deleted", model, count);
    }
    Ok(())
}
