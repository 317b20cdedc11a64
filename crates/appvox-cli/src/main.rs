mod commands;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "appvox")]
#[command(about = "App Store review insights command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch reviews for an app, run the analysis pipeline, and persist
    /// every stage to the database.
    Collect {
        /// Numeric App Store app id.
        app_id: String,
        /// Country storefront (ISO 3166-1 alpha-2). Defaults to the
        /// configured country.
        #[arg(long)]
        country: Option<String>,
        /// Maximum number of reviews to collect. Defaults to the configured
        /// limit.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the stored metrics and insights report for an app.
    Report {
        /// Numeric App Store app id.
        app_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = appvox_core::load_app_config()?;
    tracing_subscriber::fmt::init();

    let pool_config = appvox_db::PoolConfig::from_config(&config);
    let pool = appvox_db::connect_pool(&config.database_url, pool_config).await?;
    appvox_db::run_migrations(&pool).await?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Collect {
            app_id,
            country,
            limit,
        } => {
            commands::run_collect(&pool, &config, &app_id, country.as_deref(), limit).await?;
        }
        Commands::Report { app_id } => {
            commands::run_report(&pool, &app_id).await?;
        }
    }

    Ok(())
}
