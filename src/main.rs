/// Main entry point for the habit tracker server
///
/// This file loads `.env`, parses command line arguments, sets up logging
/// and starts the HTTP server.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use habit_wave::config::Args;
use habit_wave::HabitTrackerServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // RUST_LOG wins over the command line flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("habit_wave={}", args.log_level())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting habit tracker server");

    let config = args.into_config()?;
    info!("Using database at: {}", config.database_path.display());

    let server = HabitTrackerServer::new(config)?;
    server.run().await?;

    info!("Habit tracker server shutdown complete");
    Ok(())
}
