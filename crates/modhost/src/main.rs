//! Demonstration host for the mod loader.
//!
//! Loads every mod found under the configured directory, runs them through
//! pre-init, init and post-init, then waits for a shutdown signal.

mod app;
mod cli;
mod config;
mod logging;
mod signals;
mod staging;

use app::Application;
use cli::CliArgs;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to start application: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
