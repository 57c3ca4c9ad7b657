//! Home Price Estimator CLI
//!
//! A command-line client for requesting price estimates and inspecting
//! the estimator service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{estimate, locations, status};

/// Home Price Estimator CLI
#[derive(Parser)]
#[command(name = "hpe")]
#[command(author, version, about = "CLI for the Home Price Estimator", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via HPE_API_URL env var)
    #[arg(long, env = "HPE_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the price of a property in Lakhs
    Estimate {
        /// Neighborhood name (case-insensitive)
        #[arg(long, short)]
        location: String,

        /// Total area in square feet
        #[arg(long)]
        sqft: f64,

        /// Number of bedrooms (BHK)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        bhk: u32,

        /// Number of bathrooms
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        bath: u32,
    },

    /// List known locations
    Locations {
        /// Only show locations containing this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show the loaded model
    Model,

    /// Show service health and readiness
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load()?;
    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(output::OutputFormat::from_name)
        })
        .unwrap_or_default();

    let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;

    match cli.command {
        Commands::Estimate {
            location,
            sqft,
            bhk,
            bath,
        } => {
            let request = client::EstimateRequest {
                location,
                sqft,
                bhk,
                bath,
            };
            estimate::run_estimate(&client, request, format).await?;
        }
        Commands::Locations { filter } => {
            locations::list_locations(&client, filter, format).await?;
        }
        Commands::Model => {
            locations::show_model(&client, format).await?;
        }
        Commands::Status => {
            status::show_status(&client, format).await?;
        }
    }

    Ok(())
}
