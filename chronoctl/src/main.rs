//! Command-line interface for chronofact

use clap::Parser;
use std::process;
use tracing::{error, info, Level};

mod cli;
mod client;
mod commands;
mod config;
mod output;

use cli::*;
use config::ChronoctlConfig;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt().with_max_level(log_level).with_target(false).init();

    let config = match ChronoctlConfig::load(&args.config).await {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let config = config.with_overrides(&args);
    let format = args.format.clone().unwrap_or_else(|| config.default_format.clone());

    info!("Starting chronoctl with endpoint: {}", config.endpoint);

    let result = match args.command {
        Commands::Health => commands::health::handle_health_command(&config).await,
        Commands::Ingest { name, content, source, source_description, source_url, uuid } => {
            commands::ingest::handle_ingest_command(&config, name, content, source, source_description, source_url, uuid, &format).await
        }
        Commands::Search { query, search_type, max_results, entity_type, center_node_uuid } => {
            commands::search::handle_search_command(&config, query, search_type, max_results, entity_type, center_node_uuid, &format).await
        }
        Commands::Facts { command } => commands::facts::handle_facts_command(command, &config, &format).await,
        Commands::Analysis { command } => commands::analysis::handle_analysis_command(command, &config, &format).await,
    };

    match result {
        Ok(_) => {
            if !args.quiet {
                info!("Command completed successfully");
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            process::exit(1);
        }
    }
}
