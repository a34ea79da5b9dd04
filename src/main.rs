//! ghastoolkit CLI application
//!
//! Command-line interface for GitHub Advanced Security: Code Scanning alerts,
//! analyses, SARIF downloads, CodeQL databases and named GraphQL queries.

use std::process;

use tracing::info;
use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

use ghastoolkit::cli::{
    handle_auth, handle_codescanning, handle_config, handle_graphql, Cli, Commands,
};
use ghastoolkit::config::{AppConfig, LoggingConfig};
use ghastoolkit::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load GITHUB_TOKEN and friends from .env if present
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // Config errors are reported by the command itself once logging is up
    let logging = AppConfig::load(cli.global.config.clone())
        .await
        .map(|config| config.logging)
        .unwrap_or_default();
    init_logging(&cli, &logging);

    info!("ghastoolkit v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::CodeScanning(args) => {
            info!("Executing codescanning command");
            handle_codescanning(args, &cli.global).await
        }
        Commands::GraphQl(args) => {
            info!("Executing graphql command");
            handle_graphql(args, &cli.global).await
        }
        Commands::Auth(args) => {
            info!("Executing auth command");
            handle_auth(args, &cli.global).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, &cli.global).await
        }
    }
}

/// Initialize logging from the verbosity flags, falling back to `logging.level`
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let log_level = cli.log_level(&logging.level);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("ghastoolkit={}", log_level).parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
