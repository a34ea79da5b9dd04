//! Command-line argument parsing for ghastoolkit
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::AlertState;
use crate::config::Overrides;

/// ghastoolkit - GitHub Advanced Security toolkit
#[derive(Parser, Debug)]
#[command(
    name = "ghastoolkit",
    version,
    about = "GitHub Advanced Security toolkit",
    long_about = "Query GitHub Code Scanning alerts, analyses, SARIF and CodeQL databases.
Works against GitHub.com and GitHub Enterprise Server with a shared REST rate limit."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - only errors are logged
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path (TOML or YAML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// GitHub instance URL
    #[arg(long, global = true, value_name = "URL")]
    pub instance: Option<String>,

    /// Repository (owner/repo[@branch])
    #[arg(short, long, global = true, value_name = "REPO")]
    pub repository: Option<String>,

    /// Full git reference (e.g. refs/pull/1/merge)
    #[arg(long = "ref", global = true, value_name = "REF")]
    pub reference: Option<String>,

    /// Print raw JSON instead of a summary
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Code Scanning alerts, analyses and CodeQL databases
    #[command(name = "codescanning")]
    CodeScanning(CodeScanningArgs),

    /// Run a named GraphQL query
    #[command(name = "graphql")]
    GraphQl(GraphQlArgs),

    /// Manage the GitHub token
    Auth(AuthArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for Code Scanning commands
#[derive(Args, Debug)]
pub struct CodeScanningArgs {
    #[command(subcommand)]
    pub action: CodeScanningAction,
}

/// Code Scanning actions
#[derive(Subcommand, Debug)]
pub enum CodeScanningAction {
    /// List alerts
    Alerts {
        /// Alert state (open, closed, dismissed, fixed)
        #[arg(short, long, default_value = "open")]
        state: AlertState,

        /// Only alerts from this tool
        #[arg(long)]
        tool: Option<String>,

        /// List alerts for the whole organization
        #[arg(long)]
        org: bool,
    },

    /// Show a single alert
    Alert {
        /// Alert number
        number: u64,
    },

    /// List instances of an alert
    Instances {
        /// Alert number
        number: u64,
    },

    /// Alerts introduced by the current pull request
    PrAlerts {
        /// Base reference to compare against
        #[arg(short, long)]
        base: String,
    },

    /// List analyses
    Analyses {
        /// Only analyses from this tool
        #[arg(long)]
        tool: Option<String>,

        /// Only the latest analysis per tool
        #[arg(long)]
        latest: bool,
    },

    /// Download a SARIF document
    Sarif {
        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Analysis id (defaults to the latest analysis of --tool or any tool)
        #[arg(long)]
        id: Option<u64>,

        /// Tool used to pick the latest analysis
        #[arg(long)]
        tool: Option<String>,
    },

    /// List CodeQL databases
    Databases {
        /// Only the database for this language
        #[arg(short, long)]
        language: Option<String>,
    },
}

/// Arguments for GraphQL queries
#[derive(Args, Debug)]
pub struct GraphQlArgs {
    /// Query name (file stem of a .graphql file or a bundled query)
    pub name: Option<String>,

    /// Template variable, repeatable (key=value)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// List the available queries
    #[arg(long)]
    pub list: bool,
}

/// Arguments for token management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Token actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Store a GitHub token in .env
    Setup {
        /// Replace an existing token
        #[arg(short, long)]
        force: bool,
    },

    /// Verify the current token against the API
    Verify,

    /// Show token status
    Status {
        /// Also verify the token against the API
        #[arg(long)]
        verify: bool,
    },

    /// Remove the stored token
    Clear,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Target path (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },

    /// Print the effective configuration
    Show,
}

/// Parses `key=value`
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level requested by `--quiet`, `--verbose` or `--very-verbose`
    pub fn flag_log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }

    /// Effective log level: flags win over the configured `logging.level`
    pub fn log_level(&self, configured: &str) -> tracing::Level {
        self.flag_log_level()
            .or_else(|| configured.parse().ok())
            .unwrap_or(tracing::Level::WARN)
    }
}

impl GlobalArgs {
    /// Flags that override configuration values
    pub fn overrides(&self) -> Overrides {
        Overrides {
            instance: self.instance.clone(),
            repository: self.repository.clone(),
            reference: self.reference.clone(),
        }
    }
}
