//! Command handlers for the ghastoolkit CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! to the toolkit: configuration is resolved once per invocation, then the
//! matching REST or GraphQL client is built from it.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::client::graphql::cursor_argument;
use crate::app::{
    AlertInstance, Analysis, ClientConfig, CodeQLDatabase, CodeScanning,
    CodeScanningAlert, GitHub, GraphQlClient, RestClient,
};
use crate::auth::{
    clear_token, current_token, get_auth_status, prompt_token, save_token, show_auth_status,
    verify_auth_status, verify_token,
};
use crate::cli::{
    AuthAction, AuthArgs, CodeScanningAction, CodeScanningArgs, ConfigAction, ConfigArgs,
    GlobalArgs, GraphQlArgs,
};
use crate::config::AppConfig;
use crate::constants::graphql;
use crate::errors::{AppError, Result};

/// Everything a handler needs to talk to GitHub
struct Context {
    github: GitHub,
    client_config: ClientConfig,
    config: AppConfig,
}

impl Context {
    /// Resolve configuration (file, environment, flags) and the token
    async fn load(global: &GlobalArgs) -> Result<Self> {
        let mut config = AppConfig::load(global.config.clone()).await?;
        config.apply_overrides(&global.overrides());

        let token = current_token().ok();
        if token.is_none() {
            warn!("GITHUB_TOKEN is not set; only public data is reachable");
        }

        let github = config.github(token)?;
        debug!("Using {:?}", github);

        Ok(Self {
            github,
            client_config: config.client.to_runtime_config(),
            config,
        })
    }

    fn rest(&self) -> Result<RestClient> {
        Ok(RestClient::new(&self.github, &self.client_config)?)
    }
}

/// Run `future` behind a spinner when stderr is a terminal
async fn with_spinner<F, T>(message: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    if !atty::is(atty::Stream::Stderr) {
        return future.await;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style.tick_strings(&["◐", "◓", "◑", "◒", "●"]));
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = future.await;
    spinner.finish_and_clear();
    result
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::generic(format!("Failed to render JSON: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

fn display_alerts(alerts: &[CodeScanningAlert]) {
    if alerts.is_empty() {
        println!("No alerts found");
        return;
    }

    println!(
        "{:<6} {:<10} {:<10} {:<40} {}",
        "#", "STATE", "SEVERITY", "RULE", "LOCATION"
    );
    for alert in alerts {
        println!(
            "{:<6} {:<10} {:<10} {:<40} {}",
            alert.number,
            alert.state,
            alert.severity(),
            alert.rule.id.as_deref().unwrap_or("-"),
            alert.location().unwrap_or_else(|| "-".to_string())
        );
    }
    println!();
    println!("{} alert(s)", alerts.len());
}

fn display_alert(alert: &CodeScanningAlert) {
    println!("Alert #{} ({})", alert.number, alert.state);
    println!("  Rule:     {}", alert.rule.id.as_deref().unwrap_or("-"));
    if let Some(description) = &alert.rule.description {
        println!("  Summary:  {}", description);
    }
    println!("  Severity: {}", alert.severity());
    println!("  Tool:     {}", alert.tool.name.as_deref().unwrap_or("-"));
    if let Some(location) = alert.location() {
        println!("  Location: {}", location);
    }
    if let Some(created) = alert.created_at {
        println!("  Created:  {}", created.format("%Y-%m-%d %H:%M"));
    }
    if let Some(url) = &alert.html_url {
        println!("  URL:      {}", url);
    }
}

fn display_instances(instances: &[AlertInstance]) {
    if instances.is_empty() {
        println!("No instances found");
        return;
    }

    for instance in instances {
        let location = match (&instance.location.path, instance.location.start_line) {
            (Some(path), Some(line)) => format!("{}:{}", path, line),
            (Some(path), None) => path.clone(),
            _ => "-".to_string(),
        };
        println!(
            "{:<30} {:<10} {}",
            instance.reference.as_deref().unwrap_or("-"),
            instance.state.map(|s| s.as_str()).unwrap_or("-"),
            location
        );
    }
}

fn display_analyses(analyses: &[Analysis]) {
    if analyses.is_empty() {
        println!("No analyses found");
        return;
    }

    println!(
        "{:<12} {:<16} {:<8} {:<30} {}",
        "ID", "TOOL", "RESULTS", "REF", "CREATED"
    );
    for analysis in analyses {
        println!(
            "{:<12} {:<16} {:<8} {:<30} {}",
            analysis.id,
            analysis.tool_name().unwrap_or("-"),
            analysis.results_count,
            analysis.reference.as_deref().unwrap_or("-"),
            analysis
                .created_at
                .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn display_databases(databases: &[CodeQLDatabase]) {
    if databases.is_empty() {
        println!("No CodeQL databases found");
        return;
    }

    for database in databases {
        println!(
            "{:<12} {:<20} {:>10.1} MB  {}",
            database.language.as_deref().unwrap_or("-"),
            database.name.as_deref().unwrap_or("-"),
            database.size as f64 / (1024.0 * 1024.0),
            database.commit_oid.as_deref().unwrap_or("-")
        );
    }
}

/// Handle Code Scanning commands
pub async fn handle_codescanning(args: CodeScanningArgs, global: &GlobalArgs) -> Result<()> {
    let context = Context::load(global).await?;
    let codescanning = CodeScanning::new(context.rest()?)?;
    let reference = codescanning.repository().reference.clone();
    info!("Code Scanning for {}", codescanning.repository());

    match args.action {
        CodeScanningAction::Alerts { state, tool, org } => {
            let alerts = if org {
                with_spinner(
                    "Fetching organization alerts...",
                    codescanning.get_organization_alerts(state),
                )
                .await?
            } else {
                with_spinner(
                    "Fetching alerts...",
                    codescanning.get_alerts(state, tool.as_deref(), reference.as_deref()),
                )
                .await?
            };

            if global.json {
                print_json(&alerts)?;
            } else {
                display_alerts(&alerts);
            }
        }
        CodeScanningAction::Alert { number } => {
            let alert = codescanning.get_alert(number).await?;
            if global.json {
                print_json(&alert)?;
            } else {
                display_alert(&alert);
            }
        }
        CodeScanningAction::Instances { number } => {
            let instances = codescanning
                .get_alert_instances(number, reference.as_deref())
                .await?;
            if global.json {
                print_json(&instances)?;
            } else {
                display_instances(&instances);
            }
        }
        CodeScanningAction::PrAlerts { base } => {
            if !codescanning.repository().is_in_pull_request() {
                warn!(
                    "Reference {:?} is not a pull request; nothing to compare",
                    reference
                );
            }
            let alerts = with_spinner(
                "Comparing pull request alerts...",
                codescanning.get_alerts_in_pr(&base),
            )
            .await?;

            if global.json {
                print_json(&alerts)?;
            } else {
                display_alerts(&alerts);
            }
        }
        CodeScanningAction::Analyses { tool, latest } => {
            let analyses = if latest {
                codescanning
                    .get_latest_analyses(None, tool.as_deref())
                    .await?
            } else {
                codescanning.get_analyses(None, tool.as_deref()).await?
            };

            if global.json {
                print_json(&analyses)?;
            } else {
                display_analyses(&analyses);
            }
        }
        CodeScanningAction::Sarif { output, id, tool } => {
            let sarif_id = match id {
                Some(id) => id,
                None => codescanning
                    .get_latest_analyses(None, tool.as_deref())
                    .await?
                    .first()
                    .map(|analysis| analysis.id)
                    .ok_or_else(|| AppError::generic("No analyses found to download"))?,
            };

            with_spinner(
                "Downloading SARIF...",
                codescanning.download_sarif(&output, sarif_id),
            )
            .await?;
            println!("Saved analysis {} to {}", sarif_id, output.display());
        }
        CodeScanningAction::Databases { language } => {
            let databases = match language {
                Some(language) => vec![codescanning.get_codeql_database(&language).await?],
                None => codescanning.get_codeql_databases().await?,
            };

            if global.json {
                print_json(&databases)?;
            } else {
                display_databases(&databases);
            }
        }
    }

    Ok(())
}

/// Variables the bundled queries use: `owner`, `repo`, empty cursors and
/// the nested page size
fn default_query_vars(github: &GitHub) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    if let Some(repository) = github.repository() {
        vars.insert("owner".to_string(), repository.owner.clone());
        vars.insert("repo".to_string(), repository.repo.clone());
    }
    for name in graphql::CURSOR_VARIABLES {
        vars.insert(name.to_string(), cursor_argument(None));
    }
    vars.insert(
        "dependencies_first".to_string(),
        graphql::DEPENDENCIES_PAGE_SIZE.to_string(),
    );
    vars
}

/// `--var` value as substituted into a query; cursors become `after:` arguments
fn query_var_value(key: &str, value: String) -> String {
    if graphql::CURSOR_VARIABLES.contains(&key) {
        cursor_argument(Some(value.as_str()).filter(|v| !v.is_empty()))
    } else {
        value
    }
}

/// Handle the GraphQL command
pub async fn handle_graphql(args: GraphQlArgs, global: &GlobalArgs) -> Result<()> {
    let context = Context::load(global).await?;
    let mut client = GraphQlClient::new(&context.github, &context.client_config)?;
    let loaded = client
        .load_queries(&context.config.graphql.query_paths)
        .await?;
    debug!("Loaded {} query file(s)", loaded);

    let name = match args.name {
        Some(name) if !args.list => name,
        _ => {
            for name in client.query_names() {
                println!("{}", name);
            }
            return Ok(());
        }
    };

    let mut vars = default_query_vars(&context.github);
    for (key, value) in args.vars {
        let value = query_var_value(&key, value);
        vars.insert(key, value);
    }

    let result = with_spinner("Running query...", client.query(&name, &vars)).await?;
    print_json(&result)
}

/// Handle token management commands
pub async fn handle_auth(args: AuthArgs, global: &GlobalArgs) -> Result<()> {
    match args.action {
        AuthAction::Setup { force } => {
            if force || !get_auth_status().token_set {
                let token = prompt_token()?;
                save_token(&token)?;
                println!("Token saved to .env");
            } else {
                println!("Token already configured. Use --force to replace it.");
            }
        }
        AuthAction::Verify => {
            let context = Context::load(global).await?;
            let login = with_spinner(
                "Verifying token...",
                verify_token(&context.github, &context.client_config),
            )
            .await?;
            println!("Token verified as {}", login);
        }
        AuthAction::Status { verify } => {
            let mut status = get_auth_status();
            if verify && status.token_set {
                let context = Context::load(global).await?;
                status = with_spinner(
                    "Verifying token...",
                    verify_auth_status(status, &context.github, &context.client_config),
                )
                .await?;
            }
            show_auth_status(&status);
        }
        AuthAction::Clear => {
            if clear_token()? {
                println!("Removed GITHUB_TOKEN from .env");
            } else {
                println!("No stored token found");
            }
        }
    }

    Ok(())
}

/// Handle configuration commands
pub async fn handle_config(args: ConfigArgs, global: &GlobalArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { path } => {
            let (path, created) = AppConfig::initialize(path).await?;
            if created {
                println!("Created configuration file: {}", path.display());
            } else {
                println!("Configuration file already exists: {}", path.display());
            }
        }
        ConfigAction::Show => {
            let mut config = AppConfig::load(global.config.clone()).await?;
            config.apply_overrides(&global.overrides());
            if global.json {
                print_json(&config)?;
            } else {
                print!("{}", config.to_toml()?);
            }
        }
    }

    Ok(())
}
