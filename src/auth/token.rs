//! GitHub token management
//!
//! Tokens are read from `GITHUB_TOKEN` (a `.env` file is loaded at startup)
//! and can be stored in `.env` with owner-only permissions.

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::app::client::{ClientConfig, RestClient};
use crate::app::github::GitHub;
use crate::constants::{auth, env as env_constants};
use crate::errors::{AuthError, AuthResult};

/// Token status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    /// Whether `GITHUB_TOKEN` is set
    pub token_set: bool,
    /// Whether the token looks like a GitHub token
    pub token_format_valid: bool,
    /// Whether .env file exists in current directory
    pub dotenv_file_exists: bool,
    /// Login of the token owner (None = not verified)
    pub verified_login: Option<String>,
}

impl AuthStatus {
    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match (self.token_set, self.token_format_valid, &self.verified_login) {
            (false, _, _) => "Missing token - run 'auth setup' to configure".to_string(),
            (true, _, Some(login)) => format!("Token configured and verified as {}", login),
            (true, true, None) => "Token configured but not verified".to_string(),
            (true, false, None) => "Token configured but has an unexpected format".to_string(),
        }
    }
}

/// Check current token status
pub fn get_auth_status() -> AuthStatus {
    let token = env::var(env_constants::TOKEN).ok().filter(|t| !t.is_empty());
    AuthStatus {
        token_set: token.is_some(),
        token_format_valid: token.as_deref().is_some_and(is_valid_token_format),
        dotenv_file_exists: Path::new(auth::DOTENV_FILE).exists(),
        verified_login: None,
    }
}

/// Token from the environment
pub fn current_token() -> AuthResult<String> {
    match env::var(env_constants::TOKEN) {
        Ok(token) if !token.is_empty() => Ok(token),
        Ok(_) | Err(env::VarError::NotPresent) => Err(AuthError::MissingToken),
        Err(e) => Err(AuthError::EnvVar(e)),
    }
}

/// Classic 40-hex tokens and prefixed (`ghp_`, `github_pat_`, ...) tokens
pub fn is_valid_token_format(token: &str) -> bool {
    if let Some(prefix) = auth::TOKEN_PREFIXES.iter().find(|p| token.starts_with(**p)) {
        let rest = &token[prefix.len()..];
        return !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    }

    token.len() == auth::CLASSIC_TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// Prompt user for a token without echoing it
pub fn prompt_token() -> AuthResult<String> {
    let token = rpassword::prompt_password("GitHub Token: ")?;
    let token = token.trim().to_string();

    if token.is_empty() {
        return Err(AuthError::InvalidToken {
            reason: "Token cannot be empty".to_string(),
        });
    }
    if !is_valid_token_format(&token) {
        return Err(AuthError::InvalidToken {
            reason: "Expected a classic token or one starting with ghp_, github_pat_, ..."
                .to_string(),
        });
    }

    Ok(token)
}

/// Save the token to `.env` in the current directory
pub fn save_token(token: &str) -> AuthResult<()> {
    save_token_to(Path::new(auth::DOTENV_FILE), token)?;
    env::set_var(env_constants::TOKEN, token);
    Ok(())
}

/// Write `GITHUB_TOKEN=<token>` to `env_path`, keeping every other line
pub fn save_token_to(env_path: &Path, token: &str) -> AuthResult<()> {
    let key = format!("{}=", env_constants::TOKEN);
    let mut lines = read_lines_except(env_path, &key)?;
    lines.push(format!("{}{}", key, token));
    write_lines(env_path, &lines)?;
    Ok(())
}

/// Remove the token from `.env` and the current environment
pub fn clear_token() -> AuthResult<bool> {
    let removed = clear_token_from(Path::new(auth::DOTENV_FILE))?;
    env::remove_var(env_constants::TOKEN);
    Ok(removed)
}

/// Drop the `GITHUB_TOKEN=` line from `env_path`; returns whether one was present
pub fn clear_token_from(env_path: &Path) -> AuthResult<bool> {
    if !env_path.exists() {
        return Ok(false);
    }

    let key = format!("{}=", env_constants::TOKEN);
    let before = fs::read_to_string(env_path)?.lines().count();
    let lines = read_lines_except(env_path, &key)?;
    let removed = lines.len() != before;
    if removed {
        write_lines(env_path, &lines)?;
    }
    Ok(removed)
}

fn read_lines_except(env_path: &Path, key: &str) -> io::Result<Vec<String>> {
    if !env_path.exists() {
        return Ok(Vec::new());
    }
    Ok(fs::read_to_string(env_path)?
        .lines()
        .filter(|line| !line.trim().starts_with(key))
        .map(str::to_string)
        .collect())
}

fn write_lines(env_path: &Path, lines: &[String]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(env_path)?;

    for line in lines {
        writeln!(file, "{}", line)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(auth::ENV_FILE_PERMISSIONS);
        file.set_permissions(perms)?;
    }

    Ok(())
}

/// Verify a token by asking the API who it belongs to
///
/// Returns the login of the token owner.
pub async fn verify_token(github: &GitHub, config: &ClientConfig) -> AuthResult<String> {
    if github.token().is_none() {
        return Err(AuthError::MissingToken);
    }

    let rest = RestClient::new(github, config)?;
    let user = rest.current_user().await?;
    let login = user
        .get("login")
        .and_then(|l| l.as_str())
        .unwrap_or("unknown")
        .to_string();

    tracing::info!("Token verified for {}", login);
    Ok(login)
}

/// Fill in the token owner's login by verifying against the API
pub async fn verify_auth_status(
    mut status: AuthStatus,
    github: &GitHub,
    config: &ClientConfig,
) -> AuthResult<AuthStatus> {
    if status.token_set {
        status.verified_login = Some(verify_token(github, config).await?);
    }
    Ok(status)
}

/// Display token status
pub fn show_auth_status(status: &AuthStatus) {
    println!("GitHub Authentication Status");
    println!("============================");
    println!(
        "{}: {}",
        env_constants::TOKEN,
        if status.token_set { "set" } else { "not set" }
    );
    println!(
        ".env file: {}",
        if status.dotenv_file_exists {
            "present"
        } else {
            "not found"
        }
    );
    println!();
    println!("Status: {}", status.status_message());
}
