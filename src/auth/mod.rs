//! GitHub token management
//!
//! This module provides functions for managing the GitHub token, including
//! interactive setup, verification, and storage in .env files.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ghastoolkit::auth::{get_auth_status, prompt_token, save_token};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! if !get_auth_status().token_set {
//!     let token = prompt_token()?;
//!     save_token(&token)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod token;

// Re-export main public API
pub use token::{
    clear_token, current_token, get_auth_status, is_valid_token_format, prompt_token, save_token,
    show_auth_status, verify_auth_status, verify_token, AuthStatus,
};
