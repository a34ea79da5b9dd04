//! Command-line interface components
//!
//! This module contains CLI-specific code for ghastoolkit: argument parsing
//! and the command handlers that drive the library.

pub mod args;
pub mod commands;

pub use args::{
    AuthAction, AuthArgs, Cli, CodeScanningAction, CodeScanningArgs, Commands, ConfigAction,
    ConfigArgs, GlobalArgs, GraphQlArgs,
};
pub use commands::{handle_auth, handle_codescanning, handle_config, handle_graphql};
