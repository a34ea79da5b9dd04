//! HTTP clients for the GitHub REST and GraphQL APIs
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and default headers
//! - `http`: rate limiting and retries shared by both APIs
//! - `route`: path templates and query parameters
//! - `rest`: paginated REST requests
//! - `graphql`: named GraphQL query templates

pub mod config;
pub mod graphql;
pub mod http;
pub mod rest;
pub mod route;

pub use config::ClientConfig;
pub use graphql::{format_query, GraphQlClient};
pub use rest::{GetOptions, RestClient, RestResponse};
pub use route::{format_path, route, Params, Route, RouteKind};
