//! # adr-client
//!
//! HTTP [`QueryClient`](adr_core::QueryClient) implementation for the
//! ActiveData backend.
//!
//! - JSON POST of the recipe's query body
//! - request timeout and user agent from `[client]` config
//! - exponential-backoff retries for transient failures

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod error;

pub use client::ActiveDataClient;
pub use error::{Error, Result};
