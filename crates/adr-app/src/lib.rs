//! # adr-app
//!
//! A local web app exposing the recipe registry as a JSON API:
//!
//! - `GET /health`
//! - `GET /api/recipes`
//! - `GET /api/recipes/{name}`
//! - `GET /api/recipes/{name}/run?key=value...`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{AppState, router};
