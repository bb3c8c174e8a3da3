//! HTTP server for the document notary.
//!
//! `POST /api` takes `{user, hashes, action}` (as a JSON body, or as a JSON
//! string in the `data` field of a form post) and answers with
//! `{status, data_type, data}`. `GET /api` reads the same `data` field from
//! the query string.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ServerConfig, DEFAULT_CONTRACT_NAME};
pub use error::{ServerError, ServerResult};
pub use server::NotaryServer;
pub use state::AppState;
