//! Campaign calling dashboard.
//!
//! Contacts and versioned campaigns are stored in SQLite, dispatched as batches of outbound
//! AI phone calls through the calling provider, and the provider's post-call webhooks are
//! ingested back into call records that feed the dashboard and the follow-up scheduler.

pub mod auth;
pub mod calls;
pub mod campaigns;
pub mod config;
pub mod contacts;
pub mod dashboard;
pub mod db;
pub mod dispatch;
pub mod embedding;
pub mod error;
pub mod features;
pub mod followup;
pub mod http;
pub mod provider;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod users;
pub mod validation;
pub mod webhook;

pub use error::AppError;
pub use routes::api_router;
pub use state::AppContext;
