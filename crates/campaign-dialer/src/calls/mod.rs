//! Call records produced from provider webhooks.

mod domain;
mod router;
mod service;
mod store;

pub use domain::{CallFilter, CallOutcome, CallRecord, Sentiment};
pub use router::call_router;
pub use service::CallLog;
