//! Call recipients, bulk creation and CSV import.

mod domain;
mod import;
mod router;
mod service;
mod store;

pub use domain::{
    BatchOutcome, ContactDraft, ContactRecord, ContactStatistics, ContactUpdate, ImportSummary,
};
pub use import::{parse_contacts, ImportError};
pub use router::contact_router;
pub use service::{ContactService, MAX_BATCH_SIZE};
