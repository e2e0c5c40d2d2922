//! Versioned calling campaigns.
//!
//! A campaign is a group of immutable versions sharing a `campaign_group_id`; every edit,
//! status change or archive appends a version and the highest one is current.

mod domain;
mod report;
mod router;
mod service;
mod store;

pub use domain::{Campaign, CampaignDraft, CampaignStatus, CampaignUpdate, NewVersion};
pub use report::{percentage, CampaignAnalytics, CampaignSummary, StatusCount};
pub(crate) use report::round_one;
pub use router::campaign_router;
pub use service::{CampaignService, CampaignStart};
pub use store::attach_batch;
