use chrono::Utc;
use tracing::debug;

use super::summary::{self, ActivityEntry, DashboardAnalytics, DashboardPerformance, DashboardStats};
use crate::calls::CallLog;
use crate::campaigns::CampaignService;
use crate::contacts::ContactService;
use crate::error::AppError;

/// Loads rows from the other services and hands them to the pure aggregations in `summary`.
#[derive(Clone)]
pub struct DashboardService {
    calls: CallLog,
    campaigns: CampaignService,
    contacts: ContactService,
}

impl DashboardService {
    pub fn new(calls: CallLog, campaigns: CampaignService, contacts: ContactService) -> Self {
        Self {
            calls,
            campaigns,
            contacts,
        }
    }

    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        let latest = self.campaigns.latest_all().await?;
        let contacts = self.contacts.count().await?;
        let calls = self.calls.all().await?;
        Ok(summary::stats(&latest, contacts, &calls, Utc::now()))
    }

    pub async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, AppError> {
        let calls = self.calls.all().await?;
        let versions = self.campaigns.all_versions().await?;
        debug!(limit, calls = calls.len(), versions = versions.len(), "building activity feed");
        Ok(summary::recent_activity(&calls, &versions, limit))
    }

    pub async fn analytics(&self, days: u32) -> Result<DashboardAnalytics, AppError> {
        let now = Utc::now();
        let calls = self
            .calls
            .since(now - chrono::Duration::days(i64::from(days)))
            .await?;
        let latest = self.campaigns.latest_all().await?;
        Ok(summary::analytics(&calls, &latest, days, now))
    }

    pub async fn performance(&self) -> Result<DashboardPerformance, AppError> {
        let calls = self.calls.all().await?;
        let latest = self.campaigns.latest_all().await?;
        Ok(summary::performance(&calls, &latest))
    }
}
