use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::domain::{Campaign, CampaignDraft, CampaignStatus, CampaignUpdate, NewVersion};
use super::report::{CampaignAnalytics, CampaignSummary};
use super::store;
use crate::calls::{CallFilter, CallLog, CallRecord};
use crate::contacts::ContactService;
use crate::dispatch::{BatchDispatch, Dispatcher};
use crate::error::AppError;
use crate::http::Page;
use crate::provider::ProviderError;

/// Result of starting a campaign: the new active version and its batch.
#[derive(Debug, Clone)]
pub struct CampaignStart {
    pub campaign: Campaign,
    pub dispatch: BatchDispatch,
}

#[derive(Clone)]
pub struct CampaignService {
    pool: SqlitePool,
    contacts: ContactService,
    calls: CallLog,
    dispatcher: Dispatcher,
}

impl CampaignService {
    pub fn new(
        pool: SqlitePool,
        contacts: ContactService,
        calls: CallLog,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            pool,
            contacts,
            calls,
            dispatcher,
        }
    }

    pub async fn create(&self, draft: CampaignDraft) -> Result<Campaign, AppError> {
        let first = draft.into_first_version().map_err(AppError::Validation)?;
        let campaign = self.append(&first).await?;
        info!(
            campaign_id = %campaign.campaign_id,
            campaign_group_id = %campaign.campaign_group_id,
            "campaign created"
        );
        Ok(campaign)
    }

    pub async fn get(&self, campaign_id: Uuid) -> Result<Campaign, AppError> {
        store::find(&self.pool, campaign_id)
            .await?
            .ok_or_else(|| AppError::not_found("Campaign"))
    }

    /// Appends a version derived from `campaign_id`; its number follows the group's maximum.
    pub async fn create_version(
        &self,
        campaign_id: Uuid,
        update: CampaignUpdate,
    ) -> Result<Campaign, AppError> {
        let base = self.get(campaign_id).await?;
        let current = self.current_of(&base).await?;
        let mut next = base.next_version(update).map_err(AppError::Validation)?;
        next.batch_id = current.batch_id;
        let campaign = self.append(&next).await?;
        info!(
            campaign_id = %campaign.campaign_id,
            derived_from = %campaign_id,
            version = campaign.version,
            status = campaign.status.label(),
            "campaign version appended"
        );
        Ok(campaign)
    }

    pub async fn list(
        &self,
        page: Page,
        status: Option<CampaignStatus>,
    ) -> Result<Vec<Campaign>, AppError> {
        Ok(store::latest_per_group(&self.pool, page, status).await?)
    }

    pub async fn history(&self, group_id: Uuid) -> Result<Vec<Campaign>, AppError> {
        let versions = store::history(&self.pool, group_id).await?;
        if versions.is_empty() {
            return Err(AppError::not_found("Campaign history"));
        }
        Ok(versions)
    }

    pub async fn set_status(
        &self,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> Result<Campaign, AppError> {
        self.create_version(campaign_id, CampaignUpdate::status(status))
            .await
    }

    pub async fn archive(&self, campaign_id: Uuid) -> Result<Campaign, AppError> {
        self.set_status(campaign_id, CampaignStatus::Archived).await
    }

    pub async fn duplicate(&self, campaign_id: Uuid) -> Result<Campaign, AppError> {
        let source = self.get(campaign_id).await?;
        let copy = self.append(&source.duplicate()).await?;
        info!(
            campaign_id = %copy.campaign_id,
            source_campaign_id = %campaign_id,
            "campaign duplicated"
        );
        Ok(copy)
    }

    /// Moves the group's current version from draft to active and dispatches one call per
    /// listed contact. An older version id resolves to the group's current version.
    pub async fn start(&self, campaign_id: Uuid) -> Result<CampaignStart, AppError> {
        let referenced = self.get(campaign_id).await?;
        let draft = self.current_of(&referenced).await?;
        if draft.status != CampaignStatus::Draft {
            return Err(AppError::Validation(
                "Campaign can only be started from draft status".to_string(),
            ));
        }
        let contacts = self.contacts.get_many(&draft.contact_list).await?;
        if contacts.is_empty() {
            return Err(AppError::Validation(
                "Campaign must have contacts before starting".to_string(),
            ));
        }
        if !self.dispatcher.provider().is_configured() {
            return Err(ProviderError::NotConfigured.into());
        }

        let active = self
            .set_status(draft.campaign_id, CampaignStatus::Active)
            .await?;
        let dispatch = self.dispatcher.dispatch_campaign(&active, &contacts).await?;
        let campaign = self.get(active.campaign_id).await?;
        info!(
            campaign_id = %campaign.campaign_id,
            batch_id = %dispatch.batch_id,
            contacts = contacts.len(),
            "campaign started"
        );
        Ok(CampaignStart { campaign, dispatch })
    }

    pub async fn pause(&self, campaign_id: Uuid) -> Result<Campaign, AppError> {
        self.transition(
            campaign_id,
            CampaignStatus::Active,
            CampaignStatus::Paused,
            "Only active campaigns can be paused",
        )
        .await
    }

    pub async fn resume(&self, campaign_id: Uuid) -> Result<Campaign, AppError> {
        self.transition(
            campaign_id,
            CampaignStatus::Paused,
            CampaignStatus::Active,
            "Only paused campaigns can be resumed",
        )
        .await
    }

    pub async fn analytics(&self, campaign_id: Uuid) -> Result<CampaignAnalytics, AppError> {
        let campaign = self.get(campaign_id).await?;
        let calls = match &campaign.batch_id {
            Some(batch_id) => self.calls.for_batch(batch_id).await?,
            None => Vec::new(),
        };
        Ok(CampaignAnalytics::from_calls(&campaign, &calls))
    }

    pub async fn calls(&self, campaign_id: Uuid, page: Page) -> Result<Vec<CallRecord>, AppError> {
        let campaign = self.get(campaign_id).await?;
        let Some(batch_id) = campaign.batch_id else {
            return Ok(Vec::new());
        };
        let filter = CallFilter {
            batch_id: Some(batch_id),
            ..CallFilter::default()
        };
        self.calls.list(page, &filter).await
    }

    pub async fn summary(&self) -> Result<CampaignSummary, AppError> {
        let latest = store::latest_all(&self.pool).await?;
        Ok(CampaignSummary::from_latest(&latest))
    }

    /// Current version of every group, archived included.
    pub async fn latest_all(&self) -> Result<Vec<Campaign>, AppError> {
        Ok(store::latest_all(&self.pool).await?)
    }

    pub async fn all_versions(&self) -> Result<Vec<Campaign>, AppError> {
        Ok(store::all_versions(&self.pool).await?)
    }

    async fn transition(
        &self,
        campaign_id: Uuid,
        from: CampaignStatus,
        to: CampaignStatus,
        refusal: &str,
    ) -> Result<Campaign, AppError> {
        let referenced = self.get(campaign_id).await?;
        let current = self.current_of(&referenced).await?;
        if current.status != from {
            return Err(AppError::Validation(refusal.to_string()));
        }
        self.set_status(current.campaign_id, to).await
    }

    /// Highest version of the group `campaign` belongs to.
    async fn current_of(&self, campaign: &Campaign) -> Result<Campaign, AppError> {
        Ok(store::current(&self.pool, campaign.campaign_group_id)
            .await?
            .unwrap_or_else(|| campaign.clone()))
    }

    async fn append(&self, version: &NewVersion) -> Result<Campaign, AppError> {
        Ok(store::append(&self.pool, version).await?)
    }
}
