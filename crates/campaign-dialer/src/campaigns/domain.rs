use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Archived,
}

impl CampaignStatus {
    pub fn ordered() -> [CampaignStatus; 5] {
        [
            CampaignStatus::Draft,
            CampaignStatus::Active,
            CampaignStatus::Paused,
            CampaignStatus::Completed,
            CampaignStatus::Archived,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Archived => "archived",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CampaignStatus::ordered()
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("Unknown campaign status: {value}"))
    }
}

/// One version of a campaign. Versions share a `campaign_group_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    pub id: i64,
    pub campaign_id: Uuid,
    pub campaign_group_id: Uuid,
    pub version: i64,
    pub batch_id: Option<String>,
    pub campaign_name: String,
    pub agent_name: Option<String>,
    pub status: CampaignStatus,
    pub task: Option<String>,
    pub voice: Option<String>,
    pub pathway_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub contact_list: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a version about to be appended; the store assigns `version`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVersion {
    pub campaign_id: Uuid,
    pub campaign_group_id: Uuid,
    pub batch_id: Option<String>,
    pub campaign_name: String,
    pub agent_name: Option<String>,
    pub status: CampaignStatus,
    pub task: Option<String>,
    pub voice: Option<String>,
    pub pathway_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub contact_list: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignDraft {
    pub campaign_name: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub pathway_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_list: Vec<i64>,
}

impl CampaignDraft {
    /// First version of a brand new group.
    pub fn into_first_version(self) -> Result<NewVersion, String> {
        let campaign_name = self.campaign_name.trim().to_string();
        if campaign_name.is_empty() {
            return Err("Campaign name is required".to_string());
        }
        check_dates(self.start_date, self.end_date)?;

        Ok(NewVersion {
            campaign_id: Uuid::new_v4(),
            campaign_group_id: Uuid::new_v4(),
            batch_id: None,
            campaign_name,
            agent_name: self.agent_name,
            status: CampaignStatus::Draft,
            task: self.task,
            voice: self.voice,
            pathway_id: self.pathway_id,
            start_date: self.start_date,
            end_date: self.end_date,
            contact_list: dedup_ids(self.contact_list),
        })
    }
}

/// Partial update; every absent field is copied from the base version.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignUpdate {
    #[serde(default)]
    pub campaign_name: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub pathway_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_list: Option<Vec<i64>>,
    #[serde(default)]
    pub status: Option<CampaignStatus>,
}

impl CampaignUpdate {
    pub fn status(status: CampaignStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Campaign {
    /// Derives the next version of this campaign's group.
    pub fn next_version(&self, update: CampaignUpdate) -> Result<NewVersion, String> {
        let campaign_name = match update.campaign_name {
            Some(name) if name.trim().is_empty() => {
                return Err("Campaign name is required".to_string())
            }
            Some(name) => name.trim().to_string(),
            None => self.campaign_name.clone(),
        };
        let start_date = update.start_date.or(self.start_date);
        let end_date = update.end_date.or(self.end_date);
        check_dates(start_date, end_date)?;

        Ok(NewVersion {
            campaign_id: Uuid::new_v4(),
            campaign_group_id: self.campaign_group_id,
            batch_id: self.batch_id.clone(),
            campaign_name,
            agent_name: update.agent_name.or_else(|| self.agent_name.clone()),
            status: update.status.unwrap_or(self.status),
            task: update.task.or_else(|| self.task.clone()),
            voice: update.voice.or_else(|| self.voice.clone()),
            pathway_id: update.pathway_id.or_else(|| self.pathway_id.clone()),
            start_date,
            end_date,
            contact_list: update
                .contact_list
                .map(dedup_ids)
                .unwrap_or_else(|| self.contact_list.clone()),
        })
    }

    /// Fresh group seeded from this version.
    pub fn duplicate(&self) -> NewVersion {
        NewVersion {
            campaign_id: Uuid::new_v4(),
            campaign_group_id: Uuid::new_v4(),
            batch_id: None,
            campaign_name: format!("{} (Copy)", self.campaign_name),
            agent_name: self.agent_name.clone(),
            status: CampaignStatus::Draft,
            task: self.task.clone(),
            voice: self.voice.clone(),
            pathway_id: self.pathway_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            contact_list: self.contact_list.clone(),
        }
    }
}

fn check_dates(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<(), String> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => {
            Err("Campaign end date must not be before its start date".to_string())
        }
        _ => Ok(()),
    }
}

fn dedup_ids(ids: Vec<i64>) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
