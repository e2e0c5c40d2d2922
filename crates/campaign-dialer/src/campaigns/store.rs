use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::domain::{Campaign, CampaignStatus, NewVersion};
use crate::db::StoreError;
use crate::http::Page;

const COLUMNS: &str = "c.id, c.campaign_id, c.campaign_group_id, c.version, c.batch_id, \
     c.campaign_name, c.agent_name, c.status, c.task, c.voice, c.pathway_id, c.start_date, \
     c.end_date, c.contact_list, c.created_at, c.updated_at";

#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: i64,
    campaign_id: String,
    campaign_group_id: String,
    version: i64,
    batch_id: Option<String>,
    campaign_name: String,
    agent_name: Option<String>,
    status: String,
    task: Option<String>,
    voice: Option<String>,
    pathway_id: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    contact_list: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = StoreError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, detail: String| {
            StoreError::Corrupt(format!("campaign row {}: bad {what}: {detail}", row.id))
        };
        Ok(Campaign {
            id: row.id,
            campaign_id: Uuid::parse_str(&row.campaign_id)
                .map_err(|err| corrupt("campaign_id", err.to_string()))?,
            campaign_group_id: Uuid::parse_str(&row.campaign_group_id)
                .map_err(|err| corrupt("campaign_group_id", err.to_string()))?,
            version: row.version,
            status: row.status.parse().map_err(|err| corrupt("status", err))?,
            contact_list: serde_json::from_str(&row.contact_list)
                .map_err(|err| corrupt("contact_list", err.to_string()))?,
            batch_id: row.batch_id,
            campaign_name: row.campaign_name,
            agent_name: row.agent_name,
            task: row.task,
            voice: row.voice,
            pathway_id: row.pathway_id,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert(rows: Vec<CampaignRow>) -> Result<Vec<Campaign>, StoreError> {
    rows.into_iter().map(Campaign::try_from).collect()
}

/// Appends a version numbered one above the group's current maximum.
///
/// The number is computed inside the insert so concurrent appends cannot
/// reuse it; the `(campaign_group_id, version)` unique key backs this up.
pub async fn append(pool: &SqlitePool, new: &NewVersion) -> Result<Campaign, StoreError> {
    let contact_list = serde_json::to_string(&new.contact_list)
        .map_err(|err| StoreError::Corrupt(format!("contact list not serializable: {err}")))?;
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO campaigns (campaign_id, campaign_group_id, version, batch_id, campaign_name,
                                agent_name, status, task, voice, pathway_id, start_date, end_date,
                                contact_list, created_at, updated_at)
         SELECT ?1, ?2, coalesce(max(version), 0) + 1, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14
         FROM campaigns WHERE campaign_group_id = ?2",
    )
    .bind(new.campaign_id.to_string())
    .bind(new.campaign_group_id.to_string())
    .bind(&new.batch_id)
    .bind(&new.campaign_name)
    .bind(&new.agent_name)
    .bind(new.status.label())
    .bind(&new.task)
    .bind(&new.voice)
    .bind(&new.pathway_id)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(contact_list)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find(pool, new.campaign_id)
        .await?
        .ok_or_else(|| StoreError::Corrupt(format!("campaign {} vanished", new.campaign_id)))
}

pub async fn find(pool: &SqlitePool, campaign_id: Uuid) -> Result<Option<Campaign>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM campaigns c WHERE c.campaign_id = ?");
    sqlx::query_as::<_, CampaignRow>(&query)
        .bind(campaign_id.to_string())
        .fetch_optional(pool)
        .await?
        .map(Campaign::try_from)
        .transpose()
}

/// Highest version first.
pub async fn history(pool: &SqlitePool, group_id: Uuid) -> Result<Vec<Campaign>, StoreError> {
    let query = format!(
        "SELECT {COLUMNS} FROM campaigns c WHERE c.campaign_group_id = ? ORDER BY c.version DESC"
    );
    convert(
        sqlx::query_as::<_, CampaignRow>(&query)
            .bind(group_id.to_string())
            .fetch_all(pool)
            .await?,
    )
}

/// Highest version of one group.
pub async fn current(pool: &SqlitePool, group_id: Uuid) -> Result<Option<Campaign>, StoreError> {
    let query = format!(
        "SELECT {COLUMNS} FROM campaigns c WHERE c.campaign_group_id = ? ORDER BY c.version DESC LIMIT 1"
    );
    sqlx::query_as::<_, CampaignRow>(&query)
        .bind(group_id.to_string())
        .fetch_optional(pool)
        .await?
        .map(Campaign::try_from)
        .transpose()
}

/// Current version of each group, newest first. Archived groups only appear
/// when explicitly filtered for.
pub async fn latest_per_group(
    pool: &SqlitePool,
    page: Page,
    status: Option<CampaignStatus>,
) -> Result<Vec<Campaign>, StoreError> {
    let query = format!(
        "SELECT {COLUMNS} FROM campaigns c
         JOIN (SELECT campaign_group_id, max(version) AS max_version
               FROM campaigns GROUP BY campaign_group_id) latest
           ON c.campaign_group_id = latest.campaign_group_id AND c.version = latest.max_version
         WHERE (?1 IS NULL AND c.status != 'archived') OR c.status = ?1
         ORDER BY c.created_at DESC, c.id DESC
         LIMIT ?2 OFFSET ?3"
    );
    convert(
        sqlx::query_as::<_, CampaignRow>(&query)
            .bind(status.map(CampaignStatus::label))
            .bind(i64::from(page.limit))
            .bind(i64::from(page.skip))
            .fetch_all(pool)
            .await?,
    )
}

/// Current version of every group, archived included.
pub async fn latest_all(pool: &SqlitePool) -> Result<Vec<Campaign>, StoreError> {
    let query = format!(
        "SELECT {COLUMNS} FROM campaigns c
         JOIN (SELECT campaign_group_id, max(version) AS max_version
               FROM campaigns GROUP BY campaign_group_id) latest
           ON c.campaign_group_id = latest.campaign_group_id AND c.version = latest.max_version
         ORDER BY c.created_at DESC, c.id DESC"
    );
    convert(sqlx::query_as::<_, CampaignRow>(&query).fetch_all(pool).await?)
}

/// Every version of every group, newest first.
pub async fn all_versions(pool: &SqlitePool) -> Result<Vec<Campaign>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM campaigns c ORDER BY c.created_at DESC, c.id DESC");
    convert(sqlx::query_as::<_, CampaignRow>(&query).fetch_all(pool).await?)
}

/// The only in-place change a campaign row ever receives.
pub async fn attach_batch(
    pool: &SqlitePool,
    campaign_id: Uuid,
    batch_id: &str,
) -> Result<(), StoreError> {
    let result = sqlx::query("UPDATE campaigns SET batch_id = ?, updated_at = ? WHERE campaign_id = ?")
        .bind(batch_id)
        .bind(Utc::now())
        .bind(campaign_id.to_string())
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Corrupt(format!(
            "campaign {campaign_id} missing while attaching batch"
        )));
    }
    Ok(())
}
