use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::domain::{CallFilter, CallOutcome, CallRecord};
use crate::db::StoreError;
use crate::http::Page;

const COLUMNS: &str = "call_id, batch_id, emotion, from_phone, to_phone, call_length, completed, \
     summary, call_transcript, embedding, followup_scheduled, followup_at, created_at";

/// Inserts a call or refreshes the outcome of a redelivered one.
///
/// `created_at` and follow-up state survive redelivery; a missing batch id or
/// embedding does not erase a stored one.
pub async fn upsert(pool: &SqlitePool, outcome: &CallOutcome) -> Result<CallRecord, StoreError> {
    let embedding = outcome
        .embedding
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|err| StoreError::Corrupt(format!("embedding not serializable: {err}")))?;

    sqlx::query(
        "INSERT INTO calls (call_id, batch_id, emotion, from_phone, to_phone, call_length,
                            completed, summary, call_transcript, embedding, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (call_id) DO UPDATE SET
             batch_id = coalesce(excluded.batch_id, calls.batch_id),
             emotion = excluded.emotion,
             from_phone = coalesce(excluded.from_phone, calls.from_phone),
             to_phone = coalesce(excluded.to_phone, calls.to_phone),
             call_length = coalesce(excluded.call_length, calls.call_length),
             completed = coalesce(excluded.completed, calls.completed),
             summary = coalesce(excluded.summary, calls.summary),
             call_transcript = excluded.call_transcript,
             embedding = coalesce(excluded.embedding, calls.embedding)",
    )
    .bind(&outcome.call_id)
    .bind(&outcome.batch_id)
    .bind(&outcome.emotion)
    .bind(&outcome.from_phone)
    .bind(&outcome.to_phone)
    .bind(outcome.call_length)
    .bind(outcome.completed)
    .bind(&outcome.summary)
    .bind(&outcome.call_transcript)
    .bind(embedding)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    find(pool, &outcome.call_id)
        .await?
        .ok_or_else(|| StoreError::Corrupt(format!("call {} vanished", outcome.call_id)))
}

pub async fn find(pool: &SqlitePool, call_id: &str) -> Result<Option<CallRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM calls WHERE call_id = ?");
    Ok(sqlx::query_as::<_, CallRecord>(&query)
        .bind(call_id)
        .fetch_optional(pool)
        .await?)
}

/// Newest first.
pub async fn list(
    pool: &SqlitePool,
    page: Page,
    filter: &CallFilter,
) -> Result<Vec<CallRecord>, StoreError> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM calls WHERE 1 = 1"));
    if let Some(completed) = filter.completed {
        builder.push(" AND coalesce(completed, 0) = ").push_bind(completed);
    }
    if let Some(batch_id) = &filter.batch_id {
        builder.push(" AND batch_id = ").push_bind(batch_id.clone());
    }
    builder
        .push(" ORDER BY created_at DESC, call_id LIMIT ")
        .push_bind(i64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(i64::from(page.skip));

    Ok(builder
        .build_query_as::<CallRecord>()
        .fetch_all(pool)
        .await?)
}

pub async fn list_for_batch(
    pool: &SqlitePool,
    batch_id: &str,
) -> Result<Vec<CallRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM calls WHERE batch_id = ? ORDER BY created_at DESC, call_id");
    Ok(sqlx::query_as::<_, CallRecord>(&query)
        .bind(batch_id)
        .fetch_all(pool)
        .await?)
}

pub async fn list_since(
    pool: &SqlitePool,
    since: DateTime<Utc>,
) -> Result<Vec<CallRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM calls WHERE created_at >= ? ORDER BY created_at DESC, call_id");
    Ok(sqlx::query_as::<_, CallRecord>(&query)
        .bind(since)
        .fetch_all(pool)
        .await?)
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<CallRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM calls ORDER BY created_at DESC, call_id");
    Ok(sqlx::query_as::<_, CallRecord>(&query)
        .fetch_all(pool)
        .await?)
}

/// Claims the follow-up slot for a call. False when one was already scheduled.
pub async fn mark_follow_up(
    pool: &SqlitePool,
    call_id: &str,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE calls SET followup_scheduled = 1, followup_at = ?
         WHERE call_id = ? AND followup_scheduled = 0",
    )
    .bind(at)
    .bind(call_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
