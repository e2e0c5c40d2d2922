use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use super::domain::{CallFilter, CallOutcome, CallRecord};
use super::store;
use crate::error::AppError;
use crate::http::Page;

/// Persistent record of every call the provider reported back.
#[derive(Debug, Clone)]
pub struct CallLog {
    pool: SqlitePool,
}

impl CallLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, outcome: &CallOutcome) -> Result<CallRecord, AppError> {
        let record = store::upsert(&self.pool, outcome).await?;
        info!(
            call_id = %record.call_id,
            batch_id = record.batch_id.as_deref().unwrap_or("-"),
            "call stored"
        );
        Ok(record)
    }

    pub async fn get(&self, call_id: &str) -> Result<CallRecord, AppError> {
        store::find(&self.pool, call_id)
            .await?
            .ok_or_else(|| AppError::not_found("Call"))
    }

    pub async fn list(&self, page: Page, filter: &CallFilter) -> Result<Vec<CallRecord>, AppError> {
        Ok(store::list(&self.pool, page, filter).await?)
    }

    pub async fn for_batch(&self, batch_id: &str) -> Result<Vec<CallRecord>, AppError> {
        Ok(store::list_for_batch(&self.pool, batch_id).await?)
    }

    pub async fn since(&self, since: DateTime<Utc>) -> Result<Vec<CallRecord>, AppError> {
        Ok(store::list_since(&self.pool, since).await?)
    }

    pub async fn all(&self) -> Result<Vec<CallRecord>, AppError> {
        Ok(store::list_all(&self.pool).await?)
    }

    pub async fn mark_follow_up(&self, call_id: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        Ok(store::mark_follow_up(&self.pool, call_id, at).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn log() -> CallLog {
        CallLog::new(db::connect_in_memory().await.expect("in-memory db"))
    }

    fn outcome(call_id: &str, batch_id: Option<&str>, completed: bool) -> CallOutcome {
        CallOutcome {
            call_id: call_id.to_string(),
            batch_id: batch_id.map(str::to_string),
            emotion: Some("neutral".to_string()),
            to_phone: Some("+14155550100".to_string()),
            completed: Some(completed),
            call_transcript: Some("hello".to_string()),
            ..CallOutcome::default()
        }
    }

    #[tokio::test]
    async fn redelivery_keeps_created_at_and_follow_up() {
        let log = log().await;
        let first = log.upsert(&outcome("c-1", Some("batch_a"), false)).await.unwrap();
        assert!(!first.followup_scheduled);

        let at = Utc::now();
        assert!(log.mark_follow_up("c-1", at).await.unwrap());
        assert!(!log.mark_follow_up("c-1", at).await.unwrap());

        let mut redelivered = outcome("c-1", None, true);
        redelivered.emotion = Some("positive".to_string());
        redelivered.embedding = Some(vec![0.5, 0.25]);
        let second = log.upsert(&redelivered).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.followup_scheduled);
        assert!(second.followup_at.is_some());
        assert_eq!(second.batch_id.as_deref(), Some("batch_a"));
        assert_eq!(second.emotion.as_deref(), Some("positive"));
        assert_eq!(second.completed, Some(true));
        assert_eq!(second.embedding.as_deref(), Some("[0.5,0.25]"));
    }

    #[tokio::test]
    async fn list_filters_by_completion_and_batch() {
        let log = log().await;
        log.upsert(&outcome("c-1", Some("batch_a"), true)).await.unwrap();
        log.upsert(&outcome("c-2", Some("batch_a"), false)).await.unwrap();
        log.upsert(&outcome("c-3", Some("batch_b"), true)).await.unwrap();

        let page = Page::new(0, 50);
        let completed = log
            .list(
                page,
                &CallFilter {
                    completed: Some(true),
                    batch_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(completed.len(), 2);

        let batch_a = log
            .list(
                page,
                &CallFilter {
                    completed: None,
                    batch_id: Some("batch_a".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(batch_a.len(), 2);
        assert_eq!(log.for_batch("batch_b").await.unwrap().len(), 1);

        let limited = log.list(Page::new(1, 1), &CallFilter::default()).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert!(matches!(log.get("missing").await, Err(AppError::NotFound(_))));
    }
}
