use sqlx::SqlitePool;
use tracing::{info, warn};

use super::domain::{
    BatchOutcome, ContactDraft, ContactRecord, ContactStatistics, ContactUpdate, ImportSummary,
};
use super::import::parse_contacts;
use super::store;
use crate::error::AppError;
use crate::http::Page;

pub const MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct ContactService {
    pool: SqlitePool,
}

impl ContactService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, draft: ContactDraft) -> Result<ContactRecord, AppError> {
        let draft = draft.validate().map_err(AppError::Validation)?;
        self.insert_validated(&draft).await
    }

    async fn insert_validated(&self, draft: &ContactDraft) -> Result<ContactRecord, AppError> {
        if store::find_by_phone(&self.pool, &draft.phone_number)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Contact with phone number {} already exists",
                draft.phone_number
            )));
        }
        let contact = store::insert(&self.pool, draft).await?;
        info!(contact_id = contact.id, "contact created");
        Ok(contact)
    }

    pub async fn get(&self, id: i64) -> Result<ContactRecord, AppError> {
        store::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Contact"))
    }

    pub async fn list(&self, page: Page) -> Result<Vec<ContactRecord>, AppError> {
        Ok(store::list(&self.pool, page).await?)
    }

    /// Unknown ids are skipped.
    pub async fn get_many(&self, ids: &[i64]) -> Result<Vec<ContactRecord>, AppError> {
        Ok(store::find_many(&self.pool, ids).await?)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        Ok(store::count(&self.pool).await?)
    }

    pub async fn update(&self, id: i64, update: ContactUpdate) -> Result<ContactRecord, AppError> {
        let mut contact = self.get(id).await?;
        update
            .apply_to(&mut contact)
            .map_err(AppError::Validation)?;

        if let Some(other) = store::find_by_phone(&self.pool, &contact.phone_number).await? {
            if other.id != id {
                return Err(AppError::Conflict(format!(
                    "Contact with phone number {} already exists",
                    contact.phone_number
                )));
            }
        }

        store::update(&self.pool, &contact).await?;
        info!(contact_id = id, "contact updated");
        Ok(contact)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !store::delete(&self.pool, id).await? {
            return Err(AppError::not_found("Contact"));
        }
        info!(contact_id = id, "contact deleted");
        Ok(())
    }

    pub async fn batch_create(&self, drafts: Vec<ContactDraft>) -> Result<BatchOutcome, AppError> {
        if drafts.len() > MAX_BATCH_SIZE {
            return Err(AppError::Validation(format!(
                "Cannot create more than {MAX_BATCH_SIZE} contacts at once"
            )));
        }

        let mut contacts = Vec::new();
        let mut error_details = Vec::new();
        for (index, draft) in drafts.into_iter().enumerate() {
            let row = index + 1;
            match self.create(draft).await {
                Ok(contact) => contacts.push(contact),
                Err(AppError::Validation(reason)) | Err(AppError::Conflict(reason)) => {
                    error_details.push(format!("Row {row}: {reason}"));
                }
                Err(err) => {
                    warn!(row, error = %err, "contact batch row failed");
                    error_details.push(format!("Row {row}: Database error"));
                }
            }
        }

        info!(
            created = contacts.len(),
            errors = error_details.len(),
            "contact batch processed"
        );
        Ok(BatchOutcome {
            success: true,
            created: contacts.len(),
            errors: error_details.len(),
            error_details,
            contacts,
        })
    }

    /// Imports CSV text. Row-level problems are collected; header problems fail the call.
    pub async fn import_csv(&self, csv: &[u8]) -> Result<ImportSummary, AppError> {
        let rows = parse_contacts(csv)?;

        let mut created = 0;
        let mut errors = Vec::new();
        let mut drafts = Vec::new();
        for row in rows {
            match row {
                Ok(draft) => drafts.push(draft),
                Err(reason) => errors.push(reason),
            }
        }

        for draft in drafts {
            match self.insert_validated(&draft).await {
                Ok(_) => created += 1,
                Err(AppError::Conflict(reason)) => {
                    errors.push(format!("Contact '{}': {reason}", draft.name));
                }
                Err(err) => {
                    warn!(name = %draft.name, error = %err, "contact import row failed");
                    errors.push(format!("Contact '{}': Database error", draft.name));
                }
            }
        }

        info!(created, errors = errors.len(), "contact import completed");
        Ok(ImportSummary::new(created, errors))
    }

    pub async fn search(&self, query: &str) -> Result<Vec<ContactRecord>, AppError> {
        Ok(store::search(&self.pool, query).await?)
    }

    pub async fn statistics(&self) -> Result<ContactStatistics, AppError> {
        Ok(store::statistics(&self.pool).await?)
    }
}
