use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::domain::{ContactDraft, ContactRecord, ContactStatistics};
use crate::db::StoreError;
use crate::http::Page;

const COLUMNS: &str = "id, name, phone_number, company_name, email, tags, created_at";

pub async fn insert(pool: &SqlitePool, draft: &ContactDraft) -> Result<ContactRecord, StoreError> {
    let result = sqlx::query(
        "INSERT INTO contacts (name, phone_number, company_name, email, tags, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&draft.name)
    .bind(&draft.phone_number)
    .bind(&draft.company_name)
    .bind(&draft.email)
    .bind(&draft.tags)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    find_by_id(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| StoreError::Corrupt("inserted contact vanished".to_string()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<ContactRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM contacts WHERE id = ?");
    Ok(sqlx::query_as::<_, ContactRecord>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_by_phone(
    pool: &SqlitePool,
    phone_number: &str,
) -> Result<Option<ContactRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM contacts WHERE phone_number = ?");
    Ok(sqlx::query_as::<_, ContactRecord>(&query)
        .bind(phone_number)
        .fetch_optional(pool)
        .await?)
}

pub async fn list(pool: &SqlitePool, page: Page) -> Result<Vec<ContactRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM contacts ORDER BY id LIMIT ? OFFSET ?");
    Ok(sqlx::query_as::<_, ContactRecord>(&query)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(pool)
        .await?)
}

pub async fn find_many(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<ContactRecord>, StoreError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM contacts WHERE id IN ("));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");

    Ok(builder
        .build_query_as::<ContactRecord>()
        .fetch_all(pool)
        .await?)
}

pub async fn count(pool: &SqlitePool) -> Result<i64, StoreError> {
    let (total,): (i64,) = sqlx::query_as("SELECT count(*) FROM contacts")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

pub async fn update(pool: &SqlitePool, contact: &ContactRecord) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE contacts SET name = ?, phone_number = ?, company_name = ?, email = ?, tags = ?
         WHERE id = ?",
    )
    .bind(&contact.name)
    .bind(&contact.phone_number)
    .bind(&contact.company_name)
    .bind(&contact.email)
    .bind(&contact.tags)
    .bind(contact.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn search(pool: &SqlitePool, needle: &str) -> Result<Vec<ContactRecord>, StoreError> {
    let pattern = format!("%{}%", needle.trim().to_lowercase());
    let query = format!(
        "SELECT {COLUMNS} FROM contacts
         WHERE lower(name) LIKE ?1 OR phone_number LIKE ?1 OR lower(coalesce(company_name, '')) LIKE ?1
         ORDER BY id"
    );
    Ok(sqlx::query_as::<_, ContactRecord>(&query)
        .bind(pattern)
        .fetch_all(pool)
        .await?)
}

pub async fn statistics(pool: &SqlitePool) -> Result<ContactStatistics, StoreError> {
    let (total_contacts, with_email, with_company, tagged): (i64, i64, i64, i64) =
        sqlx::query_as(
            "SELECT count(*),
                    coalesce(sum(CASE WHEN email IS NOT NULL THEN 1 ELSE 0 END), 0),
                    coalesce(sum(CASE WHEN company_name IS NOT NULL THEN 1 ELSE 0 END), 0),
                    coalesce(sum(CASE WHEN tags IS NOT NULL THEN 1 ELSE 0 END), 0)
             FROM contacts",
        )
        .fetch_one(pool)
        .await?;

    Ok(ContactStatistics {
        total_contacts,
        with_email,
        with_company,
        tagged,
    })
}
