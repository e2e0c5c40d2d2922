use chrono::Utc;
use sqlx::SqlitePool;

use super::domain::{UserRecord, UserStatistics, ValidatedRegistration};
use crate::db::StoreError;
use crate::http::Page;

const COLUMNS: &str = "id, name, email, phone_number, password_hash, business_name, business_details, created_at";

pub async fn insert(
    pool: &SqlitePool,
    user: &ValidatedRegistration,
    password_hash: &str,
) -> Result<UserRecord, StoreError> {
    let result = sqlx::query(
        "INSERT INTO users (name, email, phone_number, password_hash, business_name, business_details, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.phone_number)
    .bind(password_hash)
    .bind(&user.business_name)
    .bind(&user.business_details)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    find_by_id(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| StoreError::Corrupt("inserted user vanished".to_string()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<UserRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM users WHERE id = ?");
    Ok(sqlx::query_as::<_, UserRecord>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM users WHERE email = ?");
    Ok(sqlx::query_as::<_, UserRecord>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_by_phone(
    pool: &SqlitePool,
    phone_number: &str,
) -> Result<Option<UserRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM users WHERE phone_number = ?");
    Ok(sqlx::query_as::<_, UserRecord>(&query)
        .bind(phone_number)
        .fetch_optional(pool)
        .await?)
}

pub async fn list(pool: &SqlitePool, page: Page) -> Result<Vec<UserRecord>, StoreError> {
    let query = format!("SELECT {COLUMNS} FROM users ORDER BY id LIMIT ? OFFSET ?");
    Ok(sqlx::query_as::<_, UserRecord>(&query)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(pool)
        .await?)
}

/// Writes back every mutable column of an already-merged record.
pub async fn update(pool: &SqlitePool, user: &UserRecord) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE users SET name = ?, email = ?, phone_number = ?, password_hash = ?,
         business_name = ?, business_details = ? WHERE id = ?",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.phone_number)
    .bind(&user.password_hash)
    .bind(&user.business_name)
    .bind(&user.business_details)
    .bind(user.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Case-insensitive substring match over name, email and business name.
pub async fn search(pool: &SqlitePool, needle: &str) -> Result<Vec<UserRecord>, StoreError> {
    let pattern = format!("%{}%", needle.trim().to_lowercase());
    let query = format!(
        "SELECT {COLUMNS} FROM users
         WHERE lower(name) LIKE ?1 OR lower(email) LIKE ?1 OR lower(coalesce(business_name, '')) LIKE ?1
         ORDER BY id"
    );
    Ok(sqlx::query_as::<_, UserRecord>(&query)
        .bind(pattern)
        .fetch_all(pool)
        .await?)
}

pub async fn statistics(pool: &SqlitePool) -> Result<UserStatistics, StoreError> {
    let (total_users, users_with_business): (i64, i64) = sqlx::query_as(
        "SELECT count(*), coalesce(sum(CASE WHEN business_name IS NOT NULL THEN 1 ELSE 0 END), 0) FROM users",
    )
    .fetch_one(pool)
    .await?;

    Ok(UserStatistics {
        total_users,
        users_with_business,
        users_without_business: total_users - users_with_business,
    })
}
