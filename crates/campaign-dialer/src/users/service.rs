use sqlx::SqlitePool;
use tracing::info;

use super::domain::{UserRecord, UserRegistration, UserStatistics, UserUpdate};
use super::store;
use crate::auth::password::hash_password;
use crate::error::AppError;
use crate::http::Page;

#[derive(Debug, Clone)]
pub struct UserService {
    pool: SqlitePool,
    password_cost: u32,
}

impl UserService {
    pub fn new(pool: SqlitePool, password_cost: u32) -> Self {
        Self {
            pool,
            password_cost,
        }
    }

    pub async fn create(&self, registration: UserRegistration) -> Result<UserRecord, AppError> {
        let validated = registration.validate().map_err(AppError::Validation)?;
        if store::find_by_email(&self.pool, &validated.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        if store::find_by_phone(&self.pool, &validated.phone_number)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Phone number already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&validated.password, self.password_cost).await?;
        let user = store::insert(&self.pool, &validated, &password_hash).await?;
        info!(user_id = user.id, email = %user.email, "user created");
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Result<UserRecord, AppError> {
        store::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<UserRecord, AppError> {
        store::find_by_email(&self.pool, &email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Lookup used by login; absence is not an error here.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        Ok(store::find_by_email(&self.pool, &email.trim().to_lowercase()).await?)
    }

    pub async fn list(&self, page: Page) -> Result<Vec<UserRecord>, AppError> {
        Ok(store::list(&self.pool, page).await?)
    }

    pub async fn update(&self, id: i64, update: UserUpdate) -> Result<UserRecord, AppError> {
        let update = update.validate().map_err(AppError::Validation)?;
        let mut user = self.get(id).await?;

        if let Some(email) = update.email {
            if email != user.email {
                if let Some(other) = store::find_by_email(&self.pool, &email).await? {
                    if other.id != id {
                        return Err(AppError::Conflict("Email already registered".to_string()));
                    }
                }
                user.email = email;
            }
        }
        if let Some(phone_number) = update.phone_number {
            if phone_number != user.phone_number {
                if let Some(other) = store::find_by_phone(&self.pool, &phone_number).await? {
                    if other.id != id {
                        return Err(AppError::Conflict(
                            "Phone number already registered".to_string(),
                        ));
                    }
                }
                user.phone_number = phone_number;
            }
        }
        if let Some(name) = update.name {
            user.name = name;
        }
        if update.business_name.is_some() {
            user.business_name = update.business_name;
        }
        if update.business_details.is_some() {
            user.business_details = update.business_details;
        }
        if let Some(password) = update.password {
            user.password_hash = hash_password(&password, self.password_cost).await?;
        }

        store::update(&self.pool, &user).await?;
        info!(user_id = id, "user updated");
        Ok(user)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !store::delete(&self.pool, id).await? {
            return Err(AppError::not_found("User"));
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<UserRecord>, AppError> {
        Ok(store::search(&self.pool, query).await?)
    }

    pub async fn statistics(&self) -> Result<UserStatistics, AppError> {
        Ok(store::statistics(&self.pool).await?)
    }
}
