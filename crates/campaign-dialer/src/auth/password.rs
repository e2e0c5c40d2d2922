//! bcrypt password hashes, stored in the standard `$2b$<cost>$<salt+digest>` form.
//!
//! Hashing is CPU-bound, so both directions run on the blocking pool.

use tokio::task;
use tracing::warn;

pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;
pub const MIN_COST: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password hashing task failed: {0}")]
    Join(#[from] task::JoinError),
}

pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();
    Ok(task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

/// False for malformed stored hashes as well as for wrong passwords.
pub async fn verify_password(password: &str, stored: &str) -> bool {
    let (password, stored) = (password.to_string(), stored.to_string());
    match task::spawn_blocking(move || bcrypt::verify(password, &stored)).await {
        Ok(Ok(matches)) => matches,
        Ok(Err(err)) => {
            warn!(error = %err, "stored password hash is unreadable");
            false
        }
        Err(err) => {
            warn!(error = %err, "password verification task failed");
            false
        }
    }
}
