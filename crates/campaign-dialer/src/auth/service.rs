use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::password::verify_password;
use super::token::TokenSigner;
use crate::error::AppError;
use crate::users::{UserRecord, UserRegistration, UserService, UserView};

const BAD_CREDENTIALS: &str = "Incorrect email or password";
const INVALID_TOKEN: &str = "Could not validate credentials";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserView,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserService,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(users: UserService, signer: TokenSigner) -> Self {
        Self { users, signer }
    }

    pub async fn register(&self, registration: UserRegistration) -> Result<UserRecord, AppError> {
        let user = self.users.create(registration).await?;
        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AppError> {
        let found = self.users.find_by_email(&request.email).await?;
        let verified = match &found {
            Some(user) => verify_password(&request.password, &user.password_hash).await,
            None => false,
        };
        let user = match found {
            Some(user) if verified => user,
            _ => {
                warn!(email = %request.email, "failed login attempt");
                return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
            }
        };

        info!(user_id = user.id, "user logged in");
        Ok(self.token_for(&user))
    }

    pub fn refresh(&self, user: &UserRecord) -> TokenResponse {
        debug!(user_id = user.id, "token refreshed");
        self.token_for(user)
    }

    /// Resolves a bearer token to a user that still exists.
    pub async fn authenticate(&self, token: &str) -> Result<UserRecord, AppError> {
        let claims = self.signer.verify(token).map_err(|err| {
            debug!(error = %err, "rejected bearer token");
            AppError::Unauthorized(INVALID_TOKEN.to_string())
        })?;

        match self.users.get(claims.sub).await {
            Ok(user) => Ok(user),
            Err(AppError::NotFound(_)) => Err(AppError::Unauthorized(INVALID_TOKEN.to_string())),
            Err(other) => Err(other),
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    fn token_for(&self, user: &UserRecord) -> TokenResponse {
        TokenResponse {
            access_token: self.signer.issue(user.id),
            token_type: "bearer",
            expires_in: self.signer.ttl_seconds(),
            user: user.view(),
        }
    }
}
