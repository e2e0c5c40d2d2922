use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{
    blank_as_none, normalize_email, normalize_name, validate_password, validate_phone,
};

/// Row stored in `users`. Holds the password hash, so it is never serialized directly.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub business_name: Option<String>,
    pub business_details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            business_name: self.business_name.clone(),
            business_details: self.business_details.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public representation returned by every user and auth endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub business_name: Option<String>,
    pub business_details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRegistration {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub business_details: Option<String>,
}

/// Registration that passed field validation; the password is still plain text.
#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub business_name: Option<String>,
    pub business_details: Option<String>,
}

impl UserRegistration {
    pub fn validate(self) -> Result<ValidatedRegistration, String> {
        let name = normalize_name(&self.name)?;
        let email = normalize_email(&self.email)?;
        let phone_number = self.phone_number.trim().to_string();
        validate_phone(&phone_number)?;
        validate_password(&self.password)?;

        Ok(ValidatedRegistration {
            name,
            email,
            phone_number,
            password: self.password,
            business_name: blank_as_none(self.business_name),
            business_details: blank_as_none(self.business_details),
        })
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub business_details: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl UserUpdate {
    /// Normalizes every provided field, leaving the rest as `None`.
    pub fn validate(self) -> Result<UserUpdate, String> {
        let name = self.name.as_deref().map(normalize_name).transpose()?;
        let email = self.email.as_deref().map(normalize_email).transpose()?;
        let phone_number = self.phone_number.map(|phone| phone.trim().to_string());
        if let Some(phone) = &phone_number {
            validate_phone(phone)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }

        Ok(UserUpdate {
            name,
            email,
            phone_number,
            business_name: self.business_name,
            business_details: self.business_details,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserStatistics {
    pub total_users: i64,
    pub users_with_business: i64,
    pub users_without_business: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> UserRegistration {
        UserRegistration {
            name: "  Ada Lovelace ".to_string(),
            email: "Ada@Example.com".to_string(),
            phone_number: "+14155550100".to_string(),
            password: "analytical".to_string(),
            business_name: Some("  ".to_string()),
            business_details: None,
        }
    }

    #[test]
    fn registration_normalizes_fields() {
        let validated = registration().validate().expect("valid registration");
        assert_eq!(validated.name, "Ada Lovelace");
        assert_eq!(validated.email, "ada@example.com");
        assert_eq!(validated.business_name, None);
    }

    #[test]
    fn registration_rejects_bad_phone_and_short_password() {
        let mut bad_phone = registration();
        bad_phone.phone_number = "0123".to_string();
        assert!(bad_phone.validate().is_err());

        let mut short = registration();
        short.password = "abc".to_string();
        assert_eq!(
            short.validate().expect_err("password too short"),
            "Password must be at least 6 characters long"
        );
    }

    #[test]
    fn update_only_validates_present_fields() {
        let update = UserUpdate {
            email: Some("NEW@Example.com".to_string()),
            ..UserUpdate::default()
        }
        .validate()
        .expect("valid update");
        assert_eq!(update.email.as_deref(), Some("new@example.com"));
        assert!(update.name.is_none());

        let invalid = UserUpdate {
            email: Some("nope".to_string()),
            ..UserUpdate::default()
        };
        assert!(invalid.validate().is_err());
    }
}
