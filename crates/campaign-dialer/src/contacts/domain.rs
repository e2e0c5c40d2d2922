use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{blank_as_none, validate_phone};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContactRecord {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Incoming contact, from JSON or a CSV row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContactDraft {
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl ContactDraft {
    pub fn validate(self) -> Result<ContactDraft, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        let phone_number = self.phone_number.trim().to_string();
        if phone_number.is_empty() {
            return Err("Phone number is required".to_string());
        }
        validate_phone(&phone_number)?;

        Ok(ContactDraft {
            name,
            phone_number,
            company_name: blank_as_none(self.company_name),
            email: blank_as_none(self.email),
            tags: blank_as_none(self.tags),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl ContactUpdate {
    /// Applies present fields to `contact`; a blank optional field clears it.
    pub fn apply_to(self, contact: &mut ContactRecord) -> Result<(), String> {
        if let Some(name) = self.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err("Name is required".to_string());
            }
            contact.name = name;
        }
        if let Some(phone_number) = self.phone_number {
            let phone_number = phone_number.trim().to_string();
            validate_phone(&phone_number)?;
            contact.phone_number = phone_number;
        }
        if self.company_name.is_some() {
            contact.company_name = blank_as_none(self.company_name);
        }
        if self.email.is_some() {
            contact.email = blank_as_none(self.email);
        }
        if self.tags.is_some() {
            contact.tags = blank_as_none(self.tags);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContactStatistics {
    pub total_contacts: i64,
    pub with_email: i64,
    pub with_company: i64,
    pub tagged: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub success: bool,
    pub created: usize,
    pub errors: usize,
    pub error_details: Vec<String>,
    pub contacts: Vec<ContactRecord>,
}

/// Only the first few row errors are echoed back to the caller.
pub const IMPORT_ERROR_DETAIL_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub success: bool,
    pub message: String,
    pub created: usize,
    pub errors: usize,
    pub error_details: Vec<String>,
    pub total_errors: usize,
}

impl ImportSummary {
    pub fn new(created: usize, errors: Vec<String>) -> Self {
        let total_errors = errors.len();
        Self {
            success: true,
            message: format!("Import completed. Created {created} contacts."),
            created,
            errors: total_errors,
            error_details: errors.into_iter().take(IMPORT_ERROR_DETAIL_LIMIT).collect(),
            total_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_requires_name_and_valid_phone() {
        let missing_name = ContactDraft {
            name: "  ".to_string(),
            phone_number: "+14155550100".to_string(),
            ..ContactDraft::default()
        };
        assert_eq!(missing_name.validate().unwrap_err(), "Name is required");

        let bad_phone = ContactDraft {
            name: "Linus".to_string(),
            phone_number: "555-0100".to_string(),
            ..ContactDraft::default()
        };
        assert_eq!(
            bad_phone.validate().unwrap_err(),
            "Invalid phone number format: 555-0100"
        );
    }

    #[test]
    fn blank_optionals_become_none() {
        let draft = ContactDraft {
            name: " Linus ".to_string(),
            phone_number: " +14155550100 ".to_string(),
            company_name: Some(" ".to_string()),
            email: Some("linus@example.com".to_string()),
            tags: None,
        }
        .validate()
        .expect("valid draft");
        assert_eq!(draft.name, "Linus");
        assert_eq!(draft.phone_number, "+14155550100");
        assert_eq!(draft.company_name, None);
        assert_eq!(draft.email.as_deref(), Some("linus@example.com"));
    }

    #[test]
    fn import_summary_truncates_details_only() {
        let errors: Vec<String> = (1..=12).map(|row| format!("Row {row}: bad")).collect();
        let summary = ImportSummary::new(3, errors);
        assert_eq!(summary.total_errors, 12);
        assert_eq!(summary.errors, 12);
        assert_eq!(summary.error_details.len(), 10);
        assert_eq!(summary.message, "Import completed. Created 3 contacts.");
    }
}
