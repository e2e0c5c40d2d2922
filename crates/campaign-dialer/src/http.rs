//! Small request/response helpers shared by the routers.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::PaginationConfig;
use crate::error::AppError;

/// `?skip=&limit=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Resolved offset/limit pair handed to the stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }
}

impl PageQuery {
    /// Rejects a limit above the configured maximum.
    pub fn strict(self, config: &PaginationConfig) -> Result<Page, AppError> {
        let limit = self.limit.unwrap_or(config.default_page_size);
        if limit > config.max_page_size {
            return Err(AppError::Validation(format!(
                "Limit cannot exceed {}",
                config.max_page_size
            )));
        }
        Ok(Page::new(self.skip.unwrap_or(0), limit))
    }

    /// Clamps a limit above the configured maximum.
    pub fn clamped(self, config: &PaginationConfig) -> Page {
        let limit = self
            .limit
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size);
        Page::new(self.skip.unwrap_or(0), limit)
    }
}

pub fn success_message(message: &str) -> Value {
    json!({ "success": true, "message": message })
}
