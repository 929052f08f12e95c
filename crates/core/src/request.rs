//! Inbound generation request model and validation rules.
//!
//! The request is deserialized once from the POST body, validated before any
//! background work starts, and treated as immutable for the rest of the
//! request lifecycle.

use std::collections::HashMap;

use serde::Deserialize;

/// Error type for request validation
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required fields: projectType, projectFiles and fullCode must be non-empty")]
    MissingRequiredFields,
}

/// Operating system descriptor reported by the client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OsInfo {
    pub platform: String,
    pub arch: String,
    pub release: String,
}

/// Identity of the user issuing the request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    pub email: String,
    pub os_info: OsInfo,
}

/// JSON body accepted by the generation endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateRequest {
    pub project_type: String,
    pub project_files: Vec<String>,
    pub full_code: String,
    pub user_info: UserInfo,
    pub options: HashMap<String, bool>,
    pub existing_readme: String,
    pub custom_readme_format: String,
    pub template_url: String,
    pub repo_url: String,
}

impl GenerateRequest {
    /// Check the non-empty invariants that gate all downstream work.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.project_type.is_empty() || self.project_files.is_empty() || self.full_code.is_empty()
        {
            return Err(ValidationError::MissingRequiredFields);
        }
        Ok(())
    }

    /// Username for tracking purposes; blank usernames become "anonymous".
    pub fn display_username(&self) -> String {
        let trimmed = self.user_info.username.trim();
        if trimmed.is_empty() {
            "anonymous".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// One-line OS descriptor stored alongside the usage record.
    pub fn os_descriptor(&self) -> String {
        let os = &self.user_info.os_info;
        format!("{} {} {}", os.platform, os.arch, os.release)
    }

    /// The format-template locator, if any.
    ///
    /// `customReadmeFormat` wins; an empty value falls back to `templateUrl`.
    pub fn format_source(&self) -> Option<&str> {
        if !self.custom_readme_format.is_empty() {
            Some(&self.custom_readme_format)
        } else if !self.template_url.is_empty() {
            Some(&self.template_url)
        } else {
            None
        }
    }

    /// Whether a boolean option flag is present and set.
    pub fn option(&self, name: &str) -> bool {
        self.options.get(name).copied().unwrap_or(false)
    }
}
