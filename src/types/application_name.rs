// ABOUTME: Validated application name shared by stacks, repositories and images.
// ABOUTME: One application owns one registry repository across all environments.

use heck::ToKebabCase;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationNameError {
    #[error("application name cannot be empty")]
    Empty,

    #[error("application name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("application name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("invalid character in application name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicationName(String);

impl ApplicationName {
    pub fn new(value: &str) -> Result<Self, ApplicationNameError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ApplicationNameError::Empty);
        }

        if value.len() > 63 {
            return Err(ApplicationNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(ApplicationNameError::StartsWithHyphen);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
                return Err(ApplicationNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the registry repository holding every build of this application.
    pub fn repository_name(&self) -> String {
        format!("{}-repo", self.0)
    }

    /// Name used for locally built images (docker requires lowercase).
    pub fn local_image_name(&self) -> String {
        self.0.to_kebab_case()
    }
}

impl fmt::Display for ApplicationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
