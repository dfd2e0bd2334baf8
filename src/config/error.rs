//! Errors raised while loading widget configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::source_pointer;
use crate::templating::TemplateSyntaxError;

/// A templated config value failed to parse.
///
/// Keeps the dotted property path, the raw template text and the byte
/// offset of the failure so the user can be pointed at the exact spot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid template in property '{property_path}': {message}")]
pub struct ConfigPropertyError {
    pub property_path: String,
    pub template: String,
    pub offset: usize,
    pub message: String,
}

impl ConfigPropertyError {
    pub fn new(property_path: impl Into<String>, template: &str, error: TemplateSyntaxError) -> Self {
        Self {
            property_path: property_path.into(),
            template: template.to_string(),
            offset: error.offset.min(template.len()),
            message: error.message,
        }
    }

    /// Multi-line description with the path, a snippet of the template
    /// centered on the failure and a caret under the failing position.
    pub fn format_diagnostic(&self) -> String {
        let mut msg = String::new();
        msg.push_str(&format!("Property: {}\n", self.property_path));
        msg.push_str(&format!("Error: {}\n\n", self.message));
        for line in source_pointer(&self.template, self.offset).lines() {
            msg.push_str(&format!("    {line}\n"));
        }
        msg
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config file format '{}': expected .yaml, .yml, .toml or .json", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error(transparent)]
    Property(#[from] ConfigPropertyError),

    #[error("invalid config section '{path}': {message}")]
    Validation { path: String, message: String },
}

impl ConfigError {
    pub(crate) fn validation(path: &str, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            path: if path.is_empty() {
                "<root>".to_string()
            } else {
                path.to_string()
            },
            message: message.into(),
        }
    }
}
