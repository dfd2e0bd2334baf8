//! Application-level errors and their user-facing presentation.
//!
//! Library modules return their own precise error types
//! ([`TemplateSyntaxError`], [`ConfigError`], ...). At the application
//! boundary they are collected into [`WidgetbarError`] or carried in an
//! [`anyhow::Error`] chain, and finally turned into an [`ErrorContext`] that
//! knows how to explain the failure to a user.

use std::fmt;

use colored::Colorize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::templating::TemplateSyntaxError;

#[derive(Error, Debug)]
pub enum WidgetbarError {
    /// Loading or validating a configuration file failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A template passed on the command line did not parse.
    #[error("failed to parse template: {error}")]
    Render {
        template: String,
        #[source]
        error: TemplateSyntaxError,
    },

    /// A context or provider file did not contain a mapping.
    #[error("invalid context file '{path}': {reason}")]
    InvalidContext { path: String, reason: String },

    /// A `--var` argument was not of the form `name=value`.
    #[error("invalid variable '{0}': expected NAME=VALUE")]
    InvalidVariable(String),

    #[error("{message}")]
    Other { message: String },
}

/// An error together with optional details and a suggestion for the user.
///
/// # Examples
///
/// ```rust,no_run
/// use widgetbar::core::{ErrorContext, WidgetbarError};
///
/// let context = ErrorContext::new(WidgetbarError::InvalidVariable("cpu".into()))
///     .with_suggestion("Pass variables as --var cpu=42")
///     .with_details("Variables without a value cannot be bound");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    pub error: WidgetbarError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: WidgetbarError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow and the
    /// suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}
