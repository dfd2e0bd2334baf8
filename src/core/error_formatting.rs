//! Converting errors into clear, actionable messages for users.

use super::error::{ErrorContext, WidgetbarError};
use crate::config::{ConfigError, ConfigPropertyError};
use crate::templating::TemplateSyntaxError;

/// Characters shown on each side of the failing position in a snippet.
const SNIPPET_RADIUS: usize = 30;

/// Convert any error into an [`ErrorContext`] with details and a suggestion.
///
/// The error chain is walked from the outermost error inwards and the first
/// error type with a dedicated explanation wins. Anything unrecognised is
/// reported with its full chain as details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let mut current: &dyn std::error::Error = error.as_ref();
    loop {
        if let Some(err) = current.downcast_ref::<WidgetbarError>() {
            return create_error_context(err);
        }
        if let Some(err) = current.downcast_ref::<ConfigError>() {
            return config_error_context(err);
        }
        if let Some(err) = current.downcast_ref::<ConfigPropertyError>() {
            return property_error_context(err);
        }
        if let Some(err) = current.downcast_ref::<TemplateSyntaxError>() {
            return ErrorContext::new(WidgetbarError::Other {
                message: format!("template syntax error: {err}"),
            })
            .with_suggestion("Check that every '{{' and '{%' is closed and every block has its end tag");
        }

        match current.source() {
            Some(source) => current = source,
            None => break,
        }
    }

    ErrorContext::new(WidgetbarError::Other {
        message: error.to_string(),
    })
    .with_details(format!("{error:#}"))
}

/// Build the [`ErrorContext`] for a [`WidgetbarError`].
pub fn create_error_context(error: &WidgetbarError) -> ErrorContext {
    match error {
        WidgetbarError::Config(err) => config_error_context(err),
        WidgetbarError::Render { template, error } => ErrorContext::new(WidgetbarError::Render {
            template: template.clone(),
            error: error.clone(),
        })
        .with_details(format!("\n{}", source_pointer(template, error.offset)))
        .with_suggestion("Check the template syntax at the marked position"),
        WidgetbarError::InvalidContext { path, reason } => {
            ErrorContext::new(WidgetbarError::InvalidContext {
                path: path.clone(),
                reason: reason.clone(),
            })
            .with_suggestion("Context files must contain a mapping of names to values")
        }
        WidgetbarError::InvalidVariable(arg) => {
            ErrorContext::new(WidgetbarError::InvalidVariable(arg.clone()))
                .with_suggestion(format!("Pass variables as --var {arg}=VALUE"))
        }
        WidgetbarError::Other { message } => ErrorContext::new(WidgetbarError::Other {
            message: message.clone(),
        }),
    }
}

fn property_error_context(error: &ConfigPropertyError) -> ErrorContext {
    ErrorContext::new(WidgetbarError::Config(ConfigError::Property(error.clone())))
        .with_details(format!("\n{}", error.format_diagnostic().trim_end()))
        .with_suggestion(format!(
            "Fix the template in '{}' or quote it differently if the braces are meant literally",
            error.property_path
        ))
}

fn config_error_context(error: &ConfigError) -> ErrorContext {
    let message = error.to_string();
    match error {
        ConfigError::Property(err) => property_error_context(err),
        ConfigError::Read { path, source } => ErrorContext::new(WidgetbarError::Other { message })
            .with_details(source.to_string())
            .with_suggestion(format!(
                "Check that '{}' exists and is readable",
                path.display()
            )),
        ConfigError::Parse { .. } => ErrorContext::new(WidgetbarError::Other { message })
            .with_suggestion("Fix the syntax of the configuration file"),
        ConfigError::UnsupportedFormat { .. } => {
            ErrorContext::new(WidgetbarError::Other { message })
                .with_suggestion("Rename the file to use a .yaml, .yml, .toml or .json extension")
        }
        ConfigError::Validation { path, .. } => ErrorContext::new(WidgetbarError::Other { message })
            .with_suggestion(format!(
                "Check the field names and value types in '{path}'; top-level keys must look like 'window/<name>'"
            )),
    }
}

/// Two lines: a snippet of `text` around byte `offset` and a caret under
/// the character at that offset.
///
/// Long text is cut to a window around the offset with `...` marking the
/// cut ends. Line breaks and tabs are shown as spaces so the caret stays
/// aligned.
pub fn source_pointer(text: &str, offset: usize) -> String {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }

    let chars: Vec<char> = text.chars().collect();
    let column = text[..offset].chars().count();
    let start = column.saturating_sub(SNIPPET_RADIUS);
    let end = (column + SNIPPET_RADIUS).min(chars.len());

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str("...");
    }
    let caret_column = snippet.len() + column - start;
    snippet.extend(chars[start..end].iter().map(|&c| match c {
        '\n' | '\r' | '\t' => ' ',
        c => c,
    }));
    if end < chars.len() {
        snippet.push_str("...");
    }

    format!("{snippet}\n{}^", " ".repeat(caret_column))
}
