//! Helpers shared by the CLI commands.

use std::path::Path;

use anyhow::{Context as _, Result};
use serde_json::Value as JsonValue;

use crate::config::load_config_file;
use crate::core::WidgetbarError;
use crate::templating::{Context, Value};

/// Read a YAML, TOML or JSON file holding a mapping of names to values.
pub fn load_context_file(path: &Path) -> Result<Context> {
    let raw = load_config_file(path)
        .with_context(|| format!("Failed to load context file: {}", path.display()))?;

    match raw {
        JsonValue::Object(map) => Ok(Context::from(map)),
        other => Err(WidgetbarError::InvalidContext {
            path: path.display().to_string(),
            reason: format!("expected a mapping, found {}", json_kind(&other)),
        }
        .into()),
    }
}

/// Parse a `NAME=VALUE` argument.
///
/// The value is read as JSON when possible (`3`, `true`, `[1, 2]`) and as
/// a plain string otherwise.
pub fn parse_var(arg: &str) -> Result<(String, Value), WidgetbarError> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| WidgetbarError::InvalidVariable(arg.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(WidgetbarError::InvalidVariable(arg.to_string()));
    }

    let value = serde_json::from_str::<JsonValue>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw));
    Ok((name.to_string(), value))
}

/// Context from an optional file with `--var` overrides on top.
pub fn build_context(file: Option<&Path>, vars: &[String]) -> Result<Context> {
    let mut context = match file {
        Some(path) => load_context_file(path)?,
        None => Context::new(),
    };
    for arg in vars {
        let (name, value) = parse_var(arg)?;
        context.insert(name, value);
    }
    Ok(context)
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "a mapping",
    }
}
