//! Templating of configuration sections.
//!
//! Every string value that contains template syntax is rendered against the
//! element's context before the section is validated. Strings without
//! syntax and non-string values pass through untouched. Nested mappings and
//! lists are walked recursively; child sections (`group/*`, `template/*`)
//! are skipped because they are rendered as elements of their own.

use serde_json::{Map, Value as JsonValue};

use super::error::ConfigPropertyError;
use crate::templating::{Context, TemplateEngine, has_template_syntax};

/// Key prefixes that introduce child element sections.
pub const CHILD_SECTION_PREFIXES: &[&str] = &["group/", "template/"];

pub fn is_child_section_key(key: &str) -> bool {
    CHILD_SECTION_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
}

/// Join a dotted property path.
pub fn property_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Render every templated string field of `section`.
///
/// `path` is the dotted path of the section itself and prefixes the
/// property path of any error. Fields are processed in insertion order, so
/// the first failing field is always the one reported.
pub fn render_section(
    section: &Map<String, JsonValue>,
    context: &Context,
    engine: &TemplateEngine,
    path: &str,
) -> Result<Map<String, JsonValue>, ConfigPropertyError> {
    render_fields(section, context, engine, path, &[])
}

/// [`render_section`] that leaves the fields named in `skip` out of the result.
pub(crate) fn render_fields(
    section: &Map<String, JsonValue>,
    context: &Context,
    engine: &TemplateEngine,
    path: &str,
    skip: &[&str],
) -> Result<Map<String, JsonValue>, ConfigPropertyError> {
    let mut rendered = Map::with_capacity(section.len());
    for (key, value) in section {
        if is_child_section_key(key) || skip.contains(&key.as_str()) {
            continue;
        }
        let value = render_value(value, context, engine, &property_path(path, key))?;
        rendered.insert(key.clone(), value);
    }
    Ok(rendered)
}

/// Render one config value found at `path`.
pub fn render_value(
    value: &JsonValue,
    context: &Context,
    engine: &TemplateEngine,
    path: &str,
) -> Result<JsonValue, ConfigPropertyError> {
    match value {
        JsonValue::String(text) if has_template_syntax(text) => engine
            .render(text, context)
            .map(JsonValue::String)
            .map_err(|err| ConfigPropertyError::new(path, text, err)),
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| render_value(item, context, engine, &property_path(path, &i.to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        JsonValue::Object(map) => {
            let mut rendered = Map::with_capacity(map.len());
            for (key, item) in map {
                rendered.insert(
                    key.clone(),
                    render_value(item, context, engine, &property_path(path, key))?,
                );
            }
            Ok(JsonValue::Object(rendered))
        }
        other => Ok(other.clone()),
    }
}
