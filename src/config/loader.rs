//! Turning a raw configuration value into validated [`WidgetConfig`] trees.
//!
//! Each element is loaded with its own context:
//!
//! 1. a copy of the parent element's context (the caller's base context for
//!    windows),
//! 2. the outputs of the providers the element declares, looked up by
//!    provider type in the caller's provider snapshot,
//! 3. the element's `variables`, rendered in order so later variables and
//!    all descendants can use earlier ones.
//!
//! Template elements also keep the provider entries visible to them, their
//! own and their ancestors', so live provider data can be re-bound under the
//! same names when the element is rendered.
//!
//! The remaining fields are then rendered with that context and the result is
//! validated into the typed section. Child sections (`group/*`,
//! `template/*`) are loaded recursively in the order they were written.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, trace};

use super::error::{ConfigError, ConfigPropertyError};
use super::section::{property_path, render_fields, render_value};
use super::types::{ElementConfig, GroupConfig, ProviderEntry, TemplateConfig, WidgetConfig, WindowConfig};
use crate::templating::{Context, TemplateEngine, Value};

pub const WINDOW_PREFIX: &str = "window/";
pub const GROUP_PREFIX: &str = "group/";
pub const TEMPLATE_PREFIX: &str = "template/";

/// Fields consumed while building the element context; they are not
/// rendered a second time.
const CONTEXT_FIELDS: &[&str] = &["providers", "variables", "template"];

/// Load every `window/<name>` section of `raw`.
///
/// # Errors
///
/// - [`ConfigError::Property`] for the first templated value (in file order)
///   that fails to parse.
/// - [`ConfigError::Validation`] when the root or a section has the wrong
///   shape or a rendered section does not match its typed form.
pub fn load_widget_config(
    raw: &JsonValue,
    base: &Context,
    providers: &Context,
    engine: &TemplateEngine,
) -> Result<WidgetConfig, ConfigError> {
    let root = raw
        .as_object()
        .ok_or_else(|| ConfigError::validation("", "expected a mapping of 'window/<name>' sections"))?;

    let mut windows = Vec::with_capacity(root.len());
    for (key, value) in root {
        let id = section_id(key, WINDOW_PREFIX, key)?;
        let section = as_section(value, key)?;
        windows.push(load_window(id, section, base, providers, engine, key)?);
    }

    debug!("Loaded {} window(s)", windows.len());
    Ok(WidgetConfig { windows })
}

fn load_window(
    id: &str,
    section: &Map<String, JsonValue>,
    parent: &Context,
    providers: &Context,
    engine: &TemplateEngine,
    path: &str,
) -> Result<WindowConfig, ConfigError> {
    let scope = ElementScope::build(section, parent, &[], providers, engine, path)?;
    let mut window: WindowConfig = scope.validate(section, engine, path)?;
    window.id = id.to_string();
    window.children = load_children(section, &scope, providers, engine, path)?;
    Ok(window)
}

fn load_children(
    section: &Map<String, JsonValue>,
    parent: &ElementScope,
    providers: &Context,
    engine: &TemplateEngine,
    path: &str,
) -> Result<Vec<ElementConfig>, ConfigError> {
    let mut children = Vec::new();
    for (key, value) in section {
        let child_path = property_path(path, key);
        if let Some(id) = key.strip_prefix(GROUP_PREFIX) {
            let id = non_empty(id, &child_path)?;
            let child = as_section(value, &child_path)?;
            let scope = ElementScope::build(
                child,
                &parent.context,
                &parent.bindings,
                providers,
                engine,
                &child_path,
            )?;
            let mut group: GroupConfig = scope.validate(child, engine, &child_path)?;
            group.id = id.to_string();
            group.children = load_children(child, &scope, providers, engine, &child_path)?;
            children.push(ElementConfig::Group(group));
        } else if let Some(id) = key.strip_prefix(TEMPLATE_PREFIX) {
            let id = non_empty(id, &child_path)?;
            let child = as_section(value, &child_path)?;
            let scope = ElementScope::build(
                child,
                &parent.context,
                &parent.bindings,
                providers,
                engine,
                &child_path,
            )?;
            let mut template: TemplateConfig = scope.validate(child, engine, &child_path)?;
            template.id = id.to_string();
            template.context = scope.context;
            template.bindings = scope.bindings;
            children.push(ElementConfig::Template(template));
        }
    }
    Ok(children)
}

/// The context an element renders with, plus the consumed context fields.
struct ElementScope {
    context: Context,
    /// Provider entries still bound in `context`, ancestors first.
    bindings: Vec<ProviderEntry>,
    providers: Vec<ProviderEntry>,
    variables: IndexMap<String, JsonValue>,
}

impl ElementScope {
    fn build(
        section: &Map<String, JsonValue>,
        parent: &Context,
        inherited: &[ProviderEntry],
        providers: &Context,
        engine: &TemplateEngine,
        path: &str,
    ) -> Result<Self, ConfigError> {
        let mut context = parent.clone();

        let entries: Vec<ProviderEntry> = match section.get("providers") {
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                ConfigError::validation(&property_path(path, "providers"), e.to_string())
            })?,
            None => Vec::new(),
        };
        for entry in &entries {
            let output = providers.get(entry.provider_type()).cloned().unwrap_or_default();
            if output.is_undefined() {
                trace!("Provider '{}' has no output for {}", entry.provider_type(), path);
            }
            context.insert(entry.binding(), output);
        }

        let mut variables = IndexMap::new();
        match section.get("variables") {
            None => {}
            Some(JsonValue::Object(raw)) => {
                let variables_path = property_path(path, "variables");
                for (name, value) in raw {
                    let rendered =
                        render_value(value, &context, engine, &property_path(&variables_path, name))?;
                    context.insert(name.clone(), Value::from(rendered.clone()));
                    variables.insert(name.clone(), rendered);
                }
            }
            Some(_) => {
                return Err(ConfigError::validation(
                    &property_path(path, "variables"),
                    "expected a mapping of variable names to values",
                ));
            }
        }

        // A variable shadows a provider bound under the same name.
        let bindings = inherited
            .iter()
            .chain(&entries)
            .filter(|entry| !variables.contains_key(entry.binding()))
            .cloned()
            .collect();

        Ok(Self {
            context,
            bindings,
            providers: entries,
            variables,
        })
    }

    /// Render the section's own fields and validate them into `T`.
    fn validate<T: DeserializeOwned>(
        &self,
        section: &Map<String, JsonValue>,
        engine: &TemplateEngine,
        path: &str,
    ) -> Result<T, ConfigError> {
        let mut rendered = render_fields(section, &self.context, engine, path, CONTEXT_FIELDS)?;

        if !self.providers.is_empty() {
            let providers = serde_json::to_value(&self.providers)
                .map_err(|e| ConfigError::validation(path, e.to_string()))?;
            rendered.insert("providers".to_string(), providers);
        }
        if !self.variables.is_empty() {
            let variables = self.variables.clone().into_iter().collect::<Map<_, _>>();
            rendered.insert("variables".to_string(), JsonValue::Object(variables));
        }
        if let Some(template) = section.get("template") {
            if let JsonValue::String(text) = template {
                engine.compile(text).map_err(|err| {
                    ConfigPropertyError::new(property_path(path, "template"), text, err)
                })?;
            }
            rendered.insert("template".to_string(), template.clone());
        }

        serde_json::from_value(JsonValue::Object(rendered))
            .map_err(|e| ConfigError::validation(path, e.to_string()))
    }
}

fn section_id<'a>(key: &'a str, prefix: &str, path: &str) -> Result<&'a str, ConfigError> {
    match key.strip_prefix(prefix) {
        Some(id) => non_empty(id, path),
        None => Err(ConfigError::validation(
            path,
            format!("unexpected top-level key, expected '{prefix}<name>'"),
        )),
    }
}

fn non_empty<'a>(id: &'a str, path: &str) -> Result<&'a str, ConfigError> {
    if id.is_empty() {
        Err(ConfigError::validation(path, "section name must not be empty"))
    } else {
        Ok(id)
    }
}

fn as_section<'a>(value: &'a JsonValue, path: &str) -> Result<&'a Map<String, JsonValue>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| ConfigError::validation(path, "expected a mapping of fields"))
}
