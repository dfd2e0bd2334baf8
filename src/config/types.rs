//! Typed, validated configuration sections.
//!
//! These are the shapes a section must have after its fields were rendered.
//! Unknown fields are rejected so typos surface at load time instead of
//! silently doing nothing.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::templating::{Context, TemplateEngine, TemplateSyntaxError};

/// A provider an element subscribes to.
///
/// Either a bare provider type (`cpu`) or a mapping with a `type`, an
/// optional `as` name to bind its output under, and provider options that
/// are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderEntry {
    Name(String),
    Full(ProviderConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: String,
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    #[serde(flatten)]
    pub options: Map<String, JsonValue>,
}

impl ProviderEntry {
    pub fn provider_type(&self) -> &str {
        match self {
            ProviderEntry::Name(name) => name,
            ProviderEntry::Full(config) => &config.provider_type,
        }
    }

    /// Name the provider's output is bound under in the element context.
    pub fn binding(&self) -> &str {
        match self {
            ProviderEntry::Name(name) => name,
            ProviderEntry::Full(config) => {
                config.binding.as_deref().unwrap_or(&config.provider_type)
            }
        }
    }
}

/// Top-level `window/<name>` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    #[serde(skip_deserializing)]
    pub id: String,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
    #[serde(default)]
    pub variables: IndexMap<String, JsonValue>,
    #[serde(default)]
    pub class_names: Vec<String>,
    #[serde(default)]
    pub styles: Option<String>,
    #[serde(default, deserialize_with = "de::optional_dimension")]
    pub width: Option<String>,
    #[serde(default, deserialize_with = "de::optional_dimension")]
    pub height: Option<String>,
    #[serde(default, deserialize_with = "de::optional_dimension")]
    pub position_x: Option<String>,
    #[serde(default, deserialize_with = "de::optional_dimension")]
    pub position_y: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_bool")]
    pub always_on_top: bool,
    #[serde(default, deserialize_with = "de::flexible_bool")]
    pub show_in_taskbar: bool,
    #[serde(default, deserialize_with = "de::flexible_bool")]
    pub resizable: bool,
    #[serde(skip_deserializing)]
    pub children: Vec<ElementConfig>,
}

/// `group/<name>` section: a container of further elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    #[serde(skip_deserializing)]
    pub id: String,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
    #[serde(default)]
    pub variables: IndexMap<String, JsonValue>,
    #[serde(default)]
    pub class_names: Vec<String>,
    #[serde(default)]
    pub styles: Option<String>,
    #[serde(skip_deserializing)]
    pub children: Vec<ElementConfig>,
}

/// `template/<name>` section: a leaf whose `template` is rendered against
/// live provider data by the widget layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    #[serde(skip_deserializing)]
    pub id: String,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
    #[serde(default)]
    pub variables: IndexMap<String, JsonValue>,
    #[serde(default)]
    pub class_names: Vec<String>,
    #[serde(default)]
    pub styles: Option<String>,
    pub template: String,
    /// Context the element was loaded with.
    #[serde(skip)]
    pub context: Context,
    /// Provider entries bound in `context`, including inherited ones.
    #[serde(skip)]
    pub bindings: Vec<ProviderEntry>,
}

impl TemplateConfig {
    /// Render the element's markup with its load-time context.
    pub fn render(&self, engine: &TemplateEngine) -> Result<String, TemplateSyntaxError> {
        engine.render(&self.template, &self.context)
    }

    /// Render the element's markup with fresh provider outputs.
    ///
    /// `live` is keyed by provider type. Each provider the element can see is
    /// re-bound under its binding name; providers missing from `live` keep
    /// their load-time output and undeclared providers stay invisible.
    pub fn render_with(
        &self,
        engine: &TemplateEngine,
        live: &Context,
    ) -> Result<String, TemplateSyntaxError> {
        let mut context = self.context.clone();
        for entry in &self.bindings {
            if let Some(output) = live.get(entry.provider_type()) {
                context.insert(entry.binding(), output.clone());
            }
        }
        engine.render(&self.template, &context)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementConfig {
    Group(GroupConfig),
    Template(TemplateConfig),
}

impl ElementConfig {
    pub fn id(&self) -> &str {
        match self {
            ElementConfig::Group(group) => &group.id,
            ElementConfig::Template(template) => &template.id,
        }
    }
}

/// A whole configuration file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WidgetConfig {
    pub windows: Vec<WindowConfig>,
}

impl WidgetConfig {
    /// Every template element, depth first, with its dotted path.
    pub fn templates(&self) -> Vec<(String, &TemplateConfig)> {
        fn walk<'a>(
            path: &str,
            children: &'a [ElementConfig],
            out: &mut Vec<(String, &'a TemplateConfig)>,
        ) {
            for child in children {
                let child_path = format!("{path}.{}", child.id());
                match child {
                    ElementConfig::Group(group) => walk(&child_path, &group.children, out),
                    ElementConfig::Template(template) => out.push((child_path, template)),
                }
            }
        }

        let mut out = Vec::new();
        for window in &self.windows {
            walk(&window.id, &window.children, &mut out);
        }
        out
    }
}

/// Lenient deserializers for fields that are usually written as templates
/// and therefore arrive as strings.
mod de {
    use serde::{Deserialize, Deserializer, de::Error};
    use serde_json::Value as JsonValue;

    pub(super) fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match JsonValue::deserialize(deserializer)? {
            JsonValue::Bool(b) => Ok(b),
            JsonValue::String(s) => match s.trim() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                other => Err(D::Error::custom(format!(
                    "expected a boolean, found '{other}'"
                ))),
            },
            JsonValue::Null => Ok(false),
            other => Err(D::Error::custom(format!("expected a boolean, found {other}"))),
        }
    }

    pub(super) fn optional_dimension<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match JsonValue::deserialize(deserializer)? {
            JsonValue::Null => Ok(None),
            JsonValue::String(s) => Ok(Some(s)),
            JsonValue::Number(n) => Ok(Some(n.to_string())),
            other => Err(D::Error::custom(format!(
                "expected a number or a string, found {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_window_accepts_templated_scalars() {
        let window: WindowConfig = serde_json::from_value(json!({
            "width": 1920,
            "height": "40",
            "always_on_top": "true",
            "resizable": false,
            "providers": ["cpu", {"type": "weather", "as": "w", "refresh_interval": 60}],
        }))
        .unwrap();
        assert_eq!(window.width.as_deref(), Some("1920"));
        assert!(window.always_on_top);
        assert!(!window.show_in_taskbar);
        assert_eq!(window.providers[0].binding(), "cpu");
        assert_eq!(window.providers[1].provider_type(), "weather");
        assert_eq!(window.providers[1].binding(), "w");
    }

    #[test]
    fn test_unknown_fields_and_bad_bools_are_rejected() {
        assert!(serde_json::from_value::<GroupConfig>(json!({"clas_names": []})).is_err());
        assert!(
            serde_json::from_value::<WindowConfig>(json!({"always_on_top": "maybe"})).is_err()
        );
        assert!(serde_json::from_value::<TemplateConfig>(json!({"styles": "a"})).is_err());
    }

    #[test]
    fn test_template_render_with_live_data() {
        let engine = TemplateEngine::new();
        let bindings: Vec<ProviderEntry> =
            serde_json::from_value(json!([{"type": "cpu", "as": "load"}, "battery"])).unwrap();
        let template = TemplateConfig {
            template: "{{ label }} {{ load.usage }}% {{ battery.level }} [{{ gpu.temp }}]"
                .to_string(),
            context: Context::new()
                .with("label", "CPU")
                .with("load", Context::new().with("usage", 1))
                .with("battery", Context::new().with("level", 50)),
            bindings,
            ..TemplateConfig::default()
        };
        assert_eq!(template.render(&engine).unwrap(), "CPU 1% 50 []");

        let live = Context::from(
            json!({"cpu": {"usage": 7}, "gpu": {"temp": 60}})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(template.render_with(&engine, &live).unwrap(), "CPU 7% 50 []");
    }
}
