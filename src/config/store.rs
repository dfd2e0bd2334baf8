//! Holder of the currently active widget configuration.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::error::ConfigError;
use super::loader::load_widget_config;
use super::parser::load_config_file;
use super::types::WidgetConfig;
use crate::templating::{Context, TemplateEngine, TemplateSyntaxError};

/// Owns the template engine used for a configuration and the last config
/// that loaded successfully.
///
/// A failed reload never replaces a good config: the previous one stays
/// active and the error is handed back to the caller.
#[derive(Debug, Default)]
pub struct ConfigStore {
    engine: TemplateEngine,
    current: Option<WidgetConfig>,
    path: Option<PathBuf>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    pub fn current(&self) -> Option<&WidgetConfig> {
        self.current.as_ref()
    }

    /// Path of the last successfully loaded file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load `path`, validate it and make it the current config.
    pub fn reload(
        &mut self,
        path: &Path,
        base: &Context,
        providers: &Context,
    ) -> Result<&WidgetConfig, ConfigError> {
        let loaded = load_config_file(path)
            .and_then(|raw| load_widget_config(&raw, base, providers, &self.engine));

        match loaded {
            Ok(config) => {
                // Templates of the previous config are not needed anymore.
                self.engine.clear_cache();
                info!(
                    "Loaded {} with {} window(s)",
                    path.display(),
                    config.windows.len()
                );
                self.path = Some(path.to_path_buf());
                Ok(&*self.current.insert(config))
            }
            Err(err) => {
                if self.current.is_some() {
                    warn!("Keeping previous config, reload of {} failed: {err}", path.display());
                } else {
                    warn!("Failed to load {}: {err}", path.display());
                }
                Err(err)
            }
        }
    }

    /// Render every template element of the current config with `live`
    /// provider outputs, keyed by element path.
    pub fn render_templates(&self, live: &Context) -> Vec<(String, Result<String, TemplateSyntaxError>)> {
        let Some(config) = &self.current else {
            return Vec::new();
        };
        config
            .templates()
            .into_iter()
            .map(|(path, template)| {
                let rendered = template.render_with(&self.engine, live);
                (path, rendered)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_failed_reload_keeps_previous_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bar.yaml");
        fs::write(&path, "window/bar:\n  template/t:\n    template: 'hi {{ name }}'\n").unwrap();

        let mut store = ConfigStore::new();
        let base = Context::new().with("name", "there");
        store.reload(&path, &base, &Context::new()).unwrap();
        assert_eq!(store.current().unwrap().windows[0].id, "bar");

        fs::write(&path, "window/bar:\n  styles: '{{ 1 +'\n").unwrap();
        let err = store.reload(&path, &base, &Context::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Property(_)));
        assert_eq!(store.current().unwrap().windows.len(), 1);

        let rendered = store.render_templates(&Context::new());
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].0, "bar.t");
        assert_eq!(rendered[0].1.as_deref().unwrap(), "hi there");
    }

    #[test]
    fn test_render_templates_rebinds_live_providers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bar.yaml");
        fs::write(
            &path,
            "window/bar:\n  \
             group/left:\n    \
             providers:\n      - type: cpu\n        as: load\n    \
             template/cpu:\n      template: 'CPU {{ load.usage }}%'\n  \
             template/other:\n    template: '[{{ cpu.usage }}]'\n",
        )
        .unwrap();

        let at_load = Context::new().with("cpu", Context::new().with("usage", 42));
        let mut store = ConfigStore::new();
        store.reload(&path, &Context::new(), &at_load).unwrap();

        let live = Context::new().with("cpu", Context::new().with("usage", 99));
        let rendered = store.render_templates(&live);
        assert_eq!(rendered[0].0, "bar.left.cpu");
        assert_eq!(rendered[0].1.as_deref().unwrap(), "CPU 99%");
        assert_eq!(rendered[1].0, "bar.other");
        assert_eq!(rendered[1].1.as_deref().unwrap(), "[]");

        // Providers absent from the live snapshot keep their load-time output.
        let rendered = store.render_templates(&Context::new());
        assert_eq!(rendered[0].1.as_deref().unwrap(), "CPU 42%");
    }

    #[test]
    fn test_successful_reload_clears_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bar.json");
        fs::write(&path, r#"{"window/a": {"styles": "{{ 1 + 1 }}"}}"#).unwrap();

        let mut store = ConfigStore::new();
        store.engine().compile("{{ stale }}").unwrap();
        let config = store.reload(&path, &Context::new(), &Context::new()).unwrap();
        assert_eq!(config.windows[0].styles.as_deref(), Some("2"));
        assert_eq!(store.engine().cache_stats().entries, 0);
        assert_eq!(store.path(), Some(path.as_path()));
    }
}
