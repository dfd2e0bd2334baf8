//! The template engine facade: parse once, render many times.

use std::sync::{Arc, OnceLock};

use tracing::{debug, trace};

use super::cache::{CacheStats, TemplateCache};
use super::context::Context;
use super::error::TemplateSyntaxError;
use super::parser::{Template, parse};
use super::renderer;

/// Renders template text against contexts, caching parsed trees by text.
///
/// Each engine owns its cache, so independent engines (one per test, say)
/// never see each other's entries. [`TemplateEngine::shared`] provides a
/// process-wide instance for application code.
///
/// # Examples
///
/// ```rust
/// use widgetbar::templating::{Context, TemplateEngine};
///
/// let engine = TemplateEngine::new();
/// let context = Context::new().with("cpu", 42);
/// let text = engine.render("CPU {{ cpu }}%", &context).unwrap();
/// assert_eq!(text, "CPU 42%");
/// ```
#[derive(Debug, Default)]
pub struct TemplateEngine {
    cache: TemplateCache,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide engine.
    pub fn shared() -> &'static TemplateEngine {
        static SHARED: OnceLock<TemplateEngine> = OnceLock::new();
        SHARED.get_or_init(TemplateEngine::new)
    }

    /// Parsed tree for `source`, from the cache or freshly parsed.
    pub fn compile(&self, source: &str) -> Result<Arc<Template>, TemplateSyntaxError> {
        if let Some(template) = self.cache.get(source) {
            trace!("Template cache hit ({} bytes)", source.len());
            return Ok(template);
        }

        let template = Arc::new(parse(source)?);
        self.cache.insert(source, Arc::clone(&template));
        debug!(
            "Parsed and cached template ({} bytes, {} top-level node(s))",
            source.len(),
            template.nodes.len()
        );
        Ok(template)
    }

    /// Render `source` with `context`.
    ///
    /// Syntax errors abort the render. Failures evaluating individual
    /// expressions render as empty output instead.
    pub fn render(&self, source: &str, context: &Context) -> Result<String, TemplateSyntaxError> {
        let template = self.compile(source)?;
        Ok(renderer::render(&template, context))
    }

    /// Forget every parsed template, e.g. after widget assets were reloaded.
    pub fn clear_cache(&self) {
        debug!("Clearing template cache ({} entries)", self.cache.len());
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Whether `text` contains any template delimiters at all.
pub fn has_template_syntax(text: &str) -> bool {
    text.contains("{{") || text.contains("{%")
}
