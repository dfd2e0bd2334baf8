//! widgetbar - templating and configuration for desktop status-bar widgets
//!
//! Widget markup and configuration values are written with a small template
//! language: `{{ expression }}` outputs and `{% if %}`, `{% for %}` and
//! `{% switch %}` blocks. This crate parses and renders those templates and
//! loads widget configuration files whose values are templated against
//! provider data (battery, cpu, ...).
//!
//! # Modules
//!
//! - [`templating`] - scanner, tokenizer, parser, renderer and the caching
//!   [`TemplateEngine`](templating::TemplateEngine)
//! - [`config`] - config file parsing, section templating, typed sections
//!   and the reloadable [`ConfigStore`](config::ConfigStore)
//! - [`core`] - application errors and user-facing error formatting
//! - [`cli`] - the `widgetbar` command-line interface
//!
//! # Example
//!
//! ```rust
//! use widgetbar::config::load_widget_config;
//! use widgetbar::templating::{Context, TemplateEngine};
//!
//! let raw = serde_json::json!({
//!     "window/bar": {
//!         "providers": ["cpu"],
//!         "styles": "opacity: {% if cpu.usage > 90 %}1{% else %}0.6{% end if %}",
//!         "template/cpu": {"template": "{{ cpu.usage }}%"}
//!     }
//! });
//! let providers = Context::new().with("cpu", Context::new().with("usage", 95));
//!
//! let engine = TemplateEngine::new();
//! let config = load_widget_config(&raw, &Context::new(), &providers, &engine).unwrap();
//! assert_eq!(config.windows[0].styles.as_deref(), Some("opacity: 1"));
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod templating;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
