//! Template engine for widget markup and configuration values.
//!
//! Templates are plain text with two kinds of embedded syntax:
//!
//! - Output: `{{ expression }}` renders the value of an expression.
//! - Tags: `{% if expr %}`, `{% else if expr %}`, `{% else %}`, `{% end if %}`,
//!   `{% for item in expr %}`, `{% end for %}`, `{% switch expr %}`,
//!   `{% case expr %}`, `{% case %}` (default) and `{% end switch %}`.
//!
//! # Pipeline
//!
//! Text goes through the [`scanner`], the [`tokenizer`] and the [`parser`]
//! (which also parses every [`expression`]) into a [`Template`] tree. The
//! [`TemplateEngine`] caches that tree by the exact template text and hands
//! it to the [`renderer`] together with a [`Context`].
//!
//! # Errors
//!
//! Malformed templates fail with [`TemplateSyntaxError`], carrying the byte
//! offset of the problem. Expressions that fail at render time (calling a
//! non-function, subtracting strings, ...) render as empty output; names
//! that are not in the context are simply undefined.
//!
//! # Examples
//!
//! ```rust
//! use widgetbar::templating::{Context, TemplateEngine};
//!
//! let engine = TemplateEngine::new();
//! let context = Context::new().with("battery", 18).with("charging", false);
//! let text = engine
//!     .render(
//!         "{% if charging %}⚡{% else if battery < 20 %}low{% else %}ok{% end if %}",
//!         &context,
//!     )
//!     .unwrap();
//! assert_eq!(text, "low");
//! ```

pub mod cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod expression;
pub mod parser;
pub mod renderer;
pub mod scanner;
pub mod tokenizer;

pub use cache::CacheStats;
pub use context::{Context, Function, Value};
pub use engine::{TemplateEngine, has_template_syntax};
pub use error::{EvalError, ScanError, TemplateSyntaxError};
pub use parser::{Node, Template};
