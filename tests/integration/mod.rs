//! Integration test suite for widgetbar
//!
//! End-to-end tests of the public library API and of the `widgetbar`
//! binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **engine**: rendering behavior and caching through [`TemplateEngine`]
//! - **config**: loading templated configuration files and reloading them
//! - **cli**: the `render` and `check` commands run as a subprocess
//!
//! [`TemplateEngine`]: widgetbar::templating::TemplateEngine

mod cli;
mod config;
mod engine;
