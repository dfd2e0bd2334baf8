//! Widget configuration.
//!
//! A configuration file (YAML, TOML or JSON) is a mapping of `window/<name>`
//! sections. Sections nest further elements under `group/<name>` and
//! `template/<name>` keys:
//!
//! ```yaml
//! window/bar:
//!   providers: [battery]
//!   variables:
//!     low: "{{ battery.level < 20 }}"
//!   class_names: ["bar", "{% if low == 'true' %}warn{% end if %}"]
//!   width: "100%"
//!   group/left:
//!     template/clock:
//!       providers: [date]
//!       template: "{{ date.hours }}:{{ date.minutes }}"
//! ```
//!
//! Every string field containing template syntax is rendered against the
//! element's context while loading ([`section`]), except `template` itself,
//! which is only syntax-checked and later rendered against live provider
//! data.
//!
//! # Modules
//!
//! - [`parser`] reads files into order-preserving values
//! - [`section`] renders templated fields of a single section
//! - [`loader`] builds element contexts and validates the typed tree
//! - [`types`] holds the typed sections
//! - [`store`] keeps the active config across reloads
//! - [`error`] defines [`ConfigError`] and [`ConfigPropertyError`]

pub mod error;
pub mod loader;
pub mod parser;
pub mod section;
pub mod store;
pub mod types;

pub use error::{ConfigError, ConfigPropertyError};
pub use loader::load_widget_config;
pub use parser::{ConfigFormat, load_config_file, parse_config_str};
pub use section::{render_section, render_value};
pub use store::ConfigStore;
pub use types::{
    ElementConfig, GroupConfig, ProviderConfig, ProviderEntry, TemplateConfig, WidgetConfig,
    WindowConfig,
};
