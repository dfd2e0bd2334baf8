//! Test utilities.
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! # Example
//!
//! ```rust,no_run
//! use widgetbar::test_utils::{TestWorkspace, init_test_logging};
//!
//! init_test_logging(None);
//! let workspace = TestWorkspace::new().unwrap();
//! let path = workspace.write("bar.yaml", "window/bar: {}\n").unwrap();
//! assert!(path.exists());
//! ```

use std::path::{Path, PathBuf};
use std::sync::Once;

use serde_json::Value as JsonValue;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::templating::Context;

static LOGGING: Once = Once::new();

/// Install a tracing subscriber that writes through the test harness.
///
/// An explicit `level` applies to this crate's events only. Without one,
/// `RUST_LOG` is used when set and valid; otherwise nothing is installed.
/// Only the first call in a test binary has any effect.
pub fn init_test_logging(level: Option<Level>) {
    LOGGING.call_once(|| {
        let filter = match level {
            Some(level) => EnvFilter::new(format!("widgetbar={level}")),
            None => match EnvFilter::try_from_default_env() {
                Ok(filter) => filter,
                Err(_) => return,
            },
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

/// A temporary directory for config, context and template files.
///
/// The directory is removed when the workspace is dropped.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` inside the workspace and return its path.
    pub fn write(&self, name: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

/// Context built from a JSON object literal; anything else gives an empty
/// context.
pub fn context_from_json(value: JsonValue) -> Context {
    match value {
        JsonValue::Object(map) => Context::from(map),
        _ => Context::new(),
    }
}

/// A small configuration exercising providers, variables, groups and
/// templates.
pub const SAMPLE_CONFIG: &str = r#"window/bar:
  providers: [battery]
  variables:
    low: "{{ battery.level < 20 }}"
  class_names: ["bar", "{% if low == 'true' %}warn{% end if %}"]
  width: "100%"
  height: 32
  always_on_top: true
  group/left:
    providers:
      - type: cpu
        as: load
    template/cpu:
      template: "CPU {{ load.usage }}%"
  template/battery:
    template: "{% switch battery.status %}{% case 'charging' %}+{% case %}-{% end switch %}{{ battery.level }}"
"#;

/// Provider outputs matching [`SAMPLE_CONFIG`].
pub fn sample_providers() -> Context {
    context_from_json(serde_json::json!({
        "battery": {"level": 15, "status": "charging"},
        "cpu": {"usage": 42},
    }))
}
