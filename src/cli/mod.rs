//! Command-line interface.
//!
//! # Commands
//!
//! - `render` renders one template with values from a file and `--var` flags
//! - `check` loads and validates a widget configuration file
//! - `watch` keeps a configuration loaded and reloads it on change
//!
//! # Global flags
//!
//! - `--verbose` / `-v` logs debug output, ignoring `RUST_LOG`
//! - `--quiet` / `-q` logs nothing; errors are still printed
//!
//! Without either flag the log filter comes from `RUST_LOG`, defaulting to
//! `warn`.

mod check;
pub mod common;
mod render;
mod watch;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub use check::CheckCommand;
pub use render::RenderCommand;
pub use watch::{ConfigWatcher, WatchCommand};

/// Runtime configuration derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter to install. `None` disables logging.
    pub log_level: Option<String>,
}

impl CliConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Install the global tracing subscriber.
    ///
    /// Logs go to stderr so command output on stdout stays machine-readable.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };
        let filter = EnvFilter::new(level);
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "widgetbar",
    about = "Render widget templates and check widget configuration files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all logging; errors are still reported.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template and print the result
    Render(RenderCommand),
    /// Validate a widget configuration file
    Check(CheckCommand),
    /// Reload a widget configuration file whenever it changes
    Watch(WatchCommand),
}

impl Cli {
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        if self.verbose {
            CliConfig::new().with_log_level("debug")
        } else if self.quiet {
            CliConfig::new()
        } else {
            let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
            CliConfig::new().with_log_level(level)
        }
    }

    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Render(cmd) => cmd.execute().await,
            Commands::Check(cmd) => cmd.execute().await,
            Commands::Watch(cmd) => cmd.execute().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_levels() {
        let cli = Cli::parse_from(["widgetbar", "-v", "render", "x"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));

        let cli = Cli::parse_from(["widgetbar", "check", "bar.yaml", "--quiet"]);
        assert_eq!(cli.build_config().log_level, None);

        let cli = Cli::parse_from(["widgetbar", "render", "x"]);
        assert!(cli.build_config().log_level.is_some());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["widgetbar", "-v", "-q", "render", "x"]).is_err());
    }

    #[test]
    fn test_render_requires_template_or_file() {
        assert!(Cli::try_parse_from(["widgetbar", "render"]).is_err());
        assert!(Cli::try_parse_from(["widgetbar", "render", "x", "--file", "t.tpl"]).is_err());
        assert!(Cli::try_parse_from(["widgetbar", "render", "--file", "t.tpl"]).is_ok());
    }
}
