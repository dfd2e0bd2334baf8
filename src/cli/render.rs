//! `widgetbar render`: render a single template and print the result.
//!
//! ```bash
//! widgetbar render '{{ cpu }}%' --var cpu=42
//! widgetbar render --file clock.tpl --context data.yaml
//! ```

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::debug;

use super::common::build_context;
use crate::core::WidgetbarError;
use crate::templating::TemplateEngine;

#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Template text to render.
    #[arg(value_name = "TEMPLATE", required_unless_present = "file", conflicts_with = "file")]
    pub template: Option<String>,

    /// Read the template from a file instead.
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// YAML, TOML or JSON file with the values to render with.
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Extra value as NAME=VALUE; may be repeated and wins over --context.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,
}

impl RenderCommand {
    pub async fn execute(self) -> Result<()> {
        let output = self.render()?;
        println!("{output}");
        Ok(())
    }

    fn render(&self) -> Result<String> {
        let template = match (&self.template, &self.file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template file: {}", path.display()))?,
            (None, None) => {
                return Err(WidgetbarError::Other {
                    message: "no template given".to_string(),
                }
                .into());
            }
        };

        let context = build_context(self.context.as_deref(), &self.vars)?;
        debug!("Rendering template with {} context value(s)", context.len());

        TemplateEngine::shared()
            .render(&template, &context)
            .map_err(|error| WidgetbarError::Render { template, error }.into())
    }
}
