//! `widgetbar check`: load a configuration file and report whether it is
//! valid.
//!
//! Every templated field is rendered and every `template` is compiled, so a
//! config that passes here loads the same way at runtime given the same
//! provider data.
//!
//! ```bash
//! widgetbar check bar.yaml
//! widgetbar check bar.yaml --providers snapshot.json --json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::common::build_context;
use crate::config::{ConfigStore, ElementConfig, WidgetConfig};

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Configuration file to check.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Values visible to every element.
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Provider outputs keyed by provider type.
    #[arg(short, long, value_name = "FILE")]
    pub providers: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also render every template element and print its output.
    #[arg(long)]
    pub render: bool,
}

impl CheckCommand {
    pub async fn execute(self) -> Result<()> {
        let base = build_context(self.context.as_deref(), &[])?;
        let providers = build_context(self.providers.as_deref(), &[])?;

        let mut store = ConfigStore::new();
        if let Err(err) = store.reload(&self.config, &base, &providers) {
            if self.json {
                let result = json!({
                    "valid": false,
                    "file": self.config.display().to_string(),
                    "error": err.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            return Err(err.into());
        }

        let Some(config) = store.current() else {
            return Ok(());
        };

        let rendered = if self.render {
            store.render_templates(&providers)
        } else {
            Vec::new()
        };

        if self.json {
            let outputs: serde_json::Map<_, _> = rendered
                .iter()
                .map(|(path, output)| match output {
                    Ok(text) => (path.clone(), json!(text)),
                    Err(err) => (path.clone(), json!({"error": err.to_string()})),
                })
                .collect();
            let result = json!({
                "valid": true,
                "file": self.config.display().to_string(),
                "config": config,
                "rendered": outputs,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        print_summary(&self.config, config);
        for (path, output) in &rendered {
            match output {
                Ok(text) => println!("  {} {}", format!("{path}:").cyan(), text),
                Err(err) => println!("  {} {}", format!("{path}:").cyan(), err.to_string().red()),
            }
        }
        Ok(())
    }
}

fn print_summary(path: &Path, config: &WidgetConfig) {
    println!("{} {} is valid", "✓".green(), path.display());
    for window in &config.windows {
        println!("  window {}", window.id.bold());
        print_children(&window.children, 2);
    }
}

fn print_children(children: &[ElementConfig], depth: usize) {
    let indent = "  ".repeat(depth);
    for child in children {
        match child {
            ElementConfig::Group(group) => {
                println!("{indent}group {}", group.id);
                print_children(&group.children, depth + 1);
            }
            ElementConfig::Template(template) => println!("{indent}template {}", template.id),
        }
    }
}
