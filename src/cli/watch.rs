//! `widgetbar watch`: keep a configuration loaded and reload it whenever the
//! file changes.
//!
//! The file's modification time is polled on a fixed interval. A reload that
//! fails is reported and the previously loaded config stays active, so a
//! typo while editing never takes the bar down.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::{debug, info};

use super::common::build_context;
use crate::config::ConfigStore;
use crate::core::user_friendly_error;
use crate::templating::Context;

#[derive(Args, Debug)]
pub struct WatchCommand {
    /// Configuration file to watch.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Values visible to every element.
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Provider outputs keyed by provider type.
    #[arg(short, long, value_name = "FILE")]
    pub providers: Option<PathBuf>,

    /// Polling interval in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub interval: u64,
}

impl WatchCommand {
    pub async fn execute(self) -> Result<()> {
        let base = build_context(self.context.as_deref(), &[])?;
        let providers = build_context(self.providers.as_deref(), &[])?;
        let mut watcher = ConfigWatcher::new(self.config.clone(), base, providers);

        println!("Watching {} (Ctrl+C to stop)", self.config.display());
        let period = Duration::from_millis(self.interval.max(10));
        watch_until(&mut watcher, period, tokio::signal::ctrl_c()).await;
        info!("Stopping watch of {}", self.config.display());
        Ok(())
    }
}

/// Poll `watcher` every `period` until `shutdown` resolves.
async fn watch_until<F: Future>(watcher: &mut ConfigWatcher, period: Duration, shutdown: F) {
    let mut ticker = tokio::time::interval(period);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(outcome) = watcher.poll().await {
                    report(watcher, outcome);
                }
            }
            _ = &mut shutdown => return,
        }
    }
}

fn report(watcher: &ConfigWatcher, outcome: Result<()>) {
    match outcome {
        Ok(()) => {
            println!("{} reloaded {}", "✓".green(), watcher.path.display());
            for (path, output) in watcher.store.render_templates(&watcher.providers) {
                match output {
                    Ok(text) => println!("  {} {}", format!("{path}:").cyan(), text),
                    Err(err) => println!("  {} {}", format!("{path}:").cyan(), err.to_string().red()),
                }
            }
        }
        Err(err) => user_friendly_error(err).display(),
    }
}

/// Reloads a config through a [`ConfigStore`] when its file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    base: Context,
    providers: Context,
    store: ConfigStore,
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf, base: Context, providers: Context) -> Self {
        Self {
            path,
            base,
            providers,
            store: ConfigStore::new(),
            last_modified: None,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Reload if the file changed since the last poll.
    ///
    /// Returns `None` when nothing changed, otherwise the reload outcome.
    pub async fn poll(&mut self) -> Option<Result<()>> {
        let modified = match tokio::fs::metadata(&self.path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(err) => {
                debug!("Cannot stat {}: {err}", self.path.display());
                return None;
            }
        };
        if self.last_modified == Some(modified) {
            return None;
        }
        self.last_modified = Some(modified);

        debug!("{} changed, reloading", self.path.display());
        Some(
            self.store
                .reload(&self.path, &self.base, &self.providers)
                .map(|_| ())
                .map_err(anyhow::Error::from),
        )
    }
}
