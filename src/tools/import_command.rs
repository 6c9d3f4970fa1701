use async_trait::async_trait;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

use crate::database::DatabaseManager;
use crate::error::{ImportError, Result};
use crate::models::{Config, DatasetSource};
use crate::tools::ccew_importer::CcewImporter;
use crate::tools::ccni_importer::CcniImporter;
use crate::tools::chd_importer::ChdImporter;
use crate::tools::companies_importer::CompaniesImporter;
use crate::tools::record_batch::format_count;

/// In debug mode each file stops after the row with this index
pub const DEBUG_ROW_LIMIT: usize = 100;

/// Flags shared by every import command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub cache: bool,
    pub debug: bool,
}

impl ImportOptions {
    /// Whether reading should stop once the row at `index` has been handled
    pub fn stop_after(&self, index: usize) -> bool {
        self.debug && index >= DEBUG_ROW_LIMIT
    }
}

/// `--cache/--no-cache` and `--debug/--no-debug`; the last flag given wins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Args)]
pub struct ImportFlags {
    /// Cache downloaded files
    #[arg(long, overrides_with = "no_cache")]
    pub cache: bool,
    #[arg(long = "no-cache", overrides_with = "cache")]
    pub no_cache: bool,

    /// Stop each file after a handful of rows
    #[arg(long, overrides_with = "no_debug")]
    pub debug: bool,
    #[arg(long = "no-debug", overrides_with = "debug")]
    pub no_debug: bool,
}

impl ImportFlags {
    /// Resolve the flags, falling back to `default` for any not given
    pub fn resolve(&self, default: bool) -> ImportOptions {
        let pick = |on: bool, off: bool| if on { true } else if off { false } else { default };
        ImportOptions {
            cache: pick(self.cache, self.no_cache),
            debug: pick(self.debug, self.no_debug),
        }
    }
}

/// What one import run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub files_fetched: usize,
    pub files_failed: usize,
    pub saved: BTreeMap<&'static str, usize>,
    pub deleted: BTreeMap<&'static str, u64>,
    pub statements_executed: Vec<&'static str>,
}

impl ImportSummary {
    pub fn record_saved(&mut self, model: &'static str, count: usize) -> usize {
        let total = self.saved.entry(model).or_insert(0);
        *total += count;
        *total
    }

    pub fn record_deleted(&mut self, model: &'static str, count: u64) {
        *self.deleted.entry(model).or_insert(0) += count;
    }

    pub fn saved_for(&self, model: &str) -> usize {
        self.saved.get(model).copied().unwrap_or(0)
    }

    pub fn deleted_for(&self, model: &str) -> u64 {
        self.deleted.get(model).copied().unwrap_or(0)
    }
}

/// A dataset import that can be run from the CLI or wrapped by the command logger
#[async_trait(?Send)]
pub trait ImportCommand {
    /// Subcommand name, e.g. `import-companies`
    fn name(&self) -> &'static str;

    /// File name stem of the response cache
    fn cache_name(&self) -> &'static str;

    fn source(&self) -> DatasetSource;

    async fn handle(&self, db: &DatabaseManager, options: ImportOptions) -> Result<ImportSummary>;
}

pub fn all_commands(config: &Config) -> Vec<Box<dyn ImportCommand>> {
    vec![
        Box::new(CompaniesImporter::new(config.clone())),
        Box::new(ChdImporter::new(config.clone())),
        Box::new(CcniImporter::new(config.clone())),
        Box::new(CcewImporter::new(config.clone())),
    ]
}

/// Look up a command by name, accepting `_` in place of `-`
pub fn find_command(config: &Config, name: &str) -> Result<Box<dyn ImportCommand>> {
    let wanted = name.trim().replace('_', "-");
    all_commands(config)
        .into_iter()
        .find(|command| command.name() == wanted)
        .ok_or_else(|| ImportError::UnknownCommand(name.to_string()))
}

pub fn log_saving(model: &str, count: usize) {
    info!("Saving {} {} records", format_count(count), model);
}

pub fn log_saved(model: &str, count: usize, total: usize) {
    info!(
        "Saved {} {} records ({} total)",
        format_count(count),
        model,
        format_count(total)
    );
}

/// Spinner counting rows read from one file
pub fn row_spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos:>9} rows {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}
