pub mod ccew_importer;
pub mod ccni_importer;
pub mod chd_importer;
pub mod command_logger;
pub mod companies_importer;
pub mod csv_source;
pub mod field_cleaner;
pub mod import_command;
pub mod record_batch;

pub use command_logger::{run_logged, CommandLogLayer, LoggedRun};
pub use import_command::{all_commands, find_command, ImportCommand, ImportFlags, ImportOptions, ImportSummary};
