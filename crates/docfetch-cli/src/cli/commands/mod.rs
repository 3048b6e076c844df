//! CLI command handlers, one file per command.

mod config_path;
mod plan;
mod run;

pub use config_path::run_config_path;
pub use plan::run_plan;
pub use run::run_batch;
