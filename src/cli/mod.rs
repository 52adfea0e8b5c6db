pub mod args;
mod batch;
mod rules;
mod validate;

pub use args::{BatchCliArgs, Cli, CliCommand, RulesCliArgs, ValidateCliArgs};
pub use batch::handle_batch_command;
pub use rules::handle_rules_command;
pub use validate::handle_validate_command;
