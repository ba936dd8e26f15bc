//! Command dispatch: bridges CLI args -> core pipeline -> output formatting.

pub mod check;
pub mod config_cmd;
pub mod facts;
pub mod plan;
pub mod rules;

use crate::cli::{Command, GlobalOpts};
use crate::config::{Config, Settings};
use crate::error::CliError;

/// Dispatch a compiler command to the appropriate handler.
pub fn dispatch(
    cmd: Command,
    global: &GlobalOpts,
    config: &Config,
    settings: Settings,
) -> Result<(), CliError> {
    match cmd {
        Command::Plan(args) => plan::handle(&args, global, config, settings),
        Command::Check(args) => check::handle(&args, global, config, settings),
        Command::Facts(args) => facts::handle(&args, global, config, settings),
        Command::Rules => rules::handle(global, config, settings),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
