//! Command dispatch: routes each CLI command to its handler.

pub mod config_cmd;
pub mod devices;
pub mod poll;
pub mod route;
pub mod sites;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config::Runtime;
use crate::error::CliError;

/// Dispatch a fleet command to the appropriate handler.
pub async fn dispatch(cmd: Command, runtime: &Runtime, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(runtime, &args, global).await,
        Command::Poll(args) => poll::handle(runtime, &args, global).await,
        Command::Sites => sites::handle(runtime, global).await,
        Command::Devices(args) => devices::handle(runtime, &args, global).await,
        Command::Route(args) => route::handle(runtime, &args, global),
        // Handled in main before a runtime exists
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
