//! Command dispatch: bridges CLI args -> session operations -> output.

pub mod config_cmd;
pub mod reports;
pub mod run;
pub mod scans;
pub mod sites;
pub mod util;

use nexrun_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a console-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(session, resolved, args, global).await,
        Command::Sites(args) => sites::handle(session, resolved, args, global).await,
        Command::Scans(args) => scans::handle(session, resolved, args, global).await,
        Command::Reports(args) => reports::handle(session, resolved, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "handled before connecting".into(),
        }),
    }
}
