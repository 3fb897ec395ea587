//! # mlchain-cli: command-line client for mlchain
//!
//! `mlchain <verb> <args...>`. Every verb has a fixed arity; a mismatch
//! prints that verb's usage and exits 1 before any wallet or network access.
//!
//! ```bash
//! mlchain enrollAdmins
//! mlchain enroll alice
//! mlchain buy 'x509::CN=alice...' 100
//! mlchain transfer alice 'x509::CN=bob...' 25
//! mlchain submit alice mnist QmHash input.json output.json
//! ```
//!
//! Identity workflows and wallet-backed transactions run in-process through
//! `mlchain-workflow`; token reads, purchases and model reads go through the
//! REST gateway.

pub mod api_client;
pub mod commands;
pub mod verbs;

use std::io::Write;

pub use api_client::{ApiClient, ApiError};
pub use commands::Dispatcher;
pub use verbs::{parse, Command, Parsed, VerbSpec, VERBS};

/// Check `verb` and `args` against the verb table.
///
/// Usage text goes to `out`. Returns the command to run, or the exit code
/// when nothing should run. Needs no settings, wallet or network.
pub fn preflight<W: Write>(verb: Option<&str>, args: &[String], out: &mut W) -> Result<Command, u8> {
    match parse(verb, args) {
        Parsed::Run(command) => Ok(command),
        Parsed::Usage { text, exit_code } => {
            let _ = writeln!(out, "{text}");
            Err(exit_code)
        }
        Parsed::Invalid { usage, error } => {
            tracing::error!("{error}");
            let _ = writeln!(out, "{usage}");
            Err(1)
        }
    }
}

/// Run a parsed command, writing its result to `out`. Failures are logged.
pub async fn execute<W: Write>(dispatcher: &Dispatcher, command: Command, out: &mut W) -> u8 {
    match dispatcher.run(command).await {
        Ok(text) => {
            let _ = writeln!(out, "{text}");
            0
        }
        Err(e) => {
            tracing::error!("{e:#}");
            1
        }
    }
}

/// Parse and run one invocation, writing user-facing output to `out`.
///
/// Returns the process exit code.
pub async fn dispatch<W: Write>(
    dispatcher: &Dispatcher,
    verb: Option<&str>,
    args: &[String],
    out: &mut W,
) -> u8 {
    match preflight(verb, args, out) {
        Ok(command) => execute(dispatcher, command, out).await,
        Err(code) => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn preflight_prints_usage_on_arity_mismatch() {
        let mut out = Vec::new();
        let result = preflight(Some("getBalance"), &[], &mut out);
        assert_eq!(result, Err(1));
        assert_eq!(
            String::from_utf8(out).unwrap().trim(),
            "usage: mlchain getBalance 'clientID'"
        );
    }

    #[test]
    fn preflight_lists_everything_without_a_verb() {
        let mut out = Vec::new();
        assert_eq!(preflight(None, &[], &mut out), Err(0));
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), VERBS.len());
    }

    #[test]
    fn preflight_passes_a_well_formed_command_through() {
        let mut out = Vec::new();
        let result = preflight(Some("getTotalSupply"), &args(&[]), &mut out);
        assert_eq!(result, Ok(Command::GetTotalSupply));
        assert!(out.is_empty());
    }
}
