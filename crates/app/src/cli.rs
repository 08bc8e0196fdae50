use anyhow::Result;

use crate::{client, server};

pub const USAGE: &str = "Usage: app <client|server> [flags]\n\n  \
app client [--server <host:port>] [--width <px>] [--height <px>] [--fps <n>] [--history <frames>] [--verbose]\n  \
app server [--listen <host:port>] [--threshold <0-255>] [--verbose]\n\n\
Run `app <client|server> --help` for the per-role flags.";

/// Dispatch a subcommand. Returns false when no subcommand matched so the
/// caller can print usage.
pub fn handle_commands(args: &[String]) -> Result<bool> {
    match args.get(1).map(|s| s.as_str()) {
        Some("client") => {
            client::run_from_args(args)?;
            Ok(true)
        }
        Some("server") => {
            server::run_from_args(args)?;
            Ok(true)
        }
        Some("help") | Some("--help") | Some("-h") => {
            println!("{USAGE}");
            Ok(true)
        }
        _ => Ok(false),
    }
}
