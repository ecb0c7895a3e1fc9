//! # cdir CLI entry point
//!
//! Builds the directory registry from the environment, then resolves or
//! registers identifiers. Output is JSON on stdout; logs go to stderr.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cdir_cli::app::build_resolver;
use cdir_cli::commands::{run_lookup, run_register, run_types, LookupArgs, RegisterArgs};

/// Central directory: which DFSP owns an identifier?
#[derive(Parser, Debug)]
#[command(name = "cdir", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// JSON file listing known DFSPs.
    #[arg(long, global = true)]
    dfsps: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered identifier types.
    Types,

    /// Resolve an identifier to the DFSPs that own it.
    Lookup(LookupArgs),

    /// Claim an identifier for a DFSP.
    Register(RegisterArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    tracing::debug!("cdir CLI starting");

    let result = async {
        let resolver = build_resolver(cli.dfsps.as_deref())?;
        let mut out = std::io::stdout().lock();
        let code = match &cli.command {
            Commands::Types => run_types(&resolver, &mut out),
            Commands::Lookup(args) => run_lookup(&resolver, args, &mut out).await,
            Commands::Register(args) => run_register(&resolver, args, &mut out).await,
        }?;
        out.flush()?;
        anyhow::Ok(code)
    }
    .await;

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_types() {
        let cli = Cli::try_parse_from(["cdir", "types"]).unwrap();
        assert!(matches!(cli.command, Commands::Types));
        assert_eq!(cli.verbose, 0);
        assert!(!cli.json_logs);
    }

    #[test]
    fn cli_parse_lookup() {
        let cli = Cli::try_parse_from(["cdir", "-vv", "lookup", "tel:+14441235555"]).unwrap();
        assert_eq!(cli.verbose, 2);
        if let Commands::Lookup(args) = cli.command {
            assert_eq!(args.query, "tel:+14441235555");
        } else {
            panic!("expected lookup");
        }
    }

    #[test]
    fn cli_parse_register() {
        let cli = Cli::try_parse_from([
            "cdir",
            "register",
            "tel:+14441235555",
            "--dfsp",
            "001",
            "--primary",
            "--dfsps",
            "dfsps.json",
        ])
        .unwrap();
        assert_eq!(cli.dfsps, Some(PathBuf::from("dfsps.json")));
        if let Commands::Register(args) = cli.command {
            assert_eq!(args.dfsp, "001");
            assert!(args.primary);
        } else {
            panic!("expected register");
        }
    }

    #[test]
    fn cli_register_requires_dfsp() {
        assert!(Cli::try_parse_from(["cdir", "register", "tel:+14441235555"]).is_err());
    }
}
