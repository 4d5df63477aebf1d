use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;
mod common;
mod config;

const DEFAULT_LOG_FILTER: &str = "eventkit=info";

#[derive(Parser)]
#[command(
    name = "eventkit-codegen",
    version,
    about = "\x1b[33meventkit-codegen\x1b[0m turns schema modules into Rust and TypeScript 🧬"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 🔨 Generate backend and frontend files
    Generate(commands::generate::GenerateArgs),
    /// 🔍 Check that generated files are up to date
    Check(commands::check::CheckArgs),
    /// 📋 Print the resolved schema model as JSON
    Inspect(commands::inspect::InspectArgs),
}

fn main() {
    init_tracing();
    std::process::exit(run_cli(std::env::args_os()));
}

fn run_cli<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Generate(args)) => commands::generate::run(args),
            Some(Commands::Check(args)) => commands::check::run(args),
            Some(Commands::Inspect(args)) => commands::inspect::run(args),
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        assert_eq!(run_cli(["eventkit-codegen", "generate", "--nope"]), 2);
    }

    #[test]
    fn test_no_subcommand_prints_help() {
        assert_eq!(run_cli(["eventkit-codegen"]), 0);
    }

    #[test]
    fn test_missing_schema_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let schema_dir = dir.path().join("missing");
        let code = run_cli([
            "eventkit-codegen".into(),
            "inspect".into(),
            "--schema-dir".to_string(),
            schema_dir.display().to_string(),
        ]);
        assert_eq!(code, 1);
    }
}
