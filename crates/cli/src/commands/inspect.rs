use std::path::PathBuf;

use clap::Args;
use eventkit_codegen::{ModuleSummary, inspect, load_schema_dir};

use crate::common::run_command;
use crate::config::{PathArgs, Settings};

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(
        long = "config",
        value_name = "PATH",
        help = "Path to the config file. Defaults to ./eventkit.toml when present"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long = "schema-dir",
        value_name = "DIR",
        help = "Directory holding one JSON file per schema module"
    )]
    pub schema_dir: Option<PathBuf>,
    #[arg(long = "module", value_name = "ID", help = "Only print this module")]
    pub module: Option<String>,
}

pub fn run(args: InspectArgs) -> i32 {
    run_command(|| run_inner(&args))
}

fn run_inner(args: &InspectArgs) -> Result<(), String> {
    let settings = Settings::from_current_dir(&PathArgs {
        config: args.config.clone(),
        schema_dir: args.schema_dir.clone(),
        ..PathArgs::default()
    })?;
    let summaries = summarize(&settings, args.module.as_deref())?;
    let json = serde_json::to_string_pretty(&summaries)
        .map_err(|err| format!("Failed to serialize summary: {err}"))?;
    println!("{json}");
    Ok(())
}

pub(crate) fn summarize(
    settings: &Settings,
    module: Option<&str>,
) -> Result<Vec<ModuleSummary>, String> {
    let schema = load_schema_dir(&settings.schema_dir).map_err(|err| err.to_string())?;
    let summaries = inspect(&schema).map_err(|err| err.to_string())?;

    match module {
        None => Ok(summaries),
        Some(id) => {
            let picked: Vec<_> = summaries.into_iter().filter(|s| s.module == id).collect();
            if picked.is_empty() {
                return Err(format!("Unknown module '{id}'"));
            }
            Ok(picked)
        }
    }
}
