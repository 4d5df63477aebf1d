use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use eventkit_codegen::{generate, load_schema_dir, prune_orphans, write_files};
use tracing::debug;

use crate::common::{format_elapsed_ms, run_command};
use crate::config::{PathArgs, Settings};

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub paths: PathArgs,
    #[arg(
        long = "prune",
        help = "Delete previously generated files this run no longer produces"
    )]
    pub prune: bool,
}

#[derive(Debug)]
pub(crate) struct GenerateOutcome {
    pub modules: usize,
    pub written: usize,
    pub removed: Vec<PathBuf>,
}

pub fn run(args: GenerateArgs) -> i32 {
    run_command(|| run_inner(&args))
}

fn run_inner(args: &GenerateArgs) -> Result<(), String> {
    let start = Instant::now();
    let settings = Settings::from_current_dir(&args.paths)?;

    let outcome = generate_into(&settings, args.prune)?;
    for path in &outcome.removed {
        println!("🗑️  Removed {}", path.display());
    }
    println!(
        "✅ Generated {} files for {} modules ({})",
        outcome.written,
        outcome.modules,
        format_elapsed_ms(start)
    );
    Ok(())
}

pub(crate) fn generate_into(settings: &Settings, prune: bool) -> Result<GenerateOutcome, String> {
    let schema = load_schema_dir(&settings.schema_dir).map_err(|err| err.to_string())?;
    let files = generate(&schema, &settings.generator).map_err(|err| err.to_string())?;
    debug!(files = files.len(), "Rendered files in memory.");

    write_files(&files, &settings.dirs).map_err(|err| err.to_string())?;
    let removed = if prune {
        prune_orphans(&files, &settings.dirs).map_err(|err| err.to_string())?
    } else {
        Vec::new()
    };

    Ok(GenerateOutcome {
        modules: schema.modules().len(),
        written: files.len(),
        removed,
    })
}
