use std::path::Path;
use std::time::Instant;

use clap::Args;
use console::style;
use eventkit_codegen::{StaleFile, Staleness, generate, load_schema_dir, stale_files};
use similar::{ChangeTag, TextDiff};

use crate::common::{format_elapsed_ms, run_command};
use crate::config::{PathArgs, Settings};

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub paths: PathArgs,
    #[arg(long = "diff", help = "Print a unified diff for every changed file")]
    pub diff: bool,
}

pub fn run(args: CheckArgs) -> i32 {
    run_command(|| run_inner(&args))
}

fn run_inner(args: &CheckArgs) -> Result<(), String> {
    let start = Instant::now();
    let settings = Settings::from_current_dir(&args.paths)?;
    let stale = find_stale(&settings)?;

    if stale.is_empty() {
        println!(
            "✅ Generated files are up to date ({})",
            format_elapsed_ms(start)
        );
        return Ok(());
    }

    for file in &stale {
        println!("{} {}", status_label(file.status), file.path.display());
        if args.diff
            && let (Some(actual), Some(expected)) = (&file.actual, &file.expected)
        {
            print!("{}", render_diff(&file.path, actual, expected));
        }
    }
    Err(format!(
        "{} generated file(s) are stale; run `eventkit-codegen generate`",
        stale.len()
    ))
}

pub(crate) fn find_stale(settings: &Settings) -> Result<Vec<StaleFile>, String> {
    let schema = load_schema_dir(&settings.schema_dir).map_err(|err| err.to_string())?;
    let files = generate(&schema, &settings.generator).map_err(|err| err.to_string())?;
    stale_files(&files, &settings.dirs).map_err(|err| err.to_string())
}

fn status_label(status: Staleness) -> String {
    match status {
        Staleness::Missing => style("missing ").yellow().to_string(),
        Staleness::Changed => style("changed ").red().to_string(),
        Staleness::Orphaned => style("orphaned").magenta().to_string(),
    }
}

fn render_diff(path: &Path, actual: &str, expected: &str) -> String {
    let diff = TextDiff::from_lines(actual, expected);
    let mut output = String::new();

    output.push_str(&format!(
        "{}\n",
        style(format!("--- {} (on disk)", path.display())).bold()
    ));
    output.push_str(&format!(
        "{}\n",
        style(format!("+++ {} (generated)", path.display())).bold()
    ));

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push_str("...\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let value = change.value();
                let line = value.strip_suffix('\n').unwrap_or(value);
                let rendered = match change.tag() {
                    ChangeTag::Delete => style(format!("-{line}")).red().to_string(),
                    ChangeTag::Insert => style(format!("+{line}")).green().to_string(),
                    ChangeTag::Equal => format!(" {line}"),
                };
                output.push_str(&rendered);
                output.push('\n');
            }
        }
    }
    output
}
