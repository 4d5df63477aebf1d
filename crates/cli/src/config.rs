//! `eventkit.toml` and the path flags shared by every command.
//!
//! Precedence is flag, then file, then default. Flag paths are taken relative
//! to the working directory; file paths and defaults relative to the
//! directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use eventkit_codegen::{GeneratorConfig, OutputDirs};
use serde::Deserialize;
use tracing::debug;

pub const CONFIG_FILE: &str = "eventkit.toml";
const DEFAULT_SCHEMA_DIR: &str = "schema";
const DEFAULT_BACKEND_OUT: &str = "src/generated";
const DEFAULT_FRONTEND_OUT: &str = "frontend/generated";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub schema_dir: Option<PathBuf>,
    pub backend: TargetSection,
    pub frontend: TargetSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetSection {
    pub out_dir: Option<PathBuf>,
    pub module_prefix: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
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
    #[arg(
        long = "backend-out",
        value_name = "DIR",
        help = "Directory receiving the generated Rust modules"
    )]
    pub backend_out: Option<PathBuf>,
    #[arg(
        long = "frontend-out",
        value_name = "DIR",
        help = "Directory receiving the generated TypeScript files"
    )]
    pub frontend_out: Option<PathBuf>,
}

/// Everything a command needs once flags and file are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub schema_dir: PathBuf,
    pub dirs: OutputDirs,
    pub generator: GeneratorConfig,
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
    toml::from_str(&raw).map_err(|err| format!("Failed to parse {}: {err}", path.display()))
}

impl Settings {
    pub fn from_current_dir(args: &PathArgs) -> Result<Self, String> {
        let cwd = std::env::current_dir()
            .map_err(|err| format!("Failed to determine working directory: {err}"))?;
        Self::resolve(args, &cwd)
    }

    pub fn resolve(args: &PathArgs, cwd: &Path) -> Result<Self, String> {
        let (file, base) = match &args.config {
            Some(path) => {
                let path = cwd.join(path);
                let base = path
                    .parent()
                    .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
                (load_config_file(&path)?, base)
            }
            None => {
                let default = cwd.join(CONFIG_FILE);
                if default.is_file() {
                    (load_config_file(&default)?, cwd.to_path_buf())
                } else {
                    (ConfigFile::default(), cwd.to_path_buf())
                }
            }
        };

        let pick = |flag: Option<&PathBuf>, from_file: Option<&PathBuf>, default: &str| match (
            flag, from_file,
        ) {
            (Some(flag), _) => cwd.join(flag),
            (None, Some(value)) => base.join(value),
            (None, None) => base.join(default),
        };

        let defaults = GeneratorConfig::default();
        let settings = Self {
            schema_dir: pick(
                args.schema_dir.as_ref(),
                file.schema_dir.as_ref(),
                DEFAULT_SCHEMA_DIR,
            ),
            dirs: OutputDirs {
                backend: pick(
                    args.backend_out.as_ref(),
                    file.backend.out_dir.as_ref(),
                    DEFAULT_BACKEND_OUT,
                ),
                frontend: pick(
                    args.frontend_out.as_ref(),
                    file.frontend.out_dir.as_ref(),
                    DEFAULT_FRONTEND_OUT,
                ),
            },
            generator: GeneratorConfig {
                backend_module_prefix: file
                    .backend
                    .module_prefix
                    .unwrap_or(defaults.backend_module_prefix),
                frontend_module_prefix: file
                    .frontend
                    .module_prefix
                    .unwrap_or(defaults.frontend_module_prefix),
                backend_layout: defaults.backend_layout,
            },
        };
        debug!(
            schema_dir = %settings.schema_dir.display(),
            backend = %settings.dirs.backend.display(),
            frontend = %settings.dirs.frontend.display(),
            "Resolved settings."
        );
        Ok(settings)
    }
}
