//! Entry point for Cargo build scripts.
//!
//! ```ignore
//! // build.rs
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     eventkit_codegen::build::compile_schema("schema")?;
//!     Ok(())
//! }
//!
//! // lib.rs
//! pub mod generated {
//!     include!(concat!(env!("OUT_DIR"), "/eventkit_generated.rs"));
//! }
//! ```

use std::env;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{BackendLayout, GeneratorConfig};
use crate::error::CodegenError;
use crate::generate::{OutputDirs, generate, write_files};
use crate::schema::load_schema_dir;

/// Subdirectory of `OUT_DIR` receiving the TypeScript files.
pub const FRONTEND_SUBDIR: &str = "frontend";

/// Generate from `schema_dir` into `OUT_DIR`.
///
/// Backend files are reachable through `OUT_DIR/eventkit_generated.rs`,
/// expected to be included as `crate::generated`. Frontend files land in
/// `OUT_DIR/frontend`.
pub fn compile_schema(schema_dir: impl AsRef<Path>) -> Result<(), CodegenError> {
    let schema_dir = schema_dir.as_ref();
    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| CodegenError::Config("OUT_DIR is not set; call from build.rs".into()))?;

    for entry in WalkDir::new(schema_dir).sort_by_file_name().into_iter().flatten() {
        println!("cargo:rerun-if-changed={}", entry.path().display());
    }

    let config = GeneratorConfig {
        backend_layout: BackendLayout::Include,
        ..GeneratorConfig::default()
    };
    let schema = load_schema_dir(schema_dir)?;
    let files = generate(&schema, &config)?;

    write_files(
        &files,
        &OutputDirs {
            frontend: out_dir.join(FRONTEND_SUBDIR),
            backend: out_dir,
        },
    )
}
