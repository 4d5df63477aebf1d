//! Schema compiler for eventkit services.
//!
//! One declarative schema per module yields:
//! - backend Rust: records, command scaffolding, event replay scaffolding and
//!   an axum router
//! - frontend TypeScript: a typed API client and command form definitions
//!
//! ```text
//! load_schema_dir -> generate (validate, render in memory) -> write_files
//! ```

pub mod backend;
pub mod build;
pub mod config;
pub mod error;
pub mod frontend;
pub mod generate;
pub mod mapper;
pub mod naming;
pub mod resolve;
pub mod schema;

pub use config::{BackendLayout, GeneratorConfig};
pub use error::{CodegenError, SchemaError};
pub use generate::{
    GeneratedFile, ModuleSummary, OutputDirs, StaleFile, Staleness, Target, generate, inspect,
    prune_orphans, stale_files, write_files,
};
pub use schema::{SchemaSet, load_schema_dir};
