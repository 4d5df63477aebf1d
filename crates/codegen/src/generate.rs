//! The generation pipeline.
//!
//! Every artifact is rendered in memory first. Files are only touched once
//! every emitter of every module has succeeded.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::backend::{CommandsEmitter, EventsEmitter, Renderer, RestEmitter, TypesEmitter};
use crate::config::{BackendLayout, GeneratorConfig};
use crate::error::CodegenError;
use crate::frontend::{ClientEmitter, CommandDefinitionsEmitter};
use crate::resolve::{flatten, module_dependencies, reachable_from_endpoints};
use crate::schema::{ModuleSchema, SchemaSet, validate_schema_set};

/// First line of every generated file. Also marks files `check` may report
/// as orphaned.
pub const GENERATED_HEADER: &str = "// Code generated by eventkit-codegen. DO NOT EDIT.";

/// Backend sections in declaration order.
const BACKEND_SECTIONS: [&str; 4] = ["types", "commands", "events", "rest"];

/// Name of the wrapper file of [`BackendLayout::Include`].
pub const INCLUDE_WRAPPER: &str = "eventkit_generated.rs";

const GENERATED_ALLOWS: &str =
    "clippy::all, clippy::pedantic, dead_code, unused_imports, unused_qualifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Backend,
    Frontend,
}

/// One rendered artifact. `path` is relative to its target's output dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub target: Target,
    pub path: PathBuf,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(target: Target, path: impl Into<PathBuf>, content: String) -> Self {
        Self {
            target,
            path: path.into(),
            content,
        }
    }
}

/// What an emitter sees: its module, the whole schema for cross-module
/// lookups, and the generator settings.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub module: &'a ModuleSchema,
    pub schema: &'a SchemaSet,
    pub config: &'a GeneratorConfig,
}

/// Renders zero or more artifacts for one module.
pub trait Emitter {
    fn name(&self) -> &'static str;

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Vec<GeneratedFile>, CodegenError>;
}

/// Validate `schema` and render every artifact, backend module glue included.
pub fn generate(
    schema: &SchemaSet,
    config: &GeneratorConfig,
) -> Result<Vec<GeneratedFile>, CodegenError> {
    validate_schema_set(schema)?;
    debug!(modules = schema.modules().len(), "Schema validated.");

    let renderer = Renderer::new()?;
    let types = TypesEmitter::new(&renderer);
    let commands = CommandsEmitter::new(&renderer);
    let events = EventsEmitter::new(&renderer);
    let rest = RestEmitter::new(&renderer);
    let emitters: [&dyn Emitter; 6] = [
        &types,
        &commands,
        &events,
        &rest,
        &ClientEmitter,
        &CommandDefinitionsEmitter,
    ];

    let mut files = Vec::new();
    for module in schema.modules() {
        let ctx = EmitContext {
            module,
            schema,
            config,
        };
        for emitter in emitters {
            let produced = emitter.emit(&ctx)?;
            debug!(
                module = %module.id,
                emitter = emitter.name(),
                files = produced.len(),
                "Emitted artifacts."
            );
            files.extend(produced);
        }
    }

    let glue = module_glue(schema, config.backend_layout, &files);
    files.extend(glue);

    info!(
        modules = schema.modules().len(),
        files = files.len(),
        "Generation complete."
    );
    Ok(files)
}

/// Backend sections present per module, in declaration order.
fn backend_sections<'a>(
    schema: &'a SchemaSet,
    files: &[GeneratedFile],
) -> BTreeMap<&'a str, Vec<&'static str>> {
    let produced: BTreeSet<&Path> = files
        .iter()
        .filter(|f| f.target == Target::Backend)
        .map(|f| f.path.as_path())
        .collect();

    schema
        .modules()
        .iter()
        .map(|m| {
            let sections = BACKEND_SECTIONS
                .into_iter()
                .filter(|s| produced.contains(Path::new(&format!("{}/{s}.rs", m.id))))
                .collect();
            (m.id.as_str(), sections)
        })
        .collect()
}

/// The files that make the backend artifacts a module tree.
fn module_glue(
    schema: &SchemaSet,
    layout: BackendLayout,
    files: &[GeneratedFile],
) -> Vec<GeneratedFile> {
    let sections = backend_sections(schema, files);

    match layout {
        BackendLayout::ModuleTree => {
            let mut glue = Vec::with_capacity(sections.len() + 1);

            let mut root = format!("{GENERATED_HEADER}\n\n#![allow({GENERATED_ALLOWS})]\n\n");
            for id in sections.keys() {
                root.push_str(&format!("pub mod {id};\n"));
            }
            glue.push(GeneratedFile::new(Target::Backend, "mod.rs", root));

            for (id, present) in &sections {
                let mut content = format!("{GENERATED_HEADER}\n\n");
                for section in present {
                    content.push_str(&format!("pub mod {section};\n"));
                }
                glue.push(GeneratedFile::new(
                    Target::Backend,
                    format!("{id}/mod.rs"),
                    content,
                ));
            }
            glue
        }
        BackendLayout::Include => {
            let mut content = format!("{GENERATED_HEADER}\n");
            for (id, present) in &sections {
                content.push_str(&format!("\n#[allow({GENERATED_ALLOWS})]\npub mod {id} {{\n"));
                for section in present {
                    content.push_str(&format!(
                        "    pub mod {section} {{\n        include!(concat!(env!(\"OUT_DIR\"), \"/{id}/{section}.rs\"));\n    }}\n"
                    ));
                }
                content.push_str("}\n");
            }
            vec![GeneratedFile::new(Target::Backend, INCLUDE_WRAPPER, content)]
        }
    }
}

/// Where each target's files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub backend: PathBuf,
    pub frontend: PathBuf,
}

impl OutputDirs {
    pub fn root(&self, target: Target) -> &Path {
        match target {
            Target::Backend => &self.backend,
            Target::Frontend => &self.frontend,
        }
    }

    /// Where `file` lands on disk.
    pub fn path_of(&self, file: &GeneratedFile) -> PathBuf {
        self.root(file.target).join(&file.path)
    }
}

/// Write every file, replacing whatever was there.
pub fn write_files(files: &[GeneratedFile], dirs: &OutputDirs) -> Result<(), CodegenError> {
    for file in files {
        let path = dirs.path_of(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| CodegenError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, &file.content).map_err(|source| CodegenError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = file.content.len(), "Wrote file.");
    }
    info!(files = files.len(), "Generated files written.");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Staleness {
    /// Would be generated but does not exist.
    Missing,
    /// Exists with different content.
    Changed,
    /// Carries the generated header but this run would not produce it.
    Orphaned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleFile {
    pub path: PathBuf,
    pub status: Staleness,
    /// Content this run would write, if any.
    pub expected: Option<String>,
    /// Content currently on disk, if any.
    pub actual: Option<String>,
}

/// Compare `files` with what is on disk.
pub fn stale_files(
    files: &[GeneratedFile],
    dirs: &OutputDirs,
) -> Result<Vec<StaleFile>, CodegenError> {
    let mut stale = Vec::new();
    let mut expected_paths = BTreeSet::new();

    for file in files {
        let path = dirs.path_of(file);
        expected_paths.insert(path.clone());

        match read_existing(&path)? {
            None => stale.push(StaleFile {
                path,
                status: Staleness::Missing,
                expected: Some(file.content.clone()),
                actual: None,
            }),
            Some(actual) if actual != file.content => stale.push(StaleFile {
                path,
                status: Staleness::Changed,
                expected: Some(file.content.clone()),
                actual: Some(actual),
            }),
            Some(_) => {}
        }
    }

    for (path, actual) in generated_on_disk(dirs)? {
        if !expected_paths.contains(&path) {
            stale.push(StaleFile {
                path,
                status: Staleness::Orphaned,
                expected: None,
                actual: Some(actual),
            });
        }
    }

    Ok(stale)
}

/// Delete generated files this run did not produce. Returns what was removed.
pub fn prune_orphans(
    files: &[GeneratedFile],
    dirs: &OutputDirs,
) -> Result<Vec<PathBuf>, CodegenError> {
    let mut removed = Vec::new();
    for orphan in stale_files(files, dirs)?
        .into_iter()
        .filter(|s| s.status == Staleness::Orphaned)
    {
        fs::remove_file(&orphan.path).map_err(|source| CodegenError::Write {
            path: orphan.path.clone(),
            source,
        })?;
        info!(path = %orphan.path.display(), "Removed orphaned file.");
        removed.push(orphan.path);
    }
    Ok(removed)
}

fn read_existing(path: &Path) -> Result<Option<String>, CodegenError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CodegenError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Files under the output dirs whose first line is [`GENERATED_HEADER`].
fn generated_on_disk(dirs: &OutputDirs) -> Result<Vec<(PathBuf, String)>, CodegenError> {
    let roots: BTreeSet<&Path> = [dirs.backend.as_path(), dirs.frontend.as_path()]
        .into_iter()
        .filter(|root| root.is_dir())
        .collect();

    let mut found = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| CodegenError::Read {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            // Non-UTF-8 files are not ours.
            let Ok(content) = fs::read_to_string(entry.path()) else {
                continue;
            };
            if content.lines().next() == Some(GENERATED_HEADER) {
                found.push((entry.into_path(), content));
            }
        }
    }
    Ok(found)
}

/// Resolved view of one module, for `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    pub module: String,
    pub flattened_types: Vec<String>,
    pub endpoint_reachable_types: Vec<String>,
    pub enums: Vec<EnumSummary>,
    pub dependencies: Vec<String>,
    pub commands: Vec<String>,
    pub events: Vec<String>,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumSummary {
    pub name: String,
    pub digest: String,
}

/// Validate `schema` and summarize what the resolver sees in each module.
pub fn inspect(schema: &SchemaSet) -> Result<Vec<ModuleSummary>, CodegenError> {
    validate_schema_set(schema)?;

    Ok(schema
        .modules()
        .iter()
        .map(|m| ModuleSummary {
            module: m.id.clone(),
            flattened_types: flatten(&m.types).into_iter().map(|dt| dt.name.clone()).collect(),
            endpoint_reachable_types: reachable_from_endpoints(m),
            enums: m
                .types
                .enums
                .iter()
                .map(|e| EnumSummary {
                    name: e.name.clone(),
                    digest: e.members_digest(),
                })
                .collect(),
            dependencies: module_dependencies(m),
            commands: m.commands.iter().map(|c| c.command.clone()).collect(),
            events: m.events.iter().map(|e| e.event.clone()).collect(),
            endpoints: m
                .types
                .endpoints
                .iter()
                .map(|e| format!("{} {} {}", e.method.as_str(), e.path, e.name))
                .collect(),
        })
        .collect())
}
