use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ApplicationTypesDefinition, CommandSpec, EventSpec, ModuleSchema, SchemaSet};
use crate::error::{CodegenError, SchemaError};
use crate::naming::{TS_RESERVED_WORDS, is_identifier, is_rust_keyword};

const TYPES_FILE: &str = "types.json";
const COMMANDS_FILE: &str = "commands.json";
const EVENTS_FILE: &str = "events.json";

/// Load every module directory under `schema_dir`.
///
/// Directories holding none of the schema documents are skipped. The result
/// is not validated yet; see [`super::validate_schema_set`].
pub fn load_schema_dir(schema_dir: &Path) -> Result<SchemaSet, CodegenError> {
    let entries = fs::read_dir(schema_dir).map_err(|source| CodegenError::Read {
        path: schema_dir.to_path_buf(),
        source,
    })?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CodegenError::Read {
            path: schema_dir.to_path_buf(),
            source,
        })?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    let mut modules = Vec::new();
    for dir in dirs {
        let Some(id) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if let Some(module) = load_module(&dir, &id)? {
            modules.push(module);
        }
    }

    debug!(
        schema_dir = %schema_dir.display(),
        modules = modules.len(),
        "Loaded schema modules."
    );
    Ok(SchemaSet::new(modules))
}

/// Load one module directory. Returns `None` if it holds no schema document.
pub fn load_module(dir: &Path, id: &str) -> Result<Option<ModuleSchema>, CodegenError> {
    let types: Option<ApplicationTypesDefinition> = read_json(&dir.join(TYPES_FILE))?;
    let commands: Option<Vec<CommandSpec>> = read_json(&dir.join(COMMANDS_FILE))?;
    let events: Option<Vec<EventSpec>> = read_json(&dir.join(EVENTS_FILE))?;

    if types.is_none() && commands.is_none() && events.is_none() {
        warn!(dir = %dir.display(), "Skipping directory without schema documents.");
        return Ok(None);
    }

    if !is_valid_module_id(id) {
        return Err(CodegenError::schema(
            id,
            SchemaError::InvalidIdentifier {
                name: id.to_string(),
                reason: "module ids must match [a-z][a-z0-9_]* and not be a keyword",
            },
        ));
    }

    Ok(Some(ModuleSchema {
        id: id.to_string(),
        types: types.unwrap_or_default(),
        commands: commands.unwrap_or_default(),
        events: events.unwrap_or_default(),
    }))
}

/// `[a-z][a-z0-9_]*`, and usable as both a Rust module and a TS binding.
pub(super) fn is_valid_module_id(id: &str) -> bool {
    is_identifier(id)
        && id.starts_with(|c: char| c.is_ascii_lowercase())
        && id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !is_rust_keyword(id)
        && !TS_RESERVED_WORDS.contains(id)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CodegenError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| CodegenError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| CodegenError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_load_schema_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let contacts = tmp.path().join("contacts");
        fs::create_dir_all(&contacts).unwrap();
        fs::write(
            contacts.join(TYPES_FILE),
            r#"{"types":[{"name":"Contact","type":{"_":"object","fields":{"name":{"_":"string"}}}}]}"#,
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("empty")).unwrap();

        let schema = load_schema_dir(tmp.path()).unwrap();
        assert_eq!(schema.modules().len(), 1);

        let module = schema.module("contacts").unwrap();
        assert_eq!(module.types.types[0].name, "Contact");
        assert!(module.commands.is_empty());
    }

    #[test]
    fn test_parse_error_names_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(EVENTS_FILE), "[{").unwrap();

        let err = load_schema_dir(tmp.path()).unwrap_err();
        match err {
            CodegenError::Parse { path, .. } => assert!(path.ends_with("broken/events.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_module_id_rules() {
        assert!(is_valid_module_id("contacts"));
        assert!(is_valid_module_id("u2f_tokens"));
        assert!(!is_valid_module_id("Contacts"));
        assert!(!is_valid_module_id("_x"));
        assert!(!is_valid_module_id("my-module"));
        assert!(!is_valid_module_id("type"));
        assert!(!is_valid_module_id("crate"));
        assert!(!is_valid_module_id("super"));
        assert!(!is_valid_module_id("delete"));
    }

    #[test]
    fn test_keyword_module_dir_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("mod");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(TYPES_FILE), "{}").unwrap();

        let err = load_schema_dir(tmp.path()).unwrap_err();
        assert!(matches!(err, CodegenError::Schema { .. }), "{err}");
    }
}
