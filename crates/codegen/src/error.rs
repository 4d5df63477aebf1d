use std::io;
use std::path::PathBuf;

/// A violation found while loading or validating a schema module.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate {kind} {name:?}")]
    Duplicate { kind: &'static str, name: String },

    #[error("unknown type {name:?}")]
    UnknownType { name: String },

    #[error("malformed datatype {name:?}: {reason}")]
    MalformedDatatype { name: String, reason: &'static str },

    #[error("malformed path {path:?}: {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("type {name:?} contains itself by value ({path})")]
    ValueCycle { name: String, path: String },

    #[error("invalid identifier {name:?}: {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },

    #[error("{0}")]
    Unsupported(String),

    #[error("{context}: {source}")]
    At {
        context: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Attach the location the error was found at.
    pub fn at(self, context: impl Into<String>) -> Self {
        Self::At {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, without location wrappers.
    pub fn into_root(self) -> Self {
        match self {
            Self::At { source, .. } => source.into_root(),
            other => other,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema module {module}: {source}")]
    Schema {
        module: String,
        #[source]
        source: SchemaError,
    },

    #[error("failed to render {template}: {source}")]
    Render {
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("{0}")]
    Config(String),
}

impl CodegenError {
    pub(crate) fn schema(module: &str, source: SchemaError) -> Self {
        Self::Schema {
            module: module.to_string(),
            source,
        }
    }
}
