use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("expected `{field}` to be a mapping")]
    NotAMapping { field: String },
}

/// Errors raised while turning the raw document into the IR.
///
/// Every variant is fatal; `location` points at the offending spec fragment,
/// e.g. `components.schemas.Pet.properties.tags`.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid reference format `{reference}` at {location}")]
    InvalidRef { reference: String, location: String },

    #[error("reference `{reference}` not found (used at {location})")]
    ReferenceNotFound { reference: String, location: String },

    #[error("schema at {location} has neither `type` nor `$ref`")]
    MissingType { location: String },

    #[error("array schema at {location} has no `items`")]
    MissingItems { location: String },

    #[error("type `{token}` at {location} has no mapping for this backend")]
    UnmappedType { token: String, location: String },

    #[error("malformed spec at {location}: {reason}")]
    MalformedSpec { location: String, reason: String },

    #[error("schema name `{name}` produced twice (second time at {location})")]
    DuplicateSchema { name: String, location: String },

    #[error("operation name `{name}` used by both {first} and {second}")]
    DuplicateOperation {
        name: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{name}` not found in user templates or built-ins")]
    NotFound { name: String },

    #[error("failed to render `{name}`: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize checksum ledger: {0}")]
    Ledger(#[from] serde_json::Error),

    #[error("overwrite prompt failed: {0}")]
    Prompt(String),

    #[error("{} is produced twice in one run", path.display())]
    DuplicateOutput { path: PathBuf },
}

impl EmitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EmitError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("invalid options for backend `{backend}`: {reason}")]
    BackendOptions { backend: String, reason: String },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("emit error: {0}")]
    Emit(#[from] EmitError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("step requires the `{0}` cursor but the current iterator does not set it")]
    MissingCursor(&'static str),
}
