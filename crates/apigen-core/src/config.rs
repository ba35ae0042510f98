use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::emitter::{EmitterOptions, ProtectedPaths, UntrackedPolicy};
use crate::error::ConfigError;
use crate::ledger::DEFAULT_LEDGER_FILE;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".apigen.yaml";

/// Top-level project configuration loaded from `.apigen.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// OpenAPI document, YAML or JSON.
    pub spec: PathBuf,
    pub output: PathBuf,
    /// Directory searched for templates before the built-ins.
    pub templates: Option<PathBuf>,
    pub implementation: Implementation,
    /// Write every file regardless of the ledger (protected paths still win).
    pub overwrite: bool,
    pub protected: Vec<String>,
    /// Ledger location; `<output>/.apigen-checksums.json` when unset.
    pub checksum_file: Option<PathBuf>,
    pub untracked: UntrackedPolicy,
    /// Backend options, interpreted by the selected backend.
    pub options: IndexMap<String, Value>,
    /// Extra template iterators staged after the backend's defaults.
    pub iterators: Vec<IteratorSpec>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            spec: PathBuf::from("openapi.yaml"),
            output: PathBuf::from("build"),
            templates: None,
            implementation: Implementation::Flask,
            overwrite: false,
            protected: Vec::new(),
            checksum_file: None,
            untracked: UntrackedPolicy::Prompt,
            options: IndexMap::new(),
            iterators: Vec::new(),
        }
    }
}

/// Which backend renders the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Implementation {
    Flask,
    Typescript,
}

impl Implementation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Implementation::Flask => "flask",
            Implementation::Typescript => "typescript",
        }
    }
}

/// Granularity of a config-declared template iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IteratorKind {
    Once,
    PerSchema,
    PerTag,
}

/// One extra rendered file (or file family) declared in the config.
///
/// `output` is relative to the output directory and may contain `{schema}`
/// or `{tag}`, replaced with the backend's file stem for the current item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IteratorSpec {
    pub iterator: IteratorKind,
    pub template: String,
    pub output: String,
}

/// Settings given on the command line; `Some` values win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub spec: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub implementation: Option<Implementation>,
    pub overwrite: bool,
    pub protected: Vec<String>,
}

impl ProjectConfig {
    /// A copy of this config with `overrides` applied. Protected patterns
    /// from both sources are kept.
    pub fn merged(&self, overrides: ConfigOverrides) -> Self {
        let mut protected = self.protected.clone();
        protected.extend(overrides.protected);
        Self {
            spec: overrides.spec.unwrap_or_else(|| self.spec.clone()),
            output: overrides.output.unwrap_or_else(|| self.output.clone()),
            templates: overrides.templates.or_else(|| self.templates.clone()),
            implementation: overrides.implementation.unwrap_or(self.implementation),
            overwrite: self.overwrite || overrides.overwrite,
            protected,
            ..self.clone()
        }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.checksum_file
            .clone()
            .unwrap_or_else(|| self.output.join(DEFAULT_LEDGER_FILE))
    }

    pub fn emitter_options(&self) -> EmitterOptions {
        EmitterOptions {
            force: self.overwrite,
            protected: ProtectedPaths::new(&self.protected),
            untracked: self.untracked,
        }
    }
}

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ProjectConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, path).map(Some)
}

pub fn parse_config(content: &str, path: &Path) -> Result<ProjectConfig, ConfigError> {
    // An empty file deserializes as null; treat it as all defaults
    if content.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    serde_yaml_ng::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# apigen configuration
spec: openapi.yaml
output: build
implementation: flask     # flask | typescript
# templates: templates    # searched before the built-in templates

overwrite: false          # true writes every file, ignoring the checksum ledger
untracked: prompt         # prompt | overwrite, for existing files the ledger does not know
protected: []
  # - controllers/        # substring of the output path
  # - models/.*_ext\.py$  # or a regex

# checksum_file: build/.apigen-checksums.json

options: {}
  # server_name: flask_server

iterators: []
  # - iterator: per_schema   # once | per_schema | per_tag
  #   template: schema_doc.md.j2
  #   output: docs/{schema}.md
"#
}
