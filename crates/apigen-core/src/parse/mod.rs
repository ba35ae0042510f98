pub mod ref_resolve;

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::ParseError;

/// A raw OpenAPI document kept as a plain nested mapping.
///
/// Construction only checks the handful of structural facts the IR builder
/// relies on; it is not a validator for the OpenAPI grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    root: Value,
}

impl SpecDocument {
    pub fn from_value(root: Value) -> Result<Self, ParseError> {
        let Some(map) = root.as_object() else {
            return Err(ParseError::NotAMapping {
                field: "<root>".to_string(),
            });
        };
        let version = map
            .get("openapi")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::MissingField("openapi".to_string()))?;
        validate_version(version)?;
        match map.get("paths") {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(ParseError::NotAMapping {
                    field: "paths".to_string(),
                });
            }
            None => return Err(ParseError::MissingField("paths".to_string())),
        }
        if let Some(components) = map.get("components") {
            if !components.is_object() {
                return Err(ParseError::NotAMapping {
                    field: "components".to_string(),
                });
            }
            if components.get("schemas").is_some_and(|s| !s.is_object()) {
                return Err(ParseError::NotAMapping {
                    field: "components.schemas".to_string(),
                });
            }
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn openapi(&self) -> &str {
        self.root["openapi"].as_str().unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        self.root["info"]["title"].as_str().unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.root["info"]["version"].as_str().unwrap_or_default()
    }

    pub fn description(&self) -> Option<&str> {
        self.root["info"]["description"].as_str()
    }

    /// `(url, path item)` pairs in declared order.
    pub fn paths(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.root["paths"].as_object().into_iter().flatten()
    }

    pub fn component_schemas(&self) -> Option<&Map<String, Value>> {
        self.root["components"]["schemas"].as_object()
    }

    /// The first server's url, or `/` when the document declares none.
    pub fn base_path(&self) -> &str {
        self.root["servers"][0]["url"].as_str().unwrap_or("/")
    }
}

/// Parse an OpenAPI document from YAML.
pub fn from_yaml(input: &str) -> Result<SpecDocument, ParseError> {
    let root: Value = serde_yaml_ng::from_str(input)?;
    SpecDocument::from_value(root)
}

/// Parse an OpenAPI document from JSON.
pub fn from_json(input: &str) -> Result<SpecDocument, ParseError> {
    let root: Value = serde_json::from_str(input)?;
    SpecDocument::from_value(root)
}

/// Read and parse a document from disk. `.json` files go through the JSON
/// parser, everything else through YAML.
pub fn load_spec(path: &Path) -> Result<SpecDocument, ParseError> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => from_json(&content),
        _ => from_yaml(&content),
    }
}

fn validate_version(version: &str) -> Result<(), ParseError> {
    if !version.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(version.to_string()));
    }
    Ok(())
}
