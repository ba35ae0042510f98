use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::context::TemplateContext;
use crate::error::{ConfigError, GenerateError};
use crate::orchestrator::IteratorRegistry;
use crate::template::TemplateTable;
use crate::type_mapper::TypeMapper;

/// A generation target: a type vocabulary, a set of built-in templates and
/// the iterators that lay the output out on disk.
pub trait Backend {
    /// Short identifier, also used as the `implementation` config value.
    fn id(&self) -> &'static str;

    fn type_mapper(&self) -> &dyn TypeMapper;

    fn templates(&self) -> TemplateTable;

    /// Register the backend's own iterators. Runs before any iterator
    /// declared in the config.
    fn stage_default_iterators(
        &self,
        registry: &mut IteratorRegistry,
        options: &IndexMap<String, Value>,
    ) -> Result<(), ConfigError>;

    /// One-time adjustment of the context before any step runs.
    fn process(&self, _context: &mut TemplateContext) -> Result<(), GenerateError> {
        Ok(())
    }

    /// File stem used for a schema's output file.
    fn schema_file_stem(&self, name: &str) -> String {
        name.to_string()
    }

    /// File stem used for a tag's output file.
    fn tag_file_stem(&self, tag: &str) -> String {
        tag.to_string()
    }
}

/// Deserialize the opaque `options` map into a backend's typed options.
pub fn parse_options<T: DeserializeOwned>(
    backend: &str,
    options: &IndexMap<String, Value>,
) -> Result<T, ConfigError> {
    let map: Map<String, Value> = options
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    serde_json::from_value(Value::Object(map)).map_err(|err| ConfigError::BackendOptions {
        backend: backend.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default, deny_unknown_fields)]
    struct DemoOptions {
        server_name: String,
        port: u16,
    }

    impl Default for DemoOptions {
        fn default() -> Self {
            Self {
                server_name: "demo".to_string(),
                port: 8080,
            }
        }
    }

    #[test]
    fn empty_options_use_defaults() {
        let options: DemoOptions = parse_options("demo", &IndexMap::new()).unwrap();
        assert_eq!(options, DemoOptions::default());
    }

    #[test]
    fn options_are_typed() {
        let mut raw = IndexMap::new();
        raw.insert("port".to_string(), json!(9000));
        let options: DemoOptions = parse_options("demo", &raw).unwrap();
        assert_eq!(options.port, 9000);
        assert_eq!(options.server_name, "demo");
    }

    #[test]
    fn bad_options_name_the_backend() {
        let mut raw = IndexMap::new();
        raw.insert("port".to_string(), json!("eighty"));
        let err = parse_options::<DemoOptions>("demo", &raw).unwrap_err();
        assert!(matches!(err, ConfigError::BackendOptions { backend, .. } if backend == "demo"));

        let mut raw = IndexMap::new();
        raw.insert("colour".to_string(), json!("blue"));
        assert!(parse_options::<DemoOptions>("demo", &raw).is_err());
    }
}
