use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

/// A named data schema, either a component or a flattened inline object.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub name: String,
    /// The declared OpenAPI `type`, untranslated.
    #[serde(rename = "type")]
    pub schema_type: Option<String>,
    pub format: Option<String>,
    /// Target of a component that is a bare `$ref`.
    pub ref_name: Option<String>,
    pub properties: Vec<Property>,
    pub dependencies: BTreeSet<String>,
    pub has_enums: bool,
    pub additional_properties: Option<String>,
    #[serde(flatten)]
    pub metadata: SchemaMetadata,
}

impl Schema {
    pub fn is_alias(&self) -> bool {
        self.ref_name.is_some()
    }
}

/// Validation keywords carried through to templates without interpretation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaMetadata {
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub default: Option<Value>,
    pub min_properties: Option<Value>,
    pub max_properties: Option<Value>,
    pub min_items: Option<Value>,
    pub max_items: Option<Value>,
    pub unique_items: Option<Value>,
    pub pattern: Option<Value>,
    pub min_length: Option<Value>,
    pub max_length: Option<Value>,
    pub minimum: Option<Value>,
    pub maximum: Option<Value>,
    pub exclusive_minimum: Option<Value>,
    pub exclusive_maximum: Option<Value>,
    pub multiple_of: Option<Value>,
}

impl SchemaMetadata {
    pub fn from_node(node: &Value) -> Self {
        let get = |key: &str| node.get(key).cloned();
        Self {
            title: get("title"),
            description: get("description"),
            default: get("default"),
            min_properties: get("minProperties"),
            max_properties: get("maxProperties"),
            min_items: get("minItems"),
            max_items: get("maxItems"),
            unique_items: get("uniqueItems"),
            pattern: get("pattern"),
            min_length: get("minLength"),
            max_length: get("maxLength"),
            minimum: get("minimum"),
            maximum: get("maximum"),
            exclusive_minimum: get("exclusiveMinimum"),
            exclusive_maximum: get("exclusiveMaximum"),
            multiple_of: get("multipleOf"),
        }
    }
}

/// A property of an object schema.
#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub type_token: String,
    pub is_required: bool,
    pub enum_values: Option<Vec<Value>>,
    pub description: Option<String>,
}
