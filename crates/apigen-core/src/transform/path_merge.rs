use serde_json::{Map, Value};

use crate::error::ResolveError;
use crate::parse::ref_resolve::RefResolver;

/// Keys a path item provides only when the operation leaves them unset.
const FALLBACK_KEYS: [&str; 5] = ["summary", "description", "servers", "method", "url"];

/// Merge a path item's defaults into one of its operations.
///
/// Path-level `x-` extensions are copied first so the operation's own keys
/// win. [`FALLBACK_KEYS`] are filled in from the path item when absent.
/// Path-level parameters are appended unless the operation already
/// declares a parameter with the same `(name, in)` pair.
pub fn merge_path_and_operation(
    path_item: &Map<String, Value>,
    operation: &Map<String, Value>,
    resolver: RefResolver<'_>,
    location: &str,
) -> Result<Map<String, Value>, ResolveError> {
    let mut merged = Map::new();

    for (key, value) in path_item {
        if key.starts_with("x-") {
            merged.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in operation {
        merged.insert(key.clone(), value.clone());
    }
    for key in FALLBACK_KEYS {
        if !merged.contains_key(key) {
            if let Some(value) = path_item.get(key) {
                merged.insert(key.to_string(), value.clone());
            }
        }
    }

    let path_params = parameter_list(path_item, resolver, location)?;
    let op_params = parameter_list(operation, resolver, location)?;
    let parameters = match (op_params, path_params) {
        (None, None) => None,
        (None, Some(path_params)) => Some(path_params.into_iter().map(|(_, p)| p).collect()),
        (Some(op_params), None) => Some(op_params.into_iter().map(|(_, p)| p).collect()),
        (Some(op_params), Some(path_params)) => {
            let mut list: Vec<Value> = Vec::with_capacity(op_params.len() + path_params.len());
            let shadowed: Vec<(String, String)> =
                op_params.iter().map(|(key, _)| key.clone()).collect();
            list.extend(op_params.into_iter().map(|(_, p)| p));
            list.extend(
                path_params
                    .into_iter()
                    .filter(|(key, _)| !shadowed.contains(key))
                    .map(|(_, p)| p),
            );
            Some(list)
        }
    };
    if let Some(parameters) = parameters {
        merged.insert("parameters".to_string(), Value::Array(parameters));
    }

    Ok(merged)
}

/// The `parameters` list of a mapping, each entry paired with its
/// `(name, in)` key. Entries are kept as written; `$ref`s are only followed
/// to read the key.
fn parameter_list(
    owner: &Map<String, Value>,
    resolver: RefResolver<'_>,
    location: &str,
) -> Result<Option<Vec<((String, String), Value)>>, ResolveError> {
    let Some(raw) = owner.get("parameters") else {
        return Ok(None);
    };
    let Some(entries) = raw.as_array() else {
        return Err(ResolveError::MalformedSpec {
            location: format!("{location}.parameters"),
            reason: "`parameters` must be a list".to_string(),
        });
    };

    let mut list = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let loc = format!("{location}.parameters.{i}");
        let target = resolver.deref(entry, &loc)?;
        let field = |name: &str| target.get(name).and_then(Value::as_str).unwrap_or_default();
        list.push(((field("name").to_string(), field("in").to_string()), entry.clone()));
    }
    Ok(Some(list))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn merge(path_item: Value, operation: Value) -> Map<String, Value> {
        let root = json!({
            "components": {"parameters": {"Auth": {"name": "auth", "in": "header"}}}
        });
        let resolver = RefResolver::new(&root);
        merge_path_and_operation(
            path_item.as_object().unwrap(),
            operation.as_object().unwrap(),
            resolver,
            "paths./pets",
        )
        .unwrap()
    }

    #[test]
    fn operation_keys_override_path_extensions() {
        let merged = merge(
            json!({"x-owner": "path", "x-rate": 10, "summary": "path summary"}),
            json!({"x-owner": "op", "summary": "op summary"}),
        );
        assert_eq!(merged["x-owner"], "op");
        assert_eq!(merged["x-rate"], 10);
        assert_eq!(merged["summary"], "op summary");
    }

    #[test]
    fn fallback_keys_fill_gaps_only() {
        let merged = merge(
            json!({"summary": "path summary", "description": "path desc", "get": {}}),
            json!({"description": "op desc"}),
        );
        assert_eq!(merged["summary"], "path summary");
        assert_eq!(merged["description"], "op desc");
        assert!(!merged.contains_key("get"));
    }

    #[test]
    fn path_parameters_inherited_when_operation_has_none() {
        let merged = merge(
            json!({"parameters": [{"name": "id", "in": "path", "required": true}]}),
            json!({}),
        );
        assert_eq!(
            merged["parameters"],
            json!([{"name": "id", "in": "path", "required": true}])
        );
    }

    #[test]
    fn operation_parameters_shadow_by_name_and_location() {
        let merged = merge(
            json!({"parameters": [
                {"name": "id", "in": "path", "description": "path level"},
                {"name": "id", "in": "query"},
                {"$ref": "#/components/parameters/Auth"}
            ]}),
            json!({"parameters": [
                {"name": "id", "in": "path", "description": "op level"},
                {"name": "auth", "in": "header", "description": "op auth"}
            ]}),
        );
        let params = merged["parameters"].as_array().unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params[0]["description"], "op level");
        assert_eq!(params[1]["description"], "op auth");
        assert_eq!(params[2], json!({"name": "id", "in": "query"}));
    }

    #[test]
    fn non_list_parameters_are_malformed() {
        let root = json!({});
        let err = merge_path_and_operation(
            json!({"parameters": {"name": "id"}}).as_object().unwrap(),
            json!({}).as_object().unwrap(),
            RefResolver::new(&root),
            "paths./pets",
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::MalformedSpec { location, .. } if location == "paths./pets.parameters"));
    }
}
