use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::ResolveError;
use crate::parse::ref_resolve::{RefResolver, ref_of};

/// The schema a node depends on: its `$ref` target, or the target at the
/// end of an `items` chain. Inline and primitive nodes yield `None`.
pub fn ref_chain_dependency(
    node: &Value,
    resolver: RefResolver<'_>,
    location: &str,
) -> Result<Option<String>, ResolveError> {
    let mut current = node;
    loop {
        if let Some(reference) = ref_of(current) {
            return Ok(Some(resolver.target_name(reference, location)?.to_string()));
        }
        if current.get("type").and_then(Value::as_str) != Some("array") {
            return Ok(None);
        }
        match current.get("items") {
            Some(items) => current = items,
            None => return Ok(None),
        }
    }
}

/// Dependencies contributed by the content entries of a request body or
/// response, i.e. a `content` mapping of media type to entry.
///
/// An entry without `schema` is read through its `items` instead.
pub fn content_dependencies(
    content: Option<&Value>,
    resolver: RefResolver<'_>,
    location: &str,
    into: &mut BTreeSet<String>,
) -> Result<(), ResolveError> {
    let Some(entries) = content.and_then(Value::as_object) else {
        return Ok(());
    };
    for (format, entry) in entries {
        let (node, key) = match (entry.get("schema"), entry.get("items")) {
            (Some(schema), _) => (schema, "schema"),
            (None, Some(items)) => (items, "items"),
            (None, None) => continue,
        };
        let loc = format!("{location}.content.{format}.{key}");
        if let Some(name) = ref_chain_dependency(node, resolver, &loc)? {
            into.insert(name);
        }
    }
    Ok(())
}

/// Every schema referenced by an operation's request body or responses.
///
/// `operation` is the merged operation mapping; body and response `$ref`s
/// are followed one hop before their content is read.
pub fn operation_dependencies(
    operation: &Map<String, Value>,
    resolver: RefResolver<'_>,
    location: &str,
) -> Result<BTreeSet<String>, ResolveError> {
    let mut deps = BTreeSet::new();

    if let Some(body) = operation.get("requestBody") {
        let loc = format!("{location}.requestBody");
        let body = resolver.deref(body, &loc)?;
        content_dependencies(body.get("content"), resolver, &loc, &mut deps)?;
    }

    if let Some(responses) = operation.get("responses").and_then(Value::as_object) {
        for (code, response) in responses {
            let loc = format!("{location}.responses.{code}");
            let response = resolver.deref(response, &loc)?;
            content_dependencies(response.get("content"), resolver, &loc, &mut deps)?;
        }
    }

    Ok(deps)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn root() -> Value {
        json!({
            "components": {
                "schemas": {"Pet": {"type": "object"}, "Error": {"type": "object"}},
                "responses": {
                    "NotFound": {
                        "description": "missing",
                        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Error"}}}
                    }
                }
            }
        })
    }

    #[test]
    fn follows_items_chain() {
        let root = root();
        let resolver = RefResolver::new(&root);
        let node = json!({"type": "array", "items": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}}});
        assert_eq!(
            ref_chain_dependency(&node, resolver, "x").unwrap().as_deref(),
            Some("Pet")
        );
        let inline = json!({"type": "array", "items": {"type": "string"}});
        assert_eq!(ref_chain_dependency(&inline, resolver, "x").unwrap(), None);
    }

    #[test]
    fn collects_body_and_response_refs() {
        let root = root();
        let resolver = RefResolver::new(&root);
        let op = json!({
            "requestBody": {
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
            },
            "responses": {
                "200": {"description": "ok", "content": {"application/json": {"schema": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}}}}},
                "204": {"description": "empty"},
                "404": {"$ref": "#/components/responses/NotFound"}
            }
        });
        let deps = operation_dependencies(op.as_object().unwrap(), resolver, "paths./pets.post").unwrap();
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["Error", "Pet"]);
    }

    #[test]
    fn content_without_schema_falls_back_to_items() {
        let root = root();
        let resolver = RefResolver::new(&root);
        let content = json!({
            "application/json": {"items": {"$ref": "#/components/schemas/Pet"}},
            "text/csv": {"items": {"type": "array", "items": {"$ref": "#/components/schemas/Error"}}},
            "text/plain": {"example": "nothing to follow"}
        });
        let mut deps = BTreeSet::new();
        content_dependencies(Some(&content), resolver, "paths./pets.get.responses.200", &mut deps).unwrap();
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["Error", "Pet"]);

        let dangling = json!({"application/json": {"items": {"$ref": "#/components/schemas/Ghost"}}});
        let err = content_dependencies(Some(&dangling), resolver, "r", &mut BTreeSet::new()).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ReferenceNotFound { location, .. }
                if location == "r.content.application/json.items"
        ));
    }

    #[test]
    fn dangling_content_ref_is_fatal() {
        let root = root();
        let resolver = RefResolver::new(&root);
        let op = json!({
            "responses": {
                "200": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Ghost"}}}}
            }
        });
        let err = operation_dependencies(op.as_object().unwrap(), resolver, "paths./pets.get").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ReferenceNotFound { location, .. }
                if location == "paths./pets.get.responses.200.content.application/json.schema"
        ));
    }
}
