use apigen_core::type_mapper::TypeTable;

/// OpenAPI type/format keys to Python annotations.
pub const PYTHON: TypeTable = TypeTable::new(&[
    ("integer", "int"),
    ("int32", "int"),
    ("long", "int"),
    ("int64", "int"),
    ("float", "float"),
    ("double", "float"),
    ("number", "float"),
    ("string", "str"),
    ("byte", "str"),
    ("binary", "str"),
    ("password", "str"),
    ("boolean", "bool"),
    ("date", "date"),
    ("date-time", "datetime"),
    ("object", "object"),
    ("array", "List"),
    ("<", "["),
    (">", "]"),
]);

#[cfg(test)]
mod tests {
    use apigen_core::error::ResolveError;
    use apigen_core::parse::ref_resolve::RefResolver;
    use apigen_core::transform::type_inference::TypeInference;
    use apigen_core::type_mapper::TypeMapper;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_primitives() {
        assert_eq!(PYTHON.lang_type("integer"), Some("int"));
        assert_eq!(PYTHON.lang_type("number"), Some("float"));
        assert_eq!(PYTHON.lang_type("boolean"), Some("bool"));
        assert_eq!(PYTHON.lang_type("date-time"), Some("datetime"));
        assert_eq!(PYTHON.lang_type("uuid"), None);
    }

    #[test]
    fn test_nested_arrays() {
        let root = json!({});
        let inference = TypeInference::new(RefResolver::new(&root), &PYTHON);
        let node = json!({"type": "array", "items": {"type": "array", "items": {"type": "string"}}});
        assert_eq!(
            inference.infer_type(&node, "", 0, "x").unwrap(),
            "List[List[str]]"
        );
    }

    #[test]
    fn test_format_wins_over_type() {
        let root = json!({});
        let inference = TypeInference::new(RefResolver::new(&root), &PYTHON);
        let node = json!({"type": "string", "format": "date"});
        assert_eq!(inference.infer_type(&node, "", 0, "x").unwrap(), "date");
        // unknown formats fall back to the type
        let node = json!({"type": "string", "format": "uuid"});
        assert_eq!(inference.infer_type(&node, "", 0, "x").unwrap(), "str");
    }

    #[test]
    fn test_unmapped_type() {
        let root = json!({});
        let inference = TypeInference::new(RefResolver::new(&root), &PYTHON);
        let err = inference
            .infer_type(&json!({"type": "null"}), "", 0, "components.schemas.N")
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnmappedType { token, .. } if token == "null"));
    }
}
