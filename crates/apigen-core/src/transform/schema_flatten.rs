use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use super::dependencies::ref_chain_dependency;
use super::name_normalizer::capitalize_first;
use super::type_inference::TypeInference;
use crate::error::ResolveError;
use crate::ir::{Property, Schema, SchemaMetadata};
use crate::parse::ref_resolve::ref_of;

const PRIMITIVE_TYPES: [&str; 4] = ["string", "integer", "number", "boolean"];

/// Whether a component can be registered without flattening: a primitive
/// type, or an array whose innermost element is one. `$ref`s never are.
pub fn is_primitive(node: &Value) -> bool {
    if ref_of(node).is_some() {
        return false;
    }
    match node.get("type").and_then(Value::as_str) {
        Some("array") => node.get("items").is_some_and(is_primitive),
        Some(t) => PRIMITIVE_TYPES.contains(&t),
        None => false,
    }
}

/// Walks `components.schemas`, registering each component and promoting
/// inline nested objects to schemas of their own.
pub struct SchemaFlattener<'a> {
    inference: TypeInference<'a>,
    schemas: BTreeMap<String, Schema>,
}

impl<'a> SchemaFlattener<'a> {
    pub fn new(inference: TypeInference<'a>) -> Self {
        Self {
            inference,
            schemas: BTreeMap::new(),
        }
    }

    pub fn flatten_all(
        mut self,
        components: Option<&Map<String, Value>>,
    ) -> Result<BTreeMap<String, Schema>, ResolveError> {
        for (name, node) in components.into_iter().flatten() {
            self.add_component(name, node)?;
        }
        Ok(self.schemas)
    }

    /// Register one component under `name`.
    pub fn add_component(&mut self, name: &str, node: &Value) -> Result<(), ResolveError> {
        let location = format!("components.schemas.{name}");
        if !node.is_object() {
            return Err(ResolveError::MalformedSpec {
                location,
                reason: "schema must be a mapping".to_string(),
            });
        }

        if let Some(reference) = ref_of(node) {
            let target = self
                .inference
                .resolver()
                .target_name(reference, &location)?
                .to_string();
            let mut schema = base_schema(name, node);
            schema.dependencies.insert(target.clone());
            schema.ref_name = Some(target);
            return self.register(schema, &location);
        }

        if is_primitive(node) {
            return self.register(base_schema(name, node), &location);
        }

        match node.get("type").and_then(Value::as_str) {
            Some("array") => {
                // The innermost element takes the component's name
                let mut element = node;
                let mut layers = 0;
                let mut loc = location.clone();
                while element.get("type").and_then(Value::as_str) == Some("array") {
                    element = element
                        .get("items")
                        .ok_or_else(|| ResolveError::MissingItems {
                            location: loc.clone(),
                        })?;
                    layers += 1;
                    loc.push_str(".items");
                }
                if ref_of(element).is_some() {
                    let mut schema = base_schema(name, node);
                    if let Some(dep) =
                        ref_chain_dependency(node, self.inference.resolver(), &location)?
                    {
                        schema.dependencies.insert(dep);
                    }
                    return self.register(schema, &location);
                }
                // Anything that is not an object fails inference with a located error
                self.inference.infer_type(element, name, 0, &loc)?;
                self.flatten_object(name.to_string(), element, layers, loc)
            }
            Some("object") => self.flatten_object(name.to_string(), node, 0, location),
            _ => {
                self.inference.infer_type(node, "", 0, &location)?;
                self.register(base_schema(name, node), &location)
            }
        }
    }

    /// Register an object schema and recurse into its inline children.
    ///
    /// `depth` is the number of array layers that wrapped this object; its
    /// children are named `name + "Inner" * depth + Property`.
    fn flatten_object(
        &mut self,
        name: String,
        node: &Value,
        depth: usize,
        location: String,
    ) -> Result<(), ResolveError> {
        let child_prefix = format!("{name}{}", "Inner".repeat(depth));
        let required = required_list(node);
        let resolver = self.inference.resolver();

        let properties = match node.get("properties") {
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                return Err(ResolveError::MalformedSpec {
                    location: format!("{location}.properties"),
                    reason: "`properties` must be a mapping".to_string(),
                });
            }
        };

        let mut schema = base_schema(&name, node);
        let mut children = Vec::new();

        for (prop_name, prop_node) in properties.into_iter().flatten() {
            let prop_loc = format!("{location}.properties.{prop_name}");
            let hint = format!("{child_prefix}{}", capitalize_first(prop_name));
            let type_token = self.inference.infer_type(prop_node, &hint, 0, &prop_loc)?;

            if let Some(dep) = ref_chain_dependency(prop_node, resolver, &prop_loc)? {
                schema.dependencies.insert(dep);
            }
            if let Some((element, layers)) = inline_object(prop_node) {
                schema.dependencies.insert(hint.clone());
                children.push((hint, element, layers, prop_loc));
            }

            let enum_values = prop_node.get("enum").and_then(Value::as_array).cloned();
            schema.has_enums |= enum_values.is_some();
            schema.properties.push(Property {
                name: prop_name.clone(),
                type_token,
                is_required: required.contains(prop_name.as_str()),
                enum_values,
                description: prop_node
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }

        if let Some(extra) = node.get("additionalProperties").filter(|v| v.is_object()) {
            let loc = format!("{location}.additionalProperties");
            schema.additional_properties = Some(self.inference.infer_type(extra, "", 0, &loc)?);
            if let Some(dep) = ref_chain_dependency(extra, resolver, &loc)? {
                schema.dependencies.insert(dep);
            }
        }

        self.register(schema, &location)?;

        for (child_name, element, layers, loc) in children {
            self.flatten_object(child_name, element, layers, loc)?;
        }
        Ok(())
    }

    fn register(&mut self, schema: Schema, location: &str) -> Result<(), ResolveError> {
        if self.schemas.contains_key(&schema.name) {
            return Err(ResolveError::DuplicateSchema {
                name: schema.name,
                location: location.to_string(),
            });
        }
        log::debug!("registered schema {}", schema.name);
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }
}

/// The inline object at the end of a property's `items` chain, with the
/// number of array layers around it.
fn inline_object(node: &Value) -> Option<(&Value, usize)> {
    let mut current = node;
    let mut layers = 0;
    loop {
        if ref_of(current).is_some() {
            return None;
        }
        match current.get("type").and_then(Value::as_str) {
            Some("object") => return Some((current, layers)),
            Some("array") => {
                current = current.get("items")?;
                layers += 1;
            }
            _ => return None,
        }
    }
}

fn required_list(node: &Value) -> BTreeSet<&str> {
    node.get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn base_schema(name: &str, node: &Value) -> Schema {
    let text = |key: &str| node.get(key).and_then(Value::as_str).map(str::to_string);
    Schema {
        name: name.to_string(),
        schema_type: text("type"),
        format: text("format"),
        ref_name: None,
        properties: Vec::new(),
        dependencies: BTreeSet::new(),
        has_enums: false,
        additional_properties: None,
        metadata: SchemaMetadata::from_node(node),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::parse::ref_resolve::RefResolver;
    use crate::type_mapper::TypeTable;

    const TS: TypeTable = TypeTable::new(&[
        ("integer", "number"),
        ("number", "number"),
        ("string", "string"),
        ("boolean", "boolean"),
        ("object", "any"),
        ("array", "Array"),
        ("<", "<"),
        (">", ">"),
    ]);

    fn flatten(root: Value) -> Result<BTreeMap<String, Schema>, ResolveError> {
        let resolver = RefResolver::new(&root);
        let flattener = SchemaFlattener::new(TypeInference::new(resolver, &TS));
        flattener.flatten_all(root["components"]["schemas"].as_object())
    }

    #[test]
    fn primitive_classification() {
        assert!(is_primitive(&json!({"type": "string"})));
        assert!(is_primitive(
            &json!({"type": "array", "items": {"type": "array", "items": {"type": "integer"}}})
        ));
        assert!(!is_primitive(&json!({"type": "object"})));
        assert!(!is_primitive(&json!({"$ref": "#/components/schemas/Pet"})));
        assert!(!is_primitive(
            &json!({"type": "array", "items": {"$ref": "#/components/schemas/Pet"}})
        ));
    }

    #[test]
    fn inline_objects_become_schemas() {
        let schemas = flatten(json!({"components": {"schemas": {
            "Owner": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string"},
                    "address": {
                        "type": "object",
                        "properties": {"geo": {"type": "object", "properties": {"lat": {"type": "number"}}}}
                    },
                    "tags": {
                        "type": "array",
                        "items": {"type": "object", "properties": {"meta": {"type": "object"}}}
                    }
                }
            }
        }}}))
        .unwrap();

        let names: Vec<&str> = schemas.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "Owner",
                "OwnerAddress",
                "OwnerAddressGeo",
                "OwnerTags",
                "OwnerTagsInnerMeta"
            ]
        );

        let owner = &schemas["Owner"];
        let types: Vec<(&str, &str, bool)> = owner
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.type_token.as_str(), p.is_required))
            .collect();
        assert_eq!(
            types,
            vec![
                ("name", "string", true),
                ("address", "OwnerAddress", false),
                ("tags", "Array<OwnerTags>", false)
            ]
        );
        assert_eq!(
            owner.dependencies.iter().collect::<Vec<_>>(),
            vec!["OwnerAddress", "OwnerTags"]
        );
        assert_eq!(
            schemas["OwnerTags"].properties[0].type_token,
            "OwnerTagsInnerMeta"
        );
    }

    #[test]
    fn ref_component_is_an_alias() {
        let schemas = flatten(json!({"components": {"schemas": {
            "Pet": {"type": "object"},
            "Animal": {"$ref": "#/components/schemas/Pet"}
        }}}))
        .unwrap();
        let animal = &schemas["Animal"];
        assert_eq!(animal.ref_name.as_deref(), Some("Pet"));
        assert_eq!(animal.dependencies.iter().collect::<Vec<_>>(), vec!["Pet"]);
        assert!(animal.is_alias());
    }

    #[test]
    fn array_of_objects_registers_element_under_component_name() {
        let schemas = flatten(json!({"components": {"schemas": {
            "Pets": {"type": "array", "items": {"type": "object", "properties": {
                "info": {"type": "object"}
            }}}
        }}}))
        .unwrap();
        assert_eq!(schemas["Pets"].schema_type.as_deref(), Some("object"));
        assert!(schemas.contains_key("PetsInnerInfo"));
        assert_eq!(schemas["Pets"].properties[0].type_token, "PetsInnerInfo");
    }

    #[test]
    fn array_of_refs_depends_on_target() {
        let schemas = flatten(json!({"components": {"schemas": {
            "Pet": {"type": "object"},
            "PetList": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}}
        }}}))
        .unwrap();
        let list = &schemas["PetList"];
        assert_eq!(list.schema_type.as_deref(), Some("array"));
        assert_eq!(list.dependencies.iter().collect::<Vec<_>>(), vec!["Pet"]);
    }

    #[test]
    fn refs_and_additional_properties_are_dependencies() {
        let schemas = flatten(json!({"components": {"schemas": {
            "Tag": {"type": "string", "enum": ["a", "b"]},
            "Pet": {
                "type": "object",
                "properties": {
                    "tags": {"type": "array", "items": {"$ref": "#/components/schemas/Tag"}},
                    "kind": {"type": "string", "enum": ["cat", "dog"]}
                },
                "additionalProperties": {"$ref": "#/components/schemas/Tag"}
            }
        }}}))
        .unwrap();
        let pet = &schemas["Pet"];
        assert!(pet.has_enums);
        assert_eq!(pet.additional_properties.as_deref(), Some("Tag"));
        assert_eq!(pet.dependencies.iter().collect::<Vec<_>>(), vec!["Tag"]);
        assert_eq!(
            pet.properties[1].enum_values,
            Some(vec![json!("cat"), json!("dog")])
        );
        assert!(!schemas["Tag"].has_enums);
    }

    #[test]
    fn flattened_name_collision_is_fatal() {
        let err = flatten(json!({"components": {"schemas": {
            "Owner": {"type": "object", "properties": {"address": {"type": "object"}}},
            "OwnerAddress": {"type": "object"}
        }}}))
        .unwrap_err();
        assert!(
            matches!(err, ResolveError::DuplicateSchema { name, location }
                if name == "OwnerAddress" && location == "components.schemas.OwnerAddress")
        );
    }

    #[test]
    fn property_errors_carry_full_location() {
        let err = flatten(json!({"components": {"schemas": {
            "Pet": {"type": "object", "properties": {"tags": {"type": "array"}}}
        }}}))
        .unwrap_err();
        assert!(matches!(err, ResolveError::MissingItems { location }
            if location == "components.schemas.Pet.properties.tags"));
    }

    #[test]
    fn metadata_passes_through() {
        let schemas = flatten(json!({"components": {"schemas": {
            "Name": {"type": "string", "minLength": 1, "maxLength": 64, "pattern": "^[a-z]+$", "title": "Pet name"}
        }}}))
        .unwrap();
        let meta = &schemas["Name"].metadata;
        assert_eq!(meta.min_length, Some(json!(1)));
        assert_eq!(meta.max_length, Some(json!(64)));
        assert_eq!(meta.pattern, Some(json!("^[a-z]+$")));
        assert_eq!(meta.title, Some(json!("Pet name")));
        assert_eq!(meta.minimum, None);
    }
}
