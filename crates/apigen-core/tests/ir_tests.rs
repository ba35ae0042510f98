use apigen_core::error::ResolveError;
use apigen_core::ir::{HttpMethod, IrSpec, ParameterLocation};
use apigen_core::parse;
use apigen_core::transform::build_ir;
use apigen_core::transform::spec_to_ir::dangling_dependencies;
use apigen_core::type_mapper::TypeTable;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

const TS: TypeTable = TypeTable::new(&[
    ("integer", "number"),
    ("int32", "number"),
    ("int64", "number"),
    ("number", "number"),
    ("string", "string"),
    ("boolean", "boolean"),
    ("date", "string"),
    ("date-time", "Date"),
    ("object", "any"),
    ("array", "Array"),
    ("<", "<"),
    (">", ">"),
]);

fn petstore() -> IrSpec {
    let doc = parse::from_yaml(PETSTORE).unwrap();
    build_ir(&doc, &TS).unwrap()
}

#[test]
fn petstore_info_and_base_path() {
    let ir = petstore();
    assert_eq!(ir.info.title, "Petstore");
    assert_eq!(ir.info.version, "1.2.0");
    assert_eq!(ir.info.description.as_deref(), Some("A sample pet store."));
    assert_eq!(ir.base_path, "https://petstore.example.com/v1");
}

#[test]
fn petstore_schema_names_include_flattened_children() {
    let ir = petstore();
    let names: Vec<&str> = ir.schemas.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "Animal",
            "Error",
            "Grid",
            "Inventory",
            "NewPet",
            "Pet",
            "PetId",
            "PetOwner",
            "PetOwnerAddress",
            "PetVisits",
            "Tag",
        ]
    );
}

#[test]
fn pet_properties_and_dependencies() {
    let ir = petstore();
    let pet = &ir.schemas["Pet"];

    let props: Vec<(&str, &str, bool)> = pet
        .properties
        .iter()
        .map(|p| (p.name.as_str(), p.type_token.as_str(), p.is_required))
        .collect();
    assert_eq!(
        props,
        vec![
            ("id", "number", true),
            ("name", "string", true),
            ("status", "string", false),
            ("born", "string", false),
            ("owner", "PetOwner", false),
            ("tags", "Array<Tag>", false),
            ("visits", "Array<PetVisits>", false),
        ]
    );
    assert!(pet.has_enums);
    assert_eq!(pet.properties[2].enum_values.as_ref().map(Vec::len), Some(3));
    assert_eq!(
        pet.dependencies.iter().collect::<Vec<_>>(),
        vec!["PetOwner", "PetVisits", "Tag"]
    );
}

#[test]
fn nested_inline_objects_chain_their_names() {
    let ir = petstore();
    let owner = &ir.schemas["PetOwner"];
    assert_eq!(owner.properties[1].type_token, "PetOwnerAddress");
    assert_eq!(
        owner.dependencies.iter().collect::<Vec<_>>(),
        vec!["PetOwnerAddress"]
    );
    assert_eq!(ir.schemas["PetOwnerAddress"].properties[0].name, "city");
    assert_eq!(ir.schemas["PetVisits"].properties[0].type_token, "Date");
}

#[test]
fn alias_primitive_and_map_components() {
    let ir = petstore();

    let animal = &ir.schemas["Animal"];
    assert!(animal.is_alias());
    assert_eq!(animal.ref_name.as_deref(), Some("Pet"));
    assert_eq!(animal.dependencies.iter().collect::<Vec<_>>(), vec!["Pet"]);

    let pet_id = &ir.schemas["PetId"];
    assert_eq!(pet_id.schema_type.as_deref(), Some("integer"));
    assert_eq!(pet_id.format.as_deref(), Some("int64"));
    assert!(pet_id.properties.is_empty());

    let grid = &ir.schemas["Grid"];
    assert_eq!(grid.schema_type.as_deref(), Some("array"));
    assert!(grid.dependencies.is_empty());

    let inventory = &ir.schemas["Inventory"];
    assert_eq!(inventory.additional_properties.as_deref(), Some("number"));
    assert!(inventory.properties.is_empty());
}

#[test]
fn operations_grouped_by_tag_in_stable_order() {
    let ir = petstore();
    assert_eq!(
        ir.paths.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["default", "pets", "store"]
    );

    let pets: Vec<(&str, HttpMethod, &str)> = ir.paths["pets"]
        .iter()
        .map(|op| (op.url.as_str(), op.method, op.function_name.as_str()))
        .collect();
    assert_eq!(
        pets,
        vec![
            ("/pets", HttpMethod::Get, "listPets"),
            ("/pets", HttpMethod::Post, "createPet"),
            ("/pets/{petId}", HttpMethod::Get, "getPet"),
            ("/pets/{petId}", HttpMethod::Delete, "deletePet"),
        ]
    );
    assert_eq!(ir.paths["default"][0].function_name, "listHealth");
    assert_eq!(ir.operation_count(), 6);
}

#[test]
fn path_level_defaults_merge_into_operations() {
    let ir = petstore();
    let list = &ir.paths["pets"][0];

    let params: Vec<(&str, ParameterLocation, Option<&str>)> = list
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.location, p.type_token.as_deref()))
        .collect();
    assert_eq!(
        params,
        vec![
            ("X-Trace-Id", ParameterLocation::Header, Some("string")),
            ("limit", ParameterLocation::Query, Some("number")),
            ("tags", ParameterLocation::Query, Some("Array<string>")),
        ]
    );
    assert_eq!(
        list.parameters_locations.iter().copied().collect::<Vec<_>>(),
        vec![ParameterLocation::Header, ParameterLocation::Query]
    );
    assert_eq!(list.summary.as_deref(), Some("Pets collection"));
    assert_eq!(list.extensions["x-owner"], "pets-team");

    // operation-level parameters shadow path-level ones with the same (name, in)
    let delete = &ir.paths["pets"][3];
    assert_eq!(delete.parameters.len(), 1);
    assert_eq!(delete.parameters[0].type_token.as_deref(), Some("string"));
    assert_eq!(delete.parameters[0].description.as_deref(), Some("Pet to remove"));
    assert!(delete.deprecated);

    let get = &ir.paths["pets"][2];
    assert_eq!(get.summary.as_deref(), Some("Find a pet"));
    assert_eq!(get.parameters[0].type_token.as_deref(), Some("number"));
    assert!(get.parameters[0].required);
}

#[test]
fn responses_sorted_and_resolved() {
    let ir = petstore();
    let list = &ir.paths["pets"][0];
    let codes: Vec<&str> = list.responses.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["200", "default"]);
    assert_eq!(
        list.responses[1].description.as_deref(),
        Some("Unexpected error")
    );
    assert_eq!(
        list.responses[0].contents[0].type_token.as_deref(),
        Some("Array<Pet>")
    );
    assert_eq!(
        list.response_formats.iter().collect::<Vec<_>>(),
        vec!["application/json"]
    );

    let get = &ir.paths["pets"][2];
    let codes: Vec<&str> = get.responses.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["200", "404"]);
}

#[test]
fn operation_dependencies_cover_bodies_and_responses() {
    let ir = petstore();
    let deps = |tag: &str, i: usize| -> Vec<String> {
        ir.paths[tag][i].dependencies.iter().cloned().collect()
    };
    assert_eq!(deps("pets", 0), vec!["Error", "Pet"]);
    assert_eq!(deps("pets", 1), vec!["Error", "NewPet", "Pet"]);
    assert!(deps("pets", 3).is_empty());
    assert_eq!(deps("store", 0), vec!["Inventory"]);

    let create = &ir.paths["pets"][1];
    let body = create.request_body.as_ref().unwrap();
    assert!(body.required);
    assert_eq!(body.formats, vec!["application/json"]);
    assert_eq!(body.contents[0].type_token.as_deref(), Some("NewPet"));
}

#[test]
fn every_reference_target_is_a_schema() {
    let ir = petstore();
    assert!(dangling_dependencies(&ir).is_empty());
    for op in ir.operations() {
        for dep in &op.dependencies {
            assert!(ir.schemas.contains_key(dep), "{dep} used by {}", op.function_name);
        }
    }
}

#[test]
fn building_twice_is_identical() {
    let first = serde_json::to_string(&petstore()).unwrap();
    let second = serde_json::to_string(&petstore()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn nested_arrays_wrap_twice() {
    let doc = parse::from_yaml(
        r#"
openapi: 3.0.3
paths: {}
components:
  schemas:
    Board:
      type: object
      properties:
        cells:
          type: array
          items:
            type: array
            items: {type: string}
"#,
    )
    .unwrap();
    let ir = build_ir(&doc, &TS).unwrap();
    assert_eq!(
        ir.schemas["Board"].properties[0].type_token,
        "Array<Array<string>>"
    );
}

#[test]
fn dangling_reference_reports_its_location() {
    let doc = parse::from_yaml(
        r#"
openapi: 3.0.3
paths:
  /pets:
    get:
      responses:
        '200':
          content:
            application/json:
              schema: {$ref: '#/components/schemas/Missing'}
"#,
    )
    .unwrap();
    let err = build_ir(&doc, &TS).unwrap_err();
    match err {
        ResolveError::ReferenceNotFound { reference, location } => {
            assert_eq!(reference, "#/components/schemas/Missing");
            assert!(location.starts_with("paths./pets.get"), "{location}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_function_names_are_fatal() {
    let doc = parse::from_yaml(
        r#"
openapi: 3.0.3
paths:
  /a:
    get: {operationId: fetch, responses: {}}
  /b:
    get: {operationId: fetch, responses: {}}
"#,
    )
    .unwrap();
    let err = build_ir(&doc, &TS).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::DuplicateOperation { name, first, second }
            if name == "fetch" && first == "paths./a.get" && second == "paths./b.get"
    ));
}

#[test]
fn unmapped_type_is_fatal() {
    let doc = parse::from_yaml(
        r#"
openapi: 3.0.3
paths: {}
components:
  schemas:
    Thing:
      type: object
      properties:
        blob: {type: file}
"#,
    )
    .unwrap();
    let err = build_ir(&doc, &TS).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::UnmappedType { token, location }
            if token == "file" && location == "components.schemas.Thing.properties.blob"
    ));
}
