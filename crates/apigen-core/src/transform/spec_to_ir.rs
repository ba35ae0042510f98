use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::error::ResolveError;
use crate::ir::{HttpMethod, IrInfo, IrSpec, Operation};
use crate::parse::SpecDocument;
use crate::parse::ref_resolve::RefResolver;
use crate::type_mapper::TypeMapper;

use super::operations::build_operation;
use super::path_merge::merge_path_and_operation;
use super::schema_flatten::SchemaFlattener;
use super::type_inference::TypeInference;

/// Build the IR for `doc`, computing type tokens with `mapper`.
pub fn build_ir(doc: &SpecDocument, mapper: &dyn TypeMapper) -> Result<IrSpec, ResolveError> {
    let resolver = RefResolver::new(doc.root());
    let inference = TypeInference::new(resolver, mapper);

    // Phase 1: Register component schemas, flattening inline objects
    let schemas = SchemaFlattener::new(inference).flatten_all(doc.component_schemas())?;

    // Phase 2: Merge each (path, method) pair and group by tag
    let paths = build_paths(doc, &inference)?;

    let info = IrInfo {
        title: doc.title().to_string(),
        version: doc.version().to_string(),
        description: doc.description().map(str::to_string),
    };

    log::debug!(
        "built IR: {} schemas, {} tags",
        schemas.len(),
        paths.len()
    );

    Ok(IrSpec {
        info,
        base_path: doc.base_path().to_string(),
        schemas,
        paths,
    })
}

fn build_paths(
    doc: &SpecDocument,
    inference: &TypeInference<'_>,
) -> Result<BTreeMap<String, Vec<Operation>>, ResolveError> {
    let resolver = inference.resolver();
    // (operation, location, whether the name came from an `operationId`)
    let mut built: Vec<(Operation, String, bool)> = Vec::new();

    for (url, item) in doc.paths() {
        let path_loc = format!("paths.{url}");
        let Some(path_item) = item.as_object() else {
            return Err(ResolveError::MalformedSpec {
                location: path_loc,
                reason: "path item must be a mapping".to_string(),
            });
        };

        for method in HttpMethod::ALL {
            let Some(raw) = path_item.get(method.as_str()) else {
                continue;
            };
            let location = format!("{path_loc}.{}", method.as_str());
            let Some(operation) = raw.as_object() else {
                return Err(ResolveError::MalformedSpec {
                    location,
                    reason: "operation must be a mapping".to_string(),
                });
            };

            let merged = merge_path_and_operation(path_item, operation, resolver, &location)?;
            let declared = merged.get("operationId").and_then(Value::as_str).is_some();
            let op = build_operation(url, method, &merged, inference, &location)?;
            built.push((op, location, declared));
        }
    }

    assign_unique_names(&mut built)?;

    let mut paths: BTreeMap<String, Vec<Operation>> = BTreeMap::new();
    for (op, _, _) in built {
        paths.entry(op.tag.clone()).or_default().push(op);
    }

    for operations in paths.values_mut() {
        operations.sort_by(|a, b| a.url.cmp(&b.url).then(a.method.cmp(&b.method)));
    }
    Ok(paths)
}

/// Declared `operationId`s must be unique. Names derived from the route
/// give way to them and to each other with a numeric suffix.
fn assign_unique_names(built: &mut [(Operation, String, bool)]) -> Result<(), ResolveError> {
    // function name -> where it was first declared
    let mut seen: HashMap<String, String> = HashMap::new();

    for (op, location, _) in built.iter().filter(|(_, _, declared)| *declared) {
        if let Some(first) = seen.get(&op.function_name) {
            return Err(ResolveError::DuplicateOperation {
                name: op.function_name.clone(),
                first: first.clone(),
                second: location.clone(),
            });
        }
        seen.insert(op.function_name.clone(), location.clone());
    }

    for (op, location, _) in built.iter_mut().filter(|(_, _, declared)| !*declared) {
        if let Some(first) = seen.get(&op.function_name) {
            let mut n = 2;
            let unique = loop {
                let candidate = format!("{}{n}", op.function_name);
                if !seen.contains_key(&candidate) {
                    break candidate;
                }
                n += 1;
            };
            log::warn!(
                "{location}: derived name `{}` is already used by {first}, using `{unique}`",
                op.function_name
            );
            op.function_name = unique;
        }
        seen.insert(op.function_name.clone(), location.clone());
    }
    Ok(())
}

/// Every schema name referenced anywhere in the IR that is not itself a
/// registered schema. Empty for any IR produced by [`build_ir`].
pub fn dangling_dependencies(ir: &IrSpec) -> Vec<String> {
    let schema_deps = ir.schemas.values().flat_map(|s| s.dependencies.iter());
    let operation_deps = ir.operations().flat_map(|op| op.dependencies.iter());
    let mut missing: Vec<String> = schema_deps
        .chain(operation_deps)
        .filter(|name| !ir.schemas.contains_key(*name))
        .cloned()
        .collect();
    missing.sort();
    missing.dedup();
    missing
}
