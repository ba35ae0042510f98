use serde_json::Value;

use crate::error::ResolveError;
use crate::parse::ref_resolve::{RefResolver, ref_of};
use crate::type_mapper::{OBJECT, TypeMapper};

/// Computes backend type tokens for schema nodes.
#[derive(Clone, Copy)]
pub struct TypeInference<'a> {
    resolver: RefResolver<'a>,
    mapper: &'a dyn TypeMapper,
}

impl<'a> TypeInference<'a> {
    pub fn new(resolver: RefResolver<'a>, mapper: &'a dyn TypeMapper) -> Self {
        Self { resolver, mapper }
    }

    pub fn resolver(&self) -> RefResolver<'a> {
        self.resolver
    }

    pub fn mapper(&self) -> &'a dyn TypeMapper {
        self.mapper
    }

    /// Infer the type token of `node`.
    ///
    /// `owner_hint` is the name an inline object at this position is
    /// flattened under; `depth` is the number of enclosing array layers
    /// whose close tokens still have to be emitted.
    pub fn infer_type(
        &self,
        node: &Value,
        owner_hint: &str,
        depth: usize,
        location: &str,
    ) -> Result<String, ResolveError> {
        if !node.is_object() {
            return Err(ResolveError::MalformedSpec {
                location: location.to_string(),
                reason: "schema must be a mapping".to_string(),
            });
        }

        if let Some(reference) = ref_of(node) {
            let name = self.resolver.target_name(reference, location)?;
            return Ok(format!("{name}{}", self.mapper.closers(depth, location)?));
        }

        let schema_type = match node.get("type") {
            Some(Value::String(t)) => t.as_str(),
            Some(_) => {
                return Err(ResolveError::MalformedSpec {
                    location: location.to_string(),
                    reason: "`type` must be a string".to_string(),
                });
            }
            None => {
                return Err(ResolveError::MissingType {
                    location: location.to_string(),
                });
            }
        };

        let base = match schema_type {
            "array" => {
                let items = node.get("items").ok_or_else(|| ResolveError::MissingItems {
                    location: location.to_string(),
                })?;
                let inner = self.infer_type(
                    items,
                    owner_hint,
                    depth + 1,
                    &format!("{location}.items"),
                )?;
                return Ok(format!("{}{inner}", self.mapper.array_open(location)?));
            }
            "object" if owner_hint.is_empty() => self.mapper.require(OBJECT, location)?,
            "object" => owner_hint,
            other => {
                let by_format = node
                    .get("format")
                    .and_then(Value::as_str)
                    .and_then(|f| self.mapper.lang_type(f));
                match by_format {
                    Some(token) => token,
                    None => self.mapper.require(other, location)?,
                }
            }
        };

        Ok(format!("{base}{}", self.mapper.closers(depth, location)?))
    }

    /// Type token of a body/response/parameter entry's `schema`, if any.
    pub fn schema_type(
        &self,
        entry: &Value,
        location: &str,
    ) -> Result<Option<String>, ResolveError> {
        entry
            .get("schema")
            .map(|schema| self.infer_type(schema, "", 0, &format!("{location}.schema")))
            .transpose()
    }
}
