use serde_json::Value;

use crate::error::ResolveError;

const REF_KEY: &str = "$ref";

/// Resolves local `$ref` pointers of the form `#/<section>/<group>/<name>`
/// against the root document.
///
/// Resolution is one hop: a target that is itself a `$ref` is returned as-is
/// and each call site decides whether to follow it.
#[derive(Debug, Clone, Copy)]
pub struct RefResolver<'a> {
    root: &'a Value,
}

impl<'a> RefResolver<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Look up the node a `$ref` string points at.
    pub fn resolve(&self, reference: &str, location: &str) -> Result<&'a Value, ResolveError> {
        let [section, group, name] = split_ref(reference, location)?;
        self.root
            .get(section)
            .and_then(|s| s.get(group))
            .and_then(|g| g.get(name))
            .ok_or_else(|| ResolveError::ReferenceNotFound {
                reference: reference.to_string(),
                location: location.to_string(),
            })
    }

    /// Return the referenced node when `node` carries a `$ref`, else `node`.
    pub fn deref(&self, node: &'a Value, location: &str) -> Result<&'a Value, ResolveError> {
        match ref_of(node) {
            Some(reference) => self.resolve(reference, location),
            None => Ok(node),
        }
    }

    /// Resolve `reference` and return the name of its target.
    ///
    /// Fails when the target does not exist, so a name returned from here
    /// always denotes something present in the document.
    pub fn target_name<'r>(
        &self,
        reference: &'r str,
        location: &str,
    ) -> Result<&'r str, ResolveError> {
        self.resolve(reference, location)?;
        ref_name(reference, location)
    }
}

/// The `$ref` string of a node, if it is a reference.
pub fn ref_of(node: &Value) -> Option<&str> {
    node.get(REF_KEY).and_then(Value::as_str)
}

/// The final segment of a `#/<section>/<group>/<name>` pointer.
pub fn ref_name<'r>(reference: &'r str, location: &str) -> Result<&'r str, ResolveError> {
    let [_, _, name] = split_ref(reference, location)?;
    Ok(name)
}

fn split_ref<'r>(reference: &'r str, location: &str) -> Result<[&'r str; 3], ResolveError> {
    let invalid = || ResolveError::InvalidRef {
        reference: reference.to_string(),
        location: location.to_string(),
    };
    let mut parts = reference.split('/');
    if parts.next() != Some("#") {
        return Err(invalid());
    }
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(section), Some(group), Some(name), None)
            if !section.is_empty() && !group.is_empty() && !name.is_empty() =>
        {
            Ok([section, group, name])
        }
        _ => Err(invalid()),
    }
}
