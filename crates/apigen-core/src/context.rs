use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use minijinja::context;
use serde_json::Value;

use crate::ir::{IrInfo, IrSpec, Operation, Schema};

/// Everything a template can see.
///
/// The IR part is fixed for the run once [`Backend::process`] has had its
/// turn; only the two cursors change while the orchestrator iterates.
///
/// [`Backend::process`]: crate::backend::Backend::process
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub schemas: BTreeMap<String, Schema>,
    pub paths: BTreeMap<String, Vec<Operation>>,
    pub base_path: String,
    pub info: IrInfo,
    /// Backend options as given in the config file.
    pub cfg: IndexMap<String, Value>,
    pub current_schema: Option<String>,
    pub current_tag: Option<String>,
}

impl TemplateContext {
    pub fn assemble(ir: IrSpec, options: IndexMap<String, Value>) -> Self {
        Self {
            schemas: ir.schemas,
            paths: ir.paths,
            base_path: ir.base_path,
            info: ir.info,
            cfg: options,
            current_schema: None,
            current_tag: None,
        }
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.current_schema
            .as_deref()
            .and_then(|name| self.schemas.get(name))
    }

    pub fn operations(&self) -> Option<&[Operation]> {
        self.current_tag
            .as_deref()
            .and_then(|tag| self.paths.get(tag))
            .map(Vec::as_slice)
    }

    /// Union of the current tag's operation dependencies, sorted.
    pub fn tag_dependencies(&self) -> BTreeSet<&str> {
        self.operations()
            .into_iter()
            .flatten()
            .flat_map(|op| op.dependencies.iter().map(String::as_str))
            .collect()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// The render context, with `schema`, `operations` and
    /// `tag_dependencies` bound to the current cursors (`none`, or empty,
    /// when a cursor is unset).
    pub fn to_value(&self) -> minijinja::Value {
        context! {
            schemas => &self.schemas,
            paths => &self.paths,
            base_path => &self.base_path,
            info => &self.info,
            cfg => &self.cfg,
            current_schema => &self.current_schema,
            current_tag => &self.current_tag,
            schema => self.schema(),
            operations => self.operations(),
            tag_dependencies => self.tag_dependencies(),
        }
    }
}
