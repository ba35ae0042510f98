use std::collections::BTreeMap;

use serde::Serialize;

use super::operations::Operation;
use super::schemas::Schema;

/// The resolved IR handed to the template context.
///
/// `schemas` and `paths` are keyed in sorted order so iteration over either
/// is stable between runs.
#[derive(Debug, Clone, Serialize)]
pub struct IrSpec {
    pub info: IrInfo,
    pub base_path: String,
    pub schemas: BTreeMap<String, Schema>,
    /// Tag to operations, each list ordered by url then method.
    pub paths: BTreeMap<String, Vec<Operation>>,
}

impl IrSpec {
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(Vec::len).sum()
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.paths.values().flatten()
    }
}

/// API metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IrInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}
