use apigen_core::backend::Backend;
use apigen_core::error::ConfigError;
use apigen_core::orchestrator::{IteratorRegistry, Once, PerSchema, PerTag, step, template_step};
use apigen_core::template::TemplateTable;
use apigen_core::type_mapper::TypeMapper;
use indexmap::IndexMap;
use serde_json::Value;

use crate::templates::TEMPLATES;
use crate::type_mapper::TYPESCRIPT;

pub const ID: &str = "typescript";

/// TypeScript client backend: one service class per tag, one module per
/// schema, built on `fetch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptClient;

impl Backend for TypeScriptClient {
    fn id(&self) -> &'static str {
        ID
    }

    fn type_mapper(&self) -> &dyn TypeMapper {
        &TYPESCRIPT
    }

    fn templates(&self) -> TemplateTable {
        TEMPLATES
    }

    fn stage_default_iterators(
        &self,
        registry: &mut IteratorRegistry,
        options: &IndexMap<String, Value>,
    ) -> Result<(), ConfigError> {
        if let Some(key) = options.keys().next() {
            return Err(ConfigError::BackendOptions {
                backend: ID.to_string(),
                reason: format!("unknown option `{key}`"),
            });
        }

        registry.stage(
            Once,
            vec![
                template_step("client_typescript/index.j2", "", "index.ts"),
                template_step("client_typescript/variables.j2", "", "variables.ts"),
                template_step("client_typescript/configuration.j2", "", "configuration.ts"),
                template_step("client_typescript/api_ts.j2", "api", "api.ts"),
                template_step("client_typescript/models.j2", "model", "models.ts"),
            ],
        );

        log::debug!("typescript: {} stages registered", registry.len());
        let backend = *self;
        registry.stage(
            PerTag,
            vec![step(move |ctx| {
                let file = format!("{}.service.ts", backend.tag_file_stem(ctx.current_tag()?));
                ctx.emit_template("client_typescript/service.j2", "api", &file)?;
                Ok(())
            })],
        );
        registry.stage(
            PerSchema,
            vec![step(move |ctx| {
                let file = format!("{}.ts", backend.schema_file_stem(&ctx.current_schema()?.name));
                ctx.emit_template("client_typescript/model.j2", "model", &file)?;
                Ok(())
            })],
        );
        Ok(())
    }
}
