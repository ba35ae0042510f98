use std::path::PathBuf;

use apigen_core::backend::{Backend, parse_options};
use apigen_core::context::TemplateContext;
use apigen_core::error::{ConfigError, GenerateError};
use apigen_core::orchestrator::{IteratorRegistry, Once, PerSchema, PerTag, step, template_step};
use apigen_core::template::TemplateTable;
use apigen_core::transform::name_normalizer::lower_first;
use apigen_core::type_mapper::TypeMapper;
use heck::ToSnakeCase;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::templates::TEMPLATES;
use crate::type_mapper::PYTHON;

pub const ID: &str = "flask";

/// Options read from the `options:` section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlaskOptions {
    /// Python package the server code is generated into.
    pub server_name: String,
}

impl Default for FlaskOptions {
    fn default() -> Self {
        Self {
            server_name: "flask_server".to_string(),
        }
    }
}

/// Flask server stub backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlaskServer;

impl FlaskServer {
    pub fn options(options: &IndexMap<String, Value>) -> Result<FlaskOptions, ConfigError> {
        parse_options(ID, options)
    }
}

impl Backend for FlaskServer {
    fn id(&self) -> &'static str {
        ID
    }

    fn type_mapper(&self) -> &dyn TypeMapper {
        &PYTHON
    }

    fn templates(&self) -> TemplateTable {
        TEMPLATES
    }

    fn stage_default_iterators(
        &self,
        registry: &mut IteratorRegistry,
        options: &IndexMap<String, Value>,
    ) -> Result<(), ConfigError> {
        let options = Self::options(options)?;
        log::debug!("flask: server package `{}`", options.server_name);
        let server = PathBuf::from(&options.server_name);
        let models = server.join("models");
        let controllers = server.join("controllers");

        registry.stage(
            Once,
            vec![
                template_step("server_flask/requirements.j2", "", "requirements.txt"),
                template_step("server_flask/Dockerfile.j2", "", "Dockerfile"),
                template_step("server_flask/setup.j2", "", "setup.py"),
                template_step("server_flask/init.j2", &server, "__init__.py"),
                template_step("server_flask/main.j2", &server, "__main__.py"),
                template_step("server_flask/util.j2", &server, "util.py"),
                template_step("server_flask/encoder.j2", &server, "encoder.py"),
                template_step("server_flask/models_init.j2", &models, "__init__.py"),
                template_step("server_flask/base_model.j2", &models, "base_model.py"),
                template_step("server_flask/init.j2", &controllers, "__init__.py"),
            ],
        );

        let backend = *self;
        registry.stage(
            PerTag,
            vec![step(move |ctx| {
                let file = format!("{}_controller.py", backend.tag_file_stem(ctx.current_tag()?));
                ctx.emit_template("server_flask/controller.j2", &controllers, &file)?;
                Ok(())
            })],
        );
        registry.stage(
            PerSchema,
            vec![step(move |ctx| {
                let file = format!("{}.py", backend.schema_file_stem(&ctx.current_schema()?.name));
                ctx.emit_template("server_flask/model.j2", &models, &file)?;
                Ok(())
            })],
        );
        Ok(())
    }

    /// Fills in option defaults and rewrites `{param}` path templates into
    /// Flask's `<param>` converters.
    fn process(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        let options = Self::options(&context.cfg)?;
        context
            .cfg
            .entry("server_name".to_string())
            .or_insert_with(|| Value::from(options.server_name));
        for operation in context.paths.values_mut().flatten() {
            operation.url = operation.url.replace('{', "<").replace('}', ">");
        }
        Ok(())
    }

    fn schema_file_stem(&self, name: &str) -> String {
        lower_first(name)
    }

    fn tag_file_stem(&self, tag: &str) -> String {
        tag.to_snake_case()
    }
}
