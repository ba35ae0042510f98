use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use heck::{ToLowerCamelCase, ToPascalCase, ToSnakeCase};
use minijinja::Environment;

use crate::error::TemplateError;
use crate::transform::name_normalizer::lower_first;

/// Built-in templates of a backend: `(name, source)` pairs.
pub type TemplateTable = &'static [(&'static str, &'static str)];

/// Renders named templates, preferring files in a user template directory
/// over the backend's built-in table.
///
/// A name such as `server_flask/model.j2` is looked up as
/// `<user_dir>/server_flask/model.j2`, then `<user_dir>/model.j2`, then in
/// the built-ins.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new(user_dir: Option<PathBuf>, builtins: TemplateTable) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_filter("lower_first", lower_first_filter);
        env.add_filter("snake_case", snake_case_filter);
        env.add_filter("camel_case", camel_case_filter);
        env.add_filter("pascal_case", pascal_case_filter);
        env.set_loader(move |name| {
            if let Some(dir) = &user_dir {
                if let Some(source) = load_user_template(dir, name)? {
                    return Ok(Some(source));
                }
            }
            Ok(builtins
                .iter()
                .find(|(builtin, _)| *builtin == name)
                .map(|(_, source)| source.to_string()))
        });
        Self { env }
    }

    /// Render `name` against `ctx`.
    pub fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, TemplateError> {
        let template = self.env.get_template(name).map_err(|err| {
            if err.kind() == minijinja::ErrorKind::TemplateNotFound {
                TemplateError::NotFound {
                    name: name.to_string(),
                }
            } else {
                TemplateError::Render {
                    name: name.to_string(),
                    source: err,
                }
            }
        })?;
        template.render(ctx).map_err(|source| TemplateError::Render {
            name: name.to_string(),
            source,
        })
    }
}

fn lower_first_filter(value: String) -> String {
    lower_first(&value)
}

fn snake_case_filter(value: String) -> String {
    value.to_snake_case()
}

fn camel_case_filter(value: String) -> String {
    value.to_lower_camel_case()
}

fn pascal_case_filter(value: String) -> String {
    value.to_pascal_case()
}

fn load_user_template(dir: &Path, name: &str) -> Result<Option<String>, minijinja::Error> {
    let mut candidates = vec![dir.join(name)];
    if let Some(file_name) = Path::new(name).file_name() {
        candidates.push(dir.join(file_name));
    }
    for candidate in candidates {
        match fs::read_to_string(&candidate) {
            Ok(source) => {
                log::warn!(
                    "using user-defined template {} for {name}",
                    candidate.display()
                );
                return Ok(Some(source));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => {
                return Err(minijinja::Error::new(
                    minijinja::ErrorKind::InvalidOperation,
                    format!("could not read {}", candidate.display()),
                )
                .with_source(err));
            }
        }
    }
    Ok(None)
}
