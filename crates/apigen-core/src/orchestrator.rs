use std::path::{Path, PathBuf};

use crate::context::TemplateContext;
use crate::emitter::{EmitDecision, Emitter};
use crate::error::GenerateError;
use crate::ir::Schema;
use crate::template::TemplateRenderer;

/// One unit of work run by a [`StageIterator`].
pub type StepFn = Box<dyn Fn(&mut GenerationContext<'_>) -> Result<(), GenerateError>>;

/// Box a closure as a [`StepFn`].
pub fn step<F>(f: F) -> StepFn
where
    F: Fn(&mut GenerationContext<'_>) -> Result<(), GenerateError> + 'static,
{
    Box::new(f)
}

/// A step that renders `template` to `<output>/<dir>/<file>`.
pub fn template_step(template: &str, dir: impl Into<PathBuf>, file: &str) -> StepFn {
    let template = template.to_string();
    let dir = dir.into();
    let file = file.to_string();
    step(move |ctx| ctx.emit_template(&template, &dir, &file).map(|_| ()))
}

/// State handed to every step. Steps reach the renderer and emitter only
/// through here.
pub struct GenerationContext<'a> {
    pub context: TemplateContext,
    pub renderer: &'a TemplateRenderer,
    pub emitter: &'a mut Emitter,
    pub output_dir: PathBuf,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        context: TemplateContext,
        renderer: &'a TemplateRenderer,
        emitter: &'a mut Emitter,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            context,
            renderer,
            emitter,
            output_dir: output_dir.into(),
        }
    }

    /// Render `template` against the current context.
    pub fn render(&self, template: &str) -> Result<String, GenerateError> {
        Ok(self.renderer.render(template, self.context.to_value())?)
    }

    /// Render `template` and emit it to `<output>/<dir>/<file>`.
    pub fn emit_template(
        &mut self,
        template: &str,
        dir: impl AsRef<Path>,
        file: &str,
    ) -> Result<EmitDecision, GenerateError> {
        let rendered = self.render(template)?;
        let path = self.output_dir.join(dir).join(file);
        Ok(self.emitter.emit(&rendered, &path)?)
    }

    pub fn current_schema(&self) -> Result<&Schema, GenerateError> {
        self.context
            .schema()
            .ok_or(GenerateError::MissingCursor("current_schema"))
    }

    pub fn current_tag(&self) -> Result<&str, GenerateError> {
        self.context
            .current_tag
            .as_deref()
            .ok_or(GenerateError::MissingCursor("current_tag"))
    }
}

/// Decides how often, and with which cursor, a list of steps runs.
pub trait StageIterator {
    fn name(&self) -> &str;

    fn run(&self, ctx: &mut GenerationContext<'_>, steps: &[StepFn]) -> Result<(), GenerateError>;
}

/// Runs each step exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Once;

impl StageIterator for Once {
    fn name(&self) -> &str {
        "once"
    }

    fn run(&self, ctx: &mut GenerationContext<'_>, steps: &[StepFn]) -> Result<(), GenerateError> {
        for step in steps {
            step(ctx)?;
        }
        Ok(())
    }
}

/// Runs the steps for every schema, in name order, with `current_schema` set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerSchema;

impl StageIterator for PerSchema {
    fn name(&self) -> &str {
        "per_schema"
    }

    fn run(&self, ctx: &mut GenerationContext<'_>, steps: &[StepFn]) -> Result<(), GenerateError> {
        let names: Vec<String> = ctx.context.schema_names().map(str::to_string).collect();
        for name in names {
            ctx.context.current_schema = Some(name);
            for step in steps {
                step(ctx)?;
            }
        }
        ctx.context.current_schema = None;
        Ok(())
    }
}

/// Runs the steps for every tag, in name order, with `current_tag` set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerTag;

impl StageIterator for PerTag {
    fn name(&self) -> &str {
        "per_tag"
    }

    fn run(&self, ctx: &mut GenerationContext<'_>, steps: &[StepFn]) -> Result<(), GenerateError> {
        let tags: Vec<String> = ctx.context.tags().map(str::to_string).collect();
        for tag in tags {
            ctx.context.current_tag = Some(tag);
            for step in steps {
                step(ctx)?;
            }
        }
        ctx.context.current_tag = None;
        Ok(())
    }
}

/// Ordered list of (iterator, steps) registrations. The same iterator kind
/// may be staged any number of times; [`IteratorRegistry::run`] walks the
/// registrations in the order they were staged.
#[derive(Default)]
pub struct IteratorRegistry {
    stages: Vec<(Box<dyn StageIterator>, Vec<StepFn>)>,
}

impl IteratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, iterator: impl StageIterator + 'static, steps: Vec<StepFn>) {
        self.stage_boxed(Box::new(iterator), steps);
    }

    pub fn stage_boxed(&mut self, iterator: Box<dyn StageIterator>, steps: Vec<StepFn>) {
        self.stages.push((iterator, steps));
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Iterator names in staging order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|(iterator, _)| iterator.name())
    }

    pub fn run(&self, ctx: &mut GenerationContext<'_>) -> Result<(), GenerateError> {
        for (iterator, steps) in &self.stages {
            log::debug!("running {} ({} steps)", iterator.name(), steps.len());
            iterator.run(ctx, steps)?;
        }
        Ok(())
    }
}
