use std::collections::BTreeMap;

use crate::backend::Backend;
use crate::config::{IteratorKind, IteratorSpec, ProjectConfig};
use crate::context::TemplateContext;
use crate::emitter::{Emitter, OverwritePrompt, RunSummary};
use crate::error::GenerateError;
use crate::ledger::ChecksumLedger;
use crate::orchestrator::{GenerationContext, IteratorRegistry, Once, PerSchema, PerTag, StepFn, step};
use crate::parse::SpecDocument;
use crate::template::TemplateRenderer;
use crate::transform::build_ir;

/// One full generation run: IR, context, staging, rendering, emission and
/// the ledger write.
///
/// The ledger is persisted only when every step succeeded, and then holds
/// exactly the paths this run emitted.
pub fn run(
    doc: &SpecDocument,
    backend: &dyn Backend,
    config: &ProjectConfig,
    prompt: Box<dyn OverwritePrompt>,
) -> Result<RunSummary, GenerateError> {
    let ir = build_ir(doc, backend.type_mapper())?;
    log::debug!(
        "built IR: {} schemas, {} operations",
        ir.schemas.len(),
        ir.operation_count()
    );

    let mut context = TemplateContext::assemble(ir, config.options.clone());
    backend.process(&mut context)?;

    let mut registry = IteratorRegistry::new();
    backend.stage_default_iterators(&mut registry, &config.options)?;
    stage_config_iterators(&mut registry, &config.iterators, backend, &context);

    let renderer = TemplateRenderer::new(config.templates.clone(), backend.templates());
    let ledger = ChecksumLedger::load(config.ledger_path());
    let mut emitter = Emitter::new(ledger, config.emitter_options(), prompt);

    let mut generation = GenerationContext::new(context, &renderer, &mut emitter, &config.output);
    registry.run(&mut generation)?;

    let stale = emitter.prune_ledger();
    if stale > 0 {
        log::debug!("dropped {stale} ledger entries for paths no longer generated");
    }
    emitter.ledger().save()?;
    let summary = emitter.summary();
    log::info!("{}: {summary}", backend.id());
    Ok(summary)
}

/// Stage the `iterators:` entries of the config after the backend's own.
///
/// `{schema}` and `{tag}` in an output path are replaced by the backend's
/// file stem for the current item.
pub fn stage_config_iterators(
    registry: &mut IteratorRegistry,
    iterators: &[IteratorSpec],
    backend: &dyn Backend,
    context: &TemplateContext,
) {
    for spec in iterators {
        match spec.iterator {
            IteratorKind::Once => {
                registry.stage(Once, vec![output_step(spec, "", BTreeMap::new(), Cursor::None)]);
            }
            IteratorKind::PerSchema => {
                let stems = context
                    .schema_names()
                    .map(|name| (name.to_string(), backend.schema_file_stem(name)))
                    .collect();
                registry.stage(PerSchema, vec![output_step(spec, "{schema}", stems, Cursor::Schema)]);
            }
            IteratorKind::PerTag => {
                let stems = context
                    .tags()
                    .map(|tag| (tag.to_string(), backend.tag_file_stem(tag)))
                    .collect();
                registry.stage(PerTag, vec![output_step(spec, "{tag}", stems, Cursor::Tag)]);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Cursor {
    None,
    Schema,
    Tag,
}

fn output_step(
    spec: &IteratorSpec,
    placeholder: &'static str,
    stems: BTreeMap<String, String>,
    cursor: Cursor,
) -> StepFn {
    let template = spec.template.clone();
    let output = spec.output.clone();
    step(move |ctx| {
        let item = match cursor {
            Cursor::None => None,
            Cursor::Schema => Some(ctx.current_schema()?.name.clone()),
            Cursor::Tag => Some(ctx.current_tag()?.to_string()),
        };
        let path = match item {
            Some(item) => {
                let stem = stems.get(&item).cloned().unwrap_or(item);
                output.replace(placeholder, &stem)
            }
            None => output.clone(),
        };
        ctx.emit_template(&template, "", &path)?;
        Ok(())
    })
}
