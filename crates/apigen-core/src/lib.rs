pub mod backend;
pub mod config;
pub mod context;
pub mod emitter;
pub mod error;
pub mod generate;
pub mod ir;
pub mod ledger;
pub mod orchestrator;
pub mod parse;
pub mod template;
pub mod transform;
pub mod type_mapper;

pub use backend::Backend;
pub use context::TemplateContext;
pub use emitter::{EmitDecision, Emitter, OverwritePrompt, RunSummary};
pub use error::GenerateError;
pub use orchestrator::{GenerationContext, IteratorRegistry, StageIterator};
