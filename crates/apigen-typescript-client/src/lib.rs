pub mod generator;
pub mod templates;
pub mod type_mapper;

pub use generator::TypeScriptClient;
