pub mod dependencies;
pub mod name_normalizer;
pub mod operations;
pub mod path_merge;
pub mod schema_flatten;
pub mod spec_to_ir;
pub mod type_inference;

pub use spec_to_ir::build_ir;
