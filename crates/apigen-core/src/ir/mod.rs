pub mod operations;
pub mod schemas;
pub mod types;

pub use operations::*;
pub use schemas::*;
pub use types::{IrInfo, IrSpec};
