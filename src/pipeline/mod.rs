//! Pipeline module - loading, validation and feature transformation

pub mod encoder;
pub mod error;
pub mod export;
pub mod loader;
pub mod records;
pub mod schema;
pub mod target;
pub mod transformer;

pub use encoder::*;
pub use error::{PipelineError, Result};
pub use export::*;
pub use loader::*;
pub use records::*;
pub use schema::*;
pub use target::*;
pub use transformer::*;
