//! Console helpers shared by the CLI and long-running library steps

pub mod progress;
pub mod styling;

pub use progress::*;
pub use styling::*;
