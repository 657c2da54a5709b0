//! Report module - run summaries and rendered artifacts

pub mod confusion_plot;
pub mod summary;

pub use confusion_plot::*;
pub use summary::*;
