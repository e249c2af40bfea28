#[allow(clippy::module_inception)]
pub mod engine;
pub mod normalize;
pub mod reconcile;
pub mod report;


pub use engine::{Engine, ImportSummary};
