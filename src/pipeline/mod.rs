// Enrichment pipeline: the stage contract, the ordered chain, and the stages

#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod processing;
pub mod responder;

pub use pipeline::ResponderPipeline;
pub use responder::{Responder, SessionContext};
