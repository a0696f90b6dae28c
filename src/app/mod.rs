pub mod enrich_use_case;
pub mod ports;

pub use enrich_use_case::{EnrichReport, EnrichUseCase};
