// Infrastructure adapters for the application ports

pub mod http_client;
pub mod storage;

pub use http_client::{ArcGisAddressLookup, UspsCarrierRouteLookup};
pub use storage::{storage_for_environment, InMemoryStorage, LocalFileStorage, SupabaseStorage};
