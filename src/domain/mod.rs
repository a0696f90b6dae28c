// Domain data shapes shared across layers

pub mod address;

pub use address::{Address, AddressBuilder, AddressRecord};
