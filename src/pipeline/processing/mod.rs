// Pipeline processing: validation, carrier-route annotation, and report persistence

pub mod carrier_route;
pub mod report;
pub mod validation;

pub use carrier_route::CarrierRouteRetrieverResponder;
pub use report::ReportGeneratorResponder;
pub use validation::AddressValidationResponder;
