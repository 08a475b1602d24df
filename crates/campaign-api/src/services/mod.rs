//! Application services (business rules over the repository ports)

pub mod access_service;
pub mod act_service;
pub mod catalog_service;
pub mod labeled_service;
pub mod lot_service;
pub mod pre_catastral_service;
pub mod report;

pub use access_service::{AccessService, LoginResult};
pub use act_service::ActService;
pub use catalog_service::CatalogService;
pub use labeled_service::LabeledService;
pub use lot_service::LotService;
pub use pre_catastral_service::PreCatastralService;
pub use report::{ReportFile, ReportService};
