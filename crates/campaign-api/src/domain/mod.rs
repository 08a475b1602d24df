//! Domain entities and rules for the meter replacement campaign.

pub mod access;
pub mod act;
pub mod catalog;
pub mod error;
pub mod history;
pub mod labeled;
pub mod lot;
pub mod pre_catastral;
pub mod report;

pub use access::{
    permissions, Permission, Role, RoleInput, User, UserCredentials, UserFilter, UserInput,
    UserRecord, UserSession,
};
pub use act::{Act, ActFilter, ActInput, Observation};
pub use catalog::{
    Customer, CustomerFilter, CustomerInput, MeterFilter, MeterInput, MeterRenovation,
    Technician, TechnicianFilter, TechnicianInput,
};
pub use error::DomainError;
pub use history::{HistoryAction, HistoryEntry, HistoryNote};
pub use labeled::{Labeled, LabeledFilter, LabeledInput, LabeledSummary, MeterLabeled};
pub use lot::{Lot, LotDeletion, LotFilter, LotInput, LotStatus};
pub use pre_catastral::{PreCatastral, PreCatastralFilter, PreCatastralInput};
pub use report::{ReportFilter, ReportKind, ReportQuery, ReportRow};
