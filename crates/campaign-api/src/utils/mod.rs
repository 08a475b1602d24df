pub mod error;
pub mod extract;
pub mod pagination;
pub mod response;

pub use error::ApiError;
pub use extract::{ApiJson, ApiQuery};
pub use pagination::{ListResponse, PageParams, PageRequest, Paged};
pub use response::ApiResponse;
