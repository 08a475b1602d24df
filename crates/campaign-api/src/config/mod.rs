pub mod settings;

pub use settings::{
    AuthConfig, DatabaseConfig, PaginationConfig, ReportConfig, ServerConfig, Settings,
};
