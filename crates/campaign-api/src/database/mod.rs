pub mod constraints;
pub mod history;
pub mod pool;
pub mod postgres;
pub mod references;

pub use pool::DbPool;
