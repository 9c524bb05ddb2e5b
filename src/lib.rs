pub mod config;
pub mod context;
pub mod deletion;
pub mod episodes;
pub mod error;
pub mod leaving_soon;
pub mod matcher;
pub mod model;
pub mod platform;
pub mod report;
pub mod retention;
pub mod scheduler;
pub mod services;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use error::Error;
pub use model::{CleanupType, LibraryItem, LibraryType};
pub use report::{PassReporter, PassSummary, SilentReporter};
pub use scheduler::{RetentionScheduler, SchedulerStatus};
pub use services::Services;
