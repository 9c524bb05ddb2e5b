pub mod builder;
pub mod paths;

pub use builder::{LeavingSoonBuilder, KEEP_FILE};
pub use paths::{resolve, PathStructure};
