pub mod gate;
pub mod partition;
pub mod strategy;

pub use gate::{DiskPressureGate, DiskProbe, RetentionPolicy, SystemDiskProbe};
pub use partition::{classify, partition, Partition, Verdict};
pub use strategy::{CleanupStrategy, DiskPressureStrategy, TagStrategy};
