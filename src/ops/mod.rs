pub mod registry;

pub use registry::{OpGuard, OpRegistry, OpSnapshot};
