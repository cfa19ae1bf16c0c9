pub mod registry;

pub use registry::{SourceRegistry, DEFAULT_SOURCES};
