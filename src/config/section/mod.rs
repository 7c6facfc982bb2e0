//! Configuration section definitions.

mod cache;
mod compiler;
mod output;
mod scan;

pub use cache::CacheConfig;
pub use compiler::CompilerSectionConfig;
pub use output::OutputConfig;
pub use scan::ScanConfig;
