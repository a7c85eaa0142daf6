pub mod metrics;
pub mod report;
pub mod writer;

pub use metrics::CompressionMetrics;
