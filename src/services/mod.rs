pub mod chart;
pub mod cleaner;
pub mod excel;
pub mod exporter;
pub mod loader;
pub mod pipeline;
pub mod selector;
pub mod sessions;
