pub mod dataset;
pub mod loader;
pub mod species;
pub mod stats;

pub use dataset::{Dataset, Partition, Sample};
pub use loader::{load, LoaderConfig, MissingFeatures};
pub use species::Species;
pub use stats::NormalizationStats;
