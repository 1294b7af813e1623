pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod backend;
pub mod data;
pub mod train;
pub mod inference;
pub mod session;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use network::{ModelSpec, Network};
pub use optim::adam::Adam;
pub use backend::{build, Backend, Classifier, DenseBackend};
pub use data::{load, Dataset, LoaderConfig, MissingFeatures, NormalizationStats, Species};
pub use train::{train_loop, EpochStats, TrainConfig};
pub use inference::Classification;
pub use session::{Session, TrainingReport, TrainingState};
pub use error::{IrisError, Result};
