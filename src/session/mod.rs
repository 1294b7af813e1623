pub mod session;
pub mod state;

pub use session::Session;
pub use state::{TrainedModel, TrainingReport, TrainingState};
