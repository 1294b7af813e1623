pub mod dense;
pub mod dropout;

pub use dense::{Dense, DenseGradients, Initializer};
pub use dropout::Dropout;

/// One stage of a sequential network.
#[derive(Debug, Clone)]
pub enum Layer {
    Dense(Dense),
    Dropout(Dropout),
}
