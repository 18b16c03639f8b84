//! Error taxonomy for the reconstruction pipeline.
//!
//! Every variant is unrecoverable at the point of detection: the pipeline is a
//! deterministic pure computation, so retrying with the same inputs cannot
//! succeed. Each variant carries enough context to identify the stage or
//! precondition that failed.

/// Errors raised by the WDD reconstruction pipeline.
#[derive(thiserror::Error, Debug)]
pub enum WddError {
    /// Two tensors that must agree in shape do not, or the dataset's detector
    /// dimensions disagree with the requested image size.
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    /// A scalar input or derived quantity is non-positive, non-finite or
    /// otherwise degenerate (e.g. a dataset with zero mean diffraction
    /// intensity, or an aperture that admits no beam).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Non-finite values surfaced after a transform stage.
    #[error("non-finite values after stage `{stage}`")]
    NumericInstability { stage: &'static str },
}

pub type Result<T> = std::result::Result<T, WddError>;
