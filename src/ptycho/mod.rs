//! The WDD ptychography pipeline: elementwise tensor kernels, intensity-based
//! sparsification, the Wigner distribution of the ideal probe and the
//! reconstruction orchestration.

pub mod ops;
pub mod sparse;
pub mod wdd;
pub mod wigner;
