//! Error types for encode, decode and repair operations

use std::collections::TryReserveError;
use thiserror::Error;

use crate::engine::EngineError;

/// Reasons a `(k, m, w)` triple is rejected before any coding work starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// One of k, m or w is zero
    #[error("Invalid coding parameters: k={k}, m={m}, w={w} must all be positive")]
    NonPositive { k: usize, m: usize, w: usize },

    /// Word size outside what the field arithmetic supports
    #[error("Invalid coding parameters: w={w} exceeds the maximum word size of {max}")]
    UnsupportedWordSize { w: usize, max: usize },

    /// GF(2^w) has fewer elements than there are fragments to index
    #[error("Invalid coding parameters (larger w): k+m={total} exceeds 2^{w}")]
    FieldTooSmall { total: usize, w: usize },
}

/// Errors that can occur while encoding, decoding or repairing a stripe
#[derive(Debug, Error)]
pub enum CodingError {
    #[error(transparent)]
    InvalidParameters(#[from] ParameterError),

    /// Fewer than k distinct fragments were supplied
    #[error("Not enough fragments: need {needed}, got {got}")]
    InsufficientFragments { needed: usize, got: usize },

    /// The same fragment index was supplied more than once
    #[error("Fragment {index} supplied more than once")]
    DuplicateFragment { index: usize },

    /// Fragment or repair index does not address a slot of the stripe
    #[error("Fragment index {index} out of range for a stripe of {total} fragments")]
    FragmentIndexOutOfRange { index: usize, total: usize },

    /// Supplied fragments disagree on their length
    #[error("Fragment {index} is {actual} bytes, expected {expected}")]
    FragmentSizeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Fragment length does not split into w packets of whole 16-byte words
    #[error("Fragment size {fragment_size} is not a multiple of 16*w (w={w})")]
    MisalignedFragment { fragment_size: usize, w: usize },

    /// Repair was requested for a fragment that is already present
    #[error("Fragment {index} is present and cannot be repaired")]
    RepairIndexPresent { index: usize },

    /// Requested object length does not fit in the data fragments
    #[error("Data size {data_size} exceeds the {capacity} bytes held by the data fragments")]
    DataSizeOutOfRange { data_size: usize, capacity: usize },

    /// The scratch region could not be allocated
    #[error("Failed to allocate scratch region: {0}")]
    ScratchAllocation(#[from] TryReserveError),

    /// The field engine could not complete the requested operation
    #[error("Field engine failure: {0}")]
    Engine(#[from] EngineError),
}

/// Type alias for Result with CodingError
pub type Result<T> = std::result::Result<T, CodingError>;
