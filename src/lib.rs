//! Cauchy Reed-Solomon erasure coding
//!
//! An object is split into `k` data fragments and `m` parity fragments such
//! that any `k` of the `k + m` fragments recover it. Coding runs over
//! GF(2^w) as XORs of bit-matrix packets, so the only arithmetic on data is
//! byte-wise XOR.
//!
//! ```
//! use bytes::Bytes;
//!
//! let object = Bytes::from(vec![7u8; 1000]);
//! let fragments = cauchyrs::encode(&object, 4, 2, 8).unwrap();
//! assert_eq!(fragments.len(), 6);
//!
//! // Any four fragments are enough
//! let survivors = &fragments[2..];
//! let decoded = cauchyrs::decode(survivors, 4, 2, 8, object.len()).unwrap();
//! assert_eq!(decoded, object);
//! ```

pub mod args;
pub mod coder;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod layout;
pub mod params;
pub mod repair;
pub mod scratch;

use bytes::Bytes;

pub use coder::CauchyCoder;
pub use config::RunConfig;
pub use engine::{CauchyEngine, EngineError, FieldEngine};
pub use error::{CodingError, ParameterError, Result};
pub use fragment::{ErasureList, Fragment, FragmentSet};
pub use layout::StripeLayout;
pub use params::CodingParams;

/// Encode `object` into `k + m` fragments over GF(2^w)
pub fn encode(object: &Bytes, k: usize, m: usize, w: usize) -> Result<Vec<Fragment>> {
    CauchyCoder::new(k, m, w)?.encode(object)
}

/// Recover the first `data_size` bytes of an object from at least `k` fragments
pub fn decode(
    fragments: &[Fragment],
    k: usize,
    m: usize,
    w: usize,
    data_size: usize,
) -> Result<Bytes> {
    CauchyCoder::new(k, m, w)?.decode(fragments, data_size)
}

/// Regenerate the fragments at `repair_indices` from at least `k` survivors
pub fn repair(
    fragments: &[Fragment],
    k: usize,
    m: usize,
    w: usize,
    repair_indices: &[usize],
) -> Result<Vec<Fragment>> {
    CauchyCoder::new(k, m, w)?.repair(fragments, repair_indices)
}
