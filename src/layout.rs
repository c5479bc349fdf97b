//! Stripe layout planning
//!
//! Works out how large each fragment must be so that an object of a given
//! length can be handed to the field engine's word-parallel arithmetic.
//!
//! Two roundings are applied:
//!
//! 1. the object is rounded up to a whole number of `k * w` byte units, so
//!    every data fragment splits evenly into `w` packets;
//! 2. the per-packet length is rounded up to a multiple of
//!    [`VECTOR_ALIGNMENT`] bytes so the XOR kernel always runs on whole
//!    vector words.

use crate::params::CodingParams;

/// Vector width, in bytes, the packet length is rounded to
pub const VECTOR_ALIGNMENT: usize = 16;

#[inline]
fn round_up(value: usize, multiple: usize) -> usize {
    value.div_ceil(multiple) * multiple
}

/// Fragment size for an object of `data_size` bytes split into `k` data
/// fragments over GF(2^w)
///
/// `ceil(data_size / (k * w))` rounded up to a multiple of 16, times `w`.
pub fn fragment_size(data_size: usize, k: usize, w: usize) -> usize {
    let unit = k * w;
    let rounded_units = data_size.div_ceil(unit);
    let per_fragment_words = round_up(rounded_units, VECTOR_ALIGNMENT);
    per_fragment_words * w
}

/// Layout of one stripe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripeLayout {
    data_size: usize,
    fragment_size: usize,
    k: usize,
    m: usize,
    w: usize,
}

impl StripeLayout {
    /// Plan the layout for encoding an object of `data_size` bytes
    pub fn plan(params: &CodingParams, data_size: usize) -> Self {
        Self {
            data_size,
            fragment_size: fragment_size(data_size, params.k(), params.w()),
            k: params.k(),
            m: params.m(),
            w: params.w(),
        }
    }

    /// Bytes in every fragment of the stripe
    #[inline]
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Bytes per packet handed to the field engine (`fragment_size / w`)
    #[inline]
    pub fn packet_size(&self) -> usize {
        self.fragment_size / self.w
    }

    /// Number of data fragments lying entirely inside the object
    ///
    /// These can be exposed as zero-copy views of the caller's buffer.
    pub fn filled_fragments(&self) -> usize {
        if self.fragment_size == 0 {
            return 0;
        }
        (self.data_size / self.fragment_size).min(self.k)
    }

    /// Object bytes left over after the filled fragments
    pub fn tail_len(&self) -> usize {
        self.data_size - self.filled_fragments() * self.fragment_size
    }

    /// Size of the scratch region holding the tail, the remaining data
    /// fragments and every parity fragment
    pub fn scratch_len(&self) -> usize {
        (self.k + self.m - self.filled_fragments()) * self.fragment_size
    }
}
