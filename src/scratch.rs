//! Alignment-matched scratch regions
//!
//! The XOR kernel splits every packet into an unaligned head, a run of
//! 16-byte words and an unaligned tail. Two packets can only be combined
//! word-by-word when their heads have the same length, so every buffer passed
//! to the field engine for one stripe must share the same address modulo
//! [`VECTOR_ALIGNMENT`]. Fragments carved out of the caller's object inherit
//! the object's alignment; the scratch region holding the remaining fragments
//! is allocated here with matching alignment.

use bytes::Bytes;
use std::collections::TryReserveError;

use crate::layout::VECTOR_ALIGNMENT;

/// Address of `bytes` modulo [`VECTOR_ALIGNMENT`]
#[inline]
pub fn alignment_of(bytes: &[u8]) -> usize {
    bytes.as_ptr() as usize % VECTOR_ALIGNMENT
}

/// Zeroed, owned buffer whose usable region starts at a chosen alignment
///
/// Ownership moves to the caller through [`ScratchRegion::freeze`]; nothing
/// keeps a reference to it afterwards.
#[derive(Debug)]
pub struct ScratchRegion {
    buf: Vec<u8>,
    offset: usize,
    len: usize,
}

impl ScratchRegion {
    /// Allocate `len` zeroed bytes starting on a [`VECTOR_ALIGNMENT`] boundary
    pub fn new(len: usize) -> Result<Self, TryReserveError> {
        Self::with_alignment(len, 0)
    }

    /// Allocate `len` zeroed bytes whose start shares `anchor`'s alignment
    pub fn aligned_like(len: usize, anchor: &[u8]) -> Result<Self, TryReserveError> {
        Self::with_alignment(len, alignment_of(anchor))
    }

    fn with_alignment(len: usize, target: usize) -> Result<Self, TryReserveError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len + VECTOR_ALIGNMENT)?;
        buf.resize(len + VECTOR_ALIGNMENT, 0);

        let base = alignment_of(&buf);
        let offset = (target + VECTOR_ALIGNMENT - base) % VECTOR_ALIGNMENT;

        Ok(Self { buf, offset, len })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.offset..self.offset + self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf[self.offset..self.offset + self.len]
    }

    /// Hand the region over as an immutable, cheaply sliceable buffer
    pub fn freeze(self) -> Bytes {
        let Self { buf, offset, len } = self;
        // Vec -> Bytes reuses the allocation, so the region keeps its address
        Bytes::from(buf).slice(offset..offset + len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_region_is_zeroed_and_vector_aligned() {
        let region = ScratchRegion::new(100).unwrap();
        assert_eq!(region.len(), 100);
        assert!(region.as_slice().iter().all(|&b| b == 0));
        assert_eq!(alignment_of(region.as_slice()), 0);
    }

    #[test]
    fn matches_every_anchor_alignment() {
        let backing = vec![0u8; 64];
        for shift in 0..VECTOR_ALIGNMENT {
            let anchor = &backing[shift..];
            let region = ScratchRegion::aligned_like(48, anchor).unwrap();
            assert_eq!(alignment_of(region.as_slice()), alignment_of(anchor));
        }
    }

    #[test]
    fn freeze_keeps_contents_and_alignment() {
        let backing = vec![0u8; 32];
        let anchor = &backing[5..];
        let mut region = ScratchRegion::aligned_like(8, anchor).unwrap();
        region.as_mut_slice().copy_from_slice(b"abcdefgh");
        let alignment = alignment_of(region.as_slice());

        let frozen = region.freeze();
        assert_eq!(&frozen[..], b"abcdefgh");
        assert_eq!(alignment_of(&frozen), alignment);
    }

    #[test]
    fn empty_region() {
        let region = ScratchRegion::new(0).unwrap();
        assert!(region.is_empty());
        assert!(region.freeze().is_empty());
    }
}
