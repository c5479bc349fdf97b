//! Fragments and the bookkeeping around which slots of a stripe are present

use bytes::Bytes;
use smallvec::SmallVec;

use crate::error::{CodingError, Result};
use crate::layout::VECTOR_ALIGNMENT;
use crate::params::CodingParams;

/// One of the `k + m` pieces of a stripe
///
/// Indices `0..k` hold data, `k..k+m` hold parity. `data` is usually a
/// zero-copy view into the object or into the scratch region of the call
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub index: usize,
    pub data: Bytes,
}

impl Fragment {
    pub fn new(index: usize, data: impl Into<Bytes>) -> Self {
        Self {
            index,
            data: data.into(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Absent slots of a stripe, ascending and without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErasureList {
    indices: SmallVec<[usize; 16]>,
}

impl ErasureList {
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut indices: SmallVec<[usize; 16]> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.indices.iter()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }
}

/// Validated set of fragments handed to decode or repair
///
/// Construction checks, in order: every index addresses a slot, no index
/// repeats, at least `k` fragments are present, all fragments have the same
/// length, and that length splits into `w` packets whose size is a
/// multiple of the vector width, so every staged slot keeps one alignment.
#[derive(Debug, Clone)]
pub struct FragmentSet {
    params: CodingParams,
    slots: Vec<Option<Bytes>>,
    present: usize,
    fragment_size: usize,
}

impl FragmentSet {
    pub fn new(params: &CodingParams, fragments: &[Fragment]) -> Result<Self> {
        let total = params.total();
        let mut slots: Vec<Option<Bytes>> = vec![None; total];

        for fragment in fragments {
            let slot = slots
                .get_mut(fragment.index)
                .ok_or(CodingError::FragmentIndexOutOfRange {
                    index: fragment.index,
                    total,
                })?;
            if slot.is_some() {
                return Err(CodingError::DuplicateFragment {
                    index: fragment.index,
                });
            }
            *slot = Some(fragment.data.clone());
        }

        let present = fragments.len();
        if present < params.k() {
            return Err(CodingError::InsufficientFragments {
                needed: params.k(),
                got: present,
            });
        }

        // At least k >= 1 fragments are present
        let fragment_size = fragments[0].len();
        if let Some(odd) = fragments.iter().find(|f| f.len() != fragment_size) {
            return Err(CodingError::FragmentSizeMismatch {
                index: odd.index,
                expected: fragment_size,
                actual: odd.len(),
            });
        }
        if fragment_size % (params.w() * VECTOR_ALIGNMENT) != 0 {
            return Err(CodingError::MisalignedFragment {
                fragment_size,
                w: params.w(),
            });
        }

        Ok(Self {
            params: *params,
            slots,
            present,
            fragment_size,
        })
    }

    #[inline]
    pub fn params(&self) -> &CodingParams {
        &self.params
    }

    /// Length shared by every fragment in the set
    #[inline]
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Bytes per packet (`fragment_size / w`)
    #[inline]
    pub fn packet_size(&self) -> usize {
        self.fragment_size / self.params.w()
    }

    #[inline]
    pub fn present_count(&self) -> usize {
        self.present
    }

    /// Largest object the data fragments can hold (`k * fragment_size`)
    #[inline]
    pub fn data_capacity(&self) -> usize {
        self.params.k() * self.fragment_size
    }

    pub fn get(&self, index: usize) -> Option<&Bytes> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Whether every data fragment is present, so no field arithmetic is needed
    pub fn has_all_data(&self) -> bool {
        self.slots[..self.params.k()].iter().all(Option::is_some)
    }

    pub fn erasures(&self) -> ErasureList {
        ErasureList::from_indices(
            self.slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.is_none())
                .map(|(index, _)| index),
        )
    }

    /// Present data fragments in index order
    pub fn data_fragments(&self) -> impl Iterator<Item = &Bytes> {
        self.slots[..self.params.k()].iter().flatten()
    }

    /// Check that every requested index addresses an absent slot
    pub fn validate_repair_request(&self, indices: &[usize]) -> Result<()> {
        let total = self.params.total();
        for &index in indices {
            if index >= total {
                return Err(CodingError::FragmentIndexOutOfRange { index, total });
            }
            if self.contains(index) {
                return Err(CodingError::RepairIndexPresent { index });
            }
        }
        Ok(())
    }
}
