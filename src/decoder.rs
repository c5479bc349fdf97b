//! Recovering the original object from any `k` fragments

use std::cmp::min;

use bytes::Bytes;
use log::debug;

use crate::coder::CauchyCoder;
use crate::engine::FieldEngine;
use crate::error::{CodingError, Result};
use crate::fragment::{Fragment, FragmentSet};
use crate::scratch::ScratchRegion;

/// Copy every present fragment into a zeroed `(k+m) * fragment_size` region
///
/// Absent slots stay zero. All slots share the region's alignment, which is
/// what the engine's XOR kernel wants.
pub(crate) fn stage_stripe(set: &FragmentSet) -> Result<ScratchRegion> {
    let fragment_size = set.fragment_size();
    let mut scratch = ScratchRegion::new(fragment_size * set.params().total())?;
    if fragment_size > 0 {
        for (index, slot) in scratch
            .as_mut_slice()
            .chunks_exact_mut(fragment_size)
            .enumerate()
        {
            if let Some(data) = set.get(index) {
                slot.copy_from_slice(data);
            }
        }
    }
    Ok(scratch)
}

impl<E: FieldEngine> CauchyCoder<E> {
    /// Reassemble the first `data_size` bytes of the object from `fragments`
    ///
    /// When every data fragment is present the bytes are simply copied out
    /// and no field arithmetic runs. Otherwise all erased slots are rebuilt
    /// first.
    pub fn decode(&self, fragments: &[Fragment], data_size: usize) -> Result<Bytes> {
        let set = FragmentSet::new(self.params(), fragments)?;
        let capacity = set.data_capacity();
        if data_size > capacity {
            return Err(CodingError::DataSizeOutOfRange {
                data_size,
                capacity,
            });
        }

        if set.has_all_data() {
            debug!(
                "All {} data fragments present among {}, copying {} bytes",
                self.params().k(),
                set.present_count(),
                data_size
            );
            return concatenate_data(&set, data_size);
        }

        let stripe = self.reconstruct_stripe(&set)?;
        Ok(stripe.slice(..data_size))
    }

    /// Every slot of the stripe, laid out back to back, with erasures rebuilt
    pub(crate) fn reconstruct_stripe(&self, set: &FragmentSet) -> Result<Bytes> {
        let params = self.params();
        let fragment_size = set.fragment_size();
        let erasures = set.erasures();
        debug!(
            "Rebuilding {} erased fragments of {} bytes with {}",
            erasures.len(),
            fragment_size,
            params
        );

        let mut scratch = stage_stripe(set)?;
        if fragment_size > 0 && !erasures.is_empty() {
            let bitmatrix = self.coding_bitmatrix();
            let mut slots: Vec<&mut [u8]> = scratch
                .as_mut_slice()
                .chunks_exact_mut(fragment_size)
                .collect();
            self.engine().execute_lazy_decode(
                params,
                &bitmatrix,
                &erasures,
                &mut slots,
                set.packet_size(),
                true,
            )?;
        }
        Ok(scratch.freeze())
    }
}

fn concatenate_data(set: &FragmentSet, data_size: usize) -> Result<Bytes> {
    let mut out = Vec::new();
    out.try_reserve_exact(data_size)?;
    for fragment in set.data_fragments() {
        let take = min(fragment.len(), data_size - out.len());
        out.extend_from_slice(&fragment[..take]);
    }
    Ok(Bytes::from(out))
}
