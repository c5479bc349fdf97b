//! Regenerating chosen lost fragments without rebuilding the whole stripe

use log::debug;

use crate::coder::CauchyCoder;
use crate::decoder::stage_stripe;
use crate::engine::FieldEngine;
use crate::error::Result;
use crate::fragment::{Fragment, FragmentSet};

impl<E: FieldEngine> CauchyCoder<E> {
    /// Rebuild the fragments at `repair_indices` from the surviving `fragments`
    ///
    /// Results come back in request order and are byte-identical to what
    /// [`encode`](Self::encode) produced for those indices. Every requested
    /// index must address a slot that is not among the survivors.
    pub fn repair(&self, fragments: &[Fragment], repair_indices: &[usize]) -> Result<Vec<Fragment>> {
        let params = self.params();
        let set = FragmentSet::new(params, fragments)?;
        set.validate_repair_request(repair_indices)?;
        if repair_indices.is_empty() {
            return Ok(Vec::new());
        }

        let fragment_size = set.fragment_size();
        let erasures = set.erasures();
        debug!(
            "Repairing fragments {:?} of {} bytes from {} survivors with {}",
            repair_indices,
            fragment_size,
            set.present_count(),
            params
        );

        let mut scratch = stage_stripe(&set)?;
        if fragment_size > 0 {
            let bitmatrix = self.coding_bitmatrix();
            let mut slots: Vec<&mut [u8]> = scratch
                .as_mut_slice()
                .chunks_exact_mut(fragment_size)
                .collect();
            self.engine().execute_selected_decode(
                params,
                &bitmatrix,
                &erasures,
                repair_indices,
                &mut slots,
                set.packet_size(),
                false,
            )?;
        }

        let stripe = scratch.freeze();
        Ok(repair_indices
            .iter()
            .map(|&index| {
                let offset = index * fragment_size;
                Fragment::new(index, stripe.slice(offset..offset + fragment_size))
            })
            .collect())
    }
}
