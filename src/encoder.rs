//! Encoding an object into `k` data and `m` parity fragments
//!
//! Data fragments that lie wholly inside the object are zero-copy views of
//! it. The tail, the remaining data fragments and all parity fragments share
//! one zeroed scratch region allocated with the object's alignment, so the
//! engine sees every fragment at the same address modulo 16.

use bytes::Bytes;
use log::debug;

use crate::coder::CauchyCoder;
use crate::engine::FieldEngine;
use crate::error::Result;
use crate::fragment::Fragment;
use crate::layout::StripeLayout;
use crate::scratch::ScratchRegion;

impl<E: FieldEngine> CauchyCoder<E> {
    /// Split `object` into `k + m` fragments, data first then parity
    ///
    /// Every fragment is exactly the planned fragment size. Encoding the same
    /// object with the same parameters always yields identical bytes.
    pub fn encode(&self, object: &Bytes) -> Result<Vec<Fragment>> {
        let params = self.params();
        let (k, total) = (params.k(), params.total());
        let layout = StripeLayout::plan(params, object.len());
        let fragment_size = layout.fragment_size();
        let filled = layout.filled_fragments();
        let zero_copy_len = filled * fragment_size;

        debug!(
            "Encoding {} bytes with {}: fragment size {}, {} zero-copy data fragments",
            object.len(),
            params,
            fragment_size,
            filled
        );

        let mut scratch = ScratchRegion::aligned_like(layout.scratch_len(), object)?;
        let tail = &object[zero_copy_len..];
        debug_assert!(tail.len() <= scratch.len());
        scratch.as_mut_slice()[..tail.len()].copy_from_slice(tail);

        if fragment_size > 0 {
            let bitmatrix = self.coding_bitmatrix();
            let schedule = self.engine().build_schedule(params, &bitmatrix);

            let (staged_data, parity_region) = scratch
                .as_mut_slice()
                .split_at_mut((k - filled) * fragment_size);
            let data: Vec<&[u8]> = object[..zero_copy_len]
                .chunks_exact(fragment_size)
                .chain(staged_data.chunks_exact(fragment_size))
                .collect();
            let mut parity: Vec<&mut [u8]> =
                parity_region.chunks_exact_mut(fragment_size).collect();

            self.engine().execute_encode_schedule(
                params,
                &schedule,
                &data,
                &mut parity,
                layout.packet_size(),
            )?;
        }

        let region = scratch.freeze();
        let fragments = (0..total)
            .map(|index| {
                let data = if index < filled {
                    object.slice(index * fragment_size..(index + 1) * fragment_size)
                } else {
                    let offset = (index - filled) * fragment_size;
                    region.slice(offset..offset + fragment_size)
                };
                Fragment::new(index, data)
            })
            .collect();

        Ok(fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::test_support::CountingEngine;
    use crate::params::CodingParams;
    use crate::scratch::alignment_of;

    fn pattern(len: usize) -> Bytes {
        (0..len).map(|i| (i * 7 + 3) as u8).collect::<Vec<_>>().into()
    }

    #[test]
    fn four_plus_two_over_gf256() {
        let coder = CauchyCoder::new(4, 2, 8).unwrap();
        let fragments = coder.encode(&pattern(1000)).unwrap();
        assert_eq!(fragments.len(), 6);
        for (index, fragment) in fragments.iter().enumerate() {
            assert_eq!(fragment.index, index);
            assert_eq!(fragment.len(), 256);
        }
    }

    #[test]
    fn data_fragments_hold_the_object_then_zero_padding() {
        let object = pattern(1000);
        let coder = CauchyCoder::new(4, 2, 8).unwrap();
        let fragments = coder.encode(&object).unwrap();

        let joined: Vec<u8> = fragments[..4]
            .iter()
            .flat_map(|f| f.data.iter().copied())
            .collect();
        assert_eq!(&joined[..1000], &object[..]);
        assert!(joined[1000..].iter().all(|&b| b == 0));
    }

    #[test]
    fn filled_fragments_are_zero_copy() {
        let object = pattern(1000);
        let coder = CauchyCoder::new(4, 2, 8).unwrap();
        let fragments = coder.encode(&object).unwrap();
        for (index, fragment) in fragments.iter().take(3).enumerate() {
            assert_eq!(fragment.data.as_ptr(), object[index * 256..].as_ptr());
        }
    }

    #[test]
    fn every_fragment_shares_the_object_alignment() {
        let backing = pattern(1100);
        for shift in [0usize, 1, 5, 8, 15] {
            let object = backing.slice(shift..shift + 1000);
            let coder = CauchyCoder::new(4, 2, 8).unwrap();
            let fragments = coder.encode(&object).unwrap();
            let expected = alignment_of(&object);
            for fragment in &fragments {
                assert_eq!(alignment_of(&fragment.data), expected, "shift {shift}");
            }
        }
    }

    #[test]
    fn reencoding_is_deterministic() {
        let object = pattern(4321);
        let coder = CauchyCoder::new(5, 3, 8).unwrap();
        assert_eq!(coder.encode(&object).unwrap(), coder.encode(&object).unwrap());
    }

    #[test]
    fn exact_fit_object_needs_only_parity_scratch() {
        let object = pattern(1024);
        let coder = CauchyCoder::new(4, 2, 8).unwrap();
        let fragments = coder.encode(&object).unwrap();
        for (index, fragment) in fragments.iter().take(4).enumerate() {
            assert_eq!(&fragment.data[..], &object[index * 256..(index + 1) * 256]);
        }
    }

    #[test]
    fn empty_object_skips_the_engine() {
        let params = CodingParams::new(3, 2, 8).unwrap();
        let coder = CauchyCoder::with_engine(params, CountingEngine::default());
        let fragments = coder.encode(&Bytes::new()).unwrap();
        assert_eq!(fragments.len(), 5);
        assert!(fragments.iter().all(|f| f.is_empty()));
        assert_eq!(coder.engine().total_calls(), 0);
    }

    #[test]
    fn single_parity_over_all_ones_row_is_xor_of_data() {
        // The first row of an improved Cauchy matrix is all ones
        let object = pattern(3000);
        let coder = CauchyCoder::new(3, 1, 8).unwrap();
        let fragments = coder.encode(&object).unwrap();
        let expected: Vec<u8> = (0..fragments[0].len())
            .map(|i| fragments[0].data[i] ^ fragments[1].data[i] ^ fragments[2].data[i])
            .collect();
        assert_eq!(&fragments[3].data[..], &expected[..]);
    }
}
