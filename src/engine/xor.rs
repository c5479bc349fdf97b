//! Word-parallel XOR over byte regions
//!
//! Both regions are split into an unaligned head, a run of `u128` words and
//! a tail. When the two regions share alignment modulo 16 the heads have the
//! same length and the word runs line up, so the bulk of the work is done a
//! vector word at a time. Otherwise everything falls back to bytes.

use bytemuck::{cast_slice, cast_slice_mut};

type Word = u128;
const WORD_BYTES: usize = std::mem::size_of::<Word>();

#[inline]
fn xor_bytes(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

/// `dst ^= src`
///
/// Both slices must be the same length.
pub fn xor_into(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    let len = dst.len().min(src.len());
    let align = std::mem::align_of::<Word>();
    let head = dst.as_ptr().align_offset(align);

    if head != src.as_ptr().align_offset(align) || head >= len {
        xor_bytes(dst, src);
        return;
    }

    let body = (len - head) / WORD_BYTES * WORD_BYTES;
    let (dst_head, dst_rest) = dst[..len].split_at_mut(head);
    let (dst_body, dst_tail) = dst_rest.split_at_mut(body);
    let (src_head, src_rest) = src[..len].split_at(head);
    let (src_body, src_tail) = src_rest.split_at(body);

    xor_bytes(dst_head, src_head);
    // Both bodies start on a word boundary and hold a whole number of words
    let dst_words: &mut [Word] = cast_slice_mut(dst_body);
    let src_words: &[Word] = cast_slice(src_body);
    for (d, s) in dst_words.iter_mut().zip(src_words) {
        *d ^= *s;
    }
    xor_bytes(dst_tail, src_tail);
}
