//! Bit-matrices over GF(2)
//!
//! Multiplication by a fixed element of GF(2^w) is linear over GF(2), so it
//! can be written as a `w x w` matrix of bits. Expanding every element of the
//! `m x k` coding matrix this way gives an `(m*w) x (k*w)` bit-matrix, and each
//! of its rows says which data packets are XORed together to produce one
//! parity packet. Rows are packed 64 columns to a word.

use super::galois::GaloisField;
use super::matrix::CodingMatrix;
use super::EngineError;
use crate::params::CodingParams;

const WORD_BITS: usize = u64::BITS as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    words_per_row: usize,
    words: Vec<u64>,
}

impl BitMatrix {
    /// All-zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        let words_per_row = cols.div_ceil(WORD_BITS);
        Self {
            rows,
            cols,
            words_per_row,
            words: vec![0; rows * words_per_row],
        }
    }

    pub fn identity(size: usize) -> Self {
        let mut matrix = Self::zeros(size, size);
        for i in 0..size {
            matrix.set(i, i, true);
        }
        matrix
    }

    /// Expand an `m x k` coding matrix into its `(m*w) x (k*w)` bit-matrix
    ///
    /// Bit `(i*w + l, j*w + x)` is bit `l` of `matrix[i][j] * 2^x`.
    pub fn from_coding_matrix(params: &CodingParams, matrix: &CodingMatrix) -> Self {
        let w = params.w();
        let gf = GaloisField::new(w);
        let mut bits = Self::zeros(matrix.rows() * w, matrix.cols() * w);

        for i in 0..matrix.rows() {
            for j in 0..matrix.cols() {
                for (x, column) in gf.bitmatrix_columns(matrix.get(i, j)).enumerate() {
                    for l in 0..w {
                        if column & (1 << l) != 0 {
                            bits.set(i * w + l, j * w + x, true);
                        }
                    }
                }
            }
        }
        bits
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        let word = self.words[row * self.words_per_row + col / WORD_BITS];
        word >> (col % WORD_BITS) & 1 != 0
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        let word = &mut self.words[row * self.words_per_row + col / WORD_BITS];
        let mask = 1u64 << (col % WORD_BITS);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[u64] {
        &self.words[row * self.words_per_row..(row + 1) * self.words_per_row]
    }

    #[inline]
    fn row_mut(&mut self, row: usize) -> &mut [u64] {
        &mut self.words[row * self.words_per_row..(row + 1) * self.words_per_row]
    }

    /// Ones in a row
    pub fn row_weight(&self, row: usize) -> usize {
        self.row(row).iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Columns where rows `a` and `b` differ
    pub fn row_distance(&self, a: usize, b: usize) -> usize {
        self.row(a)
            .iter()
            .zip(self.row(b))
            .map(|(x, y)| (x ^ y).count_ones() as usize)
            .sum()
    }

    /// Column indices of the ones in `row`, ascending
    pub fn ones(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(row).iter().enumerate().flat_map(|(index, &word)| {
            let mut remaining = word;
            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }
                let bit = remaining.trailing_zeros() as usize;
                remaining &= remaining - 1;
                Some(index * WORD_BITS + bit)
            })
        })
    }

    /// Column indices where rows `a` and `b` differ, ascending
    pub fn differences(&self, a: usize, b: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(a)
            .iter()
            .zip(self.row(b))
            .enumerate()
            .flat_map(|(index, (&x, &y))| {
                let mut remaining = x ^ y;
                std::iter::from_fn(move || {
                    if remaining == 0 {
                        return None;
                    }
                    let bit = remaining.trailing_zeros() as usize;
                    remaining &= remaining - 1;
                    Some(index * WORD_BITS + bit)
                })
            })
    }

    fn xor_row(&mut self, dst: usize, src: usize) {
        if dst == src {
            self.row_mut(dst).fill(0);
            return;
        }
        let width = self.words_per_row;
        let (low, high) = self.words.split_at_mut(dst.max(src) * width);
        let (dst_row, src_row) = if dst < src {
            (&mut low[dst * width..(dst + 1) * width], &high[..width])
        } else {
            (&mut high[..width], &low[src * width..(src + 1) * width])
        };
        for (d, s) in dst_row.iter_mut().zip(src_row) {
            *d ^= *s;
        }
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for word in 0..self.words_per_row {
            self.words
                .swap(a * self.words_per_row + word, b * self.words_per_row + word);
        }
    }

    /// XOR `src_row` of `src` into `row`
    fn merge_row_from(&mut self, row: usize, src: &BitMatrix, src_row: usize) {
        for (d, s) in self.row_mut(row).iter_mut().zip(src.row(src_row)) {
            *d ^= *s;
        }
    }

    /// Inverse over GF(2) by Gauss-Jordan elimination
    pub fn invert(&self) -> Result<BitMatrix, EngineError> {
        if self.rows != self.cols {
            return Err(EngineError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let n = self.rows;
        let mut work = self.clone();
        let mut inverse = BitMatrix::identity(n);

        for col in 0..n {
            let pivot = (col..n)
                .find(|&row| work.get(row, col))
                .ok_or(EngineError::SingularMatrix)?;
            work.swap_rows(col, pivot);
            inverse.swap_rows(col, pivot);

            for row in 0..n {
                if row != col && work.get(row, col) {
                    work.xor_row(row, col);
                    inverse.xor_row(row, col);
                }
            }
        }

        Ok(inverse)
    }

    /// Rows that rebuild `targets` from the packets of `survivors`
    ///
    /// `self` is the coding bit-matrix of the stripe. The survivors' generator
    /// rows (identity blocks for data fragments, coding rows for parity
    /// fragments) form a square `k*w` system whose inverse expresses every
    /// data packet in terms of survivor packets. A target data fragment takes
    /// its block of the inverse directly; a target parity fragment takes its
    /// coding rows multiplied through the inverse.
    pub fn decoding_rows(
        &self,
        params: &CodingParams,
        survivors: &[usize],
        targets: &[usize],
    ) -> Result<BitMatrix, EngineError> {
        let (k, w) = (params.k(), params.w());
        if survivors.len() != k {
            return Err(EngineError::NotEnoughSurvivors {
                needed: k,
                got: survivors.len(),
            });
        }

        let size = k * w;
        let mut system = BitMatrix::zeros(size, size);
        for (block, &device) in survivors.iter().enumerate() {
            for l in 0..w {
                let row = block * w + l;
                if params.is_data_index(device) {
                    system.set(row, device * w + l, true);
                } else {
                    system.merge_row_from(row, self, (device - k) * w + l);
                }
            }
        }
        let inverse = system.invert()?;

        let mut decoding = BitMatrix::zeros(targets.len() * w, size);
        for (block, &device) in targets.iter().enumerate() {
            for l in 0..w {
                let row = block * w + l;
                if params.is_data_index(device) {
                    decoding.merge_row_from(row, &inverse, device * w + l);
                } else {
                    for column in self.ones((device - k) * w + l) {
                        decoding.merge_row_from(row, &inverse, column);
                    }
                }
            }
        }
        Ok(decoding)
    }
}
