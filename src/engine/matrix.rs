//! Cauchy coding matrices over GF(2^w)
//!
//! The coding matrix has `m` rows and `k` columns; parity fragment `i` is
//! the GF(2^w) dot product of row `i` with the data fragments. Any square
//! submatrix of a Cauchy matrix is non-singular, which is what lets any `k`
//! of the `k + m` fragments recover the object.

use super::galois::GaloisField;
use crate::params::CodingParams;

/// Dense `m x k` matrix of field elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingMatrix {
    rows: usize,
    cols: usize,
    elements: Vec<u32>,
}

impl CodingMatrix {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.elements[row * self.cols + col]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: u32) {
        self.elements[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[u32] {
        &self.elements[row * self.cols..(row + 1) * self.cols]
    }

    /// Plain Cauchy matrix: `M[i][j] = 1 / (i XOR (m + j))`
    ///
    /// `X = {0..m}` and `Y = {m..m+k}` are disjoint because `k + m <= 2^w`,
    /// so no denominator is zero.
    pub fn cauchy_original(params: &CodingParams) -> Self {
        let (k, m) = (params.k(), params.m());
        let gf = GaloisField::new(params.w());
        let mut matrix = Self {
            rows: m,
            cols: k,
            elements: vec![0; k * m],
        };
        for i in 0..m {
            for j in 0..k {
                let denominator = (i ^ (m + j)) as u32;
                let value = gf.inverse(denominator).unwrap_or(0);
                matrix.set(i, j, value);
            }
        }
        matrix
    }

    /// Cauchy matrix with fewer ones in its bit-matrix form
    ///
    /// Scaling a row or column of a Cauchy matrix by a non-zero constant keeps
    /// every square submatrix non-singular, so the code stays MDS while
    /// encoding needs fewer XORs.
    pub fn cauchy_good(params: &CodingParams) -> Self {
        let mut matrix = Self::cauchy_original(params);
        matrix.improve(&GaloisField::new(params.w()));
        matrix
    }

    fn improve(&mut self, gf: &GaloisField) {
        // Make the first row all ones by scaling columns
        for j in 0..self.cols {
            let head = self.get(0, j);
            if head != 1 {
                let Some(scale) = gf.inverse(head) else {
                    continue;
                };
                for i in 0..self.rows {
                    let scaled = gf.multiply(self.get(i, j), scale);
                    self.set(i, j, scaled);
                }
            }
        }

        // Divide each remaining row by whichever element minimises its weight
        for i in 1..self.rows {
            let weight_of = |row: &[u32], scale: u32| -> u32 {
                row.iter()
                    .map(|&e| gf.bitmatrix_weight(gf.multiply(e, scale)))
                    .sum()
            };

            let row = self.row(i).to_vec();
            let mut best_weight = weight_of(&row, 1);
            let mut best_scale = None;

            for &element in row.iter().filter(|&&e| e != 1 && e != 0) {
                let Some(scale) = gf.inverse(element) else {
                    continue;
                };
                let weight = weight_of(&row, scale);
                if weight < best_weight {
                    best_weight = weight;
                    best_scale = Some(scale);
                }
            }

            if let Some(scale) = best_scale {
                for j in 0..self.cols {
                    let scaled = gf.multiply(self.get(i, j), scale);
                    self.set(i, j, scaled);
                }
            }
        }
    }

    /// Total ones across the bit-matrix expansion of every element
    pub fn bitmatrix_weight(&self, gf: &GaloisField) -> u32 {
        self.elements
            .iter()
            .map(|&e| gf.bitmatrix_weight(e))
            .sum()
    }
}
