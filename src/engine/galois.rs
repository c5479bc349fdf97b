//! Galois field GF(2^w) arithmetic for 1 <= w <= 32
//!
//! Elements are stored in a `u32`. Fields with `w <= 16` use log/antilog
//! lookup tables built once per word size; wider fields fall back to
//! shift-and-reduce multiplication.

use std::sync::OnceLock;

use crate::params::MAX_WORD_SIZE;

/// Primitive polynomials for w = 1..=32, including the x^w term
const PRIMITIVE_POLYNOMIALS: [u64; MAX_WORD_SIZE + 1] = [
    0,
    0o3,
    0o7,
    0o13,
    0o23,
    0o45,
    0o103,
    0o211,
    0o435, // 0x11D
    0o1021,
    0o2011,
    0o4005,
    0o10123,
    0o20033,
    0o42103,
    0o100003,
    0o210013, // 0x1100B
    0o400011,
    0o1000201,
    0o2000047,
    0o4000011,
    0o10000005,
    0o20000003,
    0o40000041,
    0o100000207,
    0o200000011,
    0o400000107,
    0o1000000047,
    0o2000000011,
    0o4000000005,
    0o10040000007,
    0o20000000011,
    0o40020000007,
];

/// Word sizes that get lookup tables
const MAX_TABLE_WORD_SIZE: usize = 16;

/// Log/antilog tables for one field
struct LogTables {
    log: Vec<u32>,
    antilog: Vec<u32>,
}

impl LogTables {
    fn build(w: usize, polynomial: u64) -> Self {
        let count = 1usize << w;
        let limit = count - 1;
        let mut log = vec![0u32; count];
        let mut antilog = vec![0u32; count];

        let mut b = 1u64;
        for l in 0..limit {
            log[b as usize] = l as u32;
            antilog[l] = b as u32;

            b <<= 1;
            if b & count as u64 != 0 {
                b ^= polynomial;
            }
        }

        Self { log, antilog }
    }
}

fn tables_for(w: usize) -> Option<&'static LogTables> {
    static TABLES: [OnceLock<LogTables>; MAX_TABLE_WORD_SIZE + 1] =
        [const { OnceLock::new() }; MAX_TABLE_WORD_SIZE + 1];

    if w == 0 || w > MAX_TABLE_WORD_SIZE {
        return None;
    }
    Some(TABLES[w].get_or_init(|| LogTables::build(w, PRIMITIVE_POLYNOMIALS[w])))
}

/// Arithmetic in GF(2^w)
#[derive(Clone, Copy)]
pub struct GaloisField {
    w: usize,
    polynomial: u64,
    tables: Option<&'static LogTables>,
}

impl std::fmt::Debug for GaloisField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaloisField")
            .field("w", &self.w)
            .field("polynomial", &format_args!("{:#x}", self.polynomial))
            .finish()
    }
}

impl GaloisField {
    /// Field for word size `w`
    ///
    /// # Panics
    /// If `w` is zero or larger than [`MAX_WORD_SIZE`]; callers hold a
    /// validated [`CodingParams`](crate::CodingParams).
    pub fn new(w: usize) -> Self {
        assert!(
            (1..=MAX_WORD_SIZE).contains(&w),
            "Unsupported Galois field word size {w}"
        );
        Self {
            w,
            polynomial: PRIMITIVE_POLYNOMIALS[w],
            tables: tables_for(w),
        }
    }

    /// Number of non-zero elements (`2^w - 1`)
    #[inline]
    fn limit(&self) -> u64 {
        (1u64 << self.w) - 1
    }

    /// Product of two field elements
    pub fn multiply(&self, a: u32, b: u32) -> u32 {
        if a == 0 || b == 0 {
            return 0;
        }
        match self.tables {
            Some(tables) => {
                let limit = self.limit() as usize;
                let sum = (tables.log[a as usize] as usize + tables.log[b as usize] as usize)
                    % limit;
                tables.antilog[sum]
            }
            None => self.shift_multiply(a, b),
        }
    }

    fn shift_multiply(&self, a: u32, b: u32) -> u32 {
        let high_bit = 1u64 << self.w;
        let mut a = a as u64;
        let mut b = b as u64;
        let mut product = 0u64;
        while b != 0 {
            if b & 1 != 0 {
                product ^= a;
            }
            b >>= 1;
            a <<= 1;
            if a & high_bit != 0 {
                a ^= self.polynomial;
            }
        }
        product as u32
    }

    /// Multiplicative inverse, `None` for zero
    pub fn inverse(&self, a: u32) -> Option<u32> {
        if a == 0 {
            return None;
        }
        match self.tables {
            Some(tables) => {
                let limit = self.limit() as usize;
                let log = tables.log[a as usize] as usize;
                Some(tables.antilog[(limit - log) % limit])
            }
            // a^(2^w - 2) = a^-1
            None => Some(self.pow(a, self.limit() - 1)),
        }
    }

    pub fn pow(&self, base: u32, mut exponent: u64) -> u32 {
        let mut result = 1u32;
        let mut square = base;
        while exponent != 0 {
            if exponent & 1 != 0 {
                result = self.multiply(result, square);
            }
            square = self.multiply(square, square);
            exponent >>= 1;
        }
        result
    }

    /// Ones in the `w x w` bit-matrix that represents multiplication by `a`
    pub fn bitmatrix_weight(&self, a: u32) -> u32 {
        self.bitmatrix_columns(a).map(u32::count_ones).sum()
    }

    /// Columns of the `w x w` bit-matrix for `a`: `a * 2^x` for x in 0..w
    pub fn bitmatrix_columns(&self, a: u32) -> impl Iterator<Item = u32> + '_ {
        let mut column = a;
        (0..self.w).map(move |x| {
            let current = column;
            // GF(2) has no element 2, and the last column needs no successor
            if x + 1 < self.w {
                column = self.multiply(column, 2);
            }
            current
        })
    }
}
