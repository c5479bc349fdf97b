//! Coding parameters and their validation
//!
//! A stripe is described by three numbers:
//!
//! - `k`: data fragments
//! - `m`: parity fragments
//! - `w`: word size in bits of the Galois field GF(2^w)
//!
//! Every fragment index `0..k+m` must be addressable as a distinct field
//! element, so the field needs at least `k + m` elements.

use crate::error::ParameterError;

/// Largest word size the field arithmetic supports
pub const MAX_WORD_SIZE: usize = 32;

/// Check that `(k, m, w)` describes a usable stripe
///
/// Pure; runs before any encode/decode/repair argument is looked at.
pub fn validate(k: usize, m: usize, w: usize) -> Result<(), ParameterError> {
    if k == 0 || m == 0 || w == 0 {
        return Err(ParameterError::NonPositive { k, m, w });
    }
    if w > MAX_WORD_SIZE {
        return Err(ParameterError::UnsupportedWordSize {
            w,
            max: MAX_WORD_SIZE,
        });
    }
    // w <= 32 so the shift fits in u64
    let field_size = 1u64 << w;
    let total = k.checked_add(m).unwrap_or(usize::MAX);
    if total as u64 > field_size {
        return Err(ParameterError::FieldTooSmall { total, w });
    }
    Ok(())
}

/// Validated `(k, m, w)` triple
///
/// Immutable once constructed and `Copy`, so it can be shared freely between
/// threads running independent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodingParams {
    k: usize,
    m: usize,
    w: usize,
}

impl CodingParams {
    pub fn new(k: usize, m: usize, w: usize) -> Result<Self, ParameterError> {
        validate(k, m, w)?;
        Ok(Self { k, m, w })
    }

    /// Number of data fragments
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of parity fragments
    #[inline]
    pub fn m(&self) -> usize {
        self.m
    }

    /// Field word size in bits
    #[inline]
    pub fn w(&self) -> usize {
        self.w
    }

    /// Total fragments in a stripe (`k + m`)
    #[inline]
    pub fn total(&self) -> usize {
        self.k + self.m
    }

    #[inline]
    pub fn is_data_index(&self, index: usize) -> bool {
        index < self.k
    }
}

impl std::fmt::Display for CodingParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "k={} m={} w={}", self.k, self.m, self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_configurations() {
        for (k, m, w) in [(4, 2, 8), (10, 4, 8), (1, 1, 1), (3, 5, 3), (200, 56, 8)] {
            assert!(validate(k, m, w).is_ok(), "k={k} m={m} w={w}");
        }
    }

    #[test]
    fn rejects_zero_parameters() {
        assert_eq!(
            validate(0, 2, 8),
            Err(ParameterError::NonPositive { k: 0, m: 2, w: 8 })
        );
        assert!(matches!(
            validate(4, 0, 8),
            Err(ParameterError::NonPositive { .. })
        ));
        assert!(matches!(
            validate(4, 2, 0),
            Err(ParameterError::NonPositive { .. })
        ));
    }

    #[test]
    fn rejects_field_too_small() {
        // 2^4 = 16 elements, 17 fragments
        assert_eq!(
            validate(12, 5, 4),
            Err(ParameterError::FieldTooSmall { total: 17, w: 4 })
        );
        // Exactly 2^w fragments is fine
        assert!(validate(12, 4, 4).is_ok());
        assert!(matches!(
            validate(2, 1, 1),
            Err(ParameterError::FieldTooSmall { .. })
        ));
    }

    #[test]
    fn rejects_oversized_words() {
        assert_eq!(
            validate(4, 2, 33),
            Err(ParameterError::UnsupportedWordSize { w: 33, max: 32 })
        );
        assert!(validate(4, 2, 32).is_ok());
    }

    #[test]
    fn accessors_report_construction_values() {
        let params = CodingParams::new(4, 2, 8).unwrap();
        assert_eq!(params.k(), 4);
        assert_eq!(params.m(), 2);
        assert_eq!(params.w(), 8);
        assert_eq!(params.total(), 6);
        assert!(params.is_data_index(3));
        assert!(!params.is_data_index(4));
        assert_eq!(params.to_string(), "k=4 m=2 w=8");
    }
}
