//! Entry point tying coding parameters to a field engine
//!
//! The operations themselves live next to their helpers:
//! [`encode`](CauchyCoder::encode) in `encoder.rs`,
//! [`decode`](CauchyCoder::decode) in `decoder.rs` and
//! [`repair`](CauchyCoder::repair) in `repair.rs`.

use crate::engine::{BitMatrix, CauchyEngine, FieldEngine};
use crate::error::ParameterError;
use crate::params::CodingParams;

/// Cauchy Reed-Solomon coder for one `(k, m, w)` configuration
///
/// Holds no per-call state; every operation allocates and hands back its own
/// buffers, so one coder can be shared between threads.
#[derive(Debug, Clone)]
pub struct CauchyCoder<E = CauchyEngine> {
    params: CodingParams,
    engine: E,
}

impl CauchyCoder<CauchyEngine> {
    /// Validate `(k, m, w)` and build a coder on the default engine
    pub fn new(k: usize, m: usize, w: usize) -> Result<Self, ParameterError> {
        Ok(Self::from_params(CodingParams::new(k, m, w)?))
    }

    pub fn from_params(params: CodingParams) -> Self {
        Self::with_engine(params, CauchyEngine::new())
    }
}

impl<E: FieldEngine> CauchyCoder<E> {
    pub fn with_engine(params: CodingParams, engine: E) -> Self {
        Self { params, engine }
    }

    #[inline]
    pub fn params(&self) -> &CodingParams {
        &self.params
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Coding matrix of this configuration expanded to bits
    pub(crate) fn coding_bitmatrix(&self) -> BitMatrix {
        let matrix = self.engine.generate_cauchy_matrix(&self.params);
        self.engine.matrix_to_bitmatrix(&self.params, &matrix)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::Cell;

    use crate::engine::{
        BitMatrix, CauchyEngine, CodingMatrix, EngineError, FieldEngine, Schedule,
    };
    use crate::fragment::ErasureList;
    use crate::params::CodingParams;

    /// Engine that counts calls before delegating to [`CauchyEngine`]
    #[derive(Debug, Default)]
    pub struct CountingEngine {
        pub matrices: Cell<usize>,
        pub encodes: Cell<usize>,
        pub lazy_decodes: Cell<usize>,
        pub selected_decodes: Cell<usize>,
        inner: CauchyEngine,
    }

    impl CountingEngine {
        pub fn total_calls(&self) -> usize {
            self.matrices.get()
                + self.encodes.get()
                + self.lazy_decodes.get()
                + self.selected_decodes.get()
        }
    }

    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }

    impl FieldEngine for CountingEngine {
        fn generate_cauchy_matrix(&self, params: &CodingParams) -> CodingMatrix {
            bump(&self.matrices);
            self.inner.generate_cauchy_matrix(params)
        }

        fn matrix_to_bitmatrix(&self, params: &CodingParams, matrix: &CodingMatrix) -> BitMatrix {
            self.inner.matrix_to_bitmatrix(params, matrix)
        }

        fn build_schedule(&self, params: &CodingParams, bitmatrix: &BitMatrix) -> Schedule {
            self.inner.build_schedule(params, bitmatrix)
        }

        fn execute_encode_schedule(
            &self,
            params: &CodingParams,
            schedule: &Schedule,
            data: &[&[u8]],
            parity: &mut [&mut [u8]],
            packet_size: usize,
        ) -> Result<(), EngineError> {
            bump(&self.encodes);
            self.inner
                .execute_encode_schedule(params, schedule, data, parity, packet_size)
        }

        fn execute_lazy_decode(
            &self,
            params: &CodingParams,
            bitmatrix: &BitMatrix,
            erasures: &ErasureList,
            fragments: &mut [&mut [u8]],
            packet_size: usize,
            reuse: bool,
        ) -> Result<(), EngineError> {
            bump(&self.lazy_decodes);
            self.inner
                .execute_lazy_decode(params, bitmatrix, erasures, fragments, packet_size, reuse)
        }

        fn execute_selected_decode(
            &self,
            params: &CodingParams,
            bitmatrix: &BitMatrix,
            erasures: &ErasureList,
            selected: &[usize],
            fragments: &mut [&mut [u8]],
            packet_size: usize,
            reuse: bool,
        ) -> Result<(), EngineError> {
            bump(&self.selected_decodes);
            self.inner.execute_selected_decode(
                params,
                bitmatrix,
                erasures,
                selected,
                fragments,
                packet_size,
                reuse,
            )
        }
    }
}
