//! Field engine: Cauchy Reed-Solomon over GF(2^w) as bit-matrix XOR schedules
//!
//! The coding layer only ever talks to a [`FieldEngine`]. The default
//! [`CauchyEngine`] generates a Cauchy coding matrix, expands it into a
//! bit-matrix, turns that into a schedule of packet copies and XORs, and runs
//! the schedule over fragments split into `w` packets each.
//!
//! Matrices, bit-matrices and schedules are plain owned values. They live for
//! one encode/decode/repair call and are dropped at its end; nothing is cached
//! between calls.

pub mod bitmatrix;
pub mod galois;
pub mod matrix;
pub mod schedule;
pub mod xor;

pub use bitmatrix::BitMatrix;
pub use galois::GaloisField;
pub use matrix::CodingMatrix;
pub use schedule::{Schedule, ScheduleStrategy};

use log::trace;
use thiserror::Error;

use crate::fragment::ErasureList;
use crate::params::CodingParams;

/// Errors raised inside the field engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Bit-matrix is singular")]
    SingularMatrix,

    #[error("Cannot invert a {rows}x{cols} bit-matrix")]
    NotSquare { rows: usize, cols: usize },

    #[error("Not enough surviving fragments: need {needed}, got {got}")]
    NotEnoughSurvivors { needed: usize, got: usize },

    #[error("Expected {expected} fragment buffers, got {got}")]
    DeviceCount { expected: usize, got: usize },

    #[error("Fragment buffers of {size} bytes do not split into packets of {packet_size} bytes")]
    BufferSize { size: usize, packet_size: usize },

    #[error("Erased index {index} outside a stripe of {total} fragments")]
    ErasureOutOfRange { index: usize, total: usize },
}

/// Galois-field primitives the coding layer is built on
///
/// `packet_size` is the number of bytes in each of the `w` packets a fragment
/// is split into (`fragment_size / w`). Decode operations take every slot of
/// the stripe, data first then parity, and write reconstructed slots in place.
pub trait FieldEngine {
    /// `m x k` Cauchy coding matrix
    fn generate_cauchy_matrix(&self, params: &CodingParams) -> CodingMatrix;

    /// Expand a coding matrix into its `(m*w) x (k*w)` bit-matrix
    fn matrix_to_bitmatrix(&self, params: &CodingParams, matrix: &CodingMatrix) -> BitMatrix;

    /// Schedule computing every parity packet from the data packets
    fn build_schedule(&self, params: &CodingParams, bitmatrix: &BitMatrix) -> Schedule;

    /// Fill `parity` from `data` by running `schedule`
    fn execute_encode_schedule(
        &self,
        params: &CodingParams,
        schedule: &Schedule,
        data: &[&[u8]],
        parity: &mut [&mut [u8]],
        packet_size: usize,
    ) -> Result<(), EngineError>;

    /// Reconstruct every slot listed in `erasures`
    ///
    /// `reuse` selects a smart schedule that derives rows from rows already
    /// computed.
    fn execute_lazy_decode(
        &self,
        params: &CodingParams,
        bitmatrix: &BitMatrix,
        erasures: &ErasureList,
        fragments: &mut [&mut [u8]],
        packet_size: usize,
        reuse: bool,
    ) -> Result<(), EngineError>;

    /// Reconstruct only the erased slots listed in `selected`
    #[allow(clippy::too_many_arguments)]
    fn execute_selected_decode(
        &self,
        params: &CodingParams,
        bitmatrix: &BitMatrix,
        erasures: &ErasureList,
        selected: &[usize],
        fragments: &mut [&mut [u8]],
        packet_size: usize,
        reuse: bool,
    ) -> Result<(), EngineError>;
}

/// Cauchy Reed-Solomon field engine
#[derive(Debug, Clone, Copy, Default)]
pub struct CauchyEngine;

impl CauchyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Rebuild `targets` in place from `k` survivors
    #[allow(clippy::too_many_arguments)]
    fn reconstruct(
        &self,
        params: &CodingParams,
        bitmatrix: &BitMatrix,
        erasures: &ErasureList,
        targets: &[usize],
        fragments: &mut [&mut [u8]],
        packet_size: usize,
        strategy: ScheduleStrategy,
    ) -> Result<(), EngineError> {
        let (k, total) = (params.k(), params.total());
        if fragments.len() != total {
            return Err(EngineError::DeviceCount {
                expected: total,
                got: fragments.len(),
            });
        }
        if let Some(&index) = erasures.iter().find(|&&index| index >= total) {
            return Err(EngineError::ErasureOutOfRange { index, total });
        }
        if targets.is_empty() {
            return Ok(());
        }

        let survivors = choose_survivors(params, erasures)?;
        let rows = bitmatrix.decoding_rows(params, &survivors, targets)?;
        let schedule = Schedule::from_bitmatrix(strategy, k, params.w(), &rows);
        trace!(
            "Decoding {:?} from survivors {:?} with {} operations ({:?})",
            targets,
            survivors,
            schedule.len(),
            strategy
        );

        #[derive(Clone, Copy)]
        enum Role {
            Unused,
            Source(usize),
            Target(usize),
        }
        let mut roles = vec![Role::Unused; total];
        for (position, &index) in survivors.iter().enumerate() {
            roles[index] = Role::Source(position);
        }
        for (position, &index) in targets.iter().enumerate() {
            roles[index] = Role::Target(position);
        }

        let mut sources: Vec<Option<&[u8]>> = vec![None; survivors.len()];
        let mut outputs: Vec<Option<&mut [u8]>> = (0..targets.len()).map(|_| None).collect();
        for (slot, role) in fragments.iter_mut().zip(roles) {
            match role {
                Role::Source(position) => sources[position] = Some(&**slot),
                Role::Target(position) => outputs[position] = Some(&mut **slot),
                Role::Unused => {}
            }
        }

        let missing = EngineError::DeviceCount {
            expected: survivors.len() + targets.len(),
            got: sources.iter().filter(|s| s.is_some()).count()
                + outputs.iter().filter(|o| o.is_some()).count(),
        };
        let sources: Vec<&[u8]> = sources
            .into_iter()
            .collect::<Option<_>>()
            .ok_or_else(|| missing.clone())?;
        let mut outputs: Vec<&mut [u8]> = outputs
            .into_iter()
            .collect::<Option<_>>()
            .ok_or(missing)?;

        schedule.execute(&sources, &mut outputs, packet_size)
    }
}

/// Pick the `k` fragments decoding reads from
///
/// Present data fragments keep their own position; each missing data
/// position is filled by the next present parity fragment.
fn choose_survivors(
    params: &CodingParams,
    erasures: &ErasureList,
) -> Result<Vec<usize>, EngineError> {
    let k = params.k();
    let mut spare_parity = (k..params.total()).filter(|index| !erasures.contains(*index));
    let survivors = (0..k)
        .map(|index| {
            if erasures.contains(index) {
                spare_parity.next()
            } else {
                Some(index)
            }
        })
        .collect::<Option<Vec<_>>>();

    survivors.ok_or(EngineError::NotEnoughSurvivors {
        needed: k,
        got: params.total() - erasures.len(),
    })
}

impl FieldEngine for CauchyEngine {
    fn generate_cauchy_matrix(&self, params: &CodingParams) -> CodingMatrix {
        CodingMatrix::cauchy_good(params)
    }

    fn matrix_to_bitmatrix(&self, params: &CodingParams, matrix: &CodingMatrix) -> BitMatrix {
        BitMatrix::from_coding_matrix(params, matrix)
    }

    fn build_schedule(&self, params: &CodingParams, bitmatrix: &BitMatrix) -> Schedule {
        let schedule =
            Schedule::from_bitmatrix(ScheduleStrategy::Smart, params.k(), params.w(), bitmatrix);
        trace!(
            "Encode schedule for {}: {} operations, {} XORs",
            params,
            schedule.len(),
            schedule.xor_count()
        );
        schedule
    }

    fn execute_encode_schedule(
        &self,
        _params: &CodingParams,
        schedule: &Schedule,
        data: &[&[u8]],
        parity: &mut [&mut [u8]],
        packet_size: usize,
    ) -> Result<(), EngineError> {
        schedule.execute(data, parity, packet_size)
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
        self.reconstruct(
            params,
            bitmatrix,
            erasures,
            erasures.as_slice(),
            fragments,
            packet_size,
            ScheduleStrategy::from_reuse(reuse),
        )
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
        let mut targets: Vec<usize> = Vec::with_capacity(selected.len());
        for &index in selected {
            if erasures.contains(index) && !targets.contains(&index) {
                targets.push(index);
            }
        }
        self.reconstruct(
            params,
            bitmatrix,
            erasures,
            &targets,
            fragments,
            packet_size,
            ScheduleStrategy::from_reuse(reuse),
        )
    }
}
