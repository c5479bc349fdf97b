//! XOR schedules derived from bit-matrices
//!
//! A schedule is a flat list of packet-sized copy/XOR operations. Executing
//! it over `w`-packet fragments computes the product of a bit-matrix with the
//! source fragments without ever touching individual bits.
//!
//! Devices are numbered the way the bit-matrix columns and rows are laid out:
//! `0..sources` are the source fragments (bit-matrix columns, `w` packets
//! each) and `sources..sources+targets` are the fragments being computed
//! (bit-matrix rows, `w` packets each).

use std::ops::Range;

use super::bitmatrix::BitMatrix;
use super::xor::xor_into;
use super::EngineError;

/// How a schedule is derived from its bit-matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScheduleStrategy {
    /// Rows may be derived from an already computed row plus the XOR of
    /// their difference, whichever is cheaper
    #[default]
    Smart,
    /// Every row computed from scratch
    Dumb,
}

impl ScheduleStrategy {
    /// Strategy selected by the engine's reuse flag
    pub fn from_reuse(reuse: bool) -> Self {
        if reuse {
            ScheduleStrategy::Smart
        } else {
            ScheduleStrategy::Dumb
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Copy,
    Xor,
    /// Target row has no ones
    Zero,
}

/// One packet of one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRef {
    pub device: usize,
    pub packet: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub source: PacketRef,
    pub target: PacketRef,
    pub kind: OpKind,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    sources: usize,
    targets: usize,
    w: usize,
    operations: Vec<Operation>,
}

impl Schedule {
    /// Build a schedule computing every row of `bits` from `sources` devices
    pub fn from_bitmatrix(
        strategy: ScheduleStrategy,
        sources: usize,
        w: usize,
        bits: &BitMatrix,
    ) -> Self {
        let mut schedule = Self {
            sources,
            targets: bits.rows() / w,
            w,
            operations: Vec::new(),
        };
        match strategy {
            ScheduleStrategy::Dumb => {
                for row in 0..bits.rows() {
                    schedule.push_row_from_scratch(bits, row);
                }
            }
            ScheduleStrategy::Smart => schedule.build_smart(bits),
        }
        schedule
    }

    fn column_packet(&self, column: usize) -> PacketRef {
        PacketRef {
            device: column / self.w,
            packet: column % self.w,
        }
    }

    fn row_packet(&self, row: usize) -> PacketRef {
        PacketRef {
            device: self.sources + row / self.w,
            packet: row % self.w,
        }
    }

    fn push_row_from_scratch(&mut self, bits: &BitMatrix, row: usize) {
        let target = self.row_packet(row);
        let mut kind = OpKind::Copy;
        for column in bits.ones(row) {
            let source = self.column_packet(column);
            self.operations.push(Operation {
                source,
                target,
                kind,
            });
            kind = OpKind::Xor;
        }
        if kind == OpKind::Copy {
            self.operations.push(Operation {
                source: target,
                target,
                kind: OpKind::Zero,
            });
        }
    }

    fn push_row_from_row(&mut self, bits: &BitMatrix, row: usize, from: usize) {
        let target = self.row_packet(row);
        self.operations.push(Operation {
            source: self.row_packet(from),
            target,
            kind: OpKind::Copy,
        });
        for column in bits.differences(row, from) {
            let source = self.column_packet(column);
            self.operations.push(Operation {
                source,
                target,
                kind: OpKind::Xor,
            });
        }
    }

    /// Greedy cheapest-row-first ordering
    ///
    /// `cost[i]` is the number of operations needed to produce row `i`,
    /// either from scratch (its weight) or from a computed row (one copy
    /// plus their distance). The cheapest pending row is emitted next and
    /// every other pending row is re-costed against it.
    fn build_smart(&mut self, bits: &BitMatrix) {
        let rows = bits.rows();
        let mut cost: Vec<usize> = (0..rows).map(|row| bits.row_weight(row)).collect();
        let mut from: Vec<Option<usize>> = vec![None; rows];
        let mut pending: Vec<usize> = (0..rows).collect();

        let mut best = match (0..rows).min_by_key(|&row| cost[row]) {
            Some(row) => row,
            None => return,
        };

        while !pending.is_empty() {
            let row = best;
            pending.retain(|&r| r != row);

            match from[row] {
                None => self.push_row_from_scratch(bits, row),
                Some(source) => self.push_row_from_row(bits, row, source),
            }

            let mut best_cost = usize::MAX;
            for &candidate in &pending {
                let derived = 1 + bits.row_distance(row, candidate);
                if derived < cost[candidate] {
                    cost[candidate] = derived;
                    from[candidate] = Some(row);
                }
                if cost[candidate] < best_cost {
                    best_cost = cost[candidate];
                    best = candidate;
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// XOR operations in the schedule
    pub fn xor_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| op.kind == OpKind::Xor)
            .count()
    }

    /// Run the schedule over `sources` and fill `targets` in place
    ///
    /// Every buffer must have the same length, a multiple of
    /// `packet_size * w`; the schedule is applied to each `packet_size * w`
    /// chunk in turn.
    pub fn execute(
        &self,
        sources: &[&[u8]],
        targets: &mut [&mut [u8]],
        packet_size: usize,
    ) -> Result<(), EngineError> {
        if sources.len() != self.sources || targets.len() != self.targets {
            return Err(EngineError::DeviceCount {
                expected: self.sources + self.targets,
                got: sources.len() + targets.len(),
            });
        }

        let size = sources
            .first()
            .map(|s| s.len())
            .or_else(|| targets.first().map(|t| t.len()))
            .unwrap_or(0);
        let chunk = packet_size * self.w;
        let lengths_agree = sources.iter().all(|s| s.len() == size)
            && targets.iter().all(|t| t.len() == size);
        if !lengths_agree || (chunk == 0 && size != 0) || (chunk != 0 && size % chunk != 0) {
            return Err(EngineError::BufferSize { size, packet_size });
        }
        if size == 0 {
            return Ok(());
        }

        for base in (0..size).step_by(chunk) {
            let span =
                |packet: usize| base + packet * packet_size..base + (packet + 1) * packet_size;
            for op in &self.operations {
                let dst_device = op.target.device - self.sources;
                let dst_range = span(op.target.packet);
                let src_range = span(op.source.packet);

                if op.kind == OpKind::Zero {
                    targets[dst_device][dst_range].fill(0);
                } else if op.source.device < self.sources {
                    let src = &sources[op.source.device][src_range];
                    apply(op.kind, &mut targets[dst_device][dst_range], src);
                } else {
                    let src_device = op.source.device - self.sources;
                    let (src, dst) = if src_device == dst_device {
                        split_within(&mut targets[dst_device], src_range, dst_range)
                    } else {
                        let (src, dst) = split_pair(targets, src_device, dst_device);
                        (&src[src_range], &mut dst[dst_range])
                    };
                    apply(op.kind, dst, src);
                }
            }
        }
        Ok(())
    }
}

#[inline]
fn apply(kind: OpKind, dst: &mut [u8], src: &[u8]) {
    match kind {
        OpKind::Copy => dst.copy_from_slice(src),
        OpKind::Xor => xor_into(dst, src),
        OpKind::Zero => dst.fill(0),
    }
}

/// Shared view of one target and mutable view of another
fn split_pair<'a>(
    targets: &'a mut [&mut [u8]],
    src: usize,
    dst: usize,
) -> (&'a [u8], &'a mut [u8]) {
    if src < dst {
        let (low, high) = targets.split_at_mut(dst);
        (&*low[src], &mut *high[0])
    } else {
        let (low, high) = targets.split_at_mut(src);
        (&*high[0], &mut *low[dst])
    }
}

/// Two disjoint packets of the same buffer
fn split_within(buf: &mut [u8], src: Range<usize>, dst: Range<usize>) -> (&[u8], &mut [u8]) {
    if src.start < dst.start {
        let (low, high) = buf.split_at_mut(dst.start);
        (&low[src], &mut high[..dst.len()])
    } else {
        let (low, high) = buf.split_at_mut(src.start);
        (&high[..src.len()], &mut low[dst])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::matrix::CodingMatrix;
    use crate::params::CodingParams;

    /// Bit-by-bit reference: target packet = XOR of source packets in its row
    fn reference(
        bits: &BitMatrix,
        w: usize,
        sources: &[Vec<u8>],
        packet_size: usize,
    ) -> Vec<Vec<u8>> {
        let targets = bits.rows() / w;
        let mut out = vec![vec![0u8; packet_size * w]; targets];
        for row in 0..bits.rows() {
            let dst = &mut out[row / w][(row % w) * packet_size..(row % w + 1) * packet_size];
            for column in bits.ones(row) {
                let src = &sources[column / w]
                    [(column % w) * packet_size..(column % w + 1) * packet_size];
                for (d, s) in dst.iter_mut().zip(src) {
                    *d ^= *s;
                }
            }
        }
        out
    }

    fn run(
        strategy: ScheduleStrategy,
        bits: &BitMatrix,
        k: usize,
        w: usize,
        data: &[Vec<u8>],
        packet_size: usize,
    ) -> Vec<Vec<u8>> {
        let schedule = Schedule::from_bitmatrix(strategy, k, w, bits);
        let sources: Vec<&[u8]> = data.iter().map(|d| d.as_slice()).collect();
        let mut out = vec![vec![0xEEu8; packet_size * w]; bits.rows() / w];
        let mut targets: Vec<&mut [u8]> = out.iter_mut().map(|t| t.as_mut_slice()).collect();
        schedule.execute(&sources, &mut targets, packet_size).unwrap();
        out
    }

    fn sample_data(k: usize, len: usize) -> Vec<Vec<u8>> {
        (0..k)
            .map(|d| (0..len).map(|i| (i * 31 + d * 17 + 5) as u8).collect())
            .collect()
    }

    #[test]
    fn smart_and_dumb_agree_with_reference() {
        let params = CodingParams::new(4, 3, 4).unwrap();
        let bits = BitMatrix::from_coding_matrix(&params, &CodingMatrix::cauchy_good(&params));
        let data = sample_data(4, 16 * 4);

        let expected = reference(&bits, 4, &data, 16);
        assert_eq!(run(ScheduleStrategy::Smart, &bits, 4, 4, &data, 16), expected);
        assert_eq!(run(ScheduleStrategy::Dumb, &bits, 4, 4, &data, 16), expected);
    }

    #[test]
    fn smart_schedule_needs_no_more_xors() {
        let params = CodingParams::new(6, 4, 8).unwrap();
        let bits = BitMatrix::from_coding_matrix(&params, &CodingMatrix::cauchy_good(&params));
        let smart = Schedule::from_bitmatrix(ScheduleStrategy::Smart, 6, 8, &bits);
        let dumb = Schedule::from_bitmatrix(ScheduleStrategy::Dumb, 6, 8, &bits);
        assert!(smart.xor_count() <= dumb.xor_count());
    }

    #[test]
    fn multiple_chunks_are_processed() {
        let params = CodingParams::new(2, 2, 3).unwrap();
        let bits = BitMatrix::from_coding_matrix(&params, &CodingMatrix::cauchy_good(&params));
        // Two chunks of 3 packets of 4 bytes
        let data = sample_data(2, 24);
        let first: Vec<Vec<u8>> = data.iter().map(|d| d[..12].to_vec()).collect();
        let second: Vec<Vec<u8>> = data.iter().map(|d| d[12..].to_vec()).collect();

        let out = run(ScheduleStrategy::Smart, &bits, 2, 3, &data, 4);
        let a = reference(&bits, 3, &first, 4);
        let b = reference(&bits, 3, &second, 4);
        for t in 0..2 {
            assert_eq!(&out[t][..12], &a[t][..]);
            assert_eq!(&out[t][12..], &b[t][..]);
        }
    }

    #[test]
    fn empty_rows_are_zeroed() {
        let bits = BitMatrix::zeros(2, 2);
        let data = vec![vec![7u8; 8], vec![9u8; 8]];
        let out = run(ScheduleStrategy::Smart, &bits, 2, 1, &data, 8);
        assert_eq!(out, vec![vec![0u8; 8], vec![0u8; 8]]);
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let bits = BitMatrix::identity(2);
        let schedule = Schedule::from_bitmatrix(ScheduleStrategy::Dumb, 2, 1, &bits);
        let a = vec![0u8; 8];
        let b = vec![0u8; 6];
        let mut t0 = vec![0u8; 8];
        let mut t1 = vec![0u8; 8];
        let result = schedule.execute(
            &[a.as_slice(), b.as_slice()],
            &mut [t0.as_mut_slice(), t1.as_mut_slice()],
            8,
        );
        assert!(matches!(result, Err(EngineError::BufferSize { .. })));
    }
}
