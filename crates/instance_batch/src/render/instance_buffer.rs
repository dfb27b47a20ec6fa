//! # Instance Data Buffer
//!
//! One contiguous allocation holding everything the batched shader reads
//! per draw:
//!
//! ```text
//! | base records (capacity * base_record_bytes) | sweep params (capacity * 16) | shared header (32) |
//! ```
//!
//! The base records belong to the batch manager and are opaque here. The
//! sweep params are one `vec4` per instance. The shared header is written
//! once per frame and holds values every instance sees:
//!
//! ```text
//! offset  0: interactor_one_pos  f32 x3
//! offset 12: is_frozen           u32
//! offset 16: interactor_two_pos  f32 x3
//! offset 28: time                f32
//! ```
//!
//! Storage is a `Vec<u32>` so every region is 4-byte aligned and can be
//! reinterpreted through `bytemuck` without copying. The upload path reads
//! [`InstanceDataBuffer::as_bytes`] directly.
//!
//! Single writer: nothing here synchronizes. The upload must drain the
//! buffer after a frame's writes and before the next frame's writes begin.

use crate::config::BatchConfig;
use bytemuck::{Pod, Zeroable};
use std::ops::Range;

/// Result type for instance buffer operations
pub type InstanceBufferResult<T> = Result<T, InstanceBufferError>;

/// Errors raised by the instance buffer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstanceBufferError {
    /// Capacity or record size cannot produce a valid layout
    #[error("Invalid instance buffer configuration: {0}")]
    Configuration(String),

    /// Slot index past the end of the buffer
    #[error("Instance slot {slot} out of range (capacity {capacity})")]
    OutOfRange {
        /// Requested slot
        slot: usize,
        /// Number of slots in the buffer
        capacity: usize,
    },

    /// A base record write with the wrong byte length
    #[error("Base record size mismatch: expected {expected} bytes, got {actual}")]
    RecordSize {
        /// Bytes per record in this buffer
        expected: usize,
        /// Bytes supplied by the writer
        actual: usize,
    },
}

/// Floats per instance in the sweep params block
pub const SWEEP_PARAMS_COMPONENTS: usize = 4;

/// Bytes per instance contributed by the sweep params block
pub const EXTENSION_RECORD_BYTES: usize = SWEEP_PARAMS_COMPONENTS * std::mem::size_of::<f32>();

/// Bytes of the shared header
pub const SHARED_HEADER_BYTES: usize = std::mem::size_of::<SharedHeader>();

/// Buffer-wide values shared by every instance for one frame
///
/// Matches the shader's uniform block byte for byte.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SharedHeader {
    /// World position of the interactor highlighting slot one
    pub interactor_one_pos: [f32; 3],
    /// 1 while the scene is frozen, 0 otherwise
    pub is_frozen: u32,
    /// World position of the interactor highlighting slot two
    pub interactor_two_pos: [f32; 3],
    /// Frame time
    pub time: f32,
}

/// Byte offsets of every region in an [`InstanceDataBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceBufferLayout {
    capacity: usize,
    base_record_bytes: usize,
    sweep_params_offset: usize,
    header_offset: usize,
    total_bytes: usize,
}

impl InstanceBufferLayout {
    /// Compute the layout for `capacity` slots
    pub fn new(capacity: usize, base_record_bytes: usize) -> InstanceBufferResult<Self> {
        if capacity == 0 {
            return Err(InstanceBufferError::Configuration(
                "capacity must be positive".to_string(),
            ));
        }
        if base_record_bytes % std::mem::align_of::<f32>() != 0 {
            return Err(InstanceBufferError::Configuration(format!(
                "base record of {base_record_bytes} bytes is not 4-byte aligned"
            )));
        }

        let base_bytes = capacity
            .checked_mul(base_record_bytes)
            .ok_or_else(|| overflow(capacity))?;
        let sweep_params_offset = align_to(base_bytes, std::mem::align_of::<f32>())
            .ok_or_else(|| overflow(capacity))?;
        let sweep_bytes = capacity
            .checked_mul(EXTENSION_RECORD_BYTES)
            .ok_or_else(|| overflow(capacity))?;
        let sweep_end = sweep_params_offset
            .checked_add(sweep_bytes)
            .ok_or_else(|| overflow(capacity))?;
        let header_offset = align_to(sweep_end, std::mem::align_of::<SharedHeader>())
            .ok_or_else(|| overflow(capacity))?;
        let total_bytes = header_offset
            .checked_add(SHARED_HEADER_BYTES)
            .ok_or_else(|| overflow(capacity))?;

        Ok(Self {
            capacity,
            base_record_bytes,
            sweep_params_offset,
            header_offset,
            total_bytes,
        })
    }

    /// Number of instance slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes per base record
    pub fn base_record_bytes(&self) -> usize {
        self.base_record_bytes
    }

    /// Bytes per instance across base record and extension
    pub fn per_instance_bytes(&self) -> usize {
        self.base_record_bytes + EXTENSION_RECORD_BYTES
    }

    /// Byte offset of slot `slot`'s base record
    pub fn base_record_offset(&self, slot: usize) -> usize {
        slot * self.base_record_bytes
    }

    /// Byte offset of the sweep params block
    pub fn sweep_params_offset(&self) -> usize {
        self.sweep_params_offset
    }

    /// Byte offset of the shared header
    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    /// Total buffer size in bytes
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    fn check_slot(&self, slot: usize) -> InstanceBufferResult<()> {
        if slot < self.capacity {
            Ok(())
        } else {
            Err(InstanceBufferError::OutOfRange {
                slot,
                capacity: self.capacity,
            })
        }
    }
}

fn align_to(offset: usize, alignment: usize) -> Option<usize> {
    offset.checked_next_multiple_of(alignment)
}

fn overflow(capacity: usize) -> InstanceBufferError {
    InstanceBufferError::Configuration(format!("capacity {capacity} overflows the buffer size"))
}

/// Word range covering `bytes` starting at byte `offset`
fn words(offset: usize, bytes: usize) -> Range<usize> {
    let word = std::mem::size_of::<u32>();
    offset / word..(offset + bytes) / word
}

/// Fixed-capacity instance data storage with typed views
#[derive(Debug, Clone)]
pub struct InstanceDataBuffer {
    layout: InstanceBufferLayout,
    storage: Vec<u32>,
}

impl InstanceDataBuffer {
    /// Allocate a zeroed buffer for `capacity` slots
    pub fn new(capacity: usize, base_record_bytes: usize) -> InstanceBufferResult<Self> {
        let layout = InstanceBufferLayout::new(capacity, base_record_bytes)?;
        let storage = vec![0; layout.total_bytes() / std::mem::size_of::<u32>()];
        log::info!(
            "Allocated instance buffer: {} slots, {} bytes",
            capacity,
            layout.total_bytes()
        );
        Ok(Self { layout, storage })
    }

    /// Allocate a buffer sized by a batch configuration
    pub fn from_config(config: &BatchConfig) -> InstanceBufferResult<Self> {
        Self::new(config.max_instances, config.base_record_bytes)
    }

    /// Region offsets
    pub fn layout(&self) -> &InstanceBufferLayout {
        &self.layout
    }

    /// Number of instance slots
    pub fn capacity(&self) -> usize {
        self.layout.capacity
    }

    /// Total size in bytes
    pub fn byte_len(&self) -> usize {
        self.layout.total_bytes
    }

    /// Whole buffer as bytes, ready for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.storage)
    }

    /// Base record of one slot
    pub fn base_record(&self, slot: usize) -> InstanceBufferResult<&[u8]> {
        self.layout.check_slot(slot)?;
        let range = words(self.layout.base_record_offset(slot), self.layout.base_record_bytes);
        Ok(bytemuck::cast_slice(&self.storage[range]))
    }

    /// Mutable base record of one slot
    pub fn base_record_mut(&mut self, slot: usize) -> InstanceBufferResult<&mut [u8]> {
        self.layout.check_slot(slot)?;
        let range = words(self.layout.base_record_offset(slot), self.layout.base_record_bytes);
        Ok(bytemuck::cast_slice_mut(&mut self.storage[range]))
    }

    /// Copy a complete base record into a slot
    pub fn write_base_record(&mut self, slot: usize, record: &[u8]) -> InstanceBufferResult<()> {
        let expected = self.layout.base_record_bytes;
        if record.len() != expected {
            return Err(InstanceBufferError::RecordSize {
                expected,
                actual: record.len(),
            });
        }
        self.base_record_mut(slot)?.copy_from_slice(record);
        Ok(())
    }

    fn sweep_range(&self) -> Range<usize> {
        words(
            self.layout.sweep_params_offset,
            self.layout.capacity * EXTENSION_RECORD_BYTES,
        )
    }

    /// Sweep params of every slot, four floats each
    pub fn sweep_params(&self) -> &[f32] {
        bytemuck::cast_slice(&self.storage[self.sweep_range()])
    }

    /// Mutable sweep params of every slot
    pub fn sweep_params_mut(&mut self) -> &mut [f32] {
        let range = self.sweep_range();
        bytemuck::cast_slice_mut(&mut self.storage[range])
    }

    /// Sweep params of one slot
    pub fn instance_sweep_params(&self, slot: usize) -> InstanceBufferResult<[f32; 4]> {
        self.layout.check_slot(slot)?;
        let start = slot * SWEEP_PARAMS_COMPONENTS;
        let mut params = [0.0; SWEEP_PARAMS_COMPONENTS];
        params.copy_from_slice(&self.sweep_params()[start..start + SWEEP_PARAMS_COMPONENTS]);
        Ok(params)
    }

    fn header_range(&self) -> Range<usize> {
        words(self.layout.header_offset, SHARED_HEADER_BYTES)
    }

    /// Shared header
    pub fn header(&self) -> &SharedHeader {
        bytemuck::from_bytes(bytemuck::cast_slice(&self.storage[self.header_range()]))
    }

    /// Mutable shared header
    pub fn header_mut(&mut self) -> &mut SharedHeader {
        let range = self.header_range();
        bytemuck::from_bytes_mut(bytemuck::cast_slice_mut(&mut self.storage[range]))
    }

    /// Shared interactor one position
    pub fn interactor_one_pos(&self) -> &[f32; 3] {
        &self.header().interactor_one_pos
    }

    /// Shared frozen flag, 0 or 1
    pub fn is_frozen(&self) -> u32 {
        self.header().is_frozen
    }

    /// Shared interactor two position
    pub fn interactor_two_pos(&self) -> &[f32; 3] {
        &self.header().interactor_two_pos
    }

    /// Shared frame time
    pub fn time(&self) -> f32 {
        self.header().time
    }

    /// Write the frame time
    pub fn set_time(&mut self, time: f32) {
        self.header_mut().time = time;
    }

    /// Write the frozen flag
    pub fn set_frozen(&mut self, frozen: bool) {
        self.header_mut().is_frozen = u32::from(frozen);
    }

    /// Zero one slot's sweep params, leaving the shared header alone
    pub fn clear_instance(&mut self, slot: usize) -> InstanceBufferResult<()> {
        self.write_instance_attributes(slot, [0.0; SWEEP_PARAMS_COMPONENTS], None, None)
    }

    /// Write one slot's sweep params and, when given, the shared
    /// interactor positions.
    ///
    /// The positions are buffer-wide. Every instance that supplies one
    /// overwrites it, so the shader sees whichever instance was written
    /// last in the frame. One position per interactor slot is broadcast to
    /// all instances.
    pub fn write_instance_attributes(
        &mut self,
        slot: usize,
        sweep_params: [f32; 4],
        interactor_one_pos: Option<[f32; 3]>,
        interactor_two_pos: Option<[f32; 3]>,
    ) -> InstanceBufferResult<()> {
        self.layout.check_slot(slot)?;

        let start = slot * SWEEP_PARAMS_COMPONENTS;
        self.sweep_params_mut()[start..start + SWEEP_PARAMS_COMPONENTS]
            .copy_from_slice(&sweep_params);

        let header = self.header_mut();
        if let Some(position) = interactor_one_pos {
            header.interactor_one_pos = position;
        }
        if let Some(position) = interactor_two_pos {
            header.interactor_two_pos = position;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_size_matches_formula() {
        for capacity in [1, 2, 7, 64, 256] {
            for base in [0, 4, 64, 112] {
                let buffer = InstanceDataBuffer::new(capacity, base).unwrap();
                assert_eq!(
                    buffer.byte_len(),
                    capacity * (base + EXTENSION_RECORD_BYTES) + SHARED_HEADER_BYTES
                );
                assert_eq!(buffer.as_bytes().len(), buffer.byte_len());
            }
        }
    }

    #[test]
    fn test_default_layout_offsets() {
        let layout = InstanceBufferLayout::new(256, 112).unwrap();
        assert_eq!(layout.sweep_params_offset(), 256 * 112);
        assert_eq!(layout.header_offset(), 256 * 112 + 256 * 16);
        assert_eq!(layout.total_bytes(), 256 * 128 + 32);
        assert_eq!(layout.per_instance_bytes(), 128);
        assert_eq!(SHARED_HEADER_BYTES, 32);
    }

    #[test]
    fn test_zero_capacity_is_configuration_error() {
        assert!(matches!(
            InstanceDataBuffer::new(0, 112),
            Err(InstanceBufferError::Configuration(_))
        ));
    }

    #[test]
    fn test_unaligned_base_record_is_configuration_error() {
        assert!(matches!(
            InstanceDataBuffer::new(4, 6),
            Err(InstanceBufferError::Configuration(_))
        ));
    }

    #[test]
    fn test_out_of_range_slot() {
        let mut buffer = InstanceDataBuffer::new(4, 112).unwrap();
        let result = buffer.write_instance_attributes(4, [1.0; 4], None, None);
        assert_eq!(
            result,
            Err(InstanceBufferError::OutOfRange { slot: 4, capacity: 4 })
        );
        assert!(buffer.base_record(4).is_err());
    }

    #[test]
    fn test_write_touches_only_its_slot() {
        let mut buffer = InstanceDataBuffer::new(8, 112).unwrap();
        for slot in 0..8 {
            let value = slot as f32;
            buffer
                .write_instance_attributes(slot, [value; 4], None, None)
                .unwrap();
        }
        let before = buffer.as_bytes().to_vec();

        buffer
            .write_instance_attributes(3, [9.0, 10.0, 1.0, 0.0], None, None)
            .unwrap();

        let after = buffer.as_bytes();
        let slot_start = buffer.layout().sweep_params_offset() + 3 * EXTENSION_RECORD_BYTES;
        let slot_end = slot_start + EXTENSION_RECORD_BYTES;
        assert_eq!(&after[..slot_start], &before[..slot_start]);
        assert_eq!(&after[slot_end..], &before[slot_end..]);
        assert_eq!(buffer.instance_sweep_params(3).unwrap(), [9.0, 10.0, 1.0, 0.0]);
    }

    #[test]
    fn test_capacity_overflow_is_configuration_error() {
        assert!(matches!(
            InstanceBufferLayout::new(usize::MAX / EXTENSION_RECORD_BYTES, 0),
            Err(InstanceBufferError::Configuration(_))
        ));
        assert!(matches!(
            InstanceBufferLayout::new(usize::MAX / 4, 4),
            Err(InstanceBufferError::Configuration(_))
        ));
        assert!(matches!(
            InstanceBufferLayout::new(1, usize::MAX - 3),
            Err(InstanceBufferError::Configuration(_))
        ));
    }

    #[test]
    fn test_clear_instance_zeroes_only_sweep_params() {
        let mut buffer = InstanceDataBuffer::new(2, 0).unwrap();
        buffer
            .write_instance_attributes(1, [1.0, 2.0, 1.0, 1.0], Some([3.0; 3]), None)
            .unwrap();
        buffer.clear_instance(1).unwrap();
        assert_eq!(buffer.instance_sweep_params(1).unwrap(), [0.0; 4]);
        assert_eq!(buffer.interactor_one_pos(), &[3.0; 3]);
        assert!(buffer.clear_instance(2).is_err());
    }

    #[test]
    fn test_positions_are_shared_across_slots() {
        let mut buffer = InstanceDataBuffer::new(4, 0).unwrap();
        buffer
            .write_instance_attributes(0, [0.0; 4], Some([1.0, 2.0, 3.0]), None)
            .unwrap();
        buffer
            .write_instance_attributes(1, [0.0; 4], Some([4.0, 5.0, 6.0]), Some([7.0, 8.0, 9.0]))
            .unwrap();

        assert_eq!(buffer.interactor_one_pos(), &[4.0, 5.0, 6.0]);
        assert_eq!(buffer.interactor_two_pos(), &[7.0, 8.0, 9.0]);

        buffer
            .write_instance_attributes(2, [0.0; 4], None, None)
            .unwrap();
        assert_eq!(buffer.interactor_one_pos(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_header_bytes_are_bit_exact() {
        let mut buffer = InstanceDataBuffer::new(2, 4).unwrap();
        buffer.set_time(2.5);
        buffer.set_frozen(true);
        buffer
            .write_instance_attributes(0, [0.0; 4], Some([1.0, 2.0, 3.0]), Some([4.0, 5.0, 6.0]))
            .unwrap();

        let header = &buffer.as_bytes()[buffer.layout().header_offset()..];
        let floats = |range: Range<usize>| -> Vec<f32> {
            header[range]
                .chunks_exact(4)
                .map(|chunk| f32::from_ne_bytes(chunk.try_into().unwrap()))
                .collect()
        };
        assert_eq!(floats(0..12), vec![1.0, 2.0, 3.0]);
        assert_eq!(u32::from_ne_bytes(header[12..16].try_into().unwrap()), 1);
        assert_eq!(floats(16..28), vec![4.0, 5.0, 6.0]);
        assert_eq!(floats(28..32), vec![2.5]);

        buffer.set_frozen(false);
        assert_eq!(buffer.is_frozen(), 0);
        assert_eq!(buffer.time(), 2.5);
    }

    #[test]
    fn test_base_record_write_checks_length() {
        let mut buffer = InstanceDataBuffer::new(2, 8).unwrap();
        assert_eq!(
            buffer.write_base_record(1, &[0; 4]),
            Err(InstanceBufferError::RecordSize { expected: 8, actual: 4 })
        );
        buffer.write_base_record(1, &[7; 8]).unwrap();
        assert_eq!(buffer.base_record(1).unwrap(), &[7; 8]);
        assert_eq!(buffer.base_record(0).unwrap(), &[0; 8]);
    }
}
