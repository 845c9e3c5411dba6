//! The bounds-checked buffer view.

use crate::storage::RawStorage;

const F32_SIZE: usize = size_of::<f32>();

/// Errors reported by [`SampleBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// An access touched memory outside of the buffer.
    #[error("access of {length} value(s) at index {index} is out of bounds (buffer size: {size_bytes} bytes)")]
    OutOfBounds {
        index: isize,
        length: usize,
        size_bytes: usize,
    },
    /// A bulk read was given a destination window that does not fit in the
    /// destination slice.
    #[error("destination window {offset}..{offset}+{length} exceeds destination length {capacity}")]
    Destination {
        offset: usize,
        length: usize,
        capacity: usize,
    },
    /// `frame_count * frame_size_bytes` is not addressable on this platform.
    #[error("a buffer of {frame_count} frames of {frame_size_bytes} bytes is not addressable")]
    SizeOverflow {
        frame_count: u32,
        frame_size_bytes: u32,
    },
    /// The storage is smaller than `frame_count * frame_size_bytes`.
    #[error("storage holds {available} bytes, but {required} are required")]
    StorageTooSmall { required: usize, available: usize },
}

/// A bounds-checked view over `frame_count * frame_size_bytes` bytes of memory.
///
/// ## Addressing
///
/// There are two addressing units, and they are deliberately kept apart:
///
/// - `f32` and `i32` accessors take an **index**, and touch the 4 bytes at byte
///   offset `index * 4`, whatever the frame size of the buffer.
/// - byte accessors take a **byte offset**, used as is.
///
/// ## Bounds checking
///
/// Every accessor computes the highest byte offset it would touch, and fails
/// with [`BufferError::OutOfBounds`] if the start index is negative or that
/// offset is past the end of the buffer. For bulk accesses of `n` values the
/// highest touched element is `index + max(0, n - 1)`, so an empty slice is
/// checked as if it were a single element at `index`.
///
/// Checks happen before any memory is touched: a failed call leaves the buffer
/// unchanged.
#[derive(Debug)]
pub struct SampleBuffer<S> {
    frame_count: u32,
    frame_size_bytes: u32,
    // invariant: size_bytes <= storage.capacity_bytes() and size_bytes <= isize::MAX
    size_bytes: usize,
    storage: S,
}

impl<S: RawStorage> SampleBuffer<S> {
    /// Creates a view of `frame_count` frames of `frame_size_bytes` bytes each
    /// over `storage`.
    ///
    /// Fails if the total size is not addressable or `storage` is too small to
    /// hold it.
    pub fn new(frame_count: u32, frame_size_bytes: u32, storage: S) -> Result<Self, BufferError> {
        let size_bytes = usize::try_from(frame_count)
            .ok()
            .zip(usize::try_from(frame_size_bytes).ok())
            .and_then(|(count, size)| count.checked_mul(size))
            .filter(|&size| isize::try_from(size).is_ok())
            .ok_or(BufferError::SizeOverflow {
                frame_count,
                frame_size_bytes,
            })?;

        let available = storage.capacity_bytes();

        if available < size_bytes {
            return Err(BufferError::StorageTooSmall {
                required: size_bytes,
                available,
            });
        }

        Ok(Self {
            frame_count,
            frame_size_bytes,
            size_bytes,
            storage,
        })
    }

    /// The number of frames the buffer can hold.
    #[inline(always)]
    pub const fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// The size of each frame in bytes.
    #[inline(always)]
    pub const fn frame_size_bytes(&self) -> u32 {
        self.frame_size_bytes
    }

    /// `frame_count * frame_size_bytes`.
    #[inline(always)]
    pub const fn total_size_bytes(&self) -> usize {
        self.size_bytes
    }

    #[inline(always)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[inline(always)]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Validates an access of `length` values of `unit` bytes starting at
    /// `index` (in units), returning the byte offset of the first value.
    #[inline]
    fn check_bounds(&self, index: isize, length: usize, unit: usize) -> Result<usize, BufferError> {
        let out_of_bounds = BufferError::OutOfBounds {
            index,
            length,
            size_bytes: self.size_bytes,
        };

        if index < 0 {
            return Err(out_of_bounds);
        }

        // highest byte touched: the last byte of the last element
        let end_offset = isize::try_from(length.saturating_sub(1))
            .ok()
            .and_then(|last| index.checked_add(last))
            .and_then(|last_index| last_index.checked_mul(unit as isize))
            .and_then(|last_start| last_start.checked_add(unit as isize - 1))
            .ok_or(out_of_bounds)?;

        // size_bytes <= isize::MAX, see constructor
        if end_offset >= self.size_bytes as isize {
            return Err(out_of_bounds);
        }

        // index >= 0 and index * unit <= end_offset, so this neither wraps nor overflows
        Ok(index as usize * unit)
    }

    /// Writes `value` at byte offset `index * 4`.
    #[inline]
    pub fn put_f32(&mut self, index: isize, value: f32) -> Result<(), BufferError> {
        let offset = self.check_bounds(index, 1, F32_SIZE)?;
        // SAFETY: offset..offset + 4 was checked to lie within size_bytes
        unsafe { self.storage.write_f32(offset, value) };
        Ok(())
    }

    /// Reads the value at byte offset `index * 4`.
    #[inline]
    pub fn get_f32(&self, index: isize) -> Result<f32, BufferError> {
        let offset = self.check_bounds(index, 1, F32_SIZE)?;
        // SAFETY: see put_f32
        Ok(unsafe { self.storage.read_f32(offset) })
    }

    /// Writes `value` at byte offset `index * 4`.
    #[inline]
    pub fn put_i32(&mut self, index: isize, value: i32) -> Result<(), BufferError> {
        let offset = self.check_bounds(index, 1, F32_SIZE)?;
        // SAFETY: see put_f32
        unsafe { self.storage.write_i32(offset, value) };
        Ok(())
    }

    /// Reads the value at byte offset `index * 4`.
    #[inline]
    pub fn get_i32(&self, index: isize) -> Result<i32, BufferError> {
        let offset = self.check_bounds(index, 1, F32_SIZE)?;
        // SAFETY: see put_f32
        Ok(unsafe { self.storage.read_i32(offset) })
    }

    /// Writes `value` at byte offset `offset`.
    #[inline]
    pub fn put_byte(&mut self, offset: isize, value: u8) -> Result<(), BufferError> {
        let offset = self.check_bounds(offset, 1, 1)?;
        // SAFETY: offset was checked to lie within size_bytes
        unsafe { self.storage.write_u8(offset, value) };
        Ok(())
    }

    /// Reads the byte at byte offset `offset`.
    #[inline]
    pub fn get_byte(&self, offset: isize) -> Result<u8, BufferError> {
        let offset = self.check_bounds(offset, 1, 1)?;
        // SAFETY: see put_byte
        Ok(unsafe { self.storage.read_u8(offset) })
    }

    /// Writes `values` contiguously, starting at byte offset `index * 4`.
    #[inline]
    pub fn put_f32s(&mut self, index: isize, values: &[f32]) -> Result<(), BufferError> {
        let offset = self.check_bounds(index, values.len(), F32_SIZE)?;
        // SAFETY: the last byte of the last value was checked to lie within size_bytes
        unsafe { self.storage.write_f32s(offset, values) };
        Ok(())
    }

    /// Reads `length` values, starting at byte offset `index * 4`, into
    /// `out[out_offset..out_offset + length]`.
    #[inline]
    pub fn get_f32s(
        &self,
        index: isize,
        out: &mut [f32],
        out_offset: usize,
        length: usize,
    ) -> Result<(), BufferError> {
        let offset = self.check_bounds(index, length, F32_SIZE)?;
        let dest = destination(out, out_offset, length)?;
        // SAFETY: see put_f32s
        unsafe { self.storage.read_f32s(offset, dest) };
        Ok(())
    }

    /// Fills `out` with values read starting at byte offset `index * 4`.
    #[inline(always)]
    pub fn get_f32s_into(&self, index: isize, out: &mut [f32]) -> Result<(), BufferError> {
        let length = out.len();
        self.get_f32s(index, out, 0, length)
    }

    /// Writes `values` contiguously, starting at byte offset `offset`.
    #[inline]
    pub fn put_bytes(&mut self, offset: isize, values: &[u8]) -> Result<(), BufferError> {
        let offset = self.check_bounds(offset, values.len(), 1)?;
        // SAFETY: the last byte written was checked to lie within size_bytes
        unsafe { self.storage.write_u8s(offset, values) };
        Ok(())
    }

    /// Reads `length` bytes, starting at byte offset `offset`, into
    /// `out[out_offset..out_offset + length]`.
    #[inline]
    pub fn get_bytes(
        &self,
        offset: isize,
        out: &mut [u8],
        out_offset: usize,
        length: usize,
    ) -> Result<(), BufferError> {
        let offset = self.check_bounds(offset, length, 1)?;
        let dest = destination(out, out_offset, length)?;
        // SAFETY: see put_bytes
        unsafe { self.storage.read_u8s(offset, dest) };
        Ok(())
    }

    /// Fills `out` with bytes read starting at byte offset `offset`.
    #[inline(always)]
    pub fn get_bytes_into(&self, offset: isize, out: &mut [u8]) -> Result<(), BufferError> {
        let length = out.len();
        self.get_bytes(offset, out, 0, length)
    }
}

#[inline(always)]
fn destination<T>(out: &mut [T], offset: usize, length: usize) -> Result<&mut [T], BufferError> {
    let capacity = out.len();

    offset
        .checked_add(length)
        .and_then(|end| out.get_mut(offset..end))
        .ok_or(BufferError::Destination {
            offset,
            length,
            capacity,
        })
}
