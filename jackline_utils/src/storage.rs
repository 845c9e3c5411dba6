//! Raw memory backends for [`SampleBuffer`](crate::SampleBuffer).

use core::{marker, ptr};

const F32_SIZE: usize = size_of::<f32>();
const I32_SIZE: usize = size_of::<i32>();

/// Primitive, unchecked access to a contiguous byte region.
///
/// All values are stored in native byte order, at arbitrary (possibly
/// unaligned) byte offsets.
///
/// # Safety
///
/// Implementors must guarantee that every `offset` range lying within
/// `0..capacity_bytes()` is valid for reads and writes for as long as the storage
/// is alive.
///
/// Callers of the `unsafe` methods must guarantee that the range of bytes
/// touched by the call lies within `0..capacity_bytes()`. Implementations
/// perform no validation of their own.
pub unsafe trait RawStorage {
    /// Size of the region in bytes.
    fn capacity_bytes(&self) -> usize;

    /// # Safety
    ///
    /// `offset..offset + 4` must be in the region.
    unsafe fn write_f32(&mut self, offset: usize, value: f32);

    /// # Safety
    ///
    /// `offset..offset + 4` must be in the region.
    unsafe fn read_f32(&self, offset: usize) -> f32;

    /// # Safety
    ///
    /// `offset..offset + 4` must be in the region.
    unsafe fn write_i32(&mut self, offset: usize, value: i32);

    /// # Safety
    ///
    /// `offset..offset + 4` must be in the region.
    unsafe fn read_i32(&self, offset: usize) -> i32;

    /// # Safety
    ///
    /// `offset` must be in the region.
    unsafe fn write_u8(&mut self, offset: usize, value: u8);

    /// # Safety
    ///
    /// `offset` must be in the region.
    unsafe fn read_u8(&self, offset: usize) -> u8;

    /// # Safety
    ///
    /// `offset..offset + 4 * values.len()` must be in the region.
    unsafe fn write_f32s(&mut self, offset: usize, values: &[f32]);

    /// # Safety
    ///
    /// `offset..offset + 4 * out.len()` must be in the region.
    unsafe fn read_f32s(&self, offset: usize, out: &mut [f32]);

    /// # Safety
    ///
    /// `offset..offset + values.len()` must be in the region.
    unsafe fn write_u8s(&mut self, offset: usize, values: &[u8]);

    /// # Safety
    ///
    /// `offset..offset + out.len()` must be in the region.
    unsafe fn read_u8s(&self, offset: usize, out: &mut [u8]);
}

/// Storage over memory owned by someone else, typically a native port buffer.
///
/// The lifetime `'a` bounds how long the region may be used. It is up to the
/// creator of the storage to pick a lifetime no longer than the region's actual
/// validity (for port buffers: one process cycle).
///
/// Accesses go through raw pointers only, no reference to the region is ever
/// formed, so two storages over the same region do not alias in the Rust sense.
#[derive(Debug)]
pub struct PointerStorage<'a> {
    ptr: ptr::NonNull<u8>,
    len: usize,
    _marker: marker::PhantomData<&'a mut [u8]>,
}

impl<'a> PointerStorage<'a> {
    /// Wraps `len` bytes starting at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr..ptr + len` must be valid for reads and writes for the whole of `'a`.
    #[inline(always)]
    pub const unsafe fn new(ptr: ptr::NonNull<u8>, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: marker::PhantomData,
        }
    }

    #[inline(always)]
    pub const fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    unsafe fn at(&self, offset: usize) -> *mut u8 {
        // SAFETY: the caller guarantees offset is in the region
        unsafe { self.ptr.as_ptr().add(offset) }
    }
}

// SAFETY: the constructor's contract guarantees the region is valid for `len` bytes
unsafe impl RawStorage for PointerStorage<'_> {
    #[inline(always)]
    fn capacity_bytes(&self) -> usize {
        self.len
    }

    #[inline(always)]
    unsafe fn write_f32(&mut self, offset: usize, value: f32) {
        unsafe { self.at(offset).cast::<f32>().write_unaligned(value) }
    }

    #[inline(always)]
    unsafe fn read_f32(&self, offset: usize) -> f32 {
        unsafe { self.at(offset).cast::<f32>().read_unaligned() }
    }

    #[inline(always)]
    unsafe fn write_i32(&mut self, offset: usize, value: i32) {
        unsafe { self.at(offset).cast::<i32>().write_unaligned(value) }
    }

    #[inline(always)]
    unsafe fn read_i32(&self, offset: usize) -> i32 {
        unsafe { self.at(offset).cast::<i32>().read_unaligned() }
    }

    #[inline(always)]
    unsafe fn write_u8(&mut self, offset: usize, value: u8) {
        unsafe { self.at(offset).write(value) }
    }

    #[inline(always)]
    unsafe fn read_u8(&self, offset: usize) -> u8 {
        unsafe { self.at(offset).read() }
    }

    #[inline(always)]
    unsafe fn write_f32s(&mut self, offset: usize, values: &[f32]) {
        // byte-wise copy, the destination may be unaligned
        unsafe {
            ptr::copy_nonoverlapping(
                values.as_ptr().cast::<u8>(),
                self.at(offset),
                values.len() * F32_SIZE,
            )
        }
    }

    #[inline(always)]
    unsafe fn read_f32s(&self, offset: usize, out: &mut [f32]) {
        unsafe {
            ptr::copy_nonoverlapping(
                self.at(offset),
                out.as_mut_ptr().cast::<u8>(),
                out.len() * F32_SIZE,
            )
        }
    }

    #[inline(always)]
    unsafe fn write_u8s(&mut self, offset: usize, values: &[u8]) {
        unsafe { ptr::copy_nonoverlapping(values.as_ptr(), self.at(offset), values.len()) }
    }

    #[inline(always)]
    unsafe fn read_u8s(&self, offset: usize, out: &mut [u8]) {
        unsafe { ptr::copy_nonoverlapping(self.at(offset), out.as_mut_ptr(), out.len()) }
    }
}

/// Storage over a zero-initialized heap allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedStorage(Box<[u8]>);

impl OwnedStorage {
    #[inline(always)]
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0; len].into_boxed_slice())
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline(always)]
    pub fn into_inner(self) -> Box<[u8]> {
        self.0
    }
}

impl From<Vec<u8>> for OwnedStorage {
    #[inline(always)]
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }
}

// The safe slice accesses below would panic rather than corrupt memory if a
// caller broke the contract.

// SAFETY: the whole boxed slice is owned and valid
unsafe impl RawStorage for OwnedStorage {
    #[inline(always)]
    fn capacity_bytes(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    unsafe fn write_f32(&mut self, offset: usize, value: f32) {
        self.0[offset..offset + F32_SIZE].copy_from_slice(&value.to_ne_bytes());
    }

    #[inline(always)]
    unsafe fn read_f32(&self, offset: usize) -> f32 {
        let mut bytes = [0; F32_SIZE];
        bytes.copy_from_slice(&self.0[offset..offset + F32_SIZE]);
        f32::from_ne_bytes(bytes)
    }

    #[inline(always)]
    unsafe fn write_i32(&mut self, offset: usize, value: i32) {
        self.0[offset..offset + I32_SIZE].copy_from_slice(&value.to_ne_bytes());
    }

    #[inline(always)]
    unsafe fn read_i32(&self, offset: usize) -> i32 {
        let mut bytes = [0; I32_SIZE];
        bytes.copy_from_slice(&self.0[offset..offset + I32_SIZE]);
        i32::from_ne_bytes(bytes)
    }

    #[inline(always)]
    unsafe fn write_u8(&mut self, offset: usize, value: u8) {
        self.0[offset] = value;
    }

    #[inline(always)]
    unsafe fn read_u8(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    #[inline]
    unsafe fn write_f32s(&mut self, offset: usize, values: &[f32]) {
        let dest = &mut self.0[offset..offset + values.len() * F32_SIZE];
        for (chunk, value) in dest.chunks_exact_mut(F32_SIZE).zip(values) {
            chunk.copy_from_slice(&value.to_ne_bytes());
        }
    }

    #[inline]
    unsafe fn read_f32s(&self, offset: usize, out: &mut [f32]) {
        let src = &self.0[offset..offset + out.len() * F32_SIZE];
        for (value, chunk) in out.iter_mut().zip(src.chunks_exact(F32_SIZE)) {
            let mut bytes = [0; F32_SIZE];
            bytes.copy_from_slice(chunk);
            *value = f32::from_ne_bytes(bytes);
        }
    }

    #[inline(always)]
    unsafe fn write_u8s(&mut self, offset: usize, values: &[u8]) {
        self.0[offset..offset + values.len()].copy_from_slice(values);
    }

    #[inline(always)]
    unsafe fn read_u8s(&self, offset: usize, out: &mut [u8]) {
        out.copy_from_slice(&self.0[offset..offset + out.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_storage_unaligned_roundtrip() {
        let mut backing = [0u8; 16];
        let ptr = ptr::NonNull::new(backing.as_mut_ptr()).unwrap();
        let mut storage = unsafe { PointerStorage::new(ptr, backing.len()) };

        unsafe {
            storage.write_f32(1, 1.5);
            storage.write_i32(7, -3);
            assert_eq!(storage.read_f32(1), 1.5);
            assert_eq!(storage.read_i32(7), -3);
        }

        assert_eq!(&backing[1..5], &1.5f32.to_ne_bytes());
    }

    #[test]
    fn owned_storage_bulk_floats() {
        let mut storage = OwnedStorage::zeroed(12);
        let mut out = [0.0; 3];

        unsafe {
            storage.write_f32s(0, &[1.0, 2.0, 3.0]);
            storage.read_f32s(0, &mut out);
        }

        assert_eq!(out, [1.0, 2.0, 3.0]);
    }
}
