//! Bounds-checked access to sample buffers whose memory belongs to someone else.
//!
//! A JACK-like server hands its clients raw pointers to per-port buffers once per
//! processing cycle. This crate turns such a region into a [`SampleBuffer`]: a
//! view addressed by frame index (for 32-bit values) or by byte offset, where
//! every access is validated against `frame_count * frame_size_bytes` before any
//! memory is touched. An invalid access is reported as a [`BufferError`], never
//! as undefined behaviour.
//!
//! The memory itself is reached through the [`RawStorage`] trait, which only
//! knows how to move values in and out of the region at already-validated
//! offsets. Two storages are provided:
//!
//! - [`PointerStorage`], over an externally-owned region (what a process
//!   callback receives),
//! - [`OwnedStorage`], over a heap allocation (useful offline and in tests).
//!
//! ```ignore
//! let mut buffer = SampleBuffer::new(128, 4, OwnedStorage::zeroed(512))?;
//! buffer.put_f32(0, 0.5)?;
//! assert!(buffer.put_f32(128, 0.5).is_err());
//! ```

pub mod buffer;
pub mod storage;

pub use buffer::{BufferError, SampleBuffer};
pub use storage::{OwnedStorage, PointerStorage, RawStorage};
