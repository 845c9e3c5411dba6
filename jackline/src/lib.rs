//! A client library for JACK-style real-time audio/MIDI servers.
//!
//! A [`Client`] is opened against some implementation of the native entry
//! points ([`sys::Native`]) and a [`PortTypeRegistry`]. It then moves through
//! three states:
//!
//! ```text
//!         activate               close
//! Open ------------> Active ------------> Closed
//!  ^  <------------    |
//!  |    deactivate     |        close
//!  +-------------------+----------------> Closed
//! ```
//!
//! Once closed, every operation fails with [`Error::ClientClosed`], including
//! those on [`Port`]s issued by the client.
//!
//! The server calls the client's process callback on its own real-time thread,
//! once per cycle. The callback receives a [`ProcessContext`], through which
//! port buffers are reached as bounds-checked [`SampleBuffer`]s. Errors and
//! panics raised by the callback never reach the server: they are logged and
//! reported as a failed cycle.
//!
//! ```ignore
//! let registry = Arc::new(PortTypeRegistry::with_defaults());
//! let client = Client::open(Arc::new(LibJack::new()), registry, &ClientConfiguration::default())?;
//!
//! let out = client.port_register_audio("out", PortFlags::IS_OUTPUT)?;
//!
//! client.set_process_callback(move |ctx| {
//!     let mut buffer = ctx.port_buffer(&out)?;
//!     for i in 0..buffer.frame_count() as isize {
//!         buffer.put_f32(i, 0.)?;
//!     }
//!     Ok(())
//! })?;
//!
//! client.activate()?;
//! ```

use core::{
    ffi, fmt, ptr,
    sync::atomic::{AtomicU8, AtomicU32, Ordering},
};
use std::sync::Arc;

pub use jackline_proto as proto;
pub use jackline_sys as sys;
pub use jackline_utils as utils;

use proto::{ClientConfiguration, PortFlags, PortTypeInformation, StatusSet};
use sys::{ClientHandle, Native, PortHandle};
use utils::{BufferError, PointerStorage, SampleBuffer};

mod client;
mod error;
mod port;
mod process;
mod registry;
pub mod status;

pub use client::{Client, ClientState};
pub use error::{ConnectionOp, Error, PortRegistrationError, Result};
pub use port::Port;
pub use process::{EventBuffer, MidiEvent, ProcessContext, ProcessError};
pub use registry::{PortTypeProvider, PortTypeRegistry, ProviderId, StaticPortTypes};
