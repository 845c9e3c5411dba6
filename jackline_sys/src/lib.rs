//! The fixed, low-level entry points of a JACK-style audio server library.
//!
//! Everything here mirrors the native C interface: integer return codes,
//! status bitmasks and opaque handles. Making sense of them is left to the
//! `jackline` crate, which is written against the [`Native`] trait only, so any
//! implementation (the real library, behind the `jack` feature, or a test
//! double) can drive it.

use core::{ffi, ptr};

#[cfg(feature = "jack")]
mod libjack;

#[cfg(feature = "jack")]
pub use libjack::LibJack;

/// Native status bits, as reported when opening a client.
pub mod status {
    pub const FAILURE: u32 = 0x01;
    pub const INVALID_OPTION: u32 = 0x02;
    pub const NAME_NOT_UNIQUE: u32 = 0x04;
    pub const SERVER_STARTED: u32 = 0x08;
    pub const SERVER_FAILED: u32 = 0x10;
    pub const SERVER_ERROR: u32 = 0x20;
    pub const NO_SUCH_CLIENT: u32 = 0x40;
    pub const LOAD_FAILURE: u32 = 0x80;
    pub const INIT_FAILURE: u32 = 0x100;
    pub const SHM_FAILURE: u32 = 0x200;
    pub const VERSION_ERROR: u32 = 0x400;
    pub const BACKEND_ERROR: u32 = 0x800;
    pub const CLIENT_ZOMBIE: u32 = 0x1000;
}

/// Native client open options.
pub mod options {
    pub const NO_START_SERVER: u32 = 0x01;
    pub const USE_EXACT_NAME: u32 = 0x02;
    pub const SERVER_NAME: u32 = 0x04;
}

/// Native port flag bits.
pub mod port_flags {
    pub const IS_INPUT: u32 = 0x1;
    pub const IS_OUTPUT: u32 = 0x2;
    pub const IS_PHYSICAL: u32 = 0x4;
    pub const CAN_MONITOR: u32 = 0x8;
    pub const IS_TERMINAL: u32 = 0x10;
}

/// Returned by [`Native::connect`] when the connection is already made.
pub const EEXIST: i32 = 17;

/// The function a server calls once per processing cycle, with the cycle's
/// frame count and the user data pointer given at registration.
pub type ProcessCallback = unsafe extern "C" fn(u32, *mut ffi::c_void) -> ffi::c_int;

/// An opened client, as handed out by [`Native::client_open`].
///
/// Handles are only ever created from non-null pointers, at the FFI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientHandle(ptr::NonNull<ffi::c_void>);

/// A port, as handed out by [`Native::port_register`] or [`Native::port_by_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortHandle(ptr::NonNull<ffi::c_void>);

macro_rules! handle_impl {
    ($handle:ty) => {
        impl $handle {
            /// Returns `None` if `ptr` is null.
            #[inline(always)]
            pub fn from_raw(ptr: *mut ffi::c_void) -> Option<Self> {
                ptr::NonNull::new(ptr).map(Self)
            }

            #[inline(always)]
            pub const fn from_non_null(ptr: ptr::NonNull<ffi::c_void>) -> Self {
                Self(ptr)
            }

            #[inline(always)]
            pub const fn as_ptr(self) -> *mut ffi::c_void {
                self.0.as_ptr()
            }
        }

        // SAFETY: handles are opaque tokens, never dereferenced outside of
        // the native library, which is thread-safe
        unsafe impl Send for $handle {}
        unsafe impl Sync for $handle {}
    };
}

handle_impl!(ClientHandle);
handle_impl!(PortHandle);

/// One event of a native MIDI buffer.
#[derive(Debug, Clone, Copy)]
pub struct RawMidiEvent {
    /// Frame offset of the event in the current cycle.
    pub time: u32,
    /// Number of bytes at `data`.
    pub size: usize,
    /// Valid for the current cycle only.
    pub data: *const u8,
}

/// The native library's entry points.
///
/// Apart from the process callback machinery, these are only called from
/// non-real-time threads.
///
/// # Safety
///
/// `port_get_buffer` must return a region valid for reads and writes of at
/// least `frames * frame size` bytes until the end of the current process
/// cycle, and `midi_event_get` must return event data valid until the end of
/// the cycle.
pub unsafe trait Native: Send + Sync {
    /// Opens a client, or returns the native status bitmask on failure.
    fn client_open(
        &self,
        name: &str,
        options: u32,
        server_name: Option<&str>,
    ) -> Result<ClientHandle, u32>;

    /// Closes the client, invalidating `client` and all of its ports.
    fn client_close(&self, client: ClientHandle) -> i32;

    /// The name the server actually gave the client.
    fn client_name(&self, client: ClientHandle) -> String;

    fn sample_rate(&self, client: ClientHandle) -> u32;

    fn buffer_size(&self, client: ClientHandle) -> u32;

    fn cpu_load(&self, client: ClientHandle) -> f32;

    /// Registers (or, with `None`, clears) the client's process callback.
    /// `user_data` is passed back to `callback` on every cycle.
    fn set_process_callback(
        &self,
        client: ClientHandle,
        callback: Option<ProcessCallback>,
        user_data: *mut ffi::c_void,
    ) -> i32;

    fn activate(&self, client: ClientHandle) -> i32;

    fn deactivate(&self, client: ClientHandle) -> i32;

    fn port_register(
        &self,
        client: ClientHandle,
        name: &str,
        port_type: &str,
        flags: u32,
        buffer_size: u64,
    ) -> Option<PortHandle>;

    /// Full names of the ports matching the given patterns and flags. `None`
    /// stands for the native null result.
    fn get_ports(
        &self,
        client: ClientHandle,
        name_pattern: Option<&str>,
        type_pattern: Option<&str>,
        flags: u32,
    ) -> Option<Vec<String>>;

    fn port_by_name(&self, client: ClientHandle, name: &str) -> Option<PortHandle>;

    fn port_name(&self, port: PortHandle) -> String;

    fn port_short_name(&self, port: PortHandle) -> String;

    fn port_type(&self, port: PortHandle) -> String;

    fn port_flags(&self, port: PortHandle) -> u32;

    fn port_is_mine(&self, client: ClientHandle, port: PortHandle) -> bool;

    fn connect(&self, client: ClientHandle, source: &str, destination: &str) -> i32;

    fn disconnect(&self, client: ClientHandle, source: &str, destination: &str) -> i32;

    /// The port's buffer for the current cycle. Only valid from within the
    /// process callback.
    fn port_get_buffer(&self, port: PortHandle, frames: u32) -> Option<ptr::NonNull<ffi::c_void>>;

    fn midi_event_count(&self, buffer: ptr::NonNull<ffi::c_void>) -> u32;

    fn midi_lost_event_count(&self, buffer: ptr::NonNull<ffi::c_void>) -> u32;

    fn midi_event_get(&self, buffer: ptr::NonNull<ffi::c_void>, index: u32) -> Option<RawMidiEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handles_are_rejected() {
        assert!(ClientHandle::from_raw(ptr::null_mut()).is_none());
        assert!(PortHandle::from_raw(ptr::null_mut()).is_none());
    }

    #[test]
    fn handles_keep_their_address() {
        let mut target = 0u8;
        let raw = (&raw mut target).cast::<ffi::c_void>();
        assert_eq!(ClientHandle::from_raw(raw).map(ClientHandle::as_ptr), Some(raw));
    }
}
