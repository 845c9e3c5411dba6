//! [`Native`] over the system's JACK library.
//!
//! Clients are opened and closed through `jack-sys` directly, so the server
//! name and the close status reach the caller. Each open client is mirrored by
//! a `jack::Client` used for the queries and port listings, which is never
//! dropped (its destructor would close the client a second time). Everything
//! that hands out raw pointers, or that needs to be reachable from a foreign
//! callback, goes through `jack-sys` too.

use super::*;
use ::jack as j;
use core::mem::ManuallyDrop;
use jack_sys as sys;
use std::{collections::HashMap, ffi::CStr, ffi::CString};

/// The real JACK library.
///
/// Clients opened through it stay alive until [`Native::client_close`] is
/// called for them, or the `LibJack` is dropped.
#[derive(Default)]
pub struct LibJack {
    clients: parking_lot::Mutex<HashMap<ClientHandle, ManuallyDrop<j::Client>>>,
}

impl LibJack {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn with_client<T>(&self, handle: ClientHandle, f: impl FnOnce(&j::Client) -> T) -> Option<T> {
        self.clients.lock().get(&handle).map(|c| f(c))
    }
}

impl core::fmt::Debug for LibJack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LibJack")
            .field("clients", &self.clients.lock().len())
            .finish()
    }
}

impl Drop for LibJack {
    fn drop(&mut self) {
        for (handle, _) in self.clients.get_mut().drain() {
            // SAFETY: the handle was opened by us, and was not closed yet
            let code = unsafe { sys::jack_client_close(client_ptr(handle)) };

            if code != 0 {
                log::warn!("closing a JACK client failed with code {code}");
            }
        }
    }
}

/// The options word passed to `jack_client_open`. The server name bit is set
/// exactly when a server name argument follows it.
fn native_options(options: u32, has_server_name: bool) -> u32 {
    if has_server_name {
        options | options::SERVER_NAME
    } else {
        options & !options::SERVER_NAME
    }
}

/// Copies a string owned by the library. Null becomes the empty string.
///
/// # Safety
///
/// `ptr` must be null or point to a nul-terminated string.
unsafe fn owned_string(ptr: *const ffi::c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }

    // SAFETY: guaranteed by the caller
    unsafe { CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}

#[inline(always)]
fn client_ptr(handle: ClientHandle) -> *mut sys::jack_client_t {
    handle.as_ptr().cast()
}

#[inline(always)]
fn port_ptr(handle: PortHandle) -> *mut sys::jack_port_t {
    handle.as_ptr().cast()
}

// SAFETY: jack_port_get_buffer returns a buffer of the requested frame count,
// valid for the current cycle, and jack_midi_event_get returns event data
// stored in that buffer
unsafe impl Native for LibJack {
    fn client_open(
        &self,
        name: &str,
        options: u32,
        server_name: Option<&str>,
    ) -> Result<ClientHandle, u32> {
        let invalid = status::FAILURE | status::INVALID_OPTION;

        let name = CString::new(name).map_err(|_| invalid)?;
        let server_name = server_name
            .map(CString::new)
            .transpose()
            .map_err(|_| invalid)?;

        let options = native_options(options, server_name.is_some());
        let mut native_status = 0;

        // opens and closes are serialized by the table lock
        let mut clients = self.clients.lock();

        // SAFETY: all strings are nul-terminated and outlive the call. The
        // variadic server name is only passed along with JackServerName.
        let raw = unsafe {
            match &server_name {
                Some(server_name) => sys::jack_client_open(
                    name.as_ptr(),
                    options as _,
                    &mut native_status,
                    server_name.as_ptr(),
                ),
                None => sys::jack_client_open(name.as_ptr(), options as _, &mut native_status),
            }
        };

        let status_bits = native_status as u32;

        let Some(handle) = ClientHandle::from_raw(raw.cast()) else {
            return Err(status_bits | status::FAILURE);
        };

        log::debug!(
            "JACK client opened, status: {:?}",
            j::ClientStatus::from_bits_truncate(native_status as _),
        );

        // SAFETY: raw is a live client. The mirror is never dropped, the
        // client is closed through client_close or LibJack's destructor.
        let mirror = unsafe { j::Client::from_raw(raw) };
        clients.insert(handle, ManuallyDrop::new(mirror));

        Ok(handle)
    }

    fn client_close(&self, client: ClientHandle) -> i32 {
        let mut clients = self.clients.lock();

        if clients.remove(&client).is_none() {
            return -1;
        }

        // SAFETY: the handle was opened by us and is removed from the table,
        // so it is closed exactly once
        unsafe { sys::jack_client_close(client_ptr(client)) }
    }

    fn client_name(&self, client: ClientHandle) -> String {
        self.with_client(client, |c| c.name().to_owned())
            .unwrap_or_default()
    }

    fn sample_rate(&self, client: ClientHandle) -> u32 {
        self.with_client(client, |c| c.sample_rate() as u32)
            .unwrap_or_default()
    }

    fn buffer_size(&self, client: ClientHandle) -> u32 {
        self.with_client(client, |c| c.buffer_size())
            .unwrap_or_default()
    }

    fn cpu_load(&self, client: ClientHandle) -> f32 {
        self.with_client(client, |c| c.cpu_load())
            .unwrap_or_default()
    }

    fn set_process_callback(
        &self,
        client: ClientHandle,
        callback: Option<ProcessCallback>,
        user_data: *mut ffi::c_void,
    ) -> i32 {
        // SAFETY: the client handle is live, user_data is only handed back to callback
        unsafe { sys::jack_set_process_callback(client_ptr(client), callback, user_data) }
    }

    fn activate(&self, client: ClientHandle) -> i32 {
        // SAFETY: the client handle is live
        unsafe { sys::jack_activate(client_ptr(client)) }
    }

    fn deactivate(&self, client: ClientHandle) -> i32 {
        // SAFETY: the client handle is live
        unsafe { sys::jack_deactivate(client_ptr(client)) }
    }

    fn port_register(
        &self,
        client: ClientHandle,
        name: &str,
        port_type: &str,
        flags: u32,
        buffer_size: u64,
    ) -> Option<PortHandle> {
        let name = CString::new(name).ok()?;
        let port_type = CString::new(port_type).ok()?;

        // SAFETY: the client handle is live, both strings are nul-terminated
        let port = unsafe {
            sys::jack_port_register(
                client_ptr(client),
                name.as_ptr(),
                port_type.as_ptr(),
                flags as _,
                buffer_size as _,
            )
        };

        PortHandle::from_raw(port.cast())
    }

    fn get_ports(
        &self,
        client: ClientHandle,
        name_pattern: Option<&str>,
        type_pattern: Option<&str>,
        flags: u32,
    ) -> Option<Vec<String>> {
        self.with_client(client, |c| {
            c.ports(
                name_pattern,
                type_pattern,
                j::PortFlags::from_bits_truncate(flags as _),
            )
        })
    }

    fn port_by_name(&self, client: ClientHandle, name: &str) -> Option<PortHandle> {
        let name = CString::new(name).ok()?;

        // SAFETY: the client handle is live, the string is nul-terminated
        let port = unsafe { sys::jack_port_by_name(client_ptr(client), name.as_ptr()) };

        PortHandle::from_raw(port.cast())
    }

    fn port_name(&self, port: PortHandle) -> String {
        // SAFETY: the port handle is live, the returned string belongs to it
        unsafe { owned_string(sys::jack_port_name(port_ptr(port))) }
    }

    fn port_short_name(&self, port: PortHandle) -> String {
        // SAFETY: see port_name
        unsafe { owned_string(sys::jack_port_short_name(port_ptr(port))) }
    }

    fn port_type(&self, port: PortHandle) -> String {
        // SAFETY: see port_name
        unsafe { owned_string(sys::jack_port_type(port_ptr(port))) }
    }

    fn port_flags(&self, port: PortHandle) -> u32 {
        // SAFETY: the port handle is live
        unsafe { sys::jack_port_flags(port_ptr(port)) as u32 }
    }

    fn port_is_mine(&self, client: ClientHandle, port: PortHandle) -> bool {
        // SAFETY: both handles are live
        unsafe { sys::jack_port_is_mine(client_ptr(client), port_ptr(port)) != 0 }
    }

    fn connect(&self, client: ClientHandle, source: &str, destination: &str) -> i32 {
        let (Ok(source), Ok(destination)) = (CString::new(source), CString::new(destination))
        else {
            return -1;
        };

        // SAFETY: the client handle is live, both strings are nul-terminated
        unsafe { sys::jack_connect(client_ptr(client), source.as_ptr(), destination.as_ptr()) }
    }

    fn disconnect(&self, client: ClientHandle, source: &str, destination: &str) -> i32 {
        let (Ok(source), Ok(destination)) = (CString::new(source), CString::new(destination))
        else {
            return -1;
        };

        // SAFETY: see connect
        unsafe { sys::jack_disconnect(client_ptr(client), source.as_ptr(), destination.as_ptr()) }
    }

    fn port_get_buffer(&self, port: PortHandle, frames: u32) -> Option<ptr::NonNull<ffi::c_void>> {
        // SAFETY: the port handle is live, and we are called from the process callback
        ptr::NonNull::new(unsafe { sys::jack_port_get_buffer(port_ptr(port), frames) })
    }

    fn midi_event_count(&self, buffer: ptr::NonNull<ffi::c_void>) -> u32 {
        // SAFETY: buffer was returned by port_get_buffer for a MIDI port, in this cycle
        unsafe { sys::jack_midi_get_event_count(buffer.as_ptr()) }
    }

    fn midi_lost_event_count(&self, buffer: ptr::NonNull<ffi::c_void>) -> u32 {
        // SAFETY: see midi_event_count
        unsafe { sys::jack_midi_get_lost_event_count(buffer.as_ptr()) }
    }

    fn midi_event_get(&self, buffer: ptr::NonNull<ffi::c_void>, index: u32) -> Option<RawMidiEvent> {
        let mut event = core::mem::MaybeUninit::<sys::jack_midi_event_t>::uninit();

        // SAFETY: see midi_event_count, event is only read if it was written to
        let event = unsafe {
            if sys::jack_midi_event_get(event.as_mut_ptr(), buffer.as_ptr(), index) != 0 {
                return None;
            }
            event.assume_init()
        };

        Some(RawMidiEvent {
            time: event.time,
            size: event.size,
            data: event.buffer.cast_const(),
        })
    }
}
