//! An in-memory server, recording every native call made to it.

#![allow(dead_code)]

use core::{ffi, ptr};
use jackline::sys::{self, ClientHandle, Native, PortHandle, ProcessCallback, RawMidiEvent};
use std::{collections::HashSet, sync::Arc};

/// Bytes allocated for each port buffer.
pub const BUFFER_BYTES: usize = 1 << 14;

/// Largest frame size the mock can serve buffers for.
const MAX_FRAME_SIZE: usize = 16;

pub struct MockPort {
    pub name: String,
    pub port_type: String,
    pub flags: u32,
    pub owner: Option<ClientHandle>,
    pub buffer: Box<[u8]>,
    pub events: Vec<(u32, Vec<u8>)>,
    pub lost_events: u32,
}

#[derive(Default)]
pub struct MockState {
    pub calls: Vec<&'static str>,
    /// Status word returned by the next open, if it should fail.
    pub open_failure: Option<u32>,
    pub activate_code: i32,
    pub deactivate_code: i32,
    pub close_code: i32,
    pub callback_code: i32,
    pub connect_code: Option<i32>,
    pub reject_ports: bool,
    pub null_buffers: bool,
    /// Answer port queries without matches with an empty list instead of null.
    pub empty_list_not_null: bool,
    pub sample_rate: u32,
    pub buffer_size: u32,
    pub last_open: Option<(String, u32, Option<String>)>,
    pub clients: Vec<String>,
    pub closed: HashSet<ClientHandle>,
    pub ports: Vec<MockPort>,
    pub connections: HashSet<(String, String)>,
    pub callback: Option<(ProcessCallback, usize)>,
}

#[derive(Default)]
pub struct MockNative {
    pub state: parking_lot::Mutex<MockState>,
}

fn handle_address(index: usize) -> *mut ffi::c_void {
    ptr::without_provenance_mut((index + 1) * 8)
}

fn handle_index(address: *mut ffi::c_void) -> usize {
    address.addr() / 8 - 1
}

impl MockNative {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: parking_lot::Mutex::new(MockState {
                sample_rate: 48000,
                buffer_size: 256,
                ..Default::default()
            }),
        })
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Adds a port owned by some other client.
    pub fn add_foreign_port(&self, name: &str, port_type: &str, flags: u32) {
        self.state.lock().ports.push(MockPort {
            name: name.to_owned(),
            port_type: port_type.to_owned(),
            flags,
            owner: None,
            buffer: vec![0; BUFFER_BYTES].into_boxed_slice(),
            events: Vec::new(),
            lost_events: 0,
        });
    }

    pub fn port_bytes(&self, name: &str, len: usize) -> Vec<u8> {
        let state = self.state.lock();
        let port = state.ports.iter().find(|p| p.name == name).unwrap();
        port.buffer[..len].to_vec()
    }

    pub fn fill_port(&self, name: &str, bytes: &[u8]) {
        let mut state = self.state.lock();
        let port = state.ports.iter_mut().find(|p| p.name == name).unwrap();
        port.buffer[..bytes.len()].copy_from_slice(bytes);
    }

    pub fn queue_events(&self, name: &str, events: Vec<(u32, Vec<u8>)>, lost: u32) {
        let mut state = self.state.lock();
        let port = state.ports.iter_mut().find(|p| p.name == name).unwrap();
        port.events = events;
        port.lost_events = lost;
    }

    /// Runs one process cycle, as the server's real-time thread would.
    ///
    /// Returns `None` if no callback is registered.
    pub fn run_cycle(&self, frames: u32) -> Option<ffi::c_int> {
        let (callback, user_data) = self.state.lock().callback?;
        // the lock is released, the callback calls back into the mock
        Some(unsafe { callback(frames, ptr::with_exposed_provenance_mut(user_data)) })
    }

    fn record(&self, call: &'static str) -> parking_lot::MutexGuard<'_, MockState> {
        let mut state = self.state.lock();
        state.calls.push(call);
        state
    }

    fn buffer_port(state: &MockState, buffer: ptr::NonNull<ffi::c_void>) -> Option<&MockPort> {
        state
            .ports
            .iter()
            .find(|p| ptr::addr_eq(p.buffer.as_ptr(), buffer.as_ptr()))
    }
}

fn pattern_matches(pattern: Option<&str>, value: &str) -> bool {
    pattern.is_none_or(|pattern| value.contains(pattern))
}

// SAFETY: buffers are BUFFER_BYTES long, never reallocated, and only handed
// out for frame counts that fit them. Event data lives in the port's event list,
// which is only replaced between cycles.
unsafe impl Native for MockNative {
    fn client_open(
        &self,
        name: &str,
        options: u32,
        server_name: Option<&str>,
    ) -> Result<ClientHandle, u32> {
        let mut state = self.record("client_open");
        state.last_open = Some((name.to_owned(), options, server_name.map(str::to_owned)));

        if let Some(status) = state.open_failure {
            return Err(status);
        }

        let unique = !state.clients.iter().any(|c| c == name);

        let name = match (unique, options & sys::options::USE_EXACT_NAME != 0) {
            (true, _) => name.to_owned(),
            (false, false) => format!("{name}-{}", state.clients.len()),
            (false, true) => return Err(sys::status::FAILURE | sys::status::NAME_NOT_UNIQUE),
        };

        state.clients.push(name);
        Ok(ClientHandle::from_raw(handle_address(state.clients.len() - 1)).unwrap())
    }

    fn client_close(&self, client: ClientHandle) -> i32 {
        let mut state = self.record("client_close");
        state.closed.insert(client);
        state.callback = None;
        state.close_code
    }

    fn client_name(&self, client: ClientHandle) -> String {
        let state = self.record("client_name");
        state.clients[handle_index(client.as_ptr())].clone()
    }

    fn sample_rate(&self, _client: ClientHandle) -> u32 {
        self.record("sample_rate").sample_rate
    }

    fn buffer_size(&self, _client: ClientHandle) -> u32 {
        self.record("buffer_size").buffer_size
    }

    fn cpu_load(&self, _client: ClientHandle) -> f32 {
        drop(self.record("cpu_load"));
        12.5
    }

    fn set_process_callback(
        &self,
        _client: ClientHandle,
        callback: Option<ProcessCallback>,
        user_data: *mut ffi::c_void,
    ) -> i32 {
        let mut state = self.record("set_process_callback");

        if state.callback_code != 0 {
            return state.callback_code;
        }

        state.callback = callback.map(|cb| (cb, user_data.expose_provenance()));
        0
    }

    fn activate(&self, _client: ClientHandle) -> i32 {
        self.record("activate").activate_code
    }

    fn deactivate(&self, _client: ClientHandle) -> i32 {
        self.record("deactivate").deactivate_code
    }

    fn port_register(
        &self,
        client: ClientHandle,
        name: &str,
        port_type: &str,
        flags: u32,
        _buffer_size: u64,
    ) -> Option<PortHandle> {
        let mut state = self.record("port_register");

        if state.reject_ports {
            return None;
        }

        let full_name = format!("{}:{name}", state.clients[handle_index(client.as_ptr())]);

        state.ports.push(MockPort {
            name: full_name,
            port_type: port_type.to_owned(),
            flags,
            owner: Some(client),
            buffer: vec![0; BUFFER_BYTES].into_boxed_slice(),
            events: Vec::new(),
            lost_events: 0,
        });

        PortHandle::from_raw(handle_address(state.ports.len() - 1))
    }

    fn get_ports(
        &self,
        _client: ClientHandle,
        name_pattern: Option<&str>,
        type_pattern: Option<&str>,
        flags: u32,
    ) -> Option<Vec<String>> {
        let state = self.record("get_ports");

        let names: Vec<_> = state
            .ports
            .iter()
            .filter(|p| pattern_matches(name_pattern, &p.name))
            .filter(|p| pattern_matches(type_pattern, &p.port_type))
            .filter(|p| p.flags & flags == flags)
            .map(|p| p.name.clone())
            .collect();

        // the native library returns null rather than an empty list
        (!names.is_empty() || state.empty_list_not_null).then_some(names)
    }

    fn port_by_name(&self, _client: ClientHandle, name: &str) -> Option<PortHandle> {
        let state = self.record("port_by_name");
        let index = state.ports.iter().position(|p| p.name == name)?;
        PortHandle::from_raw(handle_address(index))
    }

    fn port_name(&self, port: PortHandle) -> String {
        self.record("port_name").ports[handle_index(port.as_ptr())]
            .name
            .clone()
    }

    fn port_short_name(&self, port: PortHandle) -> String {
        let state = self.record("port_short_name");
        let name = &state.ports[handle_index(port.as_ptr())].name;
        name.split_once(':').map_or(name.as_str(), |(_, short)| short).to_owned()
    }

    fn port_type(&self, port: PortHandle) -> String {
        self.record("port_type").ports[handle_index(port.as_ptr())]
            .port_type
            .clone()
    }

    fn port_flags(&self, port: PortHandle) -> u32 {
        self.record("port_flags").ports[handle_index(port.as_ptr())].flags
    }

    fn port_is_mine(&self, client: ClientHandle, port: PortHandle) -> bool {
        self.record("port_is_mine").ports[handle_index(port.as_ptr())].owner == Some(client)
    }

    fn connect(&self, _client: ClientHandle, source: &str, destination: &str) -> i32 {
        let mut state = self.record("connect");

        if let Some(code) = state.connect_code {
            return code;
        }

        if state
            .connections
            .insert((source.to_owned(), destination.to_owned()))
        {
            0
        } else {
            sys::EEXIST
        }
    }

    fn disconnect(&self, _client: ClientHandle, source: &str, destination: &str) -> i32 {
        let mut state = self.record("disconnect");

        if state
            .connections
            .remove(&(source.to_owned(), destination.to_owned()))
        {
            0
        } else {
            -1
        }
    }

    fn port_get_buffer(&self, port: PortHandle, frames: u32) -> Option<ptr::NonNull<ffi::c_void>> {
        let mut state = self.record("port_get_buffer");

        if state.null_buffers || frames as usize * MAX_FRAME_SIZE > BUFFER_BYTES {
            return None;
        }

        let port = &mut state.ports[handle_index(port.as_ptr())];
        ptr::NonNull::new(port.buffer.as_mut_ptr().cast())
    }

    fn midi_event_count(&self, buffer: ptr::NonNull<ffi::c_void>) -> u32 {
        let state = self.record("midi_event_count");
        Self::buffer_port(&state, buffer).map_or(0, |p| p.events.len() as u32)
    }

    fn midi_lost_event_count(&self, buffer: ptr::NonNull<ffi::c_void>) -> u32 {
        let state = self.record("midi_lost_event_count");
        Self::buffer_port(&state, buffer).map_or(0, |p| p.lost_events)
    }

    fn midi_event_get(&self, buffer: ptr::NonNull<ffi::c_void>, index: u32) -> Option<RawMidiEvent> {
        let state = self.record("midi_event_get");
        let (time, bytes) = Self::buffer_port(&state, buffer)?.events.get(index as usize)?;

        Some(RawMidiEvent {
            time: *time,
            size: bytes.len(),
            data: bytes.as_ptr(),
        })
    }
}
