use super::*;

/// Whatever a process callback may fail with.
pub type ProcessError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) type ProcessHandler =
    parking_lot::Mutex<Box<dyn FnMut(&ProcessContext<'_>) -> core::result::Result<(), ProcessError> + Send>>;

/// What a process callback sees of the current cycle.
///
/// Buffers obtained through a context borrow it, and so cannot outlive the
/// callback invocation.
pub struct ProcessContext<'a> {
    shared: &'a client::Shared,
    frames: u32,
}

impl<'a> ProcessContext<'a> {
    #[inline(always)]
    pub(crate) fn new(shared: &'a client::Shared, frames: u32) -> Self {
        Self { shared, frames }
    }

    /// Number of frames to process in this cycle.
    #[inline(always)]
    pub fn frame_count(&self) -> u32 {
        self.frames
    }

    fn resolve(&self, port: &Port) -> Result<ptr::NonNull<ffi::c_void>> {
        self.shared.ensure_open()?;
        port.owner().ensure_open()?;

        if !self.shared.same_native(port.owner()) {
            return Err(Error::IncompatiblePort);
        }

        self.shared
            .native()
            .port_get_buffer(port.handle(), self.frames)
            .ok_or(Error::BufferUnavailable)
    }

    /// `port`'s buffer for this cycle, `frame_count()` frames of the port
    /// type's frame size.
    pub fn port_buffer(&self, port: &Port) -> Result<SampleBuffer<PointerStorage<'_>>> {
        let buffer = self.resolve(port)?;
        let frame_size_bytes = port.type_info().frame_size_bytes().get();

        let size_bytes = usize::try_from(self.frames)
            .ok()
            .zip(usize::try_from(frame_size_bytes).ok())
            .and_then(|(frames, size)| frames.checked_mul(size))
            .ok_or(BufferError::SizeOverflow {
                frame_count: self.frames,
                frame_size_bytes,
            })?;

        // SAFETY: the native library guarantees the buffer holds this many
        // bytes until the end of the cycle, which outlives the borrow of self
        let storage = unsafe { PointerStorage::new(buffer.cast(), size_bytes) };

        Ok(SampleBuffer::new(self.frames, frame_size_bytes, storage)?)
    }

    /// The events received on (or queued for) an event-stream port in this
    /// cycle.
    pub fn port_events(&self, port: &Port) -> Result<EventBuffer<'_>> {
        if !port.type_info().is_event_stream() {
            return Err(Error::PortSearchFailed(format!(
                "{} is not an event stream type",
                port.type_info().name()
            )));
        }

        let buffer = self.resolve(port)?;
        let native = self.shared.native();

        Ok(EventBuffer {
            native,
            buffer,
            event_count: native.midi_event_count(buffer),
            lost_event_count: native.midi_lost_event_count(buffer),
        })
    }
}

impl fmt::Debug for ProcessContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessContext")
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

/// A single timestamped event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent<'a> {
    /// Frame offset in the current cycle.
    pub time: u32,
    pub bytes: &'a [u8],
}

/// The events of an event-stream port, for one cycle.
pub struct EventBuffer<'a> {
    native: &'a dyn Native,
    buffer: ptr::NonNull<ffi::c_void>,
    event_count: u32,
    lost_event_count: u32,
}

impl<'a> EventBuffer<'a> {
    #[inline(always)]
    pub fn event_count(&self) -> u32 {
        self.event_count
    }

    /// Events the server had to drop, for lack of space.
    #[inline(always)]
    pub fn lost_event_count(&self) -> u32 {
        self.lost_event_count
    }

    pub fn event(&self, index: u32) -> Option<MidiEvent<'a>> {
        if index >= self.event_count {
            return None;
        }

        let event = self.native.midi_event_get(self.buffer, index)?;

        let bytes = if event.data.is_null() || event.size == 0 {
            &[][..]
        } else {
            // SAFETY: event data is valid until the end of the cycle
            unsafe { core::slice::from_raw_parts(event.data, event.size) }
        };

        Some(MidiEvent {
            time: event.time,
            bytes,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = MidiEvent<'a>> + '_ {
        (0..self.event_count).filter_map(|i| self.event(i))
    }
}

impl fmt::Debug for EventBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBuffer")
            .field("event_count", &self.event_count)
            .field("lost_event_count", &self.lost_event_count)
            .finish_non_exhaustive()
    }
}

/// Registered with the native library, with a pointer to the client's shared
/// state as user data.
///
/// # Safety
///
/// `user_data` must point to a live [`client::Shared`].
pub(crate) unsafe extern "C" fn process_trampoline(frames: u32, user_data: *mut ffi::c_void) -> ffi::c_int {
    // SAFETY: guaranteed by the caller, the client keeps its shared state alive
    // at least until the native client is closed
    let shared = unsafe { &*user_data.cast_const().cast::<client::Shared>() };

    shared.store_frame_count(frames);

    let slot = shared.process_slot().load();

    let Some(handler) = slot.as_deref() else {
        return 0;
    };

    // only contended if the handler is being called concurrently, in which
    // case this cycle is skipped rather than waited for
    let Some(mut handler) = handler.try_lock() else {
        log::warn!("process callback already running, skipping a cycle");
        return 0;
    };

    let context = ProcessContext::new(shared, frames);

    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (*handler)(&context))) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            log::error!("process callback failed: {e}");
            -1
        }
        Err(_) => {
            log::error!("process callback panicked");
            -1
        }
    }
}
