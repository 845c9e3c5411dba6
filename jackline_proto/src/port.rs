//! Port capabilities and port type descriptions.

use alloc::borrow::Cow;
use core::{fmt, num};

/// Type name the server uses for mono, 32-bit float audio ports.
pub const DEFAULT_AUDIO_TYPE: &str = "32 bit float mono audio";

/// Type name the server uses for raw MIDI event ports.
pub const DEFAULT_MIDI_TYPE: &str = "8 bit raw midi";

bitflags::bitflags! {
    /// Capabilities of a port.
    ///
    /// These bits are protocol-neutral, they do not necessarily match the values
    /// a native library uses on the wire.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct PortFlags: u8 {
        /// The port can receive data.
        const IS_INPUT = 1 << 0;
        /// Data can be read from the port.
        const IS_OUTPUT = 1 << 1;
        /// The port corresponds to some kind of physical I/O connector.
        const IS_PHYSICAL = 1 << 2;
        /// Input monitoring can be requested on the port.
        const CAN_MONITOR = 1 << 3;
        /// For an input port: data received is not passed on or made available at any
        /// other port.
        ///
        /// For an output port: data available at the port does not originate from any
        /// other port.
        const IS_TERMINAL = 1 << 4;
    }
}

/// Static description of a port type.
///
/// Instances are immutable. They are looked up by [`name`](Self::name) through a
/// registry and shared by every port of that type.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct PortTypeInformation {
    name: Cow<'static, str>,
    frame_size_bytes: num::NonZeroU32,
    is_event_stream: bool,
}

impl PortTypeInformation {
    /// Mono 32-bit float audio: one `f32` per frame.
    pub const AUDIO: Self = Self::from_static(
        DEFAULT_AUDIO_TYPE,
        num::NonZeroU32::new(size_of::<f32>() as u32).unwrap(),
        false,
    );

    /// Raw MIDI: the buffer holds a variable number of timestamped events.
    pub const MIDI: Self =
        Self::from_static(DEFAULT_MIDI_TYPE, num::NonZeroU32::new(1).unwrap(), true);

    #[inline(always)]
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        frame_size_bytes: num::NonZeroU32,
        is_event_stream: bool,
    ) -> Self {
        Self {
            name: name.into(),
            frame_size_bytes,
            is_event_stream,
        }
    }

    #[inline(always)]
    pub const fn from_static(
        name: &'static str,
        frame_size_bytes: num::NonZeroU32,
        is_event_stream: bool,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            frame_size_bytes,
            is_event_stream,
        }
    }

    /// The type string, as understood by the server.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub const fn frame_size_bytes(&self) -> num::NonZeroU32 {
        self.frame_size_bytes
    }

    /// Whether buffers of this type hold discrete timestamped events (e.g. MIDI)
    /// rather than one sample per frame.
    #[inline(always)]
    pub const fn is_event_stream(&self) -> bool {
        self.is_event_stream
    }
}

impl fmt::Display for PortTypeInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes/frame", self.name, self.frame_size_bytes)?;
        if self.is_event_stream {
            f.write_str(", events")?;
        }
        f.write_str(")")
    }
}
