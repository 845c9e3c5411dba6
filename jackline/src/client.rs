use super::*;
use arc_swap::ArcSwapOption;
use crate::process::{ProcessHandler, process_trampoline};

/// Where a [`Client`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClientState {
    /// Connected, but not processing. The initial state.
    Open = 0,
    /// The server is calling the process callback.
    Active = 1,
    /// Terminal.
    Closed = 2,
}

impl ClientState {
    #[inline(always)]
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Open,
            1 => Self::Active,
            _ => Self::Closed,
        }
    }
}

/// State shared between a client, the ports it issues, and the process
/// callback.
pub(crate) struct Shared {
    native: Arc<dyn Native>,
    handle: ClientHandle,
    registry: Arc<PortTypeRegistry>,
    state: AtomicU8,
    frames: AtomicU32,
    process: ArcSwapOption<ProcessHandler>,
    // serializes state transitions, never taken by the process callback
    transitions: parking_lot::Mutex<()>,
}

impl Shared {
    #[inline(always)]
    pub(crate) fn state(&self) -> ClientState {
        ClientState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline(always)]
    fn set_state(&self, state: ClientState) {
        self.state.store(state as u8, Ordering::Release);
    }

    #[inline(always)]
    pub(crate) fn ensure_open(&self) -> Result<()> {
        match self.state() {
            ClientState::Closed => Err(Error::ClientClosed),
            _ => Ok(()),
        }
    }

    #[inline(always)]
    pub(crate) fn native(&self) -> &dyn Native {
        &*self.native
    }

    #[inline(always)]
    pub(crate) fn handle(&self) -> ClientHandle {
        self.handle
    }

    /// Whether both clients were opened through the same native library.
    #[inline(always)]
    pub(crate) fn same_native(&self, other: &Self) -> bool {
        ptr::addr_eq(Arc::as_ptr(&self.native), Arc::as_ptr(&other.native))
    }

    #[inline(always)]
    pub(crate) fn store_frame_count(&self, frames: u32) {
        self.frames.store(frames, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn process_slot(&self) -> &ArcSwapOption<ProcessHandler> {
        &self.process
    }
}

/// A connection to the server.
///
/// See the [crate documentation](crate) for the lifecycle. Dropping a client
/// that is not closed closes it.
pub struct Client {
    shared: Arc<Shared>,
    name: String,
}

impl Client {
    /// Connects to the server.
    ///
    /// Port types are resolved through `registry` for the lifetime of the client.
    pub fn open(
        native: Arc<dyn Native>,
        registry: Arc<PortTypeRegistry>,
        config: &ClientConfiguration,
    ) -> Result<Self> {
        let requested_name = config.effective_client_name();

        let handle = native
            .client_open(
                requested_name,
                status::open_options(config),
                config.server_name.as_deref(),
            )
            .map_err(|bits| Error::OpenFailed {
                status: status::decode_status(bits),
            })?;

        let name = native.client_name(handle);

        log::debug!("opened client {name} (requested: {requested_name})");

        Ok(Self {
            shared: Arc::new(Shared {
                native,
                handle,
                registry,
                state: AtomicU8::new(ClientState::Open as u8),
                frames: AtomicU32::new(0),
                process: ArcSwapOption::empty(),
                transitions: parking_lot::Mutex::new(()),
            }),
            name,
        })
    }

    /// The name the server gave this client, which may differ from the one
    /// requested.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn state(&self) -> ClientState {
        self.shared.state()
    }

    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.state() == ClientState::Active
    }

    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        self.state() == ClientState::Closed
    }

    /// The frame count of the last process cycle, `0` if there was none yet.
    #[inline(always)]
    pub fn last_frame_count(&self) -> u32 {
        self.shared.frames.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub fn registry(&self) -> &Arc<PortTypeRegistry> {
        &self.shared.registry
    }

    #[inline(always)]
    fn native(&self) -> &dyn Native {
        self.shared.native()
    }

    #[inline(always)]
    fn handle(&self) -> ClientHandle {
        self.shared.handle
    }

    /// Starts processing. Does nothing if the client is already active.
    pub fn activate(&self) -> Result<()> {
        let _guard = self.shared.transitions.lock();

        match self.state() {
            ClientState::Closed => Err(Error::ClientClosed),
            ClientState::Active => Ok(()),
            ClientState::Open => {
                let code = self.native().activate(self.handle());

                if code != 0 {
                    return Err(Error::ActivateFailed { code });
                }

                self.shared.set_state(ClientState::Active);
                log::debug!("activated client {}", self.name);
                Ok(())
            }
        }
    }

    /// Stops processing. Does nothing if the client is not active.
    pub fn deactivate(&self) -> Result<()> {
        let _guard = self.shared.transitions.lock();

        match self.state() {
            ClientState::Closed => Err(Error::ClientClosed),
            ClientState::Open => Ok(()),
            ClientState::Active => {
                let code = self.native().deactivate(self.handle());

                if code != 0 {
                    return Err(Error::DeactivateFailed { code });
                }

                self.shared.set_state(ClientState::Open);
                log::debug!("deactivated client {}", self.name);
                Ok(())
            }
        }
    }

    /// Disconnects from the server.
    ///
    /// The client is closed when this returns, even if it returns
    /// [`Error::CloseFailed`].
    pub fn close(&self) -> Result<()> {
        let _guard = self.shared.transitions.lock();

        if self.is_closed() {
            return Err(Error::ClientClosed);
        }

        self.shared.set_state(ClientState::Closed);

        let code = self.native().client_close(self.handle());

        // no more cycles after the native close, this also breaks the
        // callback -> port -> client cycle
        self.shared.process.store(None);

        log::debug!("closed client {}", self.name);

        if code != 0 {
            return Err(Error::CloseFailed { code });
        }

        Ok(())
    }

    pub fn sample_rate(&self) -> Result<u32> {
        self.shared.ensure_open()?;
        Ok(self.native().sample_rate(self.handle()))
    }

    /// Frames per process cycle.
    pub fn buffer_size(&self) -> Result<u32> {
        self.shared.ensure_open()?;
        Ok(self.native().buffer_size(self.handle()))
    }

    /// Server DSP load, in percent.
    pub fn cpu_load(&self) -> Result<f32> {
        self.shared.ensure_open()?;
        Ok(self.native().cpu_load(self.handle()))
    }

    /// Installs the function called on every process cycle, replacing the
    /// previous one.
    ///
    /// `callback` runs on the server's real-time thread. If it returns an
    /// error or panics, the error is logged and the cycle is reported as
    /// failed to the server.
    pub fn set_process_callback<F>(&self, callback: F) -> Result<()>
    where
        F: FnMut(&ProcessContext<'_>) -> core::result::Result<(), ProcessError> + Send + 'static,
    {
        self.shared.ensure_open()?;

        let handler: ProcessHandler = parking_lot::Mutex::new(Box::new(callback));
        self.shared.process.store(Some(Arc::new(handler)));

        let user_data = Arc::as_ptr(&self.shared).cast_mut().cast::<ffi::c_void>();

        let code = self
            .native()
            .set_process_callback(self.handle(), Some(process_trampoline), user_data);

        if code != 0 {
            self.shared.process.store(None);
            return Err(Error::CallbackRegistrationFailed { code });
        }

        Ok(())
    }

    /// Registers a port of type `port_type`.
    ///
    /// The type must be known to the client's registry, otherwise this fails
    /// without contacting the server. `buffer_size` is only used by types
    /// with no fixed frame size, and may be `0` otherwise.
    pub fn port_register(
        &self,
        name: &str,
        port_type: &str,
        flags: PortFlags,
        buffer_size: u64,
    ) -> Result<Port> {
        self.shared.ensure_open()?;

        let type_info = self
            .shared
            .registry
            .lookup(port_type)
            .ok_or_else(|| PortRegistrationError::UnrecognizedType(port_type.to_owned()))?;

        let handle = self
            .native()
            .port_register(
                self.handle(),
                name,
                port_type,
                status::encode_port_flags(flags),
                buffer_size,
            )
            .ok_or_else(|| PortRegistrationError::Rejected {
                name: name.to_owned(),
            })?;

        Ok(Port::new(Arc::clone(&self.shared), handle, type_info))
    }

    /// Registers a port of the default audio type.
    #[inline(always)]
    pub fn port_register_audio(&self, name: &str, flags: PortFlags) -> Result<Port> {
        self.port_register(name, proto::port::DEFAULT_AUDIO_TYPE, flags, 0)
    }

    /// Full names of all ports matching the given patterns, and having at
    /// least `flags`. Patterns are regular expressions, `None` matches anything.
    pub fn ports(
        &self,
        name_pattern: Option<&str>,
        type_pattern: Option<&str>,
        flags: PortFlags,
    ) -> Result<Vec<String>> {
        self.shared.ensure_open()?;

        Ok(self
            .native()
            .get_ports(
                self.handle(),
                name_pattern,
                type_pattern,
                status::encode_port_flags(flags),
            )
            .unwrap_or_default())
    }

    #[inline(always)]
    pub fn ports_all_inputs(&self) -> Result<Vec<String>> {
        self.ports(None, None, PortFlags::IS_INPUT)
    }

    #[inline(always)]
    pub fn ports_all_outputs(&self) -> Result<Vec<String>> {
        self.ports(None, None, PortFlags::IS_OUTPUT)
    }

    /// Finds a port by its full name.
    ///
    /// Fails if the port exists but its type is unknown to the registry.
    pub fn port_by_name(&self, name: &str) -> Result<Option<Port>> {
        self.shared.ensure_open()?;

        let Some(handle) = self.native().port_by_name(self.handle(), name) else {
            return Ok(None);
        };

        let port_type = self.native().port_type(handle);

        let type_info = self.shared.registry.lookup(&port_type).ok_or_else(|| {
            Error::PortSearchFailed(format!("port {name} has unrecognized type {port_type}"))
        })?;

        Ok(Some(Port::new(Arc::clone(&self.shared), handle, type_info)))
    }

    /// Connects `source` (an output port) to `target` (an input port), by full
    /// name.
    ///
    /// Returns `false` if the ports were already connected.
    pub fn connect(&self, source: &str, target: &str) -> Result<bool> {
        self.shared.ensure_open()?;

        match self.native().connect(self.handle(), source, target) {
            0 => Ok(true),
            sys::EEXIST => {
                log::warn!("{source} is already connected to {target}");
                Ok(false)
            }
            code => Err(Error::PortConnectionFailed {
                op: ConnectionOp::Connect,
                source_port: source.to_owned(),
                target_port: target.to_owned(),
                code,
            }),
        }
    }

    pub fn disconnect(&self, source: &str, target: &str) -> Result<()> {
        self.shared.ensure_open()?;

        match self.native().disconnect(self.handle(), source, target) {
            0 => Ok(()),
            code => Err(Error::PortConnectionFailed {
                op: ConnectionOp::Disconnect,
                source_port: source.to_owned(),
                target_port: target.to_owned(),
                code,
            }),
        }
    }

    #[inline(always)]
    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if self.is_closed() {
            return;
        }

        if let Err(e) = self.close() {
            log::error!("while dropping client {}: {e}", self.name);
        }
    }
}
