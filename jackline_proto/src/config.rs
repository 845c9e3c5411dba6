//! Client connection settings.

use alloc::string::String;
use serde::{Deserialize, Serialize};

/// Name used for a client when [`ClientConfiguration::client_name`] is not set.
pub const DEFAULT_CLIENT_NAME: &str = "jackline";

/// What a caller asks for when opening a client.
///
/// Missing fields take their [`Default`] values when deserializing, so an empty
/// document describes a client with the default name that never starts a
/// server.
///
/// ```ignore
/// let config = ClientConfiguration::default()
///     .with_client_name("looper")
///     .with_exact_name(true);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfiguration {
    /// The name requested for the client.
    pub client_name: Option<String>,
    /// If a name is given, the server is free to pick a modified version of it
    /// when it is already taken. With exact naming, opening fails instead.
    ///
    /// Ignored when no [`client_name`](Self::client_name) is given.
    pub use_exact_name: bool,
    /// The name of the server to connect to, if not the default one.
    pub server_name: Option<String>,
    /// Whether a server should be started if none is running.
    pub start_server: bool,
}

impl ClientConfiguration {
    #[inline(always)]
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    #[inline(always)]
    pub fn with_exact_name(mut self, use_exact_name: bool) -> Self {
        self.use_exact_name = use_exact_name;
        self
    }

    #[inline(always)]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    #[inline(always)]
    pub fn with_start_server(mut self, start_server: bool) -> Self {
        self.start_server = start_server;
        self
    }

    /// The name that will actually be requested from the server.
    #[inline(always)]
    pub fn effective_client_name(&self) -> &str {
        self.client_name.as_deref().unwrap_or(DEFAULT_CLIENT_NAME)
    }
}
