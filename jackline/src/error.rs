use super::*;

/// The direction of a failed connection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOp {
    Connect,
    Disconnect,
}

impl fmt::Display for ConnectionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
        })
    }
}

/// Why a port could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortRegistrationError {
    /// No registered provider knows the requested type. The server was never
    /// contacted.
    #[error("unrecognized port type: {0}")]
    UnrecognizedType(String),
    /// The server refused to register the port.
    #[error("the server refused to register port {name}")]
    Rejected { name: String },
}

/// Everything that can go wrong when talking to the server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open client ({status})")]
    OpenFailed { status: StatusSet },
    #[error("the client is closed")]
    ClientClosed,
    #[error("failed to activate client (code {code})")]
    ActivateFailed { code: i32 },
    #[error("failed to deactivate client (code {code})")]
    DeactivateFailed { code: i32 },
    /// The client is closed regardless.
    #[error("native close reported an error (code {code})")]
    CloseFailed { code: i32 },
    #[error("failed to register process callback (code {code})")]
    CallbackRegistrationFailed { code: i32 },
    #[error(transparent)]
    PortRegistrationFailed(#[from] PortRegistrationError),
    #[error("failed to {op} {source_port} -> {target_port} (code {code})")]
    PortConnectionFailed {
        op: ConnectionOp,
        source_port: String,
        target_port: String,
        code: i32,
    },
    #[error("port search failed: {0}")]
    PortSearchFailed(String),
    #[error(transparent)]
    OutOfBounds(#[from] BufferError),
    /// The port was issued by a client of another native library.
    #[error("the port does not belong to this client's native library")]
    IncompatiblePort,
    #[error("the server did not provide a buffer for this port")]
    BufferUnavailable,
}

pub type Result<T> = core::result::Result<T, Error>;
