//! Translation between native bitmasks and the typed model of `jackline_proto`.

use super::*;
use proto::StatusCode;
use sys::{options, port_flags, status};

const STATUS_BITS: [(u32, StatusCode); 13] = [
    (status::FAILURE, StatusCode::Failure),
    (status::INVALID_OPTION, StatusCode::InvalidOption),
    (status::NAME_NOT_UNIQUE, StatusCode::NameNotUnique),
    (status::SERVER_STARTED, StatusCode::ServerStarted),
    (status::SERVER_FAILED, StatusCode::ServerFailed),
    (status::SERVER_ERROR, StatusCode::ServerError),
    (status::NO_SUCH_CLIENT, StatusCode::NoSuchClient),
    (status::LOAD_FAILURE, StatusCode::LoadFailure),
    (status::INIT_FAILURE, StatusCode::InitFailure),
    (status::SHM_FAILURE, StatusCode::ShmFailure),
    (status::VERSION_ERROR, StatusCode::VersionError),
    (status::BACKEND_ERROR, StatusCode::BackendError),
    (status::CLIENT_ZOMBIE, StatusCode::ClientZombie),
];

const PORT_FLAG_BITS: [(u32, PortFlags); 5] = [
    (port_flags::IS_INPUT, PortFlags::IS_INPUT),
    (port_flags::IS_OUTPUT, PortFlags::IS_OUTPUT),
    (port_flags::IS_PHYSICAL, PortFlags::IS_PHYSICAL),
    (port_flags::CAN_MONITOR, PortFlags::CAN_MONITOR),
    (port_flags::IS_TERMINAL, PortFlags::IS_TERMINAL),
];

/// Decodes a native status word. Every known bit is tested independently,
/// unknown bits are ignored.
pub fn decode_status(bits: u32) -> StatusSet {
    STATUS_BITS
        .iter()
        .filter(|&&(bit, _)| bits & bit != 0)
        .map(|&(_, code)| code)
        .collect()
}

/// The native status word for `set`.
pub fn encode_status(set: &StatusSet) -> u32 {
    STATUS_BITS
        .iter()
        .filter(|(_, code)| set.contains(*code))
        .fold(0, |bits, (bit, _)| bits | bit)
}

/// Decodes native port flags, ignoring unknown bits.
pub fn decode_port_flags(bits: u32) -> PortFlags {
    PORT_FLAG_BITS
        .iter()
        .filter(|&&(bit, _)| bits & bit != 0)
        .fold(PortFlags::empty(), |flags, &(_, flag)| flags | flag)
}

pub fn encode_port_flags(flags: PortFlags) -> u32 {
    PORT_FLAG_BITS
        .iter()
        .filter(|(_, flag)| flags.contains(*flag))
        .fold(0, |bits, (bit, _)| bits | bit)
}

/// The native open options requested by `config`.
///
/// Exact naming is only requested when a name is actually given.
pub fn open_options(config: &ClientConfiguration) -> u32 {
    let mut bits = 0;

    if config.client_name.is_some() && config.use_exact_name {
        bits |= options::USE_EXACT_NAME;
    }

    if config.server_name.is_some() {
        bits |= options::SERVER_NAME;
    }

    if !config.start_server {
        bits |= options::NO_START_SERVER;
    }

    bits
}
