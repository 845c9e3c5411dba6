//! Client-open status reporting.

use alloc::collections::btree_set;
use alloc::collections::BTreeSet;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A single condition reported by the server when opening a client.
///
/// Several conditions may be reported together (e.g. [`Failure`](Self::Failure)
/// alongside [`ServerFailed`](Self::ServerFailed)), see [`StatusSet`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum StatusCode {
    /// Overall operation failed.
    Failure,
    /// The operation contained an invalid or unsupported option.
    InvalidOption,
    /// The desired client name was not unique.
    NameNotUnique,
    /// The server was started as a result of this operation.
    ServerStarted,
    /// Unable to connect to the server.
    ServerFailed,
    /// Communication error with the server.
    ServerError,
    /// Requested client does not exist.
    NoSuchClient,
    /// Unable to load internal client.
    LoadFailure,
    /// Unable to initialize client.
    InitFailure,
    /// Unable to access shared memory.
    ShmFailure,
    /// The client's protocol version does not match the server's.
    VersionError,
    /// Backend error.
    BackendError,
    /// The client was zombified.
    ClientZombie,
}

impl StatusCode {
    /// Every status code, in declaration order.
    pub const ALL: [StatusCode; 13] = [
        Self::Failure,
        Self::InvalidOption,
        Self::NameNotUnique,
        Self::ServerStarted,
        Self::ServerFailed,
        Self::ServerError,
        Self::NoSuchClient,
        Self::LoadFailure,
        Self::InitFailure,
        Self::ShmFailure,
        Self::VersionError,
        Self::BackendError,
        Self::ClientZombie,
    ];

    /// Returns a short, human-readable description of this condition.
    #[inline(always)]
    pub const fn description(self) -> &'static str {
        use StatusCode::*;
        match self {
            Failure => "operation failed",
            InvalidOption => "invalid or unsupported option",
            NameNotUnique => "client name not unique",
            ServerStarted => "server started",
            ServerFailed => "unable to connect to server",
            ServerError => "server communication error",
            NoSuchClient => "no such client",
            LoadFailure => "unable to load internal client",
            InitFailure => "unable to initialize client",
            ShmFailure => "unable to access shared memory",
            VersionError => "protocol version mismatch",
            BackendError => "backend error",
            ClientZombie => "client zombified",
        }
    }
}

impl fmt::Display for StatusCode {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// An immutable set of [`StatusCode`]s, decoded from a native status word.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct StatusSet(BTreeSet<StatusCode>);

impl StatusSet {
    #[inline(always)]
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    #[inline(always)]
    pub fn contains(&self, code: StatusCode) -> bool {
        self.0.contains(&code)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the codes in the set, in declaration order.
    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = StatusCode> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<StatusCode> for StatusSet {
    #[inline(always)]
    fn from_iter<I: IntoIterator<Item = StatusCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for StatusSet {
    type Item = StatusCode;
    type IntoIter = btree_set::IntoIter<StatusCode>;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for StatusSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no status reported");
        }

        for (i, code) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(&code, f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_lists_codes_in_order() {
        let set: StatusSet = [StatusCode::ServerFailed, StatusCode::Failure]
            .into_iter()
            .collect();

        assert_eq!(
            set.to_string(),
            "operation failed, unable to connect to server"
        );
    }

    #[test]
    fn empty_set_display() {
        assert_eq!(StatusSet::empty().to_string(), "no status reported");
    }
}
