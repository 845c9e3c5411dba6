#![cfg_attr(not(test), no_std)]
//! Protocol-level vocabulary shared by every `jackline` crate.
//!
//! A JACK server reports most outcomes as C-style bitmasks and integer return
//! codes. This crate defines the *protocol-neutral* side of that translation:
//! the typed values the rest of the library hands out to users, independent of
//! how any particular native library encodes them.
//!
//! ## Contents
//!
//! - [`status`]: the conditions a server can report when a client tries to
//!   connect, and the set type used to carry several of them at once.
//! - [`port`]: capability flags of a port, and the static description of a
//!   port type (frame size, whether it carries an event stream).
//! - [`config`]: what a caller may ask for when opening a client.
//!
//! Everything here is plain data. Status codes and the client configuration
//! implement `serde`'s `Serialize` and `Deserialize` traits, so applications
//! can plug them into whatever configuration format they already use.

extern crate alloc;

pub mod config;
pub mod port;
pub mod status;

pub use config::ClientConfiguration;
pub use port::{PortFlags, PortTypeInformation};
pub use status::{StatusCode, StatusSet};
