//! Error types for tunnel definition parsing.

use std::io;
use thiserror::Error;

use crate::wire::WireError;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Reasons a base64-encoded key field is rejected.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The value is not valid URL-safe base64
    #[error("invalid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The value decoded to the wrong number of bytes
    #[error("decoded to {0} bytes, expected 32")]
    Length(usize),

    /// The decoded key is all zeroes
    #[error("key is all zeroes")]
    Zero,
}

/// Error types that can occur while translating a tunnel definition.
///
/// Any of these aborts the whole parse; no partial configuration is
/// ever returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the definition file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The [Interface] section never set a PrivateKey
    #[error("missing PrivateKey in [Interface] section")]
    MissingPrivateKey,

    /// PrivateKey was present but rejected
    #[error("invalid PrivateKey: {0}")]
    InvalidPrivateKey(#[source] KeyError),

    /// A [Peer] section never set a PublicKey, or no peer was defined
    #[error("missing PublicKey in [Peer] section")]
    MissingPublicKey,

    /// PublicKey was present but rejected
    #[error("invalid PublicKey: {0}")]
    InvalidPublicKey(#[source] KeyError),

    /// More [Peer] sections than the driver layout can carry
    #[error("too many peers: {count} (max {max})")]
    TooManyPeers { count: usize, max: usize },

    /// More AllowedIPs entries on one peer than the layout can carry
    #[error("too many allowed IPs on peer {peer}: {count} (max {max})")]
    TooManyAllowedIps {
        peer: usize,
        count: usize,
        max: usize,
    },

    /// More interface Address entries than the layout can carry
    #[error("too many interface addresses: {count} (max {max})")]
    TooManyAddresses { count: usize, max: usize },

    /// Serialization to the driver layout failed
    #[error("wire encoding error: {0}")]
    Wire(#[from] WireError),
}
