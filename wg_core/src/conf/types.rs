//! Type definitions for the parsed tunnel configuration.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::Path;
use std::str::FromStr;

use crate::conf::error::ConfigResult;
use crate::conf::parser;
use crate::wire::{self, WireError};

/// Length of a WireGuard key in raw bytes.
///
/// Key material is opaque to this crate; it is decoded, length-checked
/// and copied into the driver blob, never interpreted.
pub const KEY_LEN: usize = 32;

/// An IPv4 address with a prefix length (`a.b.c.d/n`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpCidr {
    /// Network address
    pub address: Ipv4Addr,
    /// Prefix length, 0..=32
    pub prefix: u8,
}

impl IpCidr {
    /// The catch-all range `0.0.0.0/0`.
    pub const CATCH_ALL: IpCidr = IpCidr {
        address: Ipv4Addr::UNSPECIFIED,
        prefix: 0,
    };
}

impl fmt::Display for IpCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

impl FromStr for IpCidr {
    type Err = CidrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| CidrParseError(s.to_string()))?;
        let address = addr
            .trim()
            .parse::<Ipv4Addr>()
            .map_err(|_| CidrParseError(s.to_string()))?;
        let prefix = prefix
            .trim()
            .parse::<u8>()
            .map_err(|_| CidrParseError(s.to_string()))?;
        if prefix > 32 {
            return Err(CidrParseError(s.to_string()));
        }
        Ok(IpCidr { address, prefix })
    }
}

/// Error returned when a CIDR string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid IPv4 CIDR: {0:?}")]
pub struct CidrParseError(pub String);

/// Parsed `[Interface]` section.
#[derive(Clone)]
pub struct InterfaceConfig {
    /// Raw private key bytes, always non-zero after a successful parse
    pub private_key: [u8; KEY_LEN],

    /// UDP listen port; 0 lets the driver choose
    pub listen_port: u16,

    /// Addresses bound to the interface
    pub addresses: Vec<IpCidr>,
}

impl fmt::Debug for InterfaceConfig {
    // Key material stays out of debug output
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceConfig")
            .field("private_key", &"[redacted]")
            .field("listen_port", &self.listen_port)
            .field("addresses", &self.addresses)
            .finish()
    }
}

/// Parsed `[Peer]` section.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Raw public key bytes, always non-zero after a successful parse
    pub public_key: [u8; KEY_LEN],

    /// Resolved UDP endpoint; `None` when the Endpoint line was absent
    /// or the host did not resolve
    pub endpoint: Option<SocketAddrV4>,

    /// CIDR ranges this peer routes
    pub allowed_ips: Vec<IpCidr>,
}

/// A fully parsed tunnel definition.
///
/// Immutable once built; consumed by [`encode`](TunnelConfig::encode)
/// to produce the driver blob.
#[derive(Debug, Clone)]
pub struct TunnelConfig {
    /// The single `[Interface]` section
    pub interface: InterfaceConfig,

    /// Ordered `[Peer]` sections, at least one
    pub peers: Vec<PeerConfig>,
}

impl TunnelConfig {
    /// Parse a tunnel definition file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        parser::parse_file(path.as_ref())
    }

    /// Parse a tunnel definition from already-loaded text.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        parser::parse_str(text)
    }

    /// Serialize to the driver's binary layout.
    ///
    /// The returned length is always
    /// `HEADER_SIZE + peers.len() * PEER_RECORD_SIZE`.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        wire::encode(self)
    }
}
