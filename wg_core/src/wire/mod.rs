//! Binary layout of the driver configuration blob.
//!
//! The adapter driver consumes a single contiguous blob: a fixed-size
//! header for the interface followed by one fixed-size record per peer.
//! The layout is explicit and padding-free; it is never derived from
//! in-memory struct layout, so the producing side cannot drift from the
//! driver's expectations through compiler padding or field reordering.
//!
//! # Blob format
//!
//! All multi-byte integers are little-endian. A CIDR slot is 8 bytes:
//! address octets (4), prefix length (1), reserved (3, zero).
//!
//! ```text
//! Header (HEADER_SIZE = 76 bytes):
//!   offset  0  private_key       [u8; 32]
//!   offset 32  listen_port       u16
//!   offset 34  reserved          u16
//!   offset 36  address_count     u32
//!   offset 40  addresses         4 CIDR slots
//!   offset 72  peer_count        u32
//!
//! Peer record (PEER_RECORD_SIZE = 112 bytes):
//!   offset  0  public_key        [u8; 32]
//!   offset 32  endpoint_present  u8 (0 or 1)
//!   offset 33  reserved          [u8; 3]
//!   offset 36  endpoint_addr     [u8; 4] (octets, zero when absent)
//!   offset 40  endpoint_port     u16
//!   offset 42  reserved          u16
//!   offset 44  allowed_ip_count  u32
//!   offset 48  allowed_ips       8 CIDR slots
//! ```
//!
//! Total blob length is always
//! `HEADER_SIZE + peer_count * PEER_RECORD_SIZE`; the driver receives
//! the blob as a slice, which carries that length.

use byteorder::{LittleEndian, WriteBytesExt};
use thiserror::Error;
use tracing::debug;

use crate::conf::types::{IpCidr, PeerConfig, TunnelConfig};

/// Size of one CIDR slot in bytes.
pub const CIDR_SIZE: usize = 8;

/// Maximum addresses carried in the interface header.
pub const MAX_INTERFACE_ADDRESSES: usize = 4;

/// Maximum allowed-IP entries per peer record.
pub const MAX_ALLOWED_IPS: usize = 8;

/// Maximum peer records in one blob.
pub const MAX_PEERS: usize = 8;

/// Size of the fixed interface header.
pub const HEADER_SIZE: usize = 32 + 2 + 2 + 4 + MAX_INTERFACE_ADDRESSES * CIDR_SIZE + 4;

/// Size of one peer record.
pub const PEER_RECORD_SIZE: usize = 32 + 1 + 3 + 4 + 2 + 2 + 4 + MAX_ALLOWED_IPS * CIDR_SIZE;

/// Errors that can occur while serializing a configuration.
#[derive(Debug, Error)]
pub enum WireError {
    /// A blob with no peers is never produced
    #[error("configuration has no peers")]
    NoPeers,

    /// Peer list exceeds the fixed record capacity
    #[error("too many peers: {count} (max {max})")]
    TooManyPeers { count: usize, max: usize },

    /// One peer's allowed-IP list exceeds its slot capacity
    #[error("too many allowed IPs on peer {peer}: {count} (max {max})")]
    TooManyAllowedIps {
        peer: usize,
        count: usize,
        max: usize,
    },

    /// Interface address list exceeds the header capacity
    #[error("too many interface addresses: {count} (max {max})")]
    TooManyAddresses { count: usize, max: usize },
}

/// Serialize a parsed configuration to the driver blob.
pub fn encode(config: &TunnelConfig) -> Result<Vec<u8>, WireError> {
    if config.peers.is_empty() {
        return Err(WireError::NoPeers);
    }
    if config.peers.len() > MAX_PEERS {
        return Err(WireError::TooManyPeers {
            count: config.peers.len(),
            max: MAX_PEERS,
        });
    }
    if config.interface.addresses.len() > MAX_INTERFACE_ADDRESSES {
        return Err(WireError::TooManyAddresses {
            count: config.interface.addresses.len(),
            max: MAX_INTERFACE_ADDRESSES,
        });
    }
    for (i, peer) in config.peers.iter().enumerate() {
        if peer.allowed_ips.len() > MAX_ALLOWED_IPS {
            return Err(WireError::TooManyAllowedIps {
                peer: i,
                count: peer.allowed_ips.len(),
                max: MAX_ALLOWED_IPS,
            });
        }
    }

    let total = HEADER_SIZE + config.peers.len() * PEER_RECORD_SIZE;
    let mut buffer = Vec::with_capacity(total);

    buffer.extend_from_slice(&config.interface.private_key);
    write_u16(&mut buffer, config.interface.listen_port);
    write_u16(&mut buffer, 0); // reserved
    write_u32(&mut buffer, config.interface.addresses.len() as u32);
    write_cidr_slots(&mut buffer, &config.interface.addresses, MAX_INTERFACE_ADDRESSES);
    write_u32(&mut buffer, config.peers.len() as u32);

    for peer in &config.peers {
        write_peer(&mut buffer, peer);
    }

    debug_assert_eq!(buffer.len(), total);
    debug!(
        peers = config.peers.len(),
        blob_len = buffer.len(),
        "configuration blob encoded"
    );
    Ok(buffer)
}

fn write_peer(buffer: &mut Vec<u8>, peer: &PeerConfig) {
    buffer.extend_from_slice(&peer.public_key);
    match peer.endpoint {
        Some(ep) => {
            buffer.push(1);
            buffer.extend_from_slice(&[0u8; 3]); // reserved
            buffer.extend_from_slice(&ep.ip().octets());
            write_u16(buffer, ep.port());
        }
        None => {
            buffer.push(0);
            buffer.extend_from_slice(&[0u8; 3]); // reserved
            buffer.extend_from_slice(&[0u8; 4]);
            write_u16(buffer, 0);
        }
    }
    write_u16(buffer, 0); // reserved
    write_u32(buffer, peer.allowed_ips.len() as u32);
    write_cidr_slots(buffer, &peer.allowed_ips, MAX_ALLOWED_IPS);
}

/// Write `capacity` CIDR slots, zero-filling the unused tail.
fn write_cidr_slots(buffer: &mut Vec<u8>, entries: &[IpCidr], capacity: usize) {
    for cidr in entries {
        buffer.extend_from_slice(&cidr.address.octets());
        buffer.push(cidr.prefix);
        buffer.extend_from_slice(&[0u8; 3]); // reserved
    }
    for _ in entries.len()..capacity {
        buffer.extend_from_slice(&[0u8; CIDR_SIZE]);
    }
}

fn write_u16(buffer: &mut Vec<u8>, value: u16) {
    // Writing to a Vec cannot fail
    buffer
        .write_u16::<LittleEndian>(value)
        .expect("write to Vec");
}

fn write_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer
        .write_u32::<LittleEndian>(value)
        .expect("write to Vec");
}
