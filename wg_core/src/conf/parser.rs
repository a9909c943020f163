//! Line-oriented parser for the tunnel definition format.
//!
//! The format is INI-style: `[Interface]` and `[Peer]` section headers,
//! `Key = Value` lines, `#` comments. Unknown sections and keys are
//! tolerated so newer files still load; missing or malformed key
//! material aborts the parse.

use std::fs;
use std::net::{SocketAddr, SocketAddrV4, ToSocketAddrs};
use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tracing::{debug, error, info, warn};

use crate::conf::error::{ConfigError, ConfigResult, KeyError};
use crate::conf::types::{InterfaceConfig, IpCidr, PeerConfig, TunnelConfig, KEY_LEN};
use crate::wire::{MAX_ALLOWED_IPS, MAX_INTERFACE_ADDRESSES, MAX_PEERS};

/// Which section the cursor is currently inside.
enum Section {
    /// Before any section header
    None,
    /// Inside `[Interface]`
    Interface,
    /// Inside `[Peer]`
    Peer,
    /// Inside an unrecognized section; keys are ignored rather than
    /// attributed to the previous section
    Other,
}

/// Peer fields accumulated while scanning a `[Peer]` section.
#[derive(Default)]
struct PendingPeer {
    public_key: Option<[u8; KEY_LEN]>,
    endpoint: Option<SocketAddrV4>,
    allowed_ips: Vec<IpCidr>,
}

/// Parse a tunnel definition file from disk.
pub(crate) fn parse_file(path: &Path) -> ConfigResult<TunnelConfig> {
    let text = fs::read_to_string(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to read tunnel definition");
        ConfigError::Io(e)
    })?;
    let config = parse_str(&text).map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to parse tunnel definition");
        e
    })?;
    info!(
        path = %path.display(),
        peers = config.peers.len(),
        "tunnel definition parsed"
    );
    Ok(config)
}

/// Parse a tunnel definition from text.
pub(crate) fn parse_str(text: &str) -> ConfigResult<TunnelConfig> {
    let mut section = Section::None;
    let mut private_key: Option<[u8; KEY_LEN]> = None;
    let mut listen_port: u16 = 0;
    let mut addresses: Vec<IpCidr> = Vec::new();
    let mut peers: Vec<PeerConfig> = Vec::new();
    let mut pending: Option<PendingPeer> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            finish_peer(&mut pending, &mut peers)?;
            section = match line {
                "[Interface]" => Section::Interface,
                "[Peer]" => {
                    pending = Some(PendingPeer::default());
                    Section::Peer
                }
                _ => {
                    debug!(header = line, "ignoring unknown section");
                    Section::Other
                }
            };
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            debug!(line, "skipping line without key/value separator");
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match section {
            Section::Interface => match key.as_str() {
                "privatekey" => {
                    private_key =
                        Some(decode_key(value).map_err(ConfigError::InvalidPrivateKey)?);
                }
                "listenport" => {
                    listen_port = value.parse().unwrap_or_else(|_| {
                        warn!(value, "unparsable ListenPort, defaulting to 0");
                        0
                    });
                }
                "address" => {
                    for part in value.split(',') {
                        match part.trim().parse::<IpCidr>() {
                            Ok(cidr) => addresses.push(cidr),
                            Err(e) => warn!(error = %e, "skipping interface address"),
                        }
                    }
                    if addresses.len() > MAX_INTERFACE_ADDRESSES {
                        return Err(ConfigError::TooManyAddresses {
                            count: addresses.len(),
                            max: MAX_INTERFACE_ADDRESSES,
                        });
                    }
                }
                _ => debug!(key = %key, "ignoring unrecognized interface key"),
            },
            Section::Peer => {
                if let Some(peer) = pending.as_mut() {
                    match key.as_str() {
                        "publickey" => {
                            peer.public_key =
                                Some(decode_key(value).map_err(ConfigError::InvalidPublicKey)?);
                        }
                        "endpoint" => {
                            peer.endpoint = resolve_endpoint(value);
                        }
                        "allowedips" => {
                            for part in value.split(',') {
                                match part.trim().parse::<IpCidr>() {
                                    Ok(cidr) => peer.allowed_ips.push(cidr),
                                    Err(e) => warn!(error = %e, "skipping allowed IP entry"),
                                }
                            }
                            if peer.allowed_ips.len() > MAX_ALLOWED_IPS {
                                return Err(ConfigError::TooManyAllowedIps {
                                    peer: peers.len(),
                                    count: peer.allowed_ips.len(),
                                    max: MAX_ALLOWED_IPS,
                                });
                            }
                        }
                        _ => debug!(key = %key, "ignoring unrecognized peer key"),
                    }
                }
            }
            Section::None | Section::Other => {
                debug!(key = %key, "ignoring key outside a recognized section");
            }
        }
    }

    finish_peer(&mut pending, &mut peers)?;

    let private_key = private_key.ok_or(ConfigError::MissingPrivateKey)?;
    if peers.is_empty() {
        return Err(ConfigError::MissingPublicKey);
    }

    Ok(TunnelConfig {
        interface: InterfaceConfig {
            private_key,
            listen_port,
            addresses,
        },
        peers,
    })
}

/// Close out the peer currently being accumulated, if any.
///
/// A peer without a public key fails the whole parse.
fn finish_peer(pending: &mut Option<PendingPeer>, peers: &mut Vec<PeerConfig>) -> ConfigResult<()> {
    let Some(peer) = pending.take() else {
        return Ok(());
    };
    let public_key = peer.public_key.ok_or(ConfigError::MissingPublicKey)?;
    if peers.len() == MAX_PEERS {
        return Err(ConfigError::TooManyPeers {
            count: peers.len() + 1,
            max: MAX_PEERS,
        });
    }
    peers.push(PeerConfig {
        public_key,
        endpoint: peer.endpoint,
        allowed_ips: peer.allowed_ips,
    });
    Ok(())
}

/// Decode a URL-safe base64 key value; trailing `=` padding is
/// accepted and ignored.
fn decode_key(value: &str) -> Result<[u8; KEY_LEN], KeyError> {
    let bytes = URL_SAFE_NO_PAD.decode(value.trim_end_matches('='))?;
    if bytes.len() != KEY_LEN {
        return Err(KeyError::Length(bytes.len()));
    }
    if bytes.iter().all(|&b| b == 0) {
        return Err(KeyError::Zero);
    }
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes);
    Ok(key)
}

/// Resolve a `host:port` endpoint value to an IPv4 UDP address.
///
/// Resolution failure is not fatal to the parse; the peer is simply
/// left without an endpoint.
fn resolve_endpoint(value: &str) -> Option<SocketAddrV4> {
    let Some((host, port)) = value.rsplit_once(':') else {
        warn!(value, "endpoint is not host:port, leaving unset");
        return None;
    };
    let port: u16 = match port.trim().parse() {
        Ok(p) => p,
        Err(_) => {
            warn!(value, "unparsable endpoint port, leaving unset");
            return None;
        }
    };
    let host = host.trim();
    match (host, port).to_socket_addrs() {
        Ok(mut addrs) => match addrs.find_map(|a| match a {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        }) {
            Some(v4) => Some(SocketAddrV4::new(*v4.ip(), port)),
            None => {
                warn!(host, "endpoint resolved to no IPv4 address, leaving unset");
                None
            }
        },
        Err(e) => {
            warn!(host, error = %e, "endpoint resolution failed, leaving unset");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn encoded_key(byte: u8) -> String {
        URL_SAFE_NO_PAD.encode([byte; KEY_LEN])
    }

    #[test]
    fn test_decode_key_accepts_padding() {
        let padded = format!("{}=", encoded_key(7));
        assert_eq!(decode_key(&padded).unwrap(), [7u8; KEY_LEN]);
    }

    #[test]
    fn test_decode_key_rejects_short_and_zero() {
        assert!(matches!(
            decode_key(&URL_SAFE_NO_PAD.encode([1u8; 16])),
            Err(KeyError::Length(16))
        ));
        assert!(matches!(
            decode_key(&encoded_key(0)),
            Err(KeyError::Zero)
        ));
        assert!(matches!(
            decode_key("not!base64"),
            Err(KeyError::Encoding(_))
        ));
    }

    #[test]
    fn test_resolve_endpoint_literal() {
        let ep = resolve_endpoint("10.0.0.1:51820").unwrap();
        assert_eq!(ep.ip(), &Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(ep.port(), 51820);
    }

    #[test]
    fn test_resolve_endpoint_bad_values() {
        assert!(resolve_endpoint("no-port-here").is_none());
        assert!(resolve_endpoint("10.0.0.1:notaport").is_none());
    }

    #[test]
    fn test_cidr_parse() {
        let cidr: IpCidr = "192.168.4.0/24".parse().unwrap();
        assert_eq!(cidr.address, Ipv4Addr::new(192, 168, 4, 0));
        assert_eq!(cidr.prefix, 24);

        assert_eq!("0.0.0.0/0".parse::<IpCidr>().unwrap(), IpCidr::CATCH_ALL);
        assert!("10.0.0.1/33".parse::<IpCidr>().is_err());
        assert!("10.0.0.1".parse::<IpCidr>().is_err());
        assert!("fe80::1/64".parse::<IpCidr>().is_err());
    }
}
