//! Tunnel definition handling.
//!
//! This module parses the INI-style tunnel definition file into a
//! validated [`TunnelConfig`], ready to be serialized to the driver's
//! binary layout by the [`wire`](crate::wire) module.

pub mod error;
pub mod parser;
pub mod types;

pub use error::{ConfigError, ConfigResult, KeyError};
pub use types::{CidrParseError, InterfaceConfig, IpCidr, PeerConfig, TunnelConfig, KEY_LEN};
