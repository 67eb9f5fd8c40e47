//! CIDR prefix parsing and canonicalization.
//!
//! Both engines key on 16-byte addresses, so everything that enters the
//! system is canonicalized here: IPv6 stays as-is, IPv4 is left-padded
//! into its IPv4-mapped form with the mask length shifted by 96 bits.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing targets and prefixes.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The text is neither an IP address nor CIDR notation.
    #[error("record doesn't specify an address or network: {0}")]
    NotAnAddress(String),
    /// The mask length does not fit the address family.
    #[error("prefix length {len} out of range for {addr}")]
    BadMaskLength {
        /// Address part of the offending record.
        addr: String,
        /// Claimed prefix length.
        len: u32,
    },
}

/// An aliased network prefix: a canonical 16-byte address and the number
/// of leading bits that are significant.
///
/// The address is stored masked, so two spellings of the same network
/// compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix {
    addr: [u8; 16],
    len: u8,
}

impl Prefix {
    /// Build a prefix from an already-canonical address, masking the bits
    /// past `len`.
    pub fn new(addr: Ipv6Addr, len: u8) -> Self {
        debug_assert!(len <= 128);
        let masked = u128::from(addr) & mask_bits(len);
        Self {
            addr: masked.to_be_bytes(),
            len,
        }
    }

    /// The canonical 16-byte address.
    pub fn octets(&self) -> [u8; 16] {
        self.addr
    }

    /// Number of significant leading bits.
    pub fn prefix_len(&self) -> u8 {
        self.len
    }

    /// First address covered by the prefix, as a big-endian integer.
    pub fn first(&self) -> u128 {
        u128::from_be_bytes(self.addr)
    }

    /// Last address covered by the prefix, as a big-endian integer.
    pub fn last(&self) -> u128 {
        self.first() | !mask_bits(self.len)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", Ipv6Addr::from(self.addr), self.len)
    }
}

impl FromStr for Prefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, len_part) = s
            .split_once('/')
            .ok_or_else(|| ParseError::NotAnAddress(s.to_owned()))?;
        let addr: IpAddr = addr_part
            .trim()
            .parse()
            .map_err(|_| ParseError::NotAnAddress(s.to_owned()))?;
        let len: u32 = len_part
            .trim()
            .parse()
            .map_err(|_| ParseError::NotAnAddress(s.to_owned()))?;
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if len > max {
            return Err(ParseError::BadMaskLength {
                addr: addr_part.to_owned(),
                len,
            });
        }
        let (addr6, len6) = canonicalize(addr, len as u8);
        Ok(Prefix::new(addr6, len6))
    }
}

/// Parse a bare address, mapping IPv4 into the 16-byte form.
pub fn parse_addr(s: &str) -> Result<Ipv6Addr, ParseError> {
    let addr: IpAddr = s
        .trim()
        .parse()
        .map_err(|_| ParseError::NotAnAddress(s.to_owned()))?;
    Ok(match addr {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    })
}

/// Left-pad an IPv4 network into IPv4-mapped IPv6 space.
fn canonicalize(addr: IpAddr, len: u8) -> (Ipv6Addr, u8) {
    match addr {
        IpAddr::V4(v4) => (v4.to_ipv6_mapped(), len + 96),
        IpAddr::V6(v6) => (v6, len),
    }
}

/// Bit mask with the top `len` bits set.
fn mask_bits(len: u8) -> u128 {
    if len == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(len))
    }
}
