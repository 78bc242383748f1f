//! Per-destination SOCKS5 framing state
//!
//! A `Socks5Endpoint` encodes its destination address once at construction
//! and reuses that encoding for every TCP and UDP frame sent towards it.

use bytes::{Bytes, BytesMut};

use crate::socks5::{Address, Error};

mod tcp;
mod udp;

/// Fixed response bytes preceding the bound-address field
const RESPONSE_HEADER_PREFIX: usize = 3;

/// Largest bound-address encoding: ATYP + domain length slack + IPv6
const MAX_BOUND_ADDR_LEN: usize = 3 + 16;

/// A single SOCKS5 destination with its precomputed wire encoding
///
/// Immutable after construction, freely shareable between concurrent
/// wrap/unwrap calls.
#[derive(Clone, Debug)]
pub struct Socks5Endpoint {
    address: Address,
    dest: Bytes,
    header_reserved: usize,
}

impl Socks5Endpoint {
    /// Create an endpoint for `host:port`
    ///
    /// `host` may be a numeric IPv4 or IPv6 literal or a domain name.
    /// Domain names of 256 bytes or more cannot be carried by the protocol
    /// and fail with [`Error::InvalidAddress`].
    pub fn new(host: &str, port: u16) -> Result<Socks5Endpoint, Error> {
        Socks5Endpoint::from_address(Address::from_host_port(host, port))
    }

    /// Create an endpoint from an already-parsed [`Address`]
    pub fn from_address<A: Into<Address>>(address: A) -> Result<Socks5Endpoint, Error> {
        let address = address.into();
        if let Address::DomainNameAddress(ref dn, _) = address {
            if dn.len() > u8::MAX as usize {
                return Err(Error::InvalidAddress);
            }
        }

        let mut dest = BytesMut::with_capacity(address.serialized_len());
        address.write_to_buf(&mut dest);
        let dest = dest.freeze();

        let header_reserved = std::cmp::max(
            RESPONSE_HEADER_PREFIX + MAX_BOUND_ADDR_LEN,
            RESPONSE_HEADER_PREFIX + dest.len(),
        );

        Ok(Socks5Endpoint {
            address,
            dest,
            header_reserved,
        })
    }

    /// The destination this endpoint was created for
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The destination in its wire encoding, `ATYP [LEN] ADDR PORT`
    pub fn dest(&self) -> &[u8] {
        &self.dest
    }

    /// Receive buffer sized to hold a whole TCP response carrying a
    /// `size`-byte payload, whatever bound address the server returns
    pub fn tcp_receive_buffer(&self, size: usize) -> BytesMut {
        BytesMut::with_capacity(self.header_reserved + 4 + size)
    }

    /// Receive buffer sized to hold a whole UDP datagram carrying a
    /// `size`-byte payload
    pub fn udp_receive_buffer(&self, size: usize) -> BytesMut {
        BytesMut::with_capacity(self.header_reserved + size)
    }
}
