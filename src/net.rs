//! Link- and network-layer plumbing: Ethernet framing, ARP resolution,
//! IPv4 datagrams, and longest-prefix routing between interfaces.

use thiserror::Error;

pub mod arp;
pub mod ethernet;
pub mod interface;
pub mod ipv4;
pub mod router;

/// Failures while decoding wire bytes. Interfaces drop the offending frame
/// and move on; nothing here is fatal.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
    #[error("unsupported arp body (want ethernet/ipv4, opcode request or reply)")]
    UnsupportedArp,
    #[error("payload too large for an ipv4 datagram")]
    PayloadTooBig,
    #[error(transparent)]
    Ipv4(#[from] etherparse::err::ipv4::HeaderSliceError),
}
