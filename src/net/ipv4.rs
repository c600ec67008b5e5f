//! IPv4 datagrams: an etherparse header plus an opaque payload. Routers
//! rewrite the TTL, which means recomputing the header checksum.

use std::net::Ipv4Addr;

use etherparse::{IpNumber, Ipv4Header, Ipv4HeaderSlice};

use super::WireError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Datagram {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

impl Ipv4Datagram {
    pub fn new(
        src: Ipv4Addr,
        dst: Ipv4Addr,
        protocol: IpNumber,
        ttl: u8,
        payload: Vec<u8>,
    ) -> Result<Self, WireError> {
        let len = u16::try_from(payload.len()).map_err(|_| WireError::PayloadTooBig)?;
        let mut header = Ipv4Header::new(len, ttl, protocol, src.octets(), dst.octets())
            .map_err(|_| WireError::PayloadTooBig)?;
        header.header_checksum = header.calc_header_checksum();
        Ok(Self { header, payload })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        let slice = Ipv4HeaderSlice::from_slice(bytes)?;
        let header = slice.to_header();
        let header_len = slice.slice().len();
        // frames may be padded past the datagram; trust the length field
        let end = usize::from(header.total_len).clamp(header_len, bytes.len());
        Ok(Self {
            payload: bytes[header_len..end].to_vec(),
            header,
        })
    }

    /// Header and payload as wire bytes, checksum freshly computed.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.header_len() + self.payload.len());
        self.header.write(&mut out).expect("write to Vec");
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn ttl(&self) -> u8 {
        self.header.time_to_live
    }

    /// Drop the TTL by one and refresh the header checksum.
    pub fn decrement_ttl(&mut self) {
        self.header.time_to_live -= 1;
        self.header.header_checksum = self.header.calc_header_checksum();
    }

    pub fn source(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.header.source)
    }

    pub fn destination(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.header.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datagram(ttl: u8) -> Ipv4Datagram {
        Ipv4Datagram::new(
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            IpNumber::UDP,
            ttl,
            b"ping".to_vec(),
        )
        .unwrap()
    }

    #[test]
    fn round_trips() {
        let dgram = datagram(64);
        let parsed = Ipv4Datagram::parse(&dgram.serialize()).unwrap();
        assert_eq!(parsed.payload, b"ping");
        assert_eq!(parsed.source(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(parsed.destination(), Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(parsed.ttl(), 64);
    }

    #[test]
    fn parse_ignores_link_layer_padding() {
        let mut bytes = datagram(64).serialize();
        bytes.extend_from_slice(&[0u8; 20]);
        let parsed = Ipv4Datagram::parse(&bytes).unwrap();
        assert_eq!(parsed.payload, b"ping");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Ipv4Datagram::parse(&[0u8; 5]).is_err());
    }

    #[test]
    fn ttl_decrement_keeps_the_checksum_valid() {
        let mut dgram = datagram(64);
        dgram.decrement_ttl();
        assert_eq!(dgram.ttl(), 63);
        assert_eq!(dgram.header.header_checksum, dgram.header.calc_header_checksum());
        // and the wire form still parses
        let parsed = Ipv4Datagram::parse(&dgram.serialize()).unwrap();
        assert_eq!(parsed.ttl(), 63);
    }
}
