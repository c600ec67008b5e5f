//! Ethernet II framing: a fixed 14-byte header in front of an opaque
//! payload.

use etherparse::{EtherType, Ethernet2Header, Ethernet2HeaderSlice};

use super::WireError;

/// Link-layer (hardware) address.
pub type EthernetAddress = [u8; 6];

/// Destination of a broadcast frame.
pub const ETHERNET_BROADCAST: EthernetAddress = [0xFF; 6];

/// `aa:bb:cc:dd:ee:ff` rendering for diagnostics.
pub fn format_mac(mac: &EthernetAddress) -> String {
    mac.iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub header: Ethernet2Header,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn new(
        dst: EthernetAddress,
        src: EthernetAddress,
        ether_type: EtherType,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            header: Ethernet2Header {
                destination: dst,
                source: src,
                ether_type,
            },
            payload,
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        let header = Ethernet2HeaderSlice::from_slice(bytes).map_err(|_| WireError::Truncated {
            need: Ethernet2Header::LEN,
            have: bytes.len(),
        })?;
        Ok(Self {
            header: header.to_header(),
            payload: bytes[Ethernet2Header::LEN..].to_vec(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Ethernet2Header::LEN + self.payload.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips() {
        let frame = EthernetFrame::new(
            [1, 2, 3, 4, 5, 6],
            [7, 8, 9, 10, 11, 12],
            EtherType::IPV4,
            b"payload".to_vec(),
        );
        let bytes = frame.serialize();
        assert_eq!(bytes.len(), 14 + 7);
        assert_eq!(EthernetFrame::parse(&bytes).unwrap(), frame);
    }

    #[test]
    fn short_frames_are_rejected() {
        assert!(matches!(
            EthernetFrame::parse(&[0u8; 13]),
            Err(WireError::Truncated { .. })
        ));
    }

    #[test]
    fn mac_formatting() {
        assert_eq!(format_mac(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]), "de:ad:be:ef:00:01");
        assert_eq!(format_mac(&ETHERNET_BROADCAST), "ff:ff:ff:ff:ff:ff");
    }
}
