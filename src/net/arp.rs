//! ARP for the Ethernet/IPv4 pairing (RFC 826). The body is a fixed 28
//! bytes; anything else on the wire is rejected.

use std::net::Ipv4Addr;

use super::ethernet::EthernetAddress;
use super::WireError;

const HTYPE_ETHERNET: u16 = 1;
const PTYPE_IPV4: u16 = 0x0800;
const HLEN_ETHERNET: u8 = 6;
const PLEN_IPV4: u8 = 4;

/// Serialized size of an Ethernet/IPv4 ARP body.
pub const ARP_LEN: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOpcode {
    Request = 1,
    Reply = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpMessage {
    pub opcode: ArpOpcode,
    pub sender_mac: EthernetAddress,
    pub sender_ip: u32,
    pub target_mac: EthernetAddress,
    pub target_ip: u32,
}

impl ArpMessage {
    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < ARP_LEN {
            return Err(WireError::Truncated {
                need: ARP_LEN,
                have: bytes.len(),
            });
        }

        let htype = u16::from_be_bytes([bytes[0], bytes[1]]);
        let ptype = u16::from_be_bytes([bytes[2], bytes[3]]);
        let opcode = match u16::from_be_bytes([bytes[6], bytes[7]]) {
            1 => ArpOpcode::Request,
            2 => ArpOpcode::Reply,
            _ => return Err(WireError::UnsupportedArp),
        };
        if htype != HTYPE_ETHERNET
            || ptype != PTYPE_IPV4
            || bytes[4] != HLEN_ETHERNET
            || bytes[5] != PLEN_IPV4
        {
            return Err(WireError::UnsupportedArp);
        }

        let mut sender_mac = EthernetAddress::default();
        sender_mac.copy_from_slice(&bytes[8..14]);
        let sender_ip = u32::from_be_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]);
        let mut target_mac = EthernetAddress::default();
        target_mac.copy_from_slice(&bytes[18..24]);
        let target_ip = u32::from_be_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);

        Ok(Self {
            opcode,
            sender_mac,
            sender_ip,
            target_mac,
            target_ip,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ARP_LEN);
        out.extend_from_slice(&HTYPE_ETHERNET.to_be_bytes());
        out.extend_from_slice(&PTYPE_IPV4.to_be_bytes());
        out.push(HLEN_ETHERNET);
        out.push(PLEN_IPV4);
        out.extend_from_slice(&(self.opcode as u16).to_be_bytes());
        out.extend_from_slice(&self.sender_mac);
        out.extend_from_slice(&self.sender_ip.to_be_bytes());
        out.extend_from_slice(&self.target_mac);
        out.extend_from_slice(&self.target_ip.to_be_bytes());
        out
    }

    pub fn sender_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.sender_ip)
    }

    pub fn target_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.target_ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ArpMessage {
        ArpMessage {
            opcode: ArpOpcode::Request,
            sender_mac: [1, 2, 3, 4, 5, 6],
            sender_ip: u32::from(Ipv4Addr::new(10, 0, 0, 1)),
            target_mac: [0; 6],
            target_ip: u32::from(Ipv4Addr::new(10, 0, 0, 2)),
        }
    }

    #[test]
    fn round_trips() {
        let msg = request();
        let bytes = msg.serialize();
        assert_eq!(bytes.len(), ARP_LEN);
        assert_eq!(ArpMessage::parse(&bytes).unwrap(), msg);
    }

    #[test]
    fn wire_layout_is_big_endian() {
        let bytes = request().serialize();
        assert_eq!(&bytes[..8], &[0, 1, 0x08, 0x00, 6, 4, 0, 1]);
        assert_eq!(&bytes[14..18], &[10, 0, 0, 1]);
        assert_eq!(&bytes[24..28], &[10, 0, 0, 2]);
    }

    #[test]
    fn rejects_truncation_and_foreign_bodies() {
        let bytes = request().serialize();
        assert!(matches!(
            ArpMessage::parse(&bytes[..27]),
            Err(WireError::Truncated { .. })
        ));

        let mut wrong_htype = bytes.clone();
        wrong_htype[1] = 2;
        assert!(matches!(
            ArpMessage::parse(&wrong_htype),
            Err(WireError::UnsupportedArp)
        ));

        let mut wrong_opcode = bytes;
        wrong_opcode[7] = 9;
        assert!(matches!(
            ArpMessage::parse(&wrong_opcode),
            Err(WireError::UnsupportedArp)
        ));
    }
}
