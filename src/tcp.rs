//! The TCP half of the stack: sequence arithmetic, the buffered byte
//! stream, the reassembler, and the sender/receiver state machines, plus
//! the two messages they exchange.

use bitflags::bitflags;

pub mod reassembler;
pub mod receiver;
pub mod sender;
pub mod seq;
pub mod stream;

use seq::SeqNo;

bitflags! {
    /// Control bits carried by a segment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SegFlags: u8 {
        const SYN = 0b0000_0001;
        const FIN = 0b0000_0010;
        const RST = 0b0000_0100;
    }
}

/// Sender-to-receiver message: one slice of the sequence space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSegment {
    pub seqno: SeqNo,
    pub flags: SegFlags,
    pub payload: Vec<u8>,
}

impl TcpSegment {
    /// Sequence space the segment occupies: one for SYN, one per payload
    /// byte, one for FIN.
    pub fn sequence_length(&self) -> u64 {
        u64::from(self.syn()) + self.payload.len() as u64 + u64::from(self.fin())
    }

    pub fn syn(&self) -> bool {
        self.flags.contains(SegFlags::SYN)
    }

    pub fn fin(&self) -> bool {
        self.flags.contains(SegFlags::FIN)
    }

    pub fn rst(&self) -> bool {
        self.flags.contains(SegFlags::RST)
    }
}

/// Receiver-to-sender message: acknowledgment and advertised window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpAck {
    /// Sequence number of the next byte the receiver expects; `None` until
    /// a SYN has been seen.
    pub ackno: Option<SeqNo>,
    pub window_size: u16,
    pub rst: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_length_counts_syn_and_fin() {
        let mut seg = TcpSegment {
            seqno: SeqNo::new(0),
            flags: SegFlags::SYN,
            payload: b"abc".to_vec(),
        };
        assert_eq!(seg.sequence_length(), 4);
        seg.flags.insert(SegFlags::FIN);
        assert_eq!(seg.sequence_length(), 5);
        seg.flags = SegFlags::RST;
        assert_eq!(seg.sequence_length(), 3);
    }
}
