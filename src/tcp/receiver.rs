//! Receive-side TCP state machine. Anchors the peer's sequence space at
//! its SYN, translates segment sequence numbers into stream offsets for
//! the reassembler, and reports the ackno/window pair to send back.

use super::reassembler::Reassembler;
use super::seq::SeqNo;
use super::stream::ByteStream;
use super::{TcpAck, TcpSegment};
use crate::config::MAX_WINDOW;

#[derive(Debug)]
pub struct TcpReceiver {
    reassembler: Reassembler,
    // the peer's ISN, learned from its SYN
    zero_point: Option<SeqNo>,
}

impl TcpReceiver {
    pub fn new(capacity: usize) -> Self {
        Self {
            reassembler: Reassembler::new(ByteStream::new(capacity)),
            zero_point: None,
        }
    }

    /// Accept one inbound segment. Everything before the peer's SYN is
    /// dropped; RST poisons the stream.
    pub fn receive(&mut self, segment: TcpSegment) {
        if self.reassembler.output().has_error() {
            return;
        }
        if segment.rst() {
            self.reassembler.output_mut().set_error();
            return;
        }

        let zero = match self.zero_point {
            Some(zero) => zero,
            None => {
                if !segment.syn() {
                    return;
                }
                self.zero_point = Some(segment.seqno);
                segment.seqno
            }
        };

        // the next byte we expect sits one past the SYN in sequence space
        let checkpoint = self.reassembler.output().bytes_pushed() + 1;
        let abs = segment.seqno.unwrap(zero, checkpoint);

        // a non-SYN segment claiming the SYN's own slot carries nothing
        // for the stream
        if !segment.syn() && abs == 0 {
            return;
        }
        let stream_index = abs + u64::from(segment.syn()) - 1;

        self.reassembler.insert(stream_index, &segment.payload, segment.fin());
    }

    /// The acknowledgment to send: next needed seqno (once known), the
    /// advertised window, and whether the stream has errored.
    pub fn ack(&self) -> TcpAck {
        let out = self.reassembler.output();
        let window_size = out.available_capacity().min(MAX_WINDOW) as u16;
        let ackno = self.zero_point.map(|zero| {
            // SYN consumes one sequence number; so does FIN once the
            // stream has closed
            let ack_abs = out.bytes_pushed() + 1 + u64::from(out.is_closed());
            SeqNo::wrap(ack_abs, zero)
        });
        TcpAck {
            ackno,
            window_size,
            rst: out.has_error(),
        }
    }

    pub fn stream(&self) -> &ByteStream {
        self.reassembler.output()
    }

    pub fn stream_mut(&mut self) -> &mut ByteStream {
        self.reassembler.output_mut()
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }
}
