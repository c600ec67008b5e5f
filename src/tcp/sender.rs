//! Send-side TCP state machine. Slices the outbound stream into segments
//! that fit the peer's advertised window, keeps every unacknowledged
//! segment in FIFO order, and retransmits the oldest one when the
//! retransmission timer fires.

use std::collections::VecDeque;

use log::trace;

use super::seq::SeqNo;
use super::stream::ByteStream;
use super::{SegFlags, TcpAck, TcpSegment};
use crate::config::MAX_PAYLOAD_SIZE;
use crate::timer::RetransmitTimer;

#[derive(Debug)]
pub struct TcpSender {
    input: ByteStream,
    isn: SeqNo,
    initial_rto_ms: u64,
    timer: RetransmitTimer,
    // unacknowledged segments, FIFO by absolute seqno
    outstanding: VecDeque<TcpSegment>,
    next_abs_seqno: u64,
    ack_abs_seqno: u64,
    total_outstanding: u64,
    total_retransmissions: u64,
    window_size: u16,
    syn_sent: bool,
    fin_sent: bool,
}

impl TcpSender {
    pub fn new(input: ByteStream, isn: SeqNo, initial_rto_ms: u64) -> Self {
        Self {
            input,
            isn,
            initial_rto_ms,
            timer: RetransmitTimer::new(initial_rto_ms),
            outstanding: VecDeque::new(),
            next_abs_seqno: 0,
            ack_abs_seqno: 0,
            total_outstanding: 0,
            total_retransmissions: 0,
            window_size: 1,
            syn_sent: false,
            fin_sent: false,
        }
    }

    /// Fill the peer's window from the outbound stream. A zero window is
    /// treated as one so a probe eventually draws out a window update.
    pub fn push(&mut self, mut transmit: impl FnMut(&TcpSegment)) {
        loop {
            let effective_window = if self.window_size == 0 {
                1
            } else {
                u64::from(self.window_size)
            };
            if effective_window <= self.total_outstanding || self.fin_sent {
                break;
            }

            let mut seg = self.make_empty_segment();
            if !self.syn_sent {
                seg.flags.insert(SegFlags::SYN);
                self.syn_sent = true;
            }

            let remaining = effective_window - self.total_outstanding;
            let len = MAX_PAYLOAD_SIZE.min((remaining - seg.sequence_length()) as usize);
            while self.input.bytes_buffered() > 0 && seg.payload.len() < len {
                let take = (len - seg.payload.len()).min(self.input.peek().len());
                seg.payload.extend_from_slice(&self.input.peek()[..take]);
                self.input.pop(take);
            }

            if remaining > seg.sequence_length() && self.input.is_finished() {
                seg.flags.insert(SegFlags::FIN);
                self.fin_sent = true;
            }

            if seg.sequence_length() == 0 {
                break;
            }

            transmit(&seg);
            if !self.timer.is_active() {
                self.timer.start();
            }
            self.next_abs_seqno += seg.sequence_length();
            self.total_outstanding += seg.sequence_length();
            self.outstanding.push_back(seg);
        }
    }

    /// A zero-length segment carrying the current seqno; gives ACKs and
    /// window probes a vehicle.
    pub fn make_empty_segment(&self) -> TcpSegment {
        let mut flags = SegFlags::empty();
        if self.input.has_error() {
            flags.insert(SegFlags::RST);
        }
        TcpSegment {
            seqno: SeqNo::wrap(self.next_abs_seqno, self.isn),
            flags,
            payload: Vec::new(),
        }
    }

    /// Process the peer's acknowledgment: adopt the window, retire fully
    /// acknowledged segments, and rewind the retransmission state.
    pub fn receive(&mut self, ack: &TcpAck) {
        if self.input.has_error() {
            return;
        }
        if ack.rst {
            self.input.set_error();
            return;
        }

        self.window_size = ack.window_size;
        let Some(ackno) = ack.ackno else {
            return;
        };

        let recv_ack_abs = ackno.unwrap(self.isn, self.next_abs_seqno);
        if recv_ack_abs > self.next_abs_seqno {
            return; // acks sequence space we never sent
        }

        let mut acked = false;
        while let Some(seg) = self.outstanding.front() {
            let len = seg.sequence_length();
            if self.ack_abs_seqno + len > recv_ack_abs {
                break;
            }
            acked = true;
            self.ack_abs_seqno += len;
            self.total_outstanding -= len;
            self.outstanding.pop_front();
        }

        if acked {
            self.total_retransmissions = 0;
            self.timer.reload(self.initial_rto_ms);
            if self.outstanding.is_empty() {
                self.timer.stop();
            } else {
                self.timer.start();
            }
        }
    }

    /// Report elapsed time. On expiry, retransmit the oldest outstanding
    /// segment; the timeout doubles only when the peer's window is open
    /// (a closed window makes this a probe, not a loss signal).
    pub fn tick(&mut self, ms: u64, mut transmit: impl FnMut(&TcpSegment)) {
        if !self.timer.tick(ms).is_expired() {
            return;
        }
        let Some(oldest) = self.outstanding.front() else {
            return;
        };
        trace!(
            "retransmitting seqno {} ({} bytes in flight)",
            oldest.seqno.raw(),
            self.total_outstanding
        );
        transmit(oldest);
        if self.window_size != 0 {
            self.total_retransmissions += 1;
            self.timer.backoff();
        }
        self.timer.reset();
    }

    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.total_outstanding
    }

    pub fn consecutive_retransmissions(&self) -> u64 {
        self.total_retransmissions
    }

    pub fn isn(&self) -> SeqNo {
        self.isn
    }

    pub fn input(&self) -> &ByteStream {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut ByteStream {
        &mut self.input
    }
}
