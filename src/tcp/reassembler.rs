//! Accepts substrings of a stream at arbitrary offsets — out of order,
//! overlapping, duplicated — and writes them into the owned byte stream in
//! order. Pending bytes live only inside the window the stream's remaining
//! capacity allows; everything else is dropped and must be resent.

use std::collections::BTreeMap;

use super::stream::ByteStream;

#[derive(Debug)]
pub struct Reassembler {
    output: ByteStream,
    // pending substrings keyed by stream offset; entries never overlap
    pending: BTreeMap<u64, Vec<u8>>,
    total_pending: u64,
    end_index: Option<u64>,
}

impl Reassembler {
    pub fn new(output: ByteStream) -> Self {
        Self {
            output,
            pending: BTreeMap::new(),
            total_pending: 0,
            end_index: None,
        }
    }

    /// Place `data` at absolute stream offset `first_index`. `is_last`
    /// marks the byte after `data` as EOF.
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last: bool) {
        if data.is_empty() {
            if is_last && self.end_index.is_none() {
                self.end_index = Some(first_index);
            }
            return self.try_close();
        }

        if self.output.is_closed() || self.output.available_capacity() == 0 {
            return;
        }

        let unassembled = self.output.bytes_pushed();
        let unacceptable = unassembled + self.output.available_capacity() as u64;

        let mut first_index = first_index;
        let mut is_last = is_last;
        let mut data = data;

        if first_index + data.len() as u64 <= unassembled || first_index >= unacceptable {
            return;
        }

        // clip on the right to fit the window; the true end now lies beyond
        // it and will be delivered again
        if first_index + data.len() as u64 > unacceptable {
            data = &data[..(unacceptable - first_index) as usize];
            is_last = false;
        }

        // drop any prefix that is already assembled
        if first_index < unassembled {
            data = &data[(unassembled - first_index) as usize..];
            first_index = unassembled;
        }

        if is_last && self.end_index.is_none() {
            self.end_index = Some(first_index + data.len() as u64);
        }

        self.splice(first_index, data.to_vec());

        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() != self.output.bytes_pushed() {
                break;
            }
            let payload = entry.remove();
            self.total_pending -= payload.len() as u64;
            self.output.push(&payload);
        }

        self.try_close();
    }

    pub fn bytes_pending(&self) -> u64 {
        self.total_pending
    }

    pub fn output(&self) -> &ByteStream {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }

    /// Replace whatever overlaps `[first_index, first_index + len)` with
    /// `data`, preserving pending bytes outside that interval.
    fn splice(&mut self, first_index: u64, data: Vec<u8>) {
        let end = first_index + data.len() as u64;
        self.split(end);
        self.split(first_index);

        let doomed: Vec<u64> = self.pending.range(first_index..end).map(|(&k, _)| k).collect();
        for key in doomed {
            if let Some(old) = self.pending.remove(&key) {
                self.total_pending -= old.len() as u64;
            }
        }

        self.total_pending += data.len() as u64;
        self.pending.insert(first_index, data);
    }

    /// Cut the pending entry that straddles `pos`, if any, so that no entry
    /// crosses it.
    fn split(&mut self, pos: u64) {
        let Some((&start, chunk)) = self.pending.range_mut(..pos).next_back() else {
            return;
        };
        if start + chunk.len() as u64 > pos {
            let tail = chunk.split_off((pos - start) as usize);
            self.pending.insert(pos, tail);
        }
    }

    fn try_close(&mut self) {
        if self.end_index == Some(self.output.bytes_pushed()) {
            self.output.close();
        }
    }
}
