// SPDX-License-Identifier: GPL-3.0
// status_fifo.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

/// The capacity of the builtin status FIFO.
pub const STATUS_FIFO_BYTES: usize = 255;

/// This struct models the builtin pseudo-device's status FIFO. Stale bytes past
/// the current length are kept, as they are part of the saved state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusFifo {
    bytes: [u8; STATUS_FIFO_BYTES],
    len: u8,
}

impl StatusFifo {

    /// Creates a new empty status FIFO.
    pub fn new() -> Self {
        StatusFifo {

            // Zero out the backing store and mark the queue empty.
            bytes: [0; STATUS_FIFO_BYTES],
            len: 0,
        }
    }

    /// Rebuilds a status FIFO from saved parts. A `u8` length can never exceed
    /// the capacity.
    pub fn from_parts(bytes: [u8; STATUS_FIFO_BYTES], len: u8) -> Self {
        StatusFifo { bytes, len }
    }

    /// Replaces the queue contents with a new response, truncated to capacity.
    pub fn replace(&mut self, response: &[u8]) {

        let len = response.len().min(STATUS_FIFO_BYTES);
        self.bytes[..len].copy_from_slice(&response[..len]);
        self.len = len as u8;
    }

    /// Removes and returns the oldest byte, shifting the rest down.
    pub fn pop(&mut self) -> Option<u8> {

        if self.len == 0 {
            return None;
        }

        let len = self.len as usize;
        let value = self.bytes[0];
        self.bytes.copy_within(1..len, 0);
        self.len -= 1;

        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The queued bytes, oldest first.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The whole backing store, stale bytes included.
    pub fn raw_bytes(&self) -> &[u8; STATUS_FIFO_BYTES] {
        &self.bytes
    }
}
