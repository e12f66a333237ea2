// SPDX-License-Identifier: GPL-3.0
// stub_xbus_device.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    collections::VecDeque,
    path::PathBuf,
};

use log::debug;
use opera_utility::{CustomByteSlice, CustomNibbles};

use super::{
    POLL_DATA_READY, POLL_STATUS_READY, XbusDevice, XbusRequest, fiq_armed,
};

/// How many status bytes the stub device will hold before dropping new ones.
const STATUS_QUEUE_BYTES: usize = 16;

/// The size of the stub device's save payload: data word, reserve word, poll
/// byte, queue length and the queue itself.
pub const STUB_SAVE_BYTES: usize = 4 + 4 + 1 + 1 + STATUS_QUEUE_BYTES;

/// The poll value the stub device resets to: every interrupt mask on.
const INITIAL_POLL: u8 = 0x0F;

/// This struct models an XBUS accessory, and at present is a stub. It stores
/// whatever the bus writes to it, echoes command bytes back on its status
/// queue, and raises the FIQ using the same arming rule as the builtin
/// pseudo-device.
pub struct StubXbusDevice {

    // Registers as seen from the bus.
    data: u32,
    reserve: u32,
    poll: u8,

    // Command bytes echoed back for the host to read.
    status_queue: VecDeque<u8>,

    // Whatever media was last loaded.
    media: Option<PathBuf>,
}

/// Implementation functions for the stub device itself.
impl StubXbusDevice {

    /// Creates a new stub device which answers reserve reads with `reserve`.
    pub fn new(reserve: u32) -> Self {
        StubXbusDevice {

            // Setup registers.
            data: 0,
            reserve,
            poll: INITIAL_POLL,

            // Setup empty status queue.
            status_queue: VecDeque::with_capacity(STATUS_QUEUE_BYTES),

            // No media until a reset supplies some.
            media: None,
        }
    }

    pub fn media(&self) -> Option<&PathBuf> {
        self.media.as_ref()
    }

    /// Clears the registers, keeping the reserve word.
    fn reset(&mut self) {
        self.data = 0;
        self.poll = INITIAL_POLL;
        self.status_queue.clear();
    }

    fn write_save_data(&self, out: &mut [u8]) {

        if out.len() != STUB_SAVE_BYTES {
            debug!("Stub XBUS device refusing {} byte save buffer", out.len());
            return;
        }

        out.write_u32_le(0, self.data);
        out.write_u32_le(4, self.reserve);
        out[8] = self.poll;
        out[9] = self.status_queue.len() as u8;
        for (slot, value) in out[10..].iter_mut().zip(self.status_queue.iter()) {
            *slot = *value;
        }
    }

    fn read_save_data(&mut self, input: &[u8]) {

        if input.len() != STUB_SAVE_BYTES {
            debug!("Stub XBUS device ignoring {} byte save payload", input.len());
            return;
        }

        self.data = input.read_u32_le(0).unwrap_or_default();
        self.reserve = input.read_u32_le(4).unwrap_or_default();
        self.poll = input[8];
        let len = (input[9] as usize).min(STATUS_QUEUE_BYTES);
        self.status_queue = input[10..10 + len].iter().copied().collect();
    }
}

/// Implementation functions to be called from anything that understands what
/// an XbusDevice object is.
impl XbusDevice for StubXbusDevice {

    /// Handle a directive from the bus.
    fn dispatch(&mut self, request: XbusRequest<'_>) -> u32 {

        match request {

            XbusRequest::Init | XbusRequest::Destroy => {
                self.reset();
                self.media = None;
                0
            },

            XbusRequest::Reset(path) => {
                self.reset();
                self.media = path.map(PathBuf::from);
                0
            },

            XbusRequest::SetCommand(value) => {
                if self.status_queue.len() < STATUS_QUEUE_BYTES {
                    self.status_queue.push_back(value);
                }
                self.poll |= POLL_STATUS_READY;
                0
            },

            XbusRequest::GetStatus => {
                let value = self.status_queue.pop_front().unwrap_or(0);
                if self.status_queue.is_empty() {
                    self.poll &= !POLL_STATUS_READY;
                }
                value as u32
            },

            XbusRequest::SetData(value) => {
                self.data = value;
                self.poll |= POLL_DATA_READY;
                0
            },

            XbusRequest::GetData => {
                self.poll &= !POLL_DATA_READY;
                self.data
            },

            XbusRequest::GetPoll => self.poll as u32,

            XbusRequest::SetPoll(value) => {
                self.poll = self.poll.merge_low_nibble(value as u8);
                0
            },

            XbusRequest::Reserve => self.reserve,

            XbusRequest::FiqQuery => fiq_armed(self.poll) as u32,

            XbusRequest::GetSaveSize => STUB_SAVE_BYTES as u32,

            XbusRequest::GetSaveData(out) => {
                self.write_save_data(out);
                0
            },

            XbusRequest::SetSaveData(input) => {
                self.read_save_data(input);
                0
            },
        }
    }
}
