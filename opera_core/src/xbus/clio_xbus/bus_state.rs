// SPDX-License-Identifier: GPL-3.0
// bus_state.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use opera_utility::CustomNibbles;

use super::{
    builtin::{COMMAND_BYTES, CommandRegister},
    status_fifo::{STATUS_FIFO_BYTES, StatusFifo},
};
use crate::{
    error::{Result, XbusError},
    xbus::{BUILTIN_SELECTOR, POLL_STATUS_READY},
};

// Byte positions within the fixed snapshot section.
const SELECTED_POS: usize = 0;
const AUX_FLAGS_POS: usize = 1;
const POLL_POS: usize = 2;
const DEVICE_POLL_POS: usize = 3;
const FIFO_POS: usize = 4;
const FIFO_LEN_POS: usize = FIFO_POS + STATUS_FIFO_BYTES;
const COMMAND_POS: usize = FIFO_LEN_POS + 1;
const COMMAND_CURSOR_POS: usize = COMMAND_POS + COMMAND_BYTES;

/// The size of the fixed bus state section of a snapshot.
pub const BUS_STATE_BYTES: usize = COMMAND_CURSOR_POS + 1;

/// The value the builtin poll register powers up with: every interrupt mask on.
const INITIAL_POLL: u8 = 0x0F;

/// This struct holds the bus controller's own registers, along with the state
/// of the builtin pseudo-device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusState {

    // Select register, split into the slot index and the auxiliary flags.
    pub(super) selected: u8,
    pub(super) aux_flags: u8,

    // Builtin poll register (mask nibble) and builtin condition flags
    // (high nibble).
    pub(super) poll: u8,
    pub(super) device_poll: u8,

    // Builtin pseudo-device queues.
    pub(super) status_fifo: StatusFifo,
    pub(super) command: CommandRegister,
}

impl BusState {

    /// Creates a new bus state with the correct power-on values.
    pub fn new() -> Self {
        BusState {

            // Select slot 0 with no auxiliary flags.
            selected: 0,
            aux_flags: 0,

            // Setup poll bytes with every mask on and no conditions pending.
            poll: INITIAL_POLL,
            device_poll: 0,

            // Setup empty builtin queues.
            status_fifo: StatusFifo::new(),
            command: CommandRegister::new(),
        }
    }

    /// The builtin poll byte as the host sees it: condition flags from the
    /// device side, interrupt masks from the host side.
    pub fn builtin_poll(&self) -> u8 {
        self.device_poll.high_nibble() | self.poll.low_nibble()
    }

    pub fn selected(&self) -> u8 {
        self.selected
    }

    pub fn aux_flags(&self) -> u8 {
        self.aux_flags
    }

    pub fn status_fifo(&self) -> &StatusFifo {
        &self.status_fifo
    }

    pub fn command(&self) -> &CommandRegister {
        &self.command
    }

    /// Writes the fixed snapshot section.
    pub fn write_to(&self, out: &mut [u8; BUS_STATE_BYTES]) {

        out[SELECTED_POS] = self.selected;
        out[AUX_FLAGS_POS] = self.aux_flags;
        out[POLL_POS] = self.poll;
        out[DEVICE_POLL_POS] = self.device_poll;
        out[FIFO_POS..FIFO_LEN_POS].copy_from_slice(self.status_fifo.raw_bytes());
        out[FIFO_LEN_POS] = self.status_fifo.len() as u8;
        out[COMMAND_POS..COMMAND_CURSOR_POS].copy_from_slice(self.command.bytes());
        out[COMMAND_CURSOR_POS] = self.command.cursor();
    }

    /// Reads the fixed snapshot section, rejecting register values the bus could
    /// never have produced itself.
    pub fn read_from(input: &[u8; BUS_STATE_BYTES]) -> Result<Self> {

        let selected = input[SELECTED_POS];
        if selected > BUILTIN_SELECTOR {
            return Err(XbusError::Corrupt("selected slot out of range"));
        }

        let aux_flags = input[AUX_FLAGS_POS];
        if aux_flags.low_nibble() != 0 {
            return Err(XbusError::Corrupt("auxiliary selector flags overlap slot index"));
        }

        // Draining the FIFO is the only way to clear status ready, so it can
        // never be set while the FIFO is empty.
        let device_poll = input[DEVICE_POLL_POS];
        let fifo_len = input[FIFO_LEN_POS];
        if device_poll & POLL_STATUS_READY != 0 && fifo_len == 0 {
            return Err(XbusError::Corrupt("status ready with empty status FIFO"));
        }

        let mut fifo_bytes = [0; STATUS_FIFO_BYTES];
        fifo_bytes.copy_from_slice(&input[FIFO_POS..FIFO_LEN_POS]);

        let mut command_bytes = [0; COMMAND_BYTES];
        command_bytes.copy_from_slice(&input[COMMAND_POS..COMMAND_CURSOR_POS]);
        let command = CommandRegister::from_parts(command_bytes, input[COMMAND_CURSOR_POS])
            .ok_or(XbusError::Corrupt("command cursor out of range"))?;

        Ok(BusState {
            selected,
            aux_flags,
            poll: input[POLL_POS],
            device_poll,
            status_fifo: StatusFifo::from_parts(fifo_bytes, fifo_len),
            command,
        })
    }
}
