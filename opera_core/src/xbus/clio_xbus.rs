// SPDX-License-Identifier: GPL-3.0
// clio_xbus.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::path::Path;

use log::{debug, trace};
use opera_utility::CustomNibbles;

use super::{
    AUX_LEGACY_POLL, BUILTIN_SELECTOR, IDLE_POLL, POLL_STATUS_READY, SLOT_COUNT,
    Xbus, XbusDevice, XbusRequest, fiq_armed,
};
use crate::{
    error::{Result, XbusError},
    interrupts::{InterruptController, XBUS_FIQ_LINE, XBUS_FIQ_SUBCODE},
};
use builtin::{BuiltinCommand, COMMAND_BYTES};
use slot_table::SlotTable;

/// This module contains the builtin pseudo-device's command register and
/// command decoder.
mod builtin;

/// This module contains the builtin pseudo-device's status FIFO.
mod status_fifo;

/// This module contains the bus controller's own register state, and its
/// fixed-size snapshot encoding.
mod bus_state;

/// This module contains the table of attached devices.
mod slot_table;

/// This module contains snapshot save and load for the bus and its devices.
mod save_state;

pub use builtin::{CommandRegister, IDENTIFY_RESPONSE};
pub use bus_state::{BUS_STATE_BYTES, BusState};
pub use save_state::{OFFSET_TABLE_BYTES, SNAPSHOT_HEADER_BYTES, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
pub use status_fifo::{STATUS_FIFO_BYTES, StatusFifo};

/// This struct models the expansion bus of the Clio I/O chip: sixteen device
/// slots behind one select register, plus the builtin pseudo-device on
/// selector 0xF.
pub struct ClioXbus<I: InterruptController> {

    // Bus controller registers and builtin pseudo-device state.
    state: BusState,

    // Attached devices.
    slots: SlotTable,

    // Where FIQs get delivered.
    interrupt_controller: I,
}

/// Implementation functions for the XBUS component itself.
impl<I: InterruptController> ClioXbus<I> {

    /// Creates a new XBUS object with the correct initial state, the mandatory
    /// device already attached to slot 0.
    pub fn new(zero_device: Box<dyn XbusDevice>, interrupt_controller: I) -> Self {
        ClioXbus {

            // Setup power-on register state.
            state: BusState::new(),

            // Setup slot table, initialising the zero device.
            slots: SlotTable::new(zero_device),

            // Store the FIQ destination.
            interrupt_controller,
        }
    }

    /// Attaches a device to the first free slot, returning its index.
    pub fn attach(&mut self, device: Box<dyn XbusDevice>) -> Result<usize> {
        self.slots.attach(device)
    }

    /// Destroys every attached device and empties the table.
    pub fn detach_all(&mut self) {
        self.slots.detach_all();
    }

    /// Resets the device in the given slot with new media loaded from `path`.
    pub fn device_load(&mut self, slot: usize, path: &Path) -> Result<()> {

        let device = self.occupied_device(slot)?;
        device.dispatch(XbusRequest::Reset(Some(path)));
        debug!("Loaded {} into XBUS slot {slot}", path.display());

        Ok(())
    }

    /// Resets the device in the given slot with no media.
    pub fn device_eject(&mut self, slot: usize) -> Result<()> {

        let device = self.occupied_device(slot)?;
        device.dispatch(XbusRequest::Reset(None));
        debug!("Ejected media from XBUS slot {slot}");

        Ok(())
    }

    /// Marks the start of emulation; attaching devices is refused until
    /// `stop_running` is called.
    pub fn start_running(&mut self) {
        self.slots.set_sealed(true);
        debug!("XBUS slot table sealed");
    }

    /// Marks the end of emulation, allowing devices to be attached again.
    pub fn stop_running(&mut self) {
        self.slots.set_sealed(false);
        debug!("XBUS slot table unsealed");
    }

    pub fn is_running(&self) -> bool {
        self.slots.is_sealed()
    }

    pub fn is_occupied(&self, slot: usize) -> bool {
        self.slots.is_occupied(slot)
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.occupied_count()
    }

    pub fn bus_state(&self) -> &BusState {
        &self.state
    }

    pub fn selected_slot(&self) -> u8 {
        self.state.selected
    }

    pub fn aux_flags(&self) -> u8 {
        self.state.aux_flags
    }

    pub fn interrupt_controller(&self) -> &I {
        &self.interrupt_controller
    }

    pub fn interrupt_controller_mut(&mut self) -> &mut I {
        &mut self.interrupt_controller
    }

    /// Handles a write to the select register: the low nibble picks the slot,
    /// the high nibble is kept separately as auxiliary flags.
    pub fn select(&mut self, value: u32) {

        let value = value as u8;
        self.state.selected = value.low_nibble();
        self.state.aux_flags = value.high_nibble();
    }

    /// Handles a write to the command FIFO.
    pub fn set_command_byte(&mut self, value: u32) {

        if let Some(device) = self.selected_device() {
            device.dispatch(XbusRequest::SetCommand(value as u8));
            self.raise_fiq_if_device_pending();
        } else if self.state.selected == BUILTIN_SELECTOR {
            if let Some(command) = self.state.command.push(value as u8) {
                self.execute_builtin_command(command);
            }
        }
    }

    /// Handles a read from the data FIFO.
    pub fn get_data(&mut self) -> u32 {
        match self.selected_device() {
            Some(device) => device.dispatch(XbusRequest::GetData),
            None => 0,
        }
    }

    /// Handles a write to the data FIFO.
    pub fn set_data(&mut self, value: u32) {
        if let Some(device) = self.selected_device() {
            device.dispatch(XbusRequest::SetData(value));
        }
    }

    /// Handles a read from the reserved register.
    pub fn get_reserve(&mut self) -> u32 {
        match self.selected_device() {
            Some(device) => device.dispatch(XbusRequest::Reserve),
            None => 0,
        }
    }

    /// Handles a read from the poll register.
    pub fn get_poll(&mut self) -> u32 {

        let poll = if self.state.selected == BUILTIN_SELECTOR {
            self.state.builtin_poll() as u32
        } else if let Some(device) = self.selected_device() {
            device.dispatch(XbusRequest::GetPoll)
        } else {
            IDLE_POLL
        };

        if self.state.aux_flags & AUX_LEGACY_POLL != 0 {
            poll & 0xF
        } else {
            poll
        }
    }

    /// Handles a write to the poll register. The builtin pseudo-device and a
    /// device in slot 15 both see writes made with selector 0xF.
    pub fn set_poll(&mut self, value: u32) {

        if self.state.selected == BUILTIN_SELECTOR {
            self.state.poll = self.state.poll.merge_low_nibble(value as u8);
        }

        if let Some(device) = self.selected_device() {
            device.dispatch(XbusRequest::SetPoll(value));
            self.raise_fiq_if_device_pending();
        }
    }

    /// Handles a read from the status FIFO.
    pub fn get_status(&mut self) -> u32 {

        if let Some(device) = self.selected_device() {
            return device.dispatch(XbusRequest::GetStatus);
        }

        if self.state.selected != BUILTIN_SELECTOR {
            return 0;
        }

        match self.state.status_fifo.pop() {
            Some(value) => {
                if self.state.status_fifo.is_empty() {
                    self.state.device_poll &= !POLL_STATUS_READY;
                }
                value as u32
            },
            None => 0,
        }
    }

    /// Runs a completed builtin command, then re-evaluates the builtin
    /// interrupt condition.
    fn execute_builtin_command(&mut self, command: [u8; COMMAND_BYTES]) {

        match BuiltinCommand::decode(&command) {
            Some(builtin_command) => {
                trace!("Executing builtin XBUS command {builtin_command:?}");
                self.state.status_fifo.replace(builtin_command.response());
                self.state.device_poll |= POLL_STATUS_READY;
            },
            None => trace!("Ignoring builtin XBUS command {:#04X}", command[0]),
        }

        if fiq_armed(self.state.builtin_poll()) {
            self.raise_fiq();
        }
    }

    /// Returns the device in the currently selected slot, if any.
    fn selected_device(&mut self) -> Option<&mut (dyn XbusDevice + 'static)> {
        self.slots.device_mut(self.state.selected as usize)
    }

    /// Returns the device in the given slot, or why there isn't one.
    fn occupied_device(&mut self, slot: usize) -> Result<&mut (dyn XbusDevice + 'static)> {

        if slot >= SLOT_COUNT {
            return Err(XbusError::InvalidSlot(slot));
        }
        self.slots.device_mut(slot).ok_or(XbusError::EmptySlot(slot))
    }

    /// Asks the selected device whether it wants the FIQ, raising it if so.
    fn raise_fiq_if_device_pending(&mut self) {

        let pending = self.selected_device()
            .is_some_and(|device| device.dispatch(XbusRequest::FiqQuery) != 0);
        if pending {
            self.raise_fiq();
        }
    }

    fn raise_fiq(&mut self) {
        trace!("Raising XBUS FIQ");
        self.interrupt_controller.raise(XBUS_FIQ_LINE, XBUS_FIQ_SUBCODE);
    }
}

/// Implementation functions to be called from anything that understands what
/// an Xbus object is.
impl<I: InterruptController> Xbus for ClioXbus<I> {

    fn write_select(&mut self, value: u32) {
        self.select(value);
    }

    fn write_command(&mut self, value: u32) {
        self.set_command_byte(value);
    }

    fn read_data(&mut self) -> u32 {
        self.get_data()
    }

    fn write_data(&mut self, value: u32) {
        self.set_data(value);
    }

    fn read_poll(&mut self) -> u32 {
        self.get_poll()
    }

    fn write_poll(&mut self, value: u32) {
        self.set_poll(value);
    }

    fn read_status(&mut self) -> u32 {
        self.get_status()
    }

    fn read_reserve(&mut self) -> u32 {
        self.get_reserve()
    }
}
