// SPDX-License-Identifier: GPL-3.0
// slot_table.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use log::debug;

use crate::{
    error::{Result, XbusError},
    xbus::{SLOT_COUNT, XbusDevice, XbusRequest},
};

/// This struct owns the devices plugged into the bus. A device keeps its slot
/// index for as long as it is attached; nothing is ever compacted.
pub struct SlotTable {

    // One optional device per addressable slot.
    slots: [Option<Box<dyn XbusDevice>>; SLOT_COUNT],

    // Set while emulation is running, to stop devices being swapped mid-frame.
    sealed: bool,
}

impl SlotTable {

    /// Creates a new slot table with the mandatory device in slot 0.
    pub fn new(mut zero_device: Box<dyn XbusDevice>) -> Self {

        zero_device.dispatch(XbusRequest::Init);
        debug!("Attached XBUS device to slot 0");

        let mut slots: [Option<Box<dyn XbusDevice>>; SLOT_COUNT] = std::array::from_fn(|_| None);
        slots[0] = Some(zero_device);

        SlotTable {

            // Setup slots with only the zero device present.
            slots,

            // Attaching is allowed until emulation starts.
            sealed: false,
        }
    }

    /// Places the device in the first free slot, initialises it and returns its
    /// index. The table is left untouched on failure.
    pub fn attach(&mut self, device: Box<dyn XbusDevice>) -> Result<usize> {

        if self.sealed {
            return Err(XbusError::SlotTableSealed);
        }

        let index = self.slots
            .iter()
            .position(Option::is_none)
            .ok_or(XbusError::Capacity)?;

        self.slots[index]
            .insert(device)
            .dispatch(XbusRequest::Init);
        debug!("Attached XBUS device to slot {index}");

        Ok(index)
    }

    /// Destroys and drops every attached device. Only meant for shutdown.
    pub fn detach_all(&mut self) {

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(mut device) = slot.take() {
                device.dispatch(XbusRequest::Destroy);
                debug!("Detached XBUS device from slot {index}");
            }
        }
    }

    /// Returns the device in the given slot, if there is one.
    pub fn device_mut(&mut self, index: usize) -> Option<&mut (dyn XbusDevice + 'static)> {
        self.slots.get_mut(index)?.as_deref_mut()
    }

    /// Walks all slots in table order, empty ones included.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, Option<&mut (dyn XbusDevice + 'static)>)> {
        self.slots
            .iter_mut()
            .enumerate()
            .map(|(index, slot)| (index, slot.as_deref_mut()))
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn set_sealed(&mut self, sealed: bool) {
        self.sealed = sealed;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}
