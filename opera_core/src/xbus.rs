// SPDX-License-Identifier: GPL-3.0
// xbus.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::path::Path;

/// This module contains the default XBUS implementation, modelled on the
/// expansion bus of the Clio I/O chip. There may be others in future.
pub mod clio_xbus;

/// This module contains a register-storing stand-in device, useful wherever
/// a real accessory isn't available.
pub mod stub_xbus_device;

/// The number of addressable device slots on the bus.
pub const SLOT_COUNT: usize = 16;

/// The selector value addressing the builtin pseudo-device.
pub const BUILTIN_SELECTOR: u8 = 0xF;

/// The poll value returned when nothing answers on the selected slot.
pub const IDLE_POLL: u32 = 0x30;

/// Auxiliary selector flag requesting the legacy (low nibble only) poll view.
pub const AUX_LEGACY_POLL: u8 = 0x80;

// Poll register bits. The low nibble holds the interrupt masks, the high
// nibble the matching condition flags.
pub const POLL_STATUS_MASK: u8 = 0x01;
pub const POLL_DATA_MASK: u8 = 0x02;
pub const POLL_MA_MASK: u8 = 0x04;
pub const POLL_RE_MASK: u8 = 0x08;
pub const POLL_STATUS_READY: u8 = 0x10;
pub const POLL_DATA_READY: u8 = 0x20;
pub const POLL_MA: u8 = 0x40;
pub const POLL_RE: u8 = 0x80;

/// Returns true if a poll byte satisfies the XBUS interrupt-arming rule: status
/// ready with its mask enabled, or data ready with its mask enabled. Devices
/// should use this to answer `XbusRequest::FiqQuery` consistently with the
/// builtin pseudo-device.
pub fn fiq_armed(poll: u8) -> bool {

    let status_armed = poll & POLL_STATUS_READY != 0 && poll & POLL_STATUS_MASK != 0;
    let data_armed = poll & POLL_DATA_READY != 0 && poll & POLL_DATA_MASK != 0;
    status_armed || data_armed
}

/// This enum is the closed set of directives the bus can send to a device.
/// Payloads are typed per directive, rather than squeezed into one word.
#[derive(Debug)]
pub enum XbusRequest<'a> {

    /// Sent once, straight after the device is attached.
    Init,

    /// Resets the device, optionally loading new media from the given path.
    /// Also sent on snapshot load when the device had no saved payload.
    Reset(Option<&'a Path>),

    /// Sent once at shutdown, just before the device is dropped.
    Destroy,

    SetCommand(u8),
    GetData,
    SetData(u32),
    GetPoll,
    SetPoll(u32),
    GetStatus,

    /// Device-defined; the bus passes the result through untouched.
    Reserve,

    /// Devices must answer non-zero if they want the FIQ raised.
    FiqQuery,

    /// Devices must answer with the exact size in bytes of their save payload.
    GetSaveSize,

    /// The slice is exactly as long as the size the device reported.
    GetSaveData(&'a mut [u8]),

    /// The slice is exactly as long as the size the device reports now.
    SetSaveData(&'a [u8]),
}

/// This trait provides an implementation-opaque way for the bus to talk to
/// whatever accessory is plugged into one of its slots. There is a single
/// entry point, and every directive returns a word.
pub trait XbusDevice {

    /// Implementations must handle the request and return a result word. Requests
    /// with no meaningful result should return 0.
    fn dispatch(&mut self, request: XbusRequest<'_>) -> u32;
}

/// This trait provides an implementation-opaque way of calling XBUS register
/// methods from the memory-mapped I/O layer.
pub trait Xbus {

    /// This must be called when the XBUS select register is written.
    fn write_select(&mut self, value: u32);

    /// This must be called when the command FIFO register is written.
    fn write_command(&mut self, value: u32);

    /// This must be called when the data FIFO register is read.
    fn read_data(&mut self) -> u32;

    /// This must be called when the data FIFO register is written.
    fn write_data(&mut self, value: u32);

    /// This must be called when the poll register is read.
    fn read_poll(&mut self) -> u32;

    /// This must be called when the poll register is written.
    fn write_poll(&mut self, value: u32);

    /// This must be called when the status FIFO register is read.
    fn read_status(&mut self) -> u32;

    /// This must be called when the reserved register is read.
    fn read_reserve(&mut self) -> u32;
}
