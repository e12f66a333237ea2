// SPDX-License-Identifier: GPL-3.0
// interrupts.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

/// The interrupt controller line the XBUS raises its FIQ on.
pub const XBUS_FIQ_LINE: u32 = 4;

/// The sub-code passed alongside an XBUS FIQ.
pub const XBUS_FIQ_SUBCODE: u32 = 0;

/// This trait provides an implementation-opaque way for the XBUS to raise
/// interrupts on the CPU's interrupt controller. Delivery is synchronous: the
/// call happens on the same stack as the register access that caused it.
pub trait InterruptController {

    /// Implementations must latch an interrupt on the given line with the given
    /// sub-code. This is fire-and-forget from the caller's point of view.
    fn raise(&mut self, line: u32, subcode: u32);
}
