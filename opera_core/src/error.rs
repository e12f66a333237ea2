// SPDX-License-Identifier: GPL-3.0
// error.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use thiserror::Error;

/// Result type used by the fallible XBUS operations.
pub type Result<T> = std::result::Result<T, XbusError>;

/// This enum represents everything that can go wrong on the XBUS. Register-level
/// accesses never fail; only slot management and snapshots can.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum XbusError {
    #[error("all 16 XBUS slots are occupied")]
    Capacity,

    #[error("devices cannot be attached while emulation is running")]
    SlotTableSealed,

    #[error("XBUS slot {0} does not exist")]
    InvalidSlot(usize),

    #[error("XBUS slot {0} has no device attached")]
    EmptySlot(usize),

    #[error("snapshot size mismatch (expected {expected} bytes, found {found} bytes)")]
    SnapshotSizeMismatch { expected: usize, found: usize },

    #[error("invalid snapshot magic")]
    InvalidMagic,

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("corrupt snapshot: {0}")]
    Corrupt(&'static str),
}
