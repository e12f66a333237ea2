// SPDX-License-Identifier: GPL-3.0
// save_state.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

// Snapshot layout. The tagged form is an 8 byte header followed by the legacy
// body, which is:
//
//   fixed bus state section (BUS_STATE_BYTES)
//   one little-endian u32 offset per slot (0 = no payload)
//   device payloads, in slot order
//
// Offsets count from the start of the legacy body, so the body of a tagged
// snapshot is itself a valid legacy snapshot.

use std::ops::Range;

use log::{debug, warn};
use opera_utility::CustomByteSlice;

use super::{
    ClioXbus,
    bus_state::{BUS_STATE_BYTES, BusState},
};
use crate::{
    error::{Result, XbusError},
    interrupts::InterruptController,
    xbus::{SLOT_COUNT, XbusRequest},
};

/// The size of the per-slot offset table.
pub const OFFSET_TABLE_BYTES: usize = SLOT_COUNT * 4;

/// Magic bytes at the start of a tagged snapshot.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"XBUS";

/// The current tagged snapshot version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The size of the tagged snapshot header.
pub const SNAPSHOT_HEADER_BYTES: usize = 8;

/// Where the first device payload may start within a legacy body.
const PAYLOAD_START: usize = BUS_STATE_BYTES + OFFSET_TABLE_BYTES;

impl<I: InterruptController> ClioXbus<I> {

    /// Returns the exact size of a tagged snapshot of the bus as it stands.
    pub fn compute_size(&mut self) -> usize {
        SNAPSHOT_HEADER_BYTES + self.compute_legacy_size()
    }

    /// Returns the exact size of an untagged snapshot of the bus as it stands.
    pub fn compute_legacy_size(&mut self) -> usize {

        let payload_bytes: usize = self.slots
            .iter_mut()
            .filter_map(|(_, device)| device)
            .map(|device| device.dispatch(XbusRequest::GetSaveSize) as usize)
            .sum();

        PAYLOAD_START + payload_bytes
    }

    /// Saves a tagged snapshot into a buffer of exactly `compute_size()` bytes.
    pub fn save(&mut self, buffer: &mut [u8]) -> Result<()> {

        check_size(self.compute_size(), buffer.len())?;

        let (header, body) = buffer.split_at_mut(SNAPSHOT_HEADER_BYTES);
        header[..4].copy_from_slice(SNAPSHOT_MAGIC);
        header.write_u32_le(4, SNAPSHOT_VERSION)
            .ok_or(XbusError::Corrupt("snapshot header truncated"))?;

        self.save_legacy(body)
    }

    /// Saves a tagged snapshot into a newly allocated buffer.
    pub fn save_to_vec(&mut self) -> Result<Vec<u8>> {

        let mut buffer = vec![0; self.compute_size()];
        self.save(&mut buffer)?;

        Ok(buffer)
    }

    /// Saves an untagged snapshot into a buffer of exactly
    /// `compute_legacy_size()` bytes.
    pub fn save_legacy(&mut self, buffer: &mut [u8]) -> Result<()> {

        check_size(self.compute_legacy_size(), buffer.len())?;

        let fixed = buffer.first_chunk_mut::<BUS_STATE_BYTES>()
            .ok_or(XbusError::Corrupt("bus state section truncated"))?;
        self.state.write_to(fixed);

        let mut cursor = PAYLOAD_START;
        for (index, device) in self.slots.iter_mut() {

            let entry = BUS_STATE_BYTES + index * 4;

            // Devices with nothing to save get no offset, so that every recorded
            // offset is strictly greater than the one before it.
            let offset = match device {
                None => 0,
                Some(device) => {
                    let size = device.dispatch(XbusRequest::GetSaveSize) as usize;
                    if size == 0 {
                        0
                    } else {
                        let end = cursor + size;
                        let payload = buffer.get_mut(cursor..end)
                            .ok_or(XbusError::Corrupt("device save size changed during save"))?;
                        device.dispatch(XbusRequest::GetSaveData(payload));

                        let offset = u32::try_from(cursor)
                            .map_err(|_| XbusError::Corrupt("device payload offset does not fit in u32"))?;
                        cursor = end;
                        offset
                    }
                },
            };

            buffer.write_u32_le(entry, offset)
                .ok_or(XbusError::Corrupt("offset table truncated"))?;
        }

        debug!("Saved XBUS snapshot of {} bytes", buffer.len());
        Ok(())
    }

    /// Loads a tagged snapshot. Nothing is changed unless the whole snapshot
    /// checks out.
    pub fn load(&mut self, buffer: &[u8]) -> Result<()> {

        check_size(self.compute_size(), buffer.len())?;

        let (header, body) = buffer.split_at(SNAPSHOT_HEADER_BYTES);
        if &header[..4] != SNAPSHOT_MAGIC {
            warn!("Rejected XBUS snapshot with bad magic");
            return Err(XbusError::InvalidMagic);
        }

        let version = header.read_u32_le(4)
            .ok_or(XbusError::Corrupt("snapshot header truncated"))?;
        if version != SNAPSHOT_VERSION {
            warn!("Rejected XBUS snapshot with version {version}");
            return Err(XbusError::UnsupportedVersion(version));
        }

        self.load_legacy(body)
    }

    /// Loads an untagged snapshot. Nothing is changed unless the whole snapshot
    /// checks out.
    pub fn load_legacy(&mut self, buffer: &[u8]) -> Result<()> {

        check_size(self.compute_legacy_size(), buffer.len())?;

        let fixed = buffer.first_chunk::<BUS_STATE_BYTES>()
            .ok_or(XbusError::Corrupt("bus state section truncated"))?;
        let state = BusState::read_from(fixed).inspect_err(|error| {
            warn!("Rejected XBUS snapshot: {error}");
        })?;

        let payloads = self.locate_payloads(buffer).inspect_err(|error| {
            warn!("Rejected XBUS snapshot: {error}");
        })?;

        // Everything is validated, so from here on nothing can fail.
        self.state = state;
        for (index, device) in self.slots.iter_mut() {
            let Some(device) = device else {
                continue;
            };

            match payloads[index].clone() {
                Some(range) => device.dispatch(XbusRequest::SetSaveData(&buffer[range])),
                None => device.dispatch(XbusRequest::Reset(None)),
            };
        }

        debug!("Loaded XBUS snapshot of {} bytes", buffer.len());
        Ok(())
    }

    /// Works out where each attached device's payload lives, checking every
    /// offset lands inside the buffer and that non-zero offsets are strictly
    /// increasing in slot order without payloads overlapping.
    fn locate_payloads(&mut self, buffer: &[u8]) -> Result<[Option<Range<usize>>; SLOT_COUNT]> {

        let mut payloads: [Option<Range<usize>>; SLOT_COUNT] = std::array::from_fn(|_| None);
        let mut previous_offset = 0;
        let mut previous_end = PAYLOAD_START;

        for (index, device) in self.slots.iter_mut() {

            // Offsets saved for slots that are now empty are skipped.
            let Some(device) = device else {
                continue;
            };

            let offset = buffer.read_u32_le(BUS_STATE_BYTES + index * 4)
                .ok_or(XbusError::Corrupt("offset table truncated"))? as usize;
            if offset == 0 {
                continue;
            }

            if offset <= previous_offset || offset < previous_end {
                return Err(XbusError::Corrupt("device payload offsets overlap or are out of order"));
            }

            let size = device.dispatch(XbusRequest::GetSaveSize) as usize;
            let end = offset
                .checked_add(size)
                .filter(|end| *end <= buffer.len())
                .ok_or(XbusError::Corrupt("device payload runs past end of snapshot"))?;

            payloads[index] = Some(offset..end);
            previous_offset = offset;
            previous_end = end;
        }

        Ok(payloads)
    }
}

/// Checks a caller-supplied buffer is exactly the size the bus expects.
fn check_size(expected: usize, found: usize) -> Result<()> {

    if expected != found {
        warn!("Rejected XBUS snapshot buffer of {found} bytes, expected {expected}");
        return Err(XbusError::SnapshotSizeMismatch { expected, found });
    }

    Ok(())
}
