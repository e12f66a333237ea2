// SPDX-License-Identifier: GPL-3.0
// lib.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

// This crate contains useful utility functions that can be used throughout the codebase.

/// Exists to allow us to define custom trait operations on `u8`.
type CustomByte = u8;

/// This trait exists to allow us to treat register bytes as two nibbles, which is how
/// most of the XBUS registers are laid out (flags in the high nibble, masks or
/// selectors in the low nibble).
pub trait CustomNibbles {

    type Output;

    /// This function should return the low nibble of the value, in place.
    fn low_nibble(self) -> Self::Output;

    /// This function should return the high nibble of the value, in place (not shifted).
    fn high_nibble(self) -> Self::Output;

    /// This function should return the value with its low nibble replaced by the low
    /// nibble of `from`, keeping the original high nibble.
    fn merge_low_nibble(self, from: Self::Output) -> Self::Output;
}

impl CustomNibbles for CustomByte {

    type Output = u8;

    /// Masks off the high nibble, returning `u8`.
    #[inline(always)]
    fn low_nibble(self) -> Self::Output {
        self & 0x0F
    }

    /// Masks off the low nibble, returning `u8`.
    #[inline(always)]
    fn high_nibble(self) -> Self::Output {
        self & 0xF0
    }

    /// Keeps our high nibble and takes the low nibble of `from`.
    #[inline(always)]
    fn merge_low_nibble(self, from: Self::Output) -> Self::Output {
        self.high_nibble() | from.low_nibble()
    }
}

/// This trait exists to allow little-endian words to be read from and written to
/// byte buffers at arbitrary positions, without ever indexing out of bounds.
pub trait CustomByteSlice {

    /// This function should return the little-endian `u32` starting at `index`, or
    /// `None` if fewer than four bytes remain.
    fn read_u32_le(&self, index: usize) -> Option<u32>;

    /// This function should store `value` as a little-endian `u32` starting at `index`,
    /// returning `None` (and leaving the buffer untouched) if fewer than four bytes remain.
    fn write_u32_le(&mut self, index: usize, value: u32) -> Option<()>;
}

impl CustomByteSlice for [u8] {

    /// Reads four bytes as a little-endian word.
    fn read_u32_le(&self, index: usize) -> Option<u32> {

        let end = index.checked_add(4)?;
        let bytes: [u8; 4] = self.get(index..end)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// Writes a word as four little-endian bytes.
    fn write_u32_le(&mut self, index: usize, value: u32) -> Option<()> {

        let end = index.checked_add(4)?;
        self.get_mut(index..end)?.copy_from_slice(&value.to_le_bytes());
        Some(())
    }
}
