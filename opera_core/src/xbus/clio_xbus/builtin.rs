// SPDX-License-Identifier: GPL-3.0
// builtin.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

/// The width of the builtin pseudo-device's command register.
pub const COMMAND_BYTES: usize = 7;

/// The opcode of the builtin identify command.
const IDENTIFY_OPCODE: u8 = 0x83;

/// The status response queued by the identify command: an echo of the opcode,
/// followed by the capability marker for every remaining byte.
pub const IDENTIFY_RESPONSE: [u8; 12] = [
    IDENTIFY_OPCODE,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
];

/// This enum represents the commands the builtin pseudo-device understands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BuiltinCommand {
    Identify,
}

impl BuiltinCommand {

    /// Decodes a completed command register. Anything unrecognised is `None`,
    /// and the caller treats it as a no-op.
    pub fn decode(command: &[u8; COMMAND_BYTES]) -> Option<Self> {
        match command[0] {
            IDENTIFY_OPCODE => Some(BuiltinCommand::Identify),
            _ => None,
        }
    }

    /// The bytes this command queues on the status FIFO.
    pub fn response(self) -> &'static [u8] {
        match self {
            BuiltinCommand::Identify => &IDENTIFY_RESPONSE,
        }
    }
}

/// This struct models the builtin pseudo-device's command register, which
/// behaves like a fixed-width shift register: bytes beyond the seventh are
/// dropped, and the seventh accepted byte completes the command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandRegister {
    bytes: [u8; COMMAND_BYTES],
    cursor: u8,
}

impl CommandRegister {

    /// Creates a new empty command register.
    pub fn new() -> Self {
        CommandRegister {

            // Zero out the register and point at its first byte.
            bytes: [0; COMMAND_BYTES],
            cursor: 0,
        }
    }

    /// Rebuilds a command register from saved parts. The cursor must be in 0..=7.
    pub fn from_parts(bytes: [u8; COMMAND_BYTES], cursor: u8) -> Option<Self> {
        if cursor as usize > COMMAND_BYTES {
            return None;
        }
        Some(CommandRegister { bytes, cursor })
    }

    /// Accepts one byte. Once the register is full, the completed command is
    /// returned and the cursor goes back to 0.
    pub fn push(&mut self, value: u8) -> Option<[u8; COMMAND_BYTES]> {

        let cursor = self.cursor as usize;
        if cursor < COMMAND_BYTES {
            self.bytes[cursor] = value;
            self.cursor += 1;
        }

        if self.cursor as usize >= COMMAND_BYTES {
            self.cursor = 0;
            Some(self.bytes)
        } else {
            None
        }
    }

    pub fn bytes(&self) -> &[u8; COMMAND_BYTES] {
        &self.bytes
    }

    pub fn cursor(&self) -> u8 {
        self.cursor
    }
}
