// SPDX-License-Identifier: GPL-3.0
// lib.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

// Crate-wide lines to disable specific lints:

// Components are always built through their constructors with explicit
// initial state, so there are no derived Default implementations.
#![allow(clippy::new_without_default)]

/// This module contains the error type shared by the fallible XBUS operations.
pub mod error;

/// This module contains the interface to the CPU's interrupt controller.
pub mod interrupts;

/// This module contains 3DO expansion bus (XBUS) related functionality.
pub mod xbus;
