// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! PSX Interrupt Controller
//!
//! Collects interrupt requests from hardware components and signals the
//! CPU when an unmasked request is pending.
//!
//! ## Registers
//!
//! - **I_STAT** (0x1F801070): Interrupt status register (R/W)
//! - **I_MASK** (0x1F801074): Interrupt mask register (R/W)
//!
//! The CD-ROM drive is interrupt source bit 2.
//!
//! ## References
//!
//! - [PSX-SPX: Interrupt Control](http://problemkaputt.de/psx-spx.htm#interruptcontrol)

/// Interrupt source bit flags
///
/// Bit positions in I_STAT and I_MASK for each interrupt source.
pub mod sources {
    /// CD-ROM controller interrupt (bit 2)
    pub const CDROM: u16 = 1 << 2;
}

/// PlayStation interrupt controller
///
/// The drive raises at most one request per step through [`request`].
///
/// # Example
///
/// ```
/// use spindle_core::core::interrupt::{sources, InterruptController};
///
/// let mut ic = InterruptController::new();
///
/// ic.write_mask(sources::CDROM);
/// ic.request(sources::CDROM);
/// assert!(ic.is_pending());
///
/// ic.acknowledge(sources::CDROM);
/// assert!(!ic.is_pending());
/// ```
///
/// [`request`]: InterruptController::request
pub struct InterruptController {
    /// I_STAT, one bit per pending interrupt source
    status: u16,

    /// I_MASK, 1 = interrupt enabled
    mask: u16,
}

impl InterruptController {
    /// Create a new interrupt controller with all requests cleared and masked
    pub fn new() -> Self {
        Self { status: 0, mask: 0 }
    }

    /// Request an interrupt
    ///
    /// Sets the interrupt bit(s) in the status register. Called by
    /// hardware components when they need to signal the CPU.
    pub fn request(&mut self, source: u16) {
        self.status |= source;
        log::trace!(
            "IRQ requested: 0x{:04X}, status=0x{:04X}",
            source,
            self.status
        );
    }

    /// Acknowledge an interrupt, clearing its status bit(s)
    pub fn acknowledge(&mut self, source: u16) {
        self.status &= !source;
    }

    /// Read I_STAT
    pub fn read_status(&self) -> u16 {
        self.status
    }

    /// Read I_MASK
    pub fn read_mask(&self) -> u16 {
        self.mask
    }

    /// Write I_MASK
    pub fn write_mask(&mut self, value: u16) {
        self.mask = value;
    }

    /// True if any unmasked interrupt is pending
    pub fn is_pending(&self) -> bool {
        self.status & self.mask != 0
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}
