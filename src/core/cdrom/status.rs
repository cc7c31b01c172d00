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

//! Status, stat and mode bitfields
//!
//! The drive exposes three distinct byte-wide views of its state:
//!
//! - The **host status register** (CDREG0 reads): FIFO levels and busy flags.
//! - The **stat byte**: drive mechanics (motor, shell, read state), returned
//!   as the first byte of most command responses.
//! - The **mode byte**: sector size, speed and filter settings written by
//!   Setmode.
//!
//! Each is kept as named fields with a `byte()` view so that whole-byte
//! reads observe exactly the documented bit layout.

/// Response codes carried in the interrupt FIFO
///
/// Only the low 3 bits of the FIFO front are visible to the guest through
/// the Interrupt Flag register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqCode {
    /// INT1: a freshly read sector is ready in the data buffer
    DataReady = 1,
    /// INT2: second response, command completed
    Complete = 2,
    /// INT3: first response, command acknowledged
    Acknowledge = 3,
    /// INT5: command or read error
    Error = 5,
}

/// Drive read state
///
/// At most one of reading/seeking/playing is active at a time, which the
/// stat byte encodes in bits 5..7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveState {
    /// No read operation in progress
    Stopped,
    /// Seeking to the Setloc target
    Seeking,
    /// Reading data sectors
    Reading,
    /// Playing CD-DA sectors
    Playing,
}

/// Host status register (CDREG0 reads)
///
/// ```text
/// Bit 0-1: Index (0-3), selects the active register bank
/// Bit 2:   ADPCM FIFO empty
/// Bit 3:   Parameter FIFO empty (1=Empty)
/// Bit 4:   Parameter FIFO write ready (1=Not Full)
/// Bit 5:   Response FIFO not empty (1=Not Empty)
/// Bit 6:   Data FIFO not empty (1=Not Empty)
/// Bit 7:   Transmit busy (1=Busy)
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StatusRegister {
    /// Active register bank, last value written to CDREG0
    pub index: u8,
    /// ADPCM FIFO empty
    pub adpcm_fifo_empty: bool,
    /// Parameter FIFO empty
    pub param_fifo_empty: bool,
    /// Parameter FIFO has room for at least one more byte
    pub param_fifo_write_ready: bool,
    /// Response FIFO holds unread bytes
    pub response_fifo_not_empty: bool,
    /// Data FIFO holds unread sector bytes
    pub data_fifo_not_empty: bool,
    /// A command transmission is in progress
    pub transmit_busy: bool,
}

impl StatusRegister {
    /// Reset state: both parameter FIFO flags raised, everything else clear
    pub fn new() -> Self {
        Self {
            index: 0,
            adpcm_fifo_empty: false,
            param_fifo_empty: true,
            param_fifo_write_ready: true,
            response_fifo_not_empty: false,
            data_fifo_not_empty: false,
            transmit_busy: false,
        }
    }

    /// Compose the register byte from the individual flags
    pub fn byte(&self) -> u8 {
        let mut value = self.index & 0b11;

        if self.adpcm_fifo_empty {
            value |= 1 << 2;
        }
        if self.param_fifo_empty {
            value |= 1 << 3;
        }
        if self.param_fifo_write_ready {
            value |= 1 << 4;
        }
        if self.response_fifo_not_empty {
            value |= 1 << 5;
        }
        if self.data_fifo_not_empty {
            value |= 1 << 6;
        }
        if self.transmit_busy {
            value |= 1 << 7;
        }

        value
    }
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

/// The stat byte returned as the first byte of most responses
///
/// ```text
/// Bit 0: Error
/// Bit 1: Spindle motor on
/// Bit 2: Seek error
/// Bit 3: ID error
/// Bit 4: Shell open
/// Bit 5: Reading
/// Bit 6: Seeking
/// Bit 7: Playing
/// ```
///
/// Bits 5..7 derive from a single [`DriveState`], so at most one of them
/// is ever set.
#[derive(Debug, Clone, Copy)]
pub struct StatCode {
    /// Error occurred
    pub error: bool,
    /// Spindle motor on
    pub spindle_motor_on: bool,
    /// Seek error
    pub seek_error: bool,
    /// ID error (disc not recognized)
    pub id_error: bool,
    /// Shell open (tray open or no disc inserted)
    pub shell_open: bool,
    /// Current read state
    state: DriveState,
}

impl StatCode {
    /// Power-on state: shell open, everything else clear
    pub fn new() -> Self {
        Self {
            error: false,
            spindle_motor_on: false,
            seek_error: false,
            id_error: false,
            shell_open: true,
            state: DriveState::Stopped,
        }
    }

    /// Current read state
    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Switch read state, implicitly leaving the previous one
    pub fn set_state(&mut self, state: DriveState) {
        self.state = state;
    }

    /// True while reading data sectors
    pub fn is_reading(&self) -> bool {
        self.state == DriveState::Reading
    }

    /// True while playing CD-DA
    pub fn is_playing(&self) -> bool {
        self.state == DriveState::Playing
    }

    /// Clear every bit, including the shell flag
    pub fn reset(&mut self) {
        *self = Self {
            error: false,
            spindle_motor_on: false,
            seek_error: false,
            id_error: false,
            shell_open: false,
            state: DriveState::Stopped,
        };
    }

    /// Compose the stat byte
    pub fn byte(&self) -> u8 {
        let mut value = 0u8;

        if self.error {
            value |= 1 << 0;
        }
        if self.spindle_motor_on {
            value |= 1 << 1;
        }
        if self.seek_error {
            value |= 1 << 2;
        }
        if self.id_error {
            value |= 1 << 3;
        }
        if self.shell_open {
            value |= 1 << 4;
        }

        match self.state {
            DriveState::Stopped => {}
            DriveState::Reading => value |= 1 << 5,
            DriveState::Seeking => value |= 1 << 6,
            DriveState::Playing => value |= 1 << 7,
        }

        value
    }
}

impl Default for StatCode {
    fn default() -> Self {
        Self::new()
    }
}

/// The mode byte written by Setmode
///
/// ```text
/// Bit 0: CD-DA (allow reading audio sectors)
/// Bit 1: Auto-pause at end of track
/// Bit 2: Report interrupts during play
/// Bit 3: XA filter
/// Bit 4: Ignore bit, must be zero
/// Bit 5: Sector size (0=0x800 data only, 1=0x924 whole sector minus sync)
/// Bit 6: XA-ADPCM
/// Bit 7: Double speed
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DriveMode {
    /// Raw mode byte
    pub byte: u8,
}

impl DriveMode {
    pub fn new() -> Self {
        Self { byte: 0 }
    }

    /// Restore the power-on mode
    pub fn reset(&mut self) {
        self.byte = 0;
    }

    /// Bytes the guest can read out of one sector under this mode
    pub fn sector_size(&self) -> usize {
        if self.byte & (1 << 5) != 0 {
            0x924
        } else {
            0x800
        }
    }

    /// Double speed (150 sectors per second)
    pub fn double_speed(&self) -> bool {
        self.byte & (1 << 7) != 0
    }

    /// XA-ADPCM sector routing enabled
    pub fn xa_adpcm(&self) -> bool {
        self.byte & (1 << 6) != 0
    }

    /// XA filter enabled
    pub fn xa_filter(&self) -> bool {
        self.byte & (1 << 3) != 0
    }

    /// Report interrupts during play
    pub fn report(&self) -> bool {
        self.byte & (1 << 2) != 0
    }

    /// Auto-pause at end of track
    pub fn auto_pause(&self) -> bool {
        self.byte & (1 << 1) != 0
    }

    /// Allow reading CD-DA sectors
    pub fn cdda(&self) -> bool {
        self.byte & (1 << 0) != 0
    }
}

impl Default for DriveMode {
    fn default() -> Self {
        Self::new()
    }
}
