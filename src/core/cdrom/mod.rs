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

//! CD-ROM drive controller emulation for PlayStation 1
//!
//! This module emulates the host-visible side of the CD-ROM sub-CPU:
//! - An index-multiplexed register file in a 4-byte MMIO window
//! - Parameter, response, interrupt and data FIFOs
//! - The command interpreter (Getstat, Setloc, ReadN, GetID, ...)
//! - Timed sector ingestion from a backing disc image
//!
//! # Register file
//!
//! The window holds four byte slots; the low two bits of the status byte
//! (written through slot 0) select one of four banks, so the effective
//! register is the (slot, index) pair:
//!
//! ```text
//! Read            | Write
//! ----------------|------------------------------------------
//! 0.x Status      | 0.x Index
//! 1.x Response    | 1.0 Command       1.1-3 Sound map/volume
//! 2.x Data FIFO   | 2.0 Parameter     2.1 Int enable  2.2-3 Volume
//! 3.0/2 Int enable| 3.0 Request       3.1 Int flag ack
//! 3.1/3 Int flag  | 3.2-3 Volume
//! ```
//!
//! # Interrupt codes
//!
//! Commands enqueue response codes into the interrupt FIFO:
//! - INT1: a read sector is ready
//! - INT2: second response, command completed
//! - INT3: first response, command acknowledged
//! - INT5: command error
//!
//! Only the front code is visible; the guest acknowledges it through
//! slot 3 bank 1 before the next becomes visible.
//!
//! # Example
//!
//! ```
//! use spindle_core::core::cdrom::CdromController;
//!
//! let mut drive = CdromController::new();
//!
//! // Getstat: the response FIFO receives the stat byte and the
//! // interrupt FIFO an INT3 acknowledge.
//! drive.write_reg(1, 0x01);
//! drive.write_reg(0, 1);
//! assert_eq!(drive.read_reg(3) & 0b111, 3);
//! ```

mod commands;
pub mod disc;
mod status;


pub use disc::{bcd_to_dec, dec_to_bcd, DiscImage, DiscPosition, SectorKind};
pub use status::{DriveMode, DriveState, IrqCode, StatCode, StatusRegister};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::{Rc, Weak};

use crate::core::error::Result;
use crate::core::interrupt::{sources, InterruptController};

/// 12-byte prefix marking a data sector
const SYNC_MAGIC: [u8; 12] = [
    0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
];

/// CD-ROM drive controller
///
/// Owns the register file, the four FIFOs, the drive state machine and
/// the backing disc image. The embedding system drives it through three
/// entry points, called serially from the main loop: [`read_reg`],
/// [`write_reg`] and [`step`].
///
/// [`read_reg`]: CdromController::read_reg
/// [`write_reg`]: CdromController::write_reg
/// [`step`]: CdromController::step
pub struct CdromController {
    /// Host status register (CDREG0 reads)
    reg_status: StatusRegister,

    /// Stat byte returned in responses
    stat_code: StatCode,

    /// Mode byte written by Setmode
    mode: DriveMode,

    /// Interrupt enable register, low 3 bits mask the IRQ FIFO front
    int_enable: u8,

    /// Parameter FIFO (up to 16 bytes), filled by the guest before a command
    param_fifo: VecDeque<u8>,

    /// Response FIFO (up to 16 bytes), drained by the guest after a command
    resp_fifo: VecDeque<u8>,

    /// Pending interrupt codes, one entry per response group
    irq_fifo: VecDeque<u8>,

    /// Sector currently exposed to the guest through the data FIFO
    data_buf: Vec<u8>,

    /// Next sector staged by the reader, swapped in on request
    read_buf: Vec<u8>,

    /// Read cursor into `data_buf`, relative to the mode's byte offset
    data_buffer_index: usize,

    /// Seek target set by Setloc
    seek_sector: i32,

    /// Next sector the reader will fetch
    read_sector: i32,

    /// step() calls left until the next sector delivery
    steps_until_read_sect: u32,

    /// CD-DA output muted
    #[allow(dead_code)]
    muted: bool,

    /// Backing disc image; empty when no disc is inserted
    disc: DiscImage,

    /// Interrupt sink, registered once through `init`
    interrupts: Weak<RefCell<InterruptController>>,
}

impl CdromController {
    /// Guest physical base of the 4-byte MMIO window
    pub const MMIO_BASE: u32 = 0x1F80_1800;

    /// Maximum FIFO size (16 bytes)
    const MAX_FIFO_SIZE: usize = 16;

    /// step() calls between sector deliveries at single speed
    ///
    /// One step per CPU clock at 33.8688 MHz gives 75 sectors per second
    /// of guest time. Double speed mode halves the delay.
    pub const READ_SECTOR_DELAY_STEPS: u32 = 33_868_800 / 75;

    /// Create a new controller with the shell open and no disc inserted
    pub fn new() -> Self {
        Self {
            reg_status: StatusRegister::new(),
            stat_code: StatCode::new(),
            mode: DriveMode::new(),
            int_enable: 0,
            param_fifo: VecDeque::new(),
            resp_fifo: VecDeque::new(),
            irq_fifo: VecDeque::new(),
            data_buf: Vec::new(),
            read_buf: Vec::new(),
            data_buffer_index: 0,
            seek_sector: 0,
            read_sector: 0,
            steps_until_read_sect: Self::READ_SECTOR_DELAY_STEPS,
            muted: false,
            disc: DiscImage::empty(),
            interrupts: Weak::new(),
        }
    }

    /// Register the interrupt sink
    ///
    /// Called once at system setup; the reference is never rebound.
    pub fn init(&mut self, interrupts: &Rc<RefCell<InterruptController>>) {
        self.interrupts = Rc::downgrade(interrupts);
    }

    /// Insert a disc image from a file, closing the shell
    ///
    /// A `.cue` extension (case-insensitive) selects the cue-sheet
    /// loader; any other extension is read as a raw binary image.
    pub fn insert_disk_file(&mut self, path: &Path) -> Result<()> {
        self.disc = DiscImage::load(path)?;
        self.stat_code.shell_open = false;
        Ok(())
    }

    /// Advance the drive by one tick
    ///
    /// Clears the transmit busy flag, raises the CDROM interrupt if the
    /// front of the interrupt FIFO is unmasked, and, while reading or
    /// playing, counts down to the next sector delivery.
    pub fn step(&mut self) {
        self.reg_status.transmit_busy = false;

        if let Some(&front) = self.irq_fifo.front() {
            let triggered = front & 0b111;
            let mask = self.int_enable & 0b111;

            if triggered & mask != 0 {
                if let Some(interrupts) = self.interrupts.upgrade() {
                    interrupts.borrow_mut().request(sources::CDROM);
                }
            }
        }

        if self.stat_code.is_reading() || self.stat_code.is_playing() {
            self.steps_until_read_sect -= 1;
            if self.steps_until_read_sect == 0 {
                self.steps_until_read_sect = self.read_sector_delay();
                self.fetch_sector();
            }
        }
    }

    /// Fetch the sector at the read head into the staging buffer
    fn fetch_sector(&mut self) {
        let position = DiscPosition::from_lba(self.read_sector);
        let (bytes, kind) = self.disc.read(position);
        self.read_buf = bytes;

        self.read_sector += 1;

        if kind == SectorKind::Invalid {
            return;
        }

        let sync_match =
            self.read_buf.len() >= SYNC_MAGIC.len() && self.read_buf[..SYNC_MAGIC.len()] == SYNC_MAGIC;

        if self.stat_code.is_playing() && kind == SectorKind::Audio {
            if sync_match {
                log::error!("Sync data found in audio sector at {:?}", position);
            }
        } else if self.stat_code.is_reading() && kind == SectorKind::Data {
            if !sync_match {
                log::error!("Sync data mismatch in data sector at {:?}", position);
            }

            // Ack more data
            let stat = self.stat_code.byte();
            self.push_response(IrqCode::DataReady, &[stat]);
        }
    }

    /// Delay until the next sector under the current mode's speed
    fn read_sector_delay(&self) -> u32 {
        if self.mode.double_speed() {
            Self::READ_SECTOR_DELAY_STEPS / 2
        } else {
            Self::READ_SECTOR_DELAY_STEPS
        }
    }

    /// Read one byte from the register file
    ///
    /// `addr_rebased` is the offset within the MMIO window (0..4); the
    /// active bank comes from the status register's index bits.
    pub fn read_reg(&mut self, addr_rebased: u32) -> u8 {
        let reg = (addr_rebased & 0b11) as u8;
        let index = self.reg_status.index;

        let value = match (reg, index) {
            // Status Register
            (0, _) => self.reg_status.byte(),

            // Response FIFO
            (1, _) => {
                let mut value = 0;
                if let Some(byte) = self.resp_fifo.pop_front() {
                    value = byte;

                    if self.resp_fifo.is_empty() {
                        self.reg_status.response_fifo_not_empty = false;
                    }
                }
                value
            }

            // Data FIFO
            (2, _) => self.read_byte(),

            // Interrupt Enable Register
            (3, 0) | (3, 2) => self.int_enable,

            // Interrupt Flag Register; the upper bits always read as set
            (3, 1) | (3, 3) => {
                let mut value = 0b1110_0000;
                if let Some(&front) = self.irq_fifo.front() {
                    value |= front & 0b111;
                }
                value
            }

            _ => {
                log::error!("Unknown combination, CDREG{}.{}", reg, index);
                0
            }
        };

        log::trace!(
            "CDROM read {} (CDREG{}.{}) val: 0x{:02X}",
            reg_name(reg, index, true),
            reg,
            index,
            value
        );

        value
    }

    /// Write one byte to the register file
    pub fn write_reg(&mut self, addr_rebased: u32, val: u8) {
        let reg = (addr_rebased & 0b11) as u8;
        let index = self.reg_status.index;

        match (reg, index) {
            // Index Register
            (0, _) => {
                self.reg_status.index = val & 0b11;
                return; // Bank switches are not worth logging
            }

            // Command Register
            (1, 0) => self.execute_command(val),

            // Sound Map Data Out
            (1, 1) => {}
            // Sound Map Coding Info
            (1, 2) => {}
            // Audio Volume for Right-CD-Out to Right-SPU-Input
            (1, 3) => {}

            // Parameter FIFO
            (2, 0) => {
                assert!(
                    self.param_fifo.len() < Self::MAX_FIFO_SIZE,
                    "parameter FIFO overflow"
                );

                self.param_fifo.push_back(val);
                self.reg_status.param_fifo_empty = false;
                self.reg_status.param_fifo_write_ready =
                    self.param_fifo.len() < Self::MAX_FIFO_SIZE;
            }

            // Interrupt Enable Register
            (2, 1) => self.int_enable = val,

            // Audio Volume for Left-CD-Out to Left-SPU-Input
            (2, 2) => {}
            // Audio Volume for Right-CD-Out to Left-SPU-Input
            (2, 3) => {}

            // Request Register
            (3, 0) => {
                if val & 0x80 != 0 {
                    // Want data; refill only once the previous sector is drained
                    if self.is_data_buf_empty() {
                        self.data_buf = std::mem::take(&mut self.read_buf);
                        self.data_buffer_index = 0;
                        self.reg_status.data_fifo_not_empty = !self.is_data_buf_empty();
                    }
                } else {
                    self.data_buf.clear();
                    self.data_buffer_index = 0;
                    self.reg_status.data_fifo_not_empty = false;
                }
            }

            // Interrupt Flag Register
            (3, 1) => {
                if val & 0x40 != 0 {
                    // Reset Parameter FIFO
                    self.param_fifo.clear();
                    self.reg_status.param_fifo_empty = true;
                    self.reg_status.param_fifo_write_ready = true;
                }

                self.irq_fifo.pop_front();
            }

            // Audio Volume for Left-CD-Out to Right-SPU-Input
            (3, 2) => {}
            // Audio Volume Apply Changes
            (3, 3) => {}

            _ => {
                log::error!("Unknown combination, CDREG{}.{} val: {:02X}", reg, index, val);
            }
        }

        log::trace!(
            "CDROM write {} (CDREG{}.{}) val: 0x{:02X}",
            reg_name(reg, index, false),
            reg,
            index,
            val
        );
    }

    /// True once every byte of the exposed sector has been read
    fn is_data_buf_empty(&self) -> bool {
        if self.data_buf.is_empty() {
            return true;
        }

        self.data_buffer_index >= self.mode.sector_size()
    }

    /// Read one byte from the data FIFO
    ///
    /// Bytes are served from a mode-dependent offset into the raw
    /// sector: 24 (past sync and header) in 0x800 mode, 12 (past sync
    /// only) in 0x924 mode.
    pub fn read_byte(&mut self) -> u8 {
        if self.is_data_buf_empty() {
            log::warn!("Tried to read with an empty data buffer");
            return 0;
        }

        let data_only = self.mode.sector_size() == 0x800;
        let data_offset = if data_only { 24 } else { 12 };

        let data = self.data_buf[data_offset + self.data_buffer_index];
        self.data_buffer_index += 1;

        if self.is_data_buf_empty() {
            self.reg_status.data_fifo_not_empty = false;
        }

        data
    }

    /// Read one little-endian word from the data FIFO (DMA path)
    pub fn read_word(&mut self) -> u32 {
        u32::from_le_bytes([
            self.read_byte(),
            self.read_byte(),
            self.read_byte(),
            self.read_byte(),
        ])
    }
}

impl Default for CdromController {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable register name for trace logs
fn reg_name(reg: u8, index: u8, is_read: bool) -> &'static str {
    if is_read {
        match (reg, index) {
            (0, _) => "Status Register",
            (1, _) => "Response FIFO",
            (2, _) => "Data FIFO",
            (3, 0) | (3, 2) => "Interrupt Enable Register",
            (3, 1) | (3, 3) => "Interrupt Flag Register",
            _ => "<unknown>",
        }
    } else {
        match (reg, index) {
            (0, _) => "Index Register",
            (1, 0) => "Command Register",
            (1, 1) => "Sound Map Data Out",
            (1, 2) => "Sound Map Coding Info",
            (1, 3) => "Audio Volume for Right-CD-Out to Right-SPU-Input",
            (2, 0) => "Parameter FIFO",
            (2, 1) => "Interrupt Enable Register",
            (2, 2) => "Audio Volume for Left-CD-Out to Left-SPU-Input",
            (2, 3) => "Audio Volume for Right-CD-Out to Left-SPU-Input",
            (3, 0) => "Request Register",
            (3, 1) => "Interrupt Flag Register",
            (3, 2) => "Audio Volume for Left-CD-Out to Right-SPU-Input",
            (3, 3) => "Audio Volume Apply Changes",
            _ => "<unknown>",
        }
    }
}
