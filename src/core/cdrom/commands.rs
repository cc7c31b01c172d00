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

//! CD-ROM command implementations
//!
//! Each command consumes its parameters from the parameter FIFO and
//! enqueues one or more response groups, an interrupt code paired with
//! response bytes, through [`CdromController::push_response`].

use super::disc::{bcd_to_dec, dec_to_bcd};
use super::status::{DriveState, IrqCode};
use super::{CdromController, DiscPosition};

impl CdromController {
    /// Execute a CD-ROM command
    ///
    /// Invoked synchronously from a command register write. Pending
    /// interrupts and responses are discarded, the command runs, and any
    /// leftover parameters are drained.
    ///
    /// # Example
    ///
    /// ```
    /// use spindle_core::core::cdrom::CdromController;
    ///
    /// let mut drive = CdromController::new();
    /// drive.execute_command(0x01); // Getstat
    /// assert_eq!(drive.read_reg(0) & 0x20, 0x20);
    /// ```
    pub fn execute_command(&mut self, cmd: u8) {
        self.irq_fifo.clear();
        self.resp_fifo.clear();
        self.reg_status.response_fifo_not_empty = false;

        log::debug!("CDROM command issued: {} (0x{:02X})", cmd_name(cmd), cmd);

        if !self.param_fifo.is_empty() {
            log::debug!("Parameters: {:02X?}", self.param_fifo);
        }

        match cmd {
            0x01 => self.cmd_getstat(),
            0x02 => self.cmd_setloc(),
            0x03 | 0x11 => self.cmd_play(),
            0x06 => self.cmd_readn(),
            0x07 => self.cmd_motor_on(),
            0x08 => self.cmd_stop(),
            0x09 => self.cmd_pause(),
            0x0A => self.cmd_init(),
            0x0B => self.cmd_mute(),
            0x0C => self.cmd_demute(),
            0x0D => self.cmd_setfilter(),
            0x0E => self.cmd_setmode(),
            0x0F => self.cmd_getparam(),
            0x13 => self.cmd_gettn(),
            0x14 => self.cmd_gettd(),
            0x15 => self.cmd_seekl(),
            0x19 => self.cmd_test(),
            0x1A => self.cmd_getid(),
            0x1B => self.cmd_reads(),
            _ => {
                self.command_error();
                log::error!("Unhandled CDROM command 0x{:02X}", cmd);
            }
        }

        if !self.resp_fifo.is_empty() {
            log::debug!("Response: {:02X?}", self.resp_fifo);
        }

        self.param_fifo.clear();

        self.reg_status.transmit_busy = true;
        self.reg_status.param_fifo_empty = true;
        self.reg_status.param_fifo_write_ready = true;
        self.reg_status.adpcm_fifo_empty = false;
    }

    /// Command 0x01: Getstat
    ///
    /// Returns the current stat byte.
    fn cmd_getstat(&mut self) {
        self.push_response_stat(IrqCode::Acknowledge);
    }

    /// Command 0x02: Setloc
    ///
    /// Stores the seek target from 3 parameter bytes (MM:SS:FF in BCD).
    fn cmd_setloc(&mut self) {
        let mm = bcd_to_dec(self.get_param());
        let ss = bcd_to_dec(self.get_param());
        let ff = bcd_to_dec(self.get_param());

        self.seek_sector = DiscPosition::new(mm, ss, ff).to_lba();

        log::debug!("CDROM: Setloc to {:02}:{:02}:{:02}", mm, ss, ff);

        self.push_response_stat(IrqCode::Acknowledge);
    }

    /// Commands 0x03 (Play) and 0x11 (GetlocP)
    ///
    /// Starts playback at the seek target. GetlocP position reports are
    /// not implemented; guests that poll it after modified sectors with
    /// bad CRCs expect stale position data, so the opcode is aliased to
    /// Play instead of erroring out.
    fn cmd_play(&mut self) {
        // The optional track parameter is not handled
        assert!(self.param_fifo.is_empty(), "Play with a track parameter");

        self.read_sector = self.seek_sector;
        self.steps_until_read_sect = self.read_sector_delay();

        self.stat_code.set_state(DriveState::Playing);

        self.push_response_stat(IrqCode::Acknowledge);
    }

    /// Command 0x06: ReadN
    ///
    /// Starts reading data sectors at the seek target.
    fn cmd_readn(&mut self) {
        self.read_sector = self.seek_sector;
        self.steps_until_read_sect = self.read_sector_delay();

        self.stat_code.set_state(DriveState::Reading);

        self.push_response_stat(IrqCode::Acknowledge);
    }

    /// Command 0x07: MotorOn
    fn cmd_motor_on(&mut self) {
        self.stat_code.spindle_motor_on = true;

        self.push_response_stat(IrqCode::Acknowledge);
        self.push_response_stat(IrqCode::Complete);
    }

    /// Command 0x08: Stop
    ///
    /// Stops the read head and spins the motor down.
    fn cmd_stop(&mut self) {
        self.stat_code.set_state(DriveState::Stopped);
        self.stat_code.spindle_motor_on = false;

        self.push_response_stat(IrqCode::Acknowledge);
        self.push_response_stat(IrqCode::Complete);
    }

    /// Command 0x09: Pause
    ///
    /// The first response still reports the previous read state.
    fn cmd_pause(&mut self) {
        self.push_response_stat(IrqCode::Acknowledge);

        self.stat_code.set_state(DriveState::Stopped);

        self.push_response_stat(IrqCode::Complete);
    }

    /// Command 0x0A: Init
    ///
    /// Resets the stat and mode bytes and spins the motor up.
    fn cmd_init(&mut self) {
        self.push_response_stat(IrqCode::Acknowledge);

        self.stat_code.reset();
        self.stat_code.spindle_motor_on = true;

        self.mode.reset();

        self.push_response_stat(IrqCode::Complete);
    }

    /// Command 0x0B: Mute
    fn cmd_mute(&mut self) {
        self.muted = true;

        self.push_response_stat(IrqCode::Acknowledge);
    }

    /// Command 0x0C: Demute
    fn cmd_demute(&mut self) {
        self.muted = false;

        self.push_response_stat(IrqCode::Acknowledge);
    }

    /// Command 0x0D: Setfilter
    ///
    /// Accepts the XA file/channel pair and echoes it back.
    fn cmd_setfilter(&mut self) {
        let file = bcd_to_dec(self.get_param());
        let channel = bcd_to_dec(self.get_param());

        let stat = self.stat_code.byte();
        self.push_response(
            IrqCode::Acknowledge,
            &[stat, dec_to_bcd(file), dec_to_bcd(channel)],
        );
    }

    /// Command 0x0E: Setmode
    fn cmd_setmode(&mut self) {
        self.push_response_stat(IrqCode::Acknowledge);

        let param = self.get_param();
        assert!(param & 0b1_0000 == 0, "mode bit 4 must be zero");
        self.mode.byte = param;
    }

    /// Command 0x0F: Getparam
    fn cmd_getparam(&mut self) {
        // TODO: return the Setfilter file/channel once the filter is stored
        let stat = self.stat_code.byte();
        self.push_response(IrqCode::Acknowledge, &[stat, 0x00, 0x00]);
    }

    /// Command 0x13: GetTN
    ///
    /// Returns the first track index and the track count, in BCD.
    fn cmd_gettn(&mut self) {
        let index = dec_to_bcd(0x01);
        let track_count = dec_to_bcd(self.disc.track_count());

        let stat = self.stat_code.byte();
        self.push_response(IrqCode::Acknowledge, &[stat, index, track_count]);
    }

    /// Command 0x14: GetTD
    ///
    /// Returns the start of a track; track 0 means the total disc size.
    fn cmd_gettd(&mut self) {
        let track_number = bcd_to_dec(self.get_param());

        let disk_pos = if track_number == 0 {
            self.disc.size()
        } else {
            self.disc.track_start(track_number)
        };

        let minutes = dec_to_bcd(disk_pos.minutes);
        let seconds = dec_to_bcd(disk_pos.seconds);

        let stat = self.stat_code.byte();
        self.push_response(IrqCode::Acknowledge, &[stat, minutes, seconds]);
    }

    /// Command 0x15: SeekL
    ///
    /// Moves the read head to the seek target. Completion is reported in
    /// the same command; real hardware takes time proportional to the
    /// head travel.
    fn cmd_seekl(&mut self) {
        self.push_response_stat(IrqCode::Acknowledge);

        self.read_sector = self.seek_sector;
        self.stat_code.set_state(DriveState::Seeking);

        self.push_response_stat(IrqCode::Complete);
    }

    /// Command 0x19: Test
    ///
    /// Only subfunction 0x20 (controller BIOS date/version) is handled.
    fn cmd_test(&mut self) {
        let subfunction = self.get_param();

        log::debug!("CDROM command subfunction: 0x{:02X}", subfunction);

        match subfunction {
            // Report a PSX (PU-7), 18 Nov 1994, version vC0 (b)
            0x20 => self.push_response(IrqCode::Acknowledge, &[0x94, 0x09, 0x19, 0xC0]),
            _ => {
                self.command_error();
                log::error!("Unhandled Test subfunction 0x{:02X}", subfunction);
            }
        }
    }

    /// Command 0x1A: GetID
    ///
    /// Identifies the inserted disc, or reports the open shell or the
    /// missing disc as INT5 errors.
    fn cmd_getid(&mut self) {
        let has_disk = !self.disc.is_empty();

        if self.stat_code.shell_open {
            self.push_response(IrqCode::Error, &[0x11, 0x80]);
        } else if has_disk {
            self.push_response_stat(IrqCode::Acknowledge);
            self.push_response(
                IrqCode::Complete,
                &[0x02, 0x00, 0x20, 0x00, b'S', b'C', b'E', b'A'],
            );
        } else {
            self.push_response_stat(IrqCode::Acknowledge);
            self.push_response(
                IrqCode::Error,
                &[0x08, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
            );
        }
    }

    /// Command 0x1B: ReadS
    ///
    /// Same as ReadN; retry behavior on damaged sectors is not modeled.
    fn cmd_reads(&mut self) {
        self.read_sector = self.seek_sector;
        self.steps_until_read_sect = self.read_sector_delay();

        self.stat_code.set_state(DriveState::Reading);

        self.push_response_stat(IrqCode::Acknowledge);
    }

    /// Enqueue the INT5(0x11, 0x40) command error response
    pub(super) fn command_error(&mut self) {
        self.push_response(IrqCode::Error, &[0x11, 0x40]);
    }

    /// Pop the next parameter byte
    ///
    /// The caller is responsible for only asking for parameters the
    /// guest actually pushed.
    fn get_param(&mut self) -> u8 {
        assert!(!self.param_fifo.is_empty(), "command expected a parameter");

        let param = self.param_fifo.pop_front().unwrap();

        self.reg_status.param_fifo_empty = self.param_fifo.is_empty();
        self.reg_status.param_fifo_write_ready = true;

        param
    }

    /// Enqueue one response group
    ///
    /// The interrupt code goes to the interrupt FIFO, the payload to the
    /// response FIFO. Bytes past the FIFO bound are dropped.
    pub(super) fn push_response(&mut self, code: IrqCode, bytes: &[u8]) {
        self.irq_fifo.push_back(code as u8);

        for &byte in bytes {
            if self.resp_fifo.len() < Self::MAX_FIFO_SIZE {
                self.resp_fifo.push_back(byte);
                self.reg_status.response_fifo_not_empty = true;
            } else {
                log::warn!("CDROM response 0x{:02X} lost, FIFO was full", byte);
            }
        }
    }

    /// Enqueue a response group whose only payload is the stat byte
    pub(super) fn push_response_stat(&mut self, code: IrqCode) {
        let stat = self.stat_code.byte();
        self.push_response(code, &[stat]);
    }
}

/// Human-readable command name for debug logs
pub(super) fn cmd_name(cmd: u8) -> &'static str {
    const CMD_NAMES: [&str; 32] = [
        "Sync", "Getstat", "Setloc", "Play", "Forward", "Backward", "ReadN", "MotorOn", "Stop",
        "Pause", "Init", "Mute", "Demute", "Setfilter", "Setmode", "Getparam", "GetlocL",
        "GetlocP", "SetSession", "GetTN", "GetTD", "SeekL", "SeekP", "-", "-", "Test", "GetID",
        "ReadS", "Reset", "GetQ", "ReadTOC", "VideoCD",
    ];

    if (cmd as usize) < CMD_NAMES.len() {
        return CMD_NAMES[cmd as usize];
    }
    if (0x50..=0x57).contains(&cmd) {
        return "Secret";
    }
    "<unknown>"
}
