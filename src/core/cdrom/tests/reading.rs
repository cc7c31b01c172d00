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

//! Sector delivery, pacing and data FIFO tests

use std::cell::RefCell;
use std::rc::Rc;

use super::super::*;
use super::{
    assert_status_bits, audio_sector, data_sector, init_logging, irq_codes, responses,
    write_data_disc, write_mixed_disc,
};
use crate::core::interrupt::{sources, InterruptController};

const DELAY: u32 = CdromController::READ_SECTOR_DELAY_STEPS;

/// Seek to 00:00:16 and start ReadN, acknowledging both INT3s
fn start_read_at_16(drive: &mut CdromController) {
    drive.write_reg(0, 0);
    drive.write_reg(2, 0x00);
    drive.write_reg(2, 0x00);
    drive.write_reg(2, 0x10);
    drive.write_reg(1, 0x02); // Setloc
    let _ = drive.read_reg(1);
    drive.write_reg(0, 1);
    drive.write_reg(3, 0x07);

    drive.write_reg(0, 0);
    drive.write_reg(1, 0x06); // ReadN
    let _ = drive.read_reg(1);
    drive.write_reg(0, 1);
    drive.write_reg(3, 0x07);
}

#[test]
fn test_data_sector_delivery() {
    init_logging();

    let (_cue, _bin) = write_data_disc("test_read_flow_", 20);
    let mut drive = CdromController::new();
    drive.insert_disk_file(_cue.path()).unwrap();

    start_read_at_16(&mut drive);

    // Nothing arrives before the delay elapses
    for _ in 0..DELAY - 1 {
        drive.step();
    }
    assert!(irq_codes(&drive).is_empty());

    drive.step();
    assert_eq!(irq_codes(&drive), [1]);

    // The data-ready stat still reports the read state
    let resp = responses(&drive);
    assert_eq!(resp.len(), 1);
    assert_eq!(resp[0] & 0x20, 0x20);

    // Request the data and drain a whole 0x800 payload
    drive.write_reg(0, 0);
    drive.write_reg(3, 0x80);
    assert_eq!(drive.read_reg(0) & 0x40, 0x40);

    let expected = data_sector(16);
    for i in 0..0x800usize {
        assert_eq!(drive.read_reg(2), expected[24 + i], "payload byte {}", i);
    }

    assert_eq!(drive.read_reg(0) & 0x40, 0);
    assert_status_bits(&drive);
}

#[test]
fn test_whole_sector_mode_starts_past_sync() {
    let (_cue, _bin) = write_data_disc("test_read_whole_", 20);
    let mut drive = CdromController::new();
    drive.insert_disk_file(_cue.path()).unwrap();

    // Sector size 0x924
    drive.write_reg(0, 0);
    drive.write_reg(2, 0x20);
    drive.write_reg(1, 0x0E);
    let _ = drive.read_reg(1);
    drive.write_reg(0, 1);
    drive.write_reg(3, 0x07);

    start_read_at_16(&mut drive);

    for _ in 0..DELAY {
        drive.step();
    }
    assert_eq!(irq_codes(&drive), [1]);

    drive.write_reg(0, 0);
    drive.write_reg(3, 0x80);

    let expected = data_sector(16);
    for i in 0..0x924usize {
        assert_eq!(drive.read_reg(2), expected[12 + i], "sector byte {}", i);
    }
    assert_eq!(drive.read_reg(0) & 0x40, 0);
}

#[test]
fn test_read_word_is_little_endian() {
    let (_cue, _bin) = write_data_disc("test_read_word_", 20);
    let mut drive = CdromController::new();
    drive.insert_disk_file(_cue.path()).unwrap();

    start_read_at_16(&mut drive);
    for _ in 0..DELAY {
        drive.step();
    }

    drive.write_reg(0, 0);
    drive.write_reg(3, 0x80);

    let expected = data_sector(16);
    let word = u32::from_le_bytes([expected[24], expected[25], expected[26], expected[27]]);
    assert_eq!(drive.read_word(), word);
}

#[test]
fn test_sector_pacing() {
    let (_cue, _bin) = write_data_disc("test_read_pacing_", 20);
    let mut drive = CdromController::new();
    drive.insert_disk_file(_cue.path()).unwrap();

    start_read_at_16(&mut drive);

    for _ in 0..DELAY {
        drive.step();
    }
    assert_eq!(irq_codes(&drive), [1]);
    assert_eq!(drive.read_sector, (16 - 150) + 1);

    // Ack and drain, then the next sector arrives one delay later
    let _ = drive.read_reg(1);
    drive.write_reg(0, 1);
    drive.write_reg(3, 0x07);

    for _ in 0..DELAY {
        drive.step();
    }
    assert_eq!(irq_codes(&drive), [1]);
    assert_eq!(drive.read_sector, (16 - 150) + 2);
}

#[test]
fn test_double_speed_halves_the_delay() {
    let (_cue, _bin) = write_data_disc("test_read_speed_", 20);
    let mut drive = CdromController::new();
    drive.insert_disk_file(_cue.path()).unwrap();

    drive.write_reg(0, 0);
    drive.write_reg(2, 0x80);
    drive.write_reg(1, 0x0E); // Setmode: double speed
    let _ = drive.read_reg(1);
    drive.write_reg(0, 1);
    drive.write_reg(3, 0x07);

    start_read_at_16(&mut drive);

    for _ in 0..DELAY / 2 - 1 {
        drive.step();
    }
    assert!(irq_codes(&drive).is_empty());

    drive.step();
    assert_eq!(irq_codes(&drive), [1]);
}

#[test]
fn test_invalid_sector_is_skipped() {
    init_logging();

    let (_cue, _bin) = write_data_disc("test_read_invalid_", 20);
    let mut drive = CdromController::new();
    drive.insert_disk_file(_cue.path()).unwrap();

    // Frame 100, past the 20-sector image
    drive.write_reg(0, 0);
    drive.write_reg(2, 0x00);
    drive.write_reg(2, 0x01);
    drive.write_reg(2, 0x25);
    drive.write_reg(1, 0x02); // Setloc
    let _ = drive.read_reg(1);
    drive.write_reg(0, 1);
    drive.write_reg(3, 0x07);

    drive.write_reg(0, 0);
    drive.write_reg(1, 0x06); // ReadN
    let _ = drive.read_reg(1);
    drive.write_reg(0, 1);
    drive.write_reg(3, 0x07);

    for _ in 0..DELAY {
        drive.step();
    }

    // No data-ready interrupt, but the head still advanced
    assert!(irq_codes(&drive).is_empty());
    assert_eq!(drive.read_sector, (100 - 150) + 1);
}

#[test]
fn test_audio_sector_while_playing() {
    // Audio track from frame 5 onwards
    let (_cue, _bin) = write_mixed_disc("test_play_audio_", 5, 80);
    let mut drive = CdromController::new();
    drive.insert_disk_file(_cue.path()).unwrap();

    drive.write_reg(0, 0);
    drive.write_reg(2, 0x00);
    drive.write_reg(2, 0x00);
    drive.write_reg(2, 0x05);
    drive.write_reg(1, 0x02); // Setloc
    let _ = drive.read_reg(1);
    drive.write_reg(0, 1);
    drive.write_reg(3, 0x07);

    drive.write_reg(0, 0);
    drive.write_reg(1, 0x03); // Play
    assert_eq!(drive.stat_code.state(), DriveState::Playing);
    let _ = drive.read_reg(1);
    drive.write_reg(0, 1);
    drive.write_reg(3, 0x07);

    for _ in 0..DELAY {
        drive.step();
    }

    // Audio sectors are staged without a data-ready interrupt
    assert!(irq_codes(&drive).is_empty());
    assert_eq!(drive.read_buf, audio_sector(5));
}

#[test]
fn test_data_buffer_swaps_only_when_drained() {
    let (_cue, _bin) = write_data_disc("test_read_swap_", 20);
    let mut drive = CdromController::new();
    drive.insert_disk_file(_cue.path()).unwrap();

    start_read_at_16(&mut drive);

    for _ in 0..DELAY {
        drive.step();
    }
    drive.write_reg(0, 0);
    drive.write_reg(3, 0x80);

    // Read a few bytes, then let the reader stage the next sector
    let expected_16 = data_sector(16);
    for i in 0..4usize {
        assert_eq!(drive.read_reg(2), expected_16[24 + i]);
    }

    drive.write_reg(0, 1);
    drive.write_reg(3, 0x07); // Ack INT1
    drive.write_reg(0, 0);
    for _ in 0..DELAY {
        drive.step();
    }

    // Requesting data now must not clobber the half-read sector
    drive.write_reg(3, 0x80);
    for i in 4..0x800usize {
        assert_eq!(drive.read_reg(2), expected_16[24 + i], "payload byte {}", i);
    }

    // Drained; the staged sector becomes visible on the next request
    drive.write_reg(3, 0x80);
    let expected_17 = data_sector(17);
    assert_eq!(drive.read_reg(2), expected_17[24]);
}

#[test]
fn test_request_clear_empties_data_fifo() {
    let (_cue, _bin) = write_data_disc("test_read_clear_", 20);
    let mut drive = CdromController::new();
    drive.insert_disk_file(_cue.path()).unwrap();

    start_read_at_16(&mut drive);
    for _ in 0..DELAY {
        drive.step();
    }

    drive.write_reg(0, 0);
    drive.write_reg(3, 0x80);
    assert_eq!(drive.read_reg(0) & 0x40, 0x40);

    drive.write_reg(3, 0x00);
    assert_eq!(drive.read_reg(0) & 0x40, 0);
    assert_eq!(drive.read_reg(2), 0);
    assert_status_bits(&drive);
}

#[test]
fn test_interrupt_masking() {
    let interrupts = Rc::new(RefCell::new(InterruptController::new()));
    interrupts.borrow_mut().write_mask(sources::CDROM);

    let mut drive = CdromController::new();
    drive.init(&interrupts);

    // Pending INT3 with all drive interrupts masked: no raise
    drive.write_reg(0, 0);
    drive.write_reg(1, 0x01); // Getstat
    drive.step();
    assert_eq!(interrupts.borrow().read_status(), 0);

    // Unmask and the pending code goes through
    drive.write_reg(0, 1);
    drive.write_reg(2, 0x07); // Interrupt Enable
    drive.step();
    assert_ne!(interrupts.borrow().read_status() & sources::CDROM, 0);
}

#[test]
fn test_step_raises_at_most_one_interrupt() {
    let interrupts = Rc::new(RefCell::new(InterruptController::new()));
    interrupts.borrow_mut().write_mask(sources::CDROM);

    let mut drive = CdromController::new();
    drive.init(&interrupts);

    drive.write_reg(0, 1);
    drive.write_reg(2, 0x07);
    drive.write_reg(0, 0);
    drive.write_reg(1, 0x07); // MotorOn queues two codes

    // Each step re-raises the single CDROM line exactly once
    drive.step();
    assert_ne!(interrupts.borrow().read_status() & sources::CDROM, 0);

    interrupts.borrow_mut().acknowledge(sources::CDROM);
    drive.step();
    assert_ne!(interrupts.borrow().read_status() & sources::CDROM, 0);
}

#[test]
fn test_step_with_dropped_interrupt_sink() {
    let interrupts = Rc::new(RefCell::new(InterruptController::new()));

    let mut drive = CdromController::new();
    drive.init(&interrupts);
    drop(interrupts);

    drive.write_reg(0, 1);
    drive.write_reg(2, 0x07);
    drive.write_reg(0, 0);
    drive.write_reg(1, 0x01);

    // The sink is gone; stepping must not panic
    drive.step();
}
