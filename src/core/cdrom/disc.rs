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

//! Disc image loading and sector access
//!
//! Handles CD-ROM disc images in two layouts: a cue sheet referencing a
//! raw .bin file, or a bare binary image treated as a single data track.
//! Sectors are addressed in MSF (Minute:Second:Frame) format, 75 frames
//! per second, 2352 bytes per raw sector.

use std::path::Path;

use crate::core::error::{DiscError, Result};

/// Raw sector size, 12 sync + 12 header/subheader + payload + ECC
pub const RAW_SECTOR_SIZE: usize = 2352;

/// Convert BCD (Binary-Coded Decimal) to decimal
///
/// Each nibble holds one decimal digit: 0x23 (BCD) = 23 (decimal).
#[inline]
pub fn bcd_to_dec(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Convert decimal (0-99) to BCD
#[inline]
pub fn dec_to_bcd(dec: u8) -> u8 {
    ((dec / 10) << 4) | (dec % 10)
}

/// A position on the disc in MSF (Minute:Second:Frame) format
///
/// Values are stored as plain decimal; BCD conversion happens at the
/// command interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscPosition {
    /// Minute (0-99)
    pub minutes: u8,
    /// Second (0-59)
    pub seconds: u8,
    /// Frame (0-74)
    pub frames: u8,
}

impl DiscPosition {
    pub fn new(minutes: u8, seconds: u8, frames: u8) -> Self {
        Self {
            minutes,
            seconds,
            frames,
        }
    }

    /// Convert MSF to logical block address
    ///
    /// LBA = (minutes * 60 + seconds) * 75 + frames - 150. The offset
    /// accounts for the 2-second lead-in, so positions inside it map to
    /// negative LBAs.
    pub fn to_lba(&self) -> i32 {
        (self.minutes as i32 * 60 + self.seconds as i32) * 75 + self.frames as i32 - 150
    }

    /// Convert a logical block address back to MSF
    pub fn from_lba(lba: i32) -> Self {
        let total = lba + 150;
        debug_assert!(total >= 0, "LBA {} is before the disc start", lba);
        Self::from_frames(total.max(0) as u32)
    }

    /// Build a position from an absolute frame count (no lead-in offset)
    pub fn from_frames(frames: u32) -> Self {
        Self {
            minutes: (frames / 75 / 60) as u8,
            seconds: ((frames / 75) % 60) as u8,
            frames: (frames % 75) as u8,
        }
    }

    /// Absolute frame count from the start of the disc
    pub fn total_frames(&self) -> u32 {
        (self.minutes as u32 * 60 + self.seconds as u32) * 75 + self.frames as u32
    }
}

/// Classification of one sector as handed to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorKind {
    /// Sector of a data track (Mode 1 or Mode 2)
    Data,
    /// Sector of a CD-DA audio track
    Audio,
    /// Position outside the image; no payload
    Invalid,
}

/// Content type of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// MODE1/2352 or MODE2/2352 data track
    Data,
    /// CD-DA audio track
    Audio,
}

/// One track of the disc image
#[derive(Debug, Clone)]
pub struct Track {
    /// Track number (1-99)
    pub number: u8,

    /// Content type
    pub kind: TrackKind,

    /// Start position (MSF), from the cue sheet's INDEX 01
    pub start: DiscPosition,

    /// Length in sectors
    pub length_sectors: u32,

    /// Byte offset in the .bin file
    pub file_offset: u64,
}

/// A disc image composed of tracks over raw sector data
///
/// Built either from a cue sheet (multi-track) or a bare .bin file
/// (single data track). An empty image stands in for "no disc".
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use spindle_core::core::cdrom::{DiscImage, DiscPosition};
///
/// let disc = DiscImage::load(Path::new("game.cue")).unwrap();
/// let (sector, kind) = disc.read(DiscPosition::new(0, 2, 0));
/// ```
#[derive(Debug)]
pub struct DiscImage {
    /// Tracks on the disc
    tracks: Vec<Track>,

    /// Raw sector data from the .bin file
    data: Vec<u8>,
}

impl DiscImage {
    /// An image with no tracks and no data, reported as "no disc"
    pub fn empty() -> Self {
        Self {
            tracks: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Load a disc image, dispatching on the file extension
    ///
    /// `.cue` (in any letter case) selects the cue-sheet loader; every
    /// other extension is treated as a raw binary image.
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("cue") => Self::from_cue(path),
            _ => Self::from_bin(path),
        }
    }

    /// Load a disc image from a cue sheet
    ///
    /// Parses the cue sheet for track layout and reads the referenced
    /// .bin file for sector data.
    pub fn from_cue(cue_path: &Path) -> Result<Self> {
        let cue_data = std::fs::read_to_string(cue_path)?;
        let bin_path = Self::bin_path_from_cue(cue_path, &cue_data)?;

        let mut tracks = Self::parse_cue(&cue_data)?;
        let data = std::fs::read(&bin_path).map_err(|e| DiscError::BinRead {
            path: bin_path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::calculate_track_lengths(&mut tracks, data.len());

        log::info!(
            "Loaded disc image: {} tracks, {} sectors",
            tracks.len(),
            data.len() / RAW_SECTOR_SIZE
        );

        Ok(Self { tracks, data })
    }

    /// Load a raw binary image as a single data track
    pub fn from_bin(bin_path: &Path) -> Result<Self> {
        let data = std::fs::read(bin_path)?;

        let mut tracks = vec![Track {
            number: 1,
            kind: TrackKind::Data,
            start: DiscPosition::new(0, 0, 0),
            length_sectors: 0,
            file_offset: 0,
        }];
        Self::calculate_track_lengths(&mut tracks, data.len());

        log::info!(
            "Loaded raw disc image: {} sectors",
            data.len() / RAW_SECTOR_SIZE
        );

        Ok(Self { tracks, data })
    }

    /// Extract the .bin path from the cue sheet's FILE directive
    ///
    /// The referenced file is resolved relative to the cue sheet.
    fn bin_path_from_cue(cue_path: &Path, cue_data: &str) -> Result<std::path::PathBuf> {
        for line in cue_data.lines() {
            let line = line.trim();
            if line.starts_with("FILE") {
                if let Some(start) = line.find('"') {
                    if let Some(end) = line[start + 1..].find('"') {
                        let bin_filename = &line[start + 1..start + 1 + end];

                        let bin_path = match cue_path.parent() {
                            Some(parent) => parent.join(bin_filename),
                            None => std::path::PathBuf::from(bin_filename),
                        };

                        return Ok(bin_path);
                    }
                }
            }
        }

        Err(DiscError::CueFormat {
            message: "No FILE directive found".to_string(),
        })
    }

    /// Parse the cue sheet's TRACK and INDEX 01 directives
    pub(super) fn parse_cue(cue_data: &str) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut current_track: Option<Track> = None;

        for line in cue_data.lines() {
            let line = line.trim();

            if line.starts_with("TRACK") {
                if let Some(track) = current_track.take() {
                    tracks.push(track);
                }

                let parts: Vec<&str> = line.split_whitespace().collect();
                let number = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(1);
                let kind_str = parts.get(2).unwrap_or(&"MODE2/2352");

                current_track = Some(Track {
                    number,
                    kind: Self::parse_track_kind(kind_str),
                    start: DiscPosition::new(0, 0, 0),
                    length_sectors: 0,
                    file_offset: 0,
                });
            } else if line.starts_with("INDEX 01") {
                if let Some(ref mut track) = current_track {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if let Some(time_str) = parts.get(2) {
                        track.start = Self::parse_msf(time_str)?;
                        track.file_offset =
                            track.start.total_frames() as u64 * RAW_SECTOR_SIZE as u64;
                    }
                }
            }
        }

        if let Some(track) = current_track {
            tracks.push(track);
        }

        Ok(tracks)
    }

    /// Parse an MSF time string of the form "MM:SS:FF"
    pub(super) fn parse_msf(msf: &str) -> Result<DiscPosition> {
        let parts: Vec<&str> = msf.split(':').collect();
        if parts.len() != 3 {
            return Err(DiscError::CueFormat {
                message: format!("Invalid MSF time '{}'", msf),
            });
        }

        let minutes = parts[0].parse().map_err(|_| DiscError::CueFormat {
            message: format!("Invalid minute in MSF time '{}'", msf),
        })?;
        let seconds = parts[1].parse().map_err(|_| DiscError::CueFormat {
            message: format!("Invalid second in MSF time '{}'", msf),
        })?;
        let frames = parts[2].parse().map_err(|_| DiscError::CueFormat {
            message: format!("Invalid frame in MSF time '{}'", msf),
        })?;

        Ok(DiscPosition {
            minutes,
            seconds,
            frames,
        })
    }

    /// Map a cue sheet track type string to a track kind
    pub(super) fn parse_track_kind(s: &str) -> TrackKind {
        match s {
            "MODE1/2352" | "MODE2/2352" => TrackKind::Data,
            "AUDIO" => TrackKind::Audio,
            _ => {
                log::warn!("Unknown cue track type '{}', assuming data", s);
                TrackKind::Data
            }
        }
    }

    /// Fill in track lengths from neighboring offsets and the file size
    pub(super) fn calculate_track_lengths(tracks: &mut [Track], file_size: usize) {
        for i in 0..tracks.len() {
            let this_offset = tracks[i].file_offset;
            if i + 1 < tracks.len() {
                let next_offset = tracks[i + 1].file_offset;
                tracks[i].length_sectors =
                    ((next_offset - this_offset) / RAW_SECTOR_SIZE as u64) as u32;
            } else {
                // Last track runs to the end of the file
                tracks[i].length_sectors =
                    ((file_size as u64).saturating_sub(this_offset) / RAW_SECTOR_SIZE as u64) as u32;
            }
        }
    }

    /// Read one raw sector at the given position
    ///
    /// Returns the 2352 sector bytes and the kind of the track they
    /// belong to. Positions outside the image yield an empty payload and
    /// [`SectorKind::Invalid`].
    pub fn read(&self, position: DiscPosition) -> (Vec<u8>, SectorKind) {
        let kind = self.kind_at(position);
        if kind == SectorKind::Invalid {
            return (Vec::new(), SectorKind::Invalid);
        }

        let offset = position.total_frames() as usize * RAW_SECTOR_SIZE;
        (self.data[offset..offset + RAW_SECTOR_SIZE].to_vec(), kind)
    }

    /// Kind of the track covering the given position
    fn kind_at(&self, position: DiscPosition) -> SectorKind {
        let frame = position.total_frames();

        let in_file =
            (frame as usize + 1) * RAW_SECTOR_SIZE <= self.data.len();
        if !in_file {
            return SectorKind::Invalid;
        }

        for track in &self.tracks {
            let start = track.start.total_frames();
            if frame >= start && frame < start + track.length_sectors {
                return match track.kind {
                    TrackKind::Data => SectorKind::Data,
                    TrackKind::Audio => SectorKind::Audio,
                };
            }
        }

        SectorKind::Invalid
    }

    /// True if no image is loaded
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of tracks on the disc
    pub fn track_count(&self) -> u8 {
        self.tracks.len() as u8
    }

    /// Start position of the given track (1-based)
    pub fn track_start(&self, number: u8) -> DiscPosition {
        match self.tracks.iter().find(|t| t.number == number) {
            Some(track) => track.start,
            None => {
                log::warn!("No such track {:02}", number);
                DiscPosition::new(0, 0, 0)
            }
        }
    }

    /// Total size of the image as an MSF position one past the last sector
    pub fn size(&self) -> DiscPosition {
        DiscPosition::from_frames((self.data.len() / RAW_SECTOR_SIZE) as u32)
    }
}

impl Default for DiscImage {
    fn default() -> Self {
        Self::empty()
    }
}
