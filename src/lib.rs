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

//! PlayStation 1 CD-ROM drive controller core
//!
//! This library emulates the host-visible interface of the PSX CD-ROM
//! sub-CPU: its index-multiplexed register file, command protocol, FIFOs,
//! interrupt behavior, and the timed delivery of sectors from a backing
//! disc image.
//!
//! # Example
//!
//! ```
//! use spindle_core::core::cdrom::CdromController;
//!
//! let mut drive = CdromController::new();
//!
//! // Issue Getstat through the command register (CDREG1, index 0)
//! drive.write_reg(1, 0x01);
//!
//! // The response FIFO now holds the stat byte
//! assert_eq!(drive.read_reg(0) & 0x20, 0x20);
//! ```

pub mod core;
