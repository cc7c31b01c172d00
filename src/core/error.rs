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

/// Disc image error types
use std::fmt;

/// Result type for disc image operations
pub type Result<T> = std::result::Result<T, DiscError>;

/// Errors raised while loading a disc image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscError {
    /// I/O error (file operations)
    Io {
        /// Error message
        message: String,
    },

    /// Malformed cue sheet
    CueFormat {
        /// Error message
        message: String,
    },

    /// The .bin file referenced by a cue sheet could not be read
    BinRead {
        /// Path of the .bin file
        path: String,
        /// Error message
        message: String,
    },
}

impl fmt::Display for DiscError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscError::Io { message } => {
                write!(f, "I/O error: {}", message)
            }
            DiscError::CueFormat { message } => {
                write!(f, "Malformed cue sheet: {}", message)
            }
            DiscError::BinRead { path, message } => {
                write!(f, "Failed to read bin file '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for DiscError {}

impl From<std::io::Error> for DiscError {
    fn from(err: std::io::Error) -> Self {
        DiscError::Io {
            message: err.to_string(),
        }
    }
}
