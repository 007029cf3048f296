// Operata
// Copyright (C) 2021  Wesley Merkel
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Error types shared across the crate.
//!
//! Almost every operation on operands is total: an unsupported selector or source leaves things
//! untouched rather than failing. The fallible edges are the ones that talk to the outside world,
//! building a [`Scale`](crate::scale::Scale) from a user supplied mask and reading or writing
//! serialized records.

use std::io;
use thiserror::Error;

/// A specialized [`Result`] type for operata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for the fallible operations in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A scale mask did not have one slot per chromatic pitch class.
    #[error("scale mask must have 12 slots, got {len}")]
    InvalidScale { len: usize },
    /// A scale mask had no active slots.
    #[error("scale mask must contain at least one active slot")]
    EmptyScale,
    /// A record named a class that does not exist.
    #[error("unknown operand class: {0}")]
    UnknownClass(String),
    /// A record could not be converted to or from JSON.
    #[error("failed to convert record: {0}")]
    Json(#[from] serde_json::Error),
    /// A record file could not be read or written.
    #[error("failed to access record file: {0}")]
    Io(#[from] io::Error),
}
