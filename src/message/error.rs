// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Message decode errors

use super::tcode::TCode;

/// Message decode errors
///
/// Positions are byte offsets of the first slice of the affected message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// All messages were consumed
    #[error("end of trace")]
    EndOfTrace,
    /// The trace data ends inside a message
    #[error("trace ends inside the message at byte {pos}")]
    Truncated { pos: usize },
    /// A slice carries the reserved MSEO value
    #[error("reserved MSEO value in the message at byte {pos}")]
    ReservedMseo { pos: usize },
    /// The type code is not known
    #[error("unknown TCODE {tcode} at byte {pos}")]
    UnknownTCode { tcode: u8, pos: usize },
    /// The message's fields do not match its layout
    #[error("malformed message at byte {pos}: {cause}")]
    Malformed {
        pos: usize,
        core: Option<u16>,
        #[source]
        cause: FieldError,
    },
    /// The message is well-formed but not used for reconstruction
    #[error("unsupported message {tcode} from core {core}")]
    Unsupported { tcode: TCode, core: u16 },
}

impl Error {
    /// Retrieve the core the failed message originates from, if known
    pub fn core(&self) -> Option<u16> {
        match self {
            Self::Malformed { core, .. } => *core,
            Self::Unsupported { core, .. } => Some(*core),
            _ => None,
        }
    }
}

/// Errors concerning individual fields of a message
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The message ends before all mandatory fields were read
    #[error("message ends before its mandatory fields")]
    MissingField,
    /// A fixed width field crosses the end of a field
    #[error("fixed field crosses a field boundary")]
    Boundary,
    /// A variable field holds more than 64 significant bits
    #[error("variable field exceeds 64 bits")]
    Oversized,
}
