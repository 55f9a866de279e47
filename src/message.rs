// Copyright (C) 2024, 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Trace message decoding
//!
//! This module provides a [`Reader`] for decoding Nexus trace messages from
//! raw trace data, an [`Encoder`] for producing such data, and definitions of
//! both the wire-level [`Raw`] messages and the logical [`Message`]s the
//! reconstruction consumes.

pub mod encoder;
pub mod error;
pub mod reader;
pub mod slice;
pub mod tcode;


use core::fmt;

use smallvec::SmallVec;

pub use encoder::Encoder;
pub use error::{Error, FieldError};
pub use reader::Reader;
pub use tcode::TCode;

/// Default width of timestamps in bits
pub const DEFAULT_TIMESTAMP_WIDTH: u8 = 40;

/// Maximum width of core ids in bits
pub const MAX_SRC_BITS: u8 = 16;

/// Create a new [`Builder`] for [`Reader`]s and [`Encoder`]s
pub fn builder() -> Builder {
    Default::default()
}

/// Builder for [`Reader`]s and [`Encoder`]s
///
/// A builder will build a single reader for a specific trace. [`Builder`]
/// implements [`Copy`], so the same configuration may be used for building
/// multiple readers or an [`Encoder`] producing compatible data.
#[derive(Copy, Clone, Debug)]
pub struct Builder {
    src_bits: u8,
    timestamp_width: u8,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            src_bits: 0,
            timestamp_width: DEFAULT_TIMESTAMP_WIDTH,
        }
    }
}

impl Builder {
    /// Create a new builder
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the width of the core id following the TCODE in message headers
    ///
    /// Single core traces usually don't carry a core id at all, which is
    /// reflected by the default of `0`. Core ids are at most [`MAX_SRC_BITS`]
    /// wide, larger values are clamped.
    pub fn with_src_bits(self, src_bits: u8) -> Self {
        Self {
            src_bits: src_bits.min(MAX_SRC_BITS),
            ..self
        }
    }

    /// Set the width of timestamps in bits
    ///
    /// This width determines how full timestamps are combined with the
    /// running timestamp and how wrap-arounds are compensated.
    pub fn with_timestamp_width(self, timestamp_width: u8) -> Self {
        Self {
            timestamp_width,
            ..self
        }
    }

    /// Build a [`Reader`] for the given data
    pub fn build<D: AsRef<[u8]>>(self, data: D) -> Reader<D> {
        Reader::new(data, self.src_bits, self.timestamp_width)
    }

    /// Build an [`Encoder`] for this configuration
    pub fn encoder(self) -> Encoder {
        Encoder::new(self.src_bits)
    }
}

/// A wire-level message
///
/// Holds the values of all fields in the order in which they appear, starting
/// with the mandatory fields defined by the [`TCode`]'s
/// [layout][TCode::layout] and followed by optional trailing fields (history
/// and timestamp).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raw {
    pub tcode: TCode,
    pub core: u16,
    pub fields: SmallVec<[u64; 6]>,
}

impl Raw {
    /// Create a new message without any fields
    pub fn new(tcode: TCode, core: u16) -> Self {
        Self {
            tcode,
            core,
            fields: Default::default(),
        }
    }

    /// Append a field
    pub fn with_field(mut self, value: u64) -> Self {
        self.fields.push(value);
        self
    }

    /// Append several fields
    pub fn with_fields(mut self, values: impl IntoIterator<Item = u64>) -> Self {
        self.fields.extend(values);
        self
    }
}

/// A logical trace message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Core the message originates from
    pub core: u16,
    /// Running timestamp of the core after decoding the message
    pub timestamp: u64,
    pub payload: Payload,
}

impl Message {
    /// Retrieve the instruction count of this message, `0` if it has none
    pub fn i_cnt(&self) -> u64 {
        match self.payload {
            Payload::Sync { i_cnt, .. }
            | Payload::DirectBranch { i_cnt, .. }
            | Payload::IndirectBranch { i_cnt, .. }
            | Payload::Exception { i_cnt, .. } => i_cnt,
            _ => 0,
        }
    }

    /// Retrieve the [`Kind`] of this message
    pub fn kind(&self) -> Kind {
        match self.payload {
            Payload::Sync { .. } => Kind::Sync,
            Payload::DirectBranch { .. } => Kind::DirectBranch,
            Payload::IndirectBranch { .. } => Kind::IndirectBranch,
            Payload::Exception { .. } => Kind::Exception,
            Payload::PrintFragment(_) => Kind::PrintFragment,
            Payload::Timestamp => Kind::Timestamp,
            Payload::Error { .. } => Kind::Error,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}@{}] ", self.core, self.timestamp)?;
        match &self.payload {
            Payload::Sync { address, i_cnt } => write!(f, "sync {address:#x}, i-cnt {i_cnt}"),
            Payload::DirectBranch { taken, i_cnt } => {
                write!(f, "direct branch, taken: {taken}, i-cnt {i_cnt}")
            }
            Payload::IndirectBranch { target, i_cnt } => {
                write!(f, "indirect branch to {target:#x}, i-cnt {i_cnt}")
            }
            Payload::Exception { address, i_cnt } => {
                write!(f, "exception to {address:#x}, i-cnt {i_cnt}")
            }
            Payload::PrintFragment(fragment) => write!(
                f,
                "print channel {}: {:?}",
                fragment.channel,
                String::from_utf8_lossy(&fragment.data)
            ),
            Payload::Timestamp => write!(f, "timestamp"),
            Payload::Error { code } => write!(f, "error {code:#x}"),
        }
    }
}

/// Payload of a logical trace message
///
/// Messages reporting control flow carry an instruction count `i_cnt`: the
/// number of half-words retired since the previous counted message, up to
/// and including the instruction the message reports. Instructions within
/// the count which do not end it are not reported individually. In
/// particular, conditional branches within the count were not taken. A
/// count of `0` denotes a message without a count, e.g. an outcome expanded
/// from branch history, which refers to the next pending instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Full address, resynchronizing the reconstruction
    Sync { address: u64, i_cnt: u64 },
    /// Outcome of a conditional branch
    DirectBranch { taken: bool, i_cnt: u64 },
    /// Target of an uninferable jump
    IndirectBranch { target: u64, i_cnt: u64 },
    /// Target of a trap or interrupt
    Exception { address: u64, i_cnt: u64 },
    /// Piece of instrumented print output
    PrintFragment(Fragment),
    /// Timestamp only
    Timestamp,
    /// The encoder reports lost messages
    Error { code: u64 },
}

/// Kind of a [`Message`], used for statistics
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Sync,
    DirectBranch,
    IndirectBranch,
    Exception,
    PrintFragment,
    Timestamp,
    Error,
    /// End of the trace
    End,
}

impl Kind {
    /// All kinds, in order
    pub const ALL: [Self; 8] = [
        Self::Sync,
        Self::DirectBranch,
        Self::IndirectBranch,
        Self::Exception,
        Self::PrintFragment,
        Self::Timestamp,
        Self::Error,
        Self::End,
    ];
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sync => "sync",
            Self::DirectBranch => "direct branch",
            Self::IndirectBranch => "indirect branch",
            Self::Exception => "exception",
            Self::PrintFragment => "print fragment",
            Self::Timestamp => "timestamp",
            Self::Error => "error",
            Self::End => "end",
        };
        f.write_str(name)
    }
}

/// Piece of instrumented print output written to a stimulus channel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    /// Core the output originates from
    pub core: u16,
    /// Stimulus channel
    pub channel: u8,
    /// Payload bytes, including a trailing newline if present
    pub data: SmallVec<[u8; 4]>,
    /// Whether the fragment ends with a line terminator (newline or NUL)
    pub terminator: bool,
    /// Running timestamp at the time the fragment was written
    pub timestamp: u64,
}
