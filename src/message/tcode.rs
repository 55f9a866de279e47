// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Message type codes and their field layouts

use core::fmt;

/// Nexus message type code
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TCode {
    DebugStatus = 0,
    DeviceId = 1,
    OwnershipTrace = 2,
    DirectBranch = 3,
    IndirectBranch = 4,
    DataWrite = 5,
    DataRead = 6,
    DataAcquisition = 7,
    Error = 8,
    Sync = 9,
    Correction = 10,
    DirectBranchSync = 11,
    IndirectBranchSync = 12,
    DataWriteSync = 13,
    DataReadSync = 14,
    Watchpoint = 15,
    OutputPortReplacement = 20,
    InputPortReplacement = 21,
    AuxAccessRead = 22,
    AuxAccessWrite = 23,
    AuxAccessReadNext = 24,
    AuxAccessWriteNext = 25,
    AuxAccessResponse = 26,
    ResourceFull = 27,
    IndirectBranchHistory = 28,
    IndirectBranchHistorySync = 29,
    RepeatBranch = 30,
    RepeatInstruction = 31,
    RepeatInstructionSync = 32,
    Correlation = 33,
    InCircuitTrace = 34,
    InCircuitTraceSync = 35,
}

impl TCode {
    /// Retrieve the layout of the mandatory fields following the header
    ///
    /// Returns `None` for messages which are never reconstructed. The fields of
    /// such messages are not decoded.
    pub fn layout(self) -> Option<&'static [Field]> {
        use Field::{Fixed, Var};

        let layout: &'static [Field] = match self {
            Self::OwnershipTrace => &[Var],
            Self::DirectBranch => &[Var],
            Self::IndirectBranch => &[Fixed(2), Var, Var],
            Self::DataAcquisition => &[Var, Var],
            Self::Error => &[Fixed(4), Var],
            Self::Sync => &[Fixed(4), Var, Var],
            Self::DirectBranchSync => &[Fixed(4), Var, Var],
            Self::IndirectBranchSync => &[Fixed(4), Fixed(2), Var, Var],
            Self::AuxAccessWrite => &[Var, Var],
            Self::ResourceFull => &[Fixed(4), Var],
            Self::IndirectBranchHistory => &[Fixed(2), Var, Var, Var],
            Self::IndirectBranchHistorySync => &[Fixed(4), Fixed(2), Var, Var, Var],
            Self::Correlation => &[Fixed(4), Fixed(2), Var],
            _ => return None,
        };
        Some(layout)
    }

    /// Determine whether this message carries a full address and timestamp
    pub fn is_sync(self) -> bool {
        matches!(
            self,
            Self::Sync
                | Self::DirectBranchSync
                | Self::IndirectBranchSync
                | Self::IndirectBranchHistorySync
        )
    }
}

impl TryFrom<u8> for TCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        let tcode = match value {
            0 => Self::DebugStatus,
            1 => Self::DeviceId,
            2 => Self::OwnershipTrace,
            3 => Self::DirectBranch,
            4 => Self::IndirectBranch,
            5 => Self::DataWrite,
            6 => Self::DataRead,
            7 => Self::DataAcquisition,
            8 => Self::Error,
            9 => Self::Sync,
            10 => Self::Correction,
            11 => Self::DirectBranchSync,
            12 => Self::IndirectBranchSync,
            13 => Self::DataWriteSync,
            14 => Self::DataReadSync,
            15 => Self::Watchpoint,
            20 => Self::OutputPortReplacement,
            21 => Self::InputPortReplacement,
            22 => Self::AuxAccessRead,
            23 => Self::AuxAccessWrite,
            24 => Self::AuxAccessReadNext,
            25 => Self::AuxAccessWriteNext,
            26 => Self::AuxAccessResponse,
            27 => Self::ResourceFull,
            28 => Self::IndirectBranchHistory,
            29 => Self::IndirectBranchHistorySync,
            30 => Self::RepeatBranch,
            31 => Self::RepeatInstruction,
            32 => Self::RepeatInstructionSync,
            33 => Self::Correlation,
            34 => Self::InCircuitTrace,
            35 => Self::InCircuitTraceSync,
            v => return Err(v),
        };
        Ok(tcode)
    }
}

impl From<TCode> for u8 {
    fn from(tcode: TCode) -> Self {
        tcode as u8
    }
}

impl fmt::Display for TCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ({})", *self as u8)
    }
}

/// Kind of a message field
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// Fixed width field of the given number of bits
    Fixed(u8),
    /// Variable width field ending at a slice with an end of field marker
    Var,
}
