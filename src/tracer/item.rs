// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Reconstructed instructions

use core::fmt;

use crate::image::{Correlation, Label, Source};
use crate::instruction::{self, Instruction, info::Info};

use super::cache::Entry;

/// A reconstructed, retired instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Core which retired the instruction
    pub core: u16,
    pub address: u64,
    pub instruction: Instruction,
    /// Source location, `None` if the address could not be correlated
    pub source: Option<Source>,
    /// Closest preceding symbol
    pub label: Option<Label>,
    /// Timestamp of the message which led to this record
    pub timestamp: u64,
    pub flow: Flow,
}

impl Record {
    pub(super) fn new(core: u16, address: u64, timestamp: u64, entry: Entry) -> Self {
        Self {
            core,
            address,
            flow: Flow::of(&entry.instruction.kind),
            instruction: entry.instruction,
            source: entry.correlation.source,
            label: entry.correlation.label,
            timestamp,
        }
    }

    /// Retrieve the [`Correlation`] this record was annotated with
    pub fn correlation(&self) -> Correlation {
        Correlation {
            address: self.address,
            source: self.source.clone(),
            label: self.label.clone(),
        }
    }
}

/// Control flow classification of an instruction
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Execution continues with the next instruction
    #[default]
    Sequential,
    /// Conditional branch
    Branch,
    /// Jump which is neither a call nor a return
    Jump,
    /// Function call
    Call,
    /// Return from a function
    Return,
    /// Co-routine swap
    Swap,
    /// `ecall` or `ebreak`
    Exception,
    /// Return from a trap
    ExceptionReturn,
}

impl Flow {
    /// Classify an instruction
    pub fn of(kind: &instruction::Kind) -> Self {
        if kind.is_ecall_or_ebreak() {
            Self::Exception
        } else if kind.is_return_from_trap() {
            Self::ExceptionReturn
        } else if kind.is_branch() {
            Self::Branch
        } else if kind.is_swap() {
            Self::Swap
        } else if kind.is_call() {
            Self::Call
        } else if kind.is_return() {
            Self::Return
        } else if kind.is_inferable_jump() || kind.is_uninferable_jump() {
            Self::Jump
        } else {
            Self::Sequential
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sequential => "sequential",
            Self::Branch => "branch",
            Self::Jump => "jump",
            Self::Call => "call",
            Self::Return => "return",
            Self::Swap => "swap",
            Self::Exception => "exception",
            Self::ExceptionReturn => "exception return",
        };
        f.write_str(name)
    }
}
