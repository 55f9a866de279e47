// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Per-core reconstruction state

use core::fmt;

use crate::instruction::Instruction;

use super::stack::ReturnStack;

/// Reconstruction state of a single core
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum State {
    /// No address is known, e.g. at the start of the trace
    #[default]
    Unsynced,
    /// Instructions are being reconstructed, no trace evidence is pending
    ///
    /// A core remains in this state while parked at a jump to itself.
    Synced,
    /// Waiting for trace evidence resolving a control flow instruction
    Branching,
    /// Trace and image disagreed, waiting for a sync
    Faulted,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unsynced => "unsynced",
            Self::Synced => "synced",
            Self::Branching => "branching",
            Self::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// Tracking information of a single core
#[derive(Clone, Debug, Default)]
pub(super) struct Core {
    pub state: State,
    /// Address of the next or parked instruction
    pub pc: u64,
    /// Instruction the core is parked at while [`State::Branching`] or
    /// [`State::Synced`]
    pub pending: Option<Instruction>,
    /// Half-words retired since the last counted message
    pub retired: u64,
    pub stack: ReturnStack,
}

impl Core {
    /// Create an unsynced core with a return stack of the given depth
    pub fn new(stack_depth: usize) -> Self {
        Self {
            stack: ReturnStack::new(stack_depth),
            ..Default::default()
        }
    }

    /// Move to [`State::Faulted`], returning whether this is a transition
    pub fn fault(&mut self) -> bool {
        self.pending = None;
        self.retired = 0;
        self.stack.clear();
        let transition = self.state != State::Faulted;
        self.state = State::Faulted;
        transition
    }

    /// Park at the instruction at the given address
    pub fn park(&mut self, pc: u64, insn: Instruction, state: State) {
        self.state = state;
        self.pc = pc;
        self.pending = Some(insn);
    }

    /// Mnemonic of the pending instruction, for diagnostics
    pub fn pending_name(&self) -> &'static str {
        self.pending.map(|i| i.mnemonic()).unwrap_or("nothing")
    }
}
