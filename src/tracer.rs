// Copyright (C) 2024, 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Tracing logic
//!
//! This module provides the [`Tracer`], which replays the control flow
//! described by trace [`Message`]s against the instructions of an
//! [`ObjectImage`], generating [`Record`]s of retired instructions.

pub mod cache;
pub mod error;
pub mod item;
pub mod stack;
pub mod state;

#[cfg(test)]
mod tests;

pub use item::{Flow, Record};
pub use state::State;

use std::collections::BTreeMap;

use crate::config::Mask;
use crate::error::Error as CrateError;
use crate::image::ObjectImage;
use crate::instruction::info::Info;
use crate::message::{Message, Payload};

use cache::{DirectMappedCache, Entry, InstructionCache};
use error::Error;
use state::Core;

/// Default maximum number of instructions reconstructed for a single message
pub const DEFAULT_MAX_RUN: u64 = 1_000_000;

/// Maximum depth of return address stacks
pub const MAX_RETURN_STACK: usize = 4096;

/// Create a new [`Builder`] for [`Tracer`]s
pub fn builder() -> Builder {
    Default::default()
}

/// Tracer
///
/// A tracer keeps one [`State`] per core. Each core starts
/// [`Unsynced`][State::Unsynced] and is seeded with its first sync message.
/// It then reconstructs instructions up to the next one requiring trace
/// evidence, i.e. a conditional branch or an uninferable discontinuity, and
/// waits in [`Branching`][State::Branching] for the message resolving it.
/// Inferable jumps are followed without evidence. A core stopping at a jump
/// to itself stays [`Synced`][State::Synced]: no evidence is required, but
/// only the next message tells where execution continues.
///
/// Messages carrying an instruction count (see [`Payload`]) are checked
/// against the instructions reconstructed since the previous counted message.
/// A conditional branch the count extends beyond was not taken, and a self
/// jump the count extends beyond was repeated. The message resolves the
/// instruction at which the count ends.
///
/// With a non-zero [return stack depth][Builder::with_return_stack], return
/// addresses of calls are recorded and function returns are resolved without
/// trace evidence, as long as the stack is not empty.
///
/// If the trace disagrees with the image, the core becomes
/// [`Faulted`][State::Faulted] until the next sync message.
///
/// # Example
///
/// ```
/// use riscv_nexus::image::{ObjectImage, Section, Symbol};
/// use riscv_nexus::instruction::base;
/// use riscv_nexus::message::{Message, Payload};
/// use riscv_nexus::tracer;
///
/// // addi a0, a0, 1; beq x0, x0, 0
/// let code = [0x13, 0x05, 0x15, 0x00, 0x63, 0x00, 0x00, 0x00];
/// let image = ObjectImage::builder(base::Set::Rv32I)
///     .section(Section::new(".text", 0x80, code.to_vec(), true))
///     .symbol(Symbol::function("main", 0x80, 8))
///     .build();
/// let mut tracer = tracer::builder().build(&image);
///
/// let sync = Message {
///     core: 0,
///     timestamp: 0,
///     payload: Payload::Sync { address: 0x80, i_cnt: 0 },
/// };
/// let records = tracer.process(&sync).unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(tracer.state(0), tracer::State::Branching);
/// ```
pub struct Tracer<'i, C = DirectMappedCache<1024>> {
    image: &'i ObjectImage,
    cache: C,
    cores: BTreeMap<u16, Core>,
    core_mask: Mask,
    max_run: u64,
    return_stack: usize,
    address_mask: u64,
    partial: Vec<Record>,
}

impl<'i, C: InstructionCache> Tracer<'i, C> {
    /// Process a [`Message`]
    ///
    /// Returns the [`Record`]s of all instructions reconstructed due to the
    /// message. Messages of cores not selected by the core mask are ignored.
    ///
    /// If the trace disagrees with the image, the core becomes
    /// [`Faulted`][State::Faulted] and an
    /// [`UnexpectedEncoding`][CrateError::UnexpectedEncoding] is returned.
    /// Records reconstructed before the disagreement was detected are kept
    /// and may be retrieved via [`take_partial`][Self::take_partial].
    pub fn process(&mut self, message: &Message) -> Result<Vec<Record>, CrateError> {
        let id = message.core;
        if !self.core_mask.contains(id) {
            return Ok(Default::default());
        }
        let mut records = Vec::new();
        match self.step(id, message, &mut records) {
            Ok(()) => Ok(records),
            Err(err) => {
                self.core(id).fault();
                tracing::warn!(core = id, error = %err, records = records.len(), "core faulted");
                self.partial.append(&mut records);
                Err(err)
            }
        }
    }

    /// Take records reconstructed before the last failing [`process`][Self::process]
    pub fn take_partial(&mut self) -> Vec<Record> {
        core::mem::take(&mut self.partial)
    }

    /// Move a core to [`State::Faulted`]
    ///
    /// If `core` is `None`, all known cores are faulted. Returns the number of
    /// cores which were not already faulted.
    pub fn fault(&mut self, core: Option<u16>) -> usize {
        match core {
            Some(id) if self.core_mask.contains(id) => usize::from(self.core(id).fault()),
            Some(_) => 0,
            None => self
                .cores
                .values_mut()
                .map(Core::fault)
                .filter(|t| *t)
                .count(),
        }
    }

    /// Retrieve the [`State`] of a core
    pub fn state(&self, core: u16) -> State {
        self.cores.get(&core).map(|c| c.state).unwrap_or_default()
    }

    /// Retrieve the number of return addresses on a core's stack
    pub fn stack_depth(&self, core: u16) -> usize {
        self.cores.get(&core).map(|c| c.stack.depth()).unwrap_or_default()
    }

    /// Reset all cores to [`State::Unsynced`]
    pub fn reset(&mut self) {
        self.cores.clear();
        self.partial.clear();
    }

    fn core(&mut self, id: u16) -> &mut Core {
        let depth = self.return_stack;
        self.cores.entry(id).or_insert_with(|| Core::new(depth))
    }

    /// Process a message for a selected core, collecting records
    fn step(
        &mut self,
        id: u16,
        message: &Message,
        records: &mut Vec<Record>,
    ) -> Result<(), CrateError> {
        let timestamp = message.timestamp;
        let state = self.core(id).state;
        let pc = match (&message.payload, state) {
            (Payload::Error { .. }, _) => {
                let depth = self.return_stack;
                *self.core(id) = Core::new(depth);
                return Ok(());
            }
            (Payload::Timestamp | Payload::PrintFragment(_), _) => return Ok(()),
            (Payload::Sync { address, .. }, State::Unsynced | State::Faulted) => {
                tracing::debug!(core = id, address, previous = %state, "sync");
                *address
            }
            (_, State::Unsynced | State::Faulted) => return Ok(()),
            (Payload::Sync { address, i_cnt }, _) => {
                if let Err(err) = self.retire(id, *i_cnt, timestamp, records) {
                    tracing::debug!(core = id, error = %err, address, "resynchronizing");
                }
                *address
            }
            (Payload::Exception { address, i_cnt }, _) => {
                self.retire(id, *i_cnt, timestamp, records)?;
                *address
            }
            (Payload::DirectBranch { taken, i_cnt }, _) => {
                self.retire(id, *i_cnt, timestamp, records)?;
                let core = &*self.core(id);
                core.pending
                    .filter(|_| core.state == State::Branching)
                    .and_then(|i| i.kind.branch_target().map(|t| (i, t)))
                    .map(|(insn, target)| {
                        if *taken {
                            core.pc.wrapping_add_signed(target.into())
                        } else {
                            core.pc.wrapping_add(insn.size().into())
                        }
                    })
                    .ok_or_else(|| unexpected_evidence(core, message))?
            }
            (Payload::IndirectBranch { target, i_cnt }, _) => {
                self.retire(id, *i_cnt, timestamp, records)?;
                let core = &*self.core(id);
                core.pending
                    .filter(|i| core.state == State::Branching && i.kind.is_uninferable_discon())
                    .map(|_| *target)
                    .ok_or_else(|| unexpected_evidence(core, message))?
            }
        };

        // Outcomes expanded from branch history are covered by a later count
        if !matches!(message.payload, Payload::DirectBranch { i_cnt: 0, .. }) {
            self.core(id).retired = 0;
        }
        self.run(id, pc & self.address_mask, timestamp, records)
    }

    /// Retire instructions up to the end of an instruction count
    ///
    /// Cores parked within the count continue: conditional branches are not
    /// taken and self jumps are repeated. Afterwards, the count must end
    /// exactly at the instruction the core is parked at.
    fn retire(
        &mut self,
        id: u16,
        i_cnt: u64,
        timestamp: u64,
        records: &mut Vec<Record>,
    ) -> Result<(), CrateError> {
        if i_cnt == 0 {
            return Ok(());
        }
        loop {
            let core = self.core(id);
            if core.retired >= i_cnt {
                break;
            }
            let next = match (core.state, core.pending) {
                (State::Branching, Some(insn)) if insn.kind.is_branch() => {
                    core.pc.wrapping_add(insn.size().into())
                }
                (State::Synced, Some(_)) => core.pc,
                _ => break,
            };
            self.run(id, next & self.address_mask, timestamp, records)?;
        }

        let core = self.core(id);
        if core.retired == i_cnt {
            Ok(())
        } else {
            Err(CrateError::UnexpectedEncoding {
                address: core.pc,
                cause: Error::CountMismatch {
                    i_cnt,
                    retired: core.retired,
                }
                .into(),
            })
        }
    }

    /// Reconstruct instructions starting at `pc` up to the next one requiring
    /// evidence
    ///
    /// On success, the core is parked at the last instruction.
    fn run(
        &mut self,
        id: u16,
        mut pc: u64,
        timestamp: u64,
        records: &mut Vec<Record>,
    ) -> Result<(), CrateError> {
        let mask = self.address_mask;
        loop {
            if records.len() as u64 >= self.max_run {
                return Err(CrateError::UnexpectedEncoding {
                    address: pc,
                    cause: Error::RunLimit(self.max_run).into(),
                });
            }
            let entry = self.entry(pc)?;
            let insn = entry.instruction;
            let kind = insn.kind;
            records.push(Record::new(id, pc, timestamp, entry));

            let size = u64::from(insn.size());
            let after = pc.wrapping_add(size) & mask;
            let core = self.core(id);
            core.retired += size / 2;

            let implicit = if kind.is_return() || kind.is_swap() {
                core.stack.pop()
            } else {
                None
            };
            if kind.is_call() || kind.is_swap() {
                core.stack.push(after);
            }
            if let Some(target) = implicit {
                pc = target & mask;
                continue;
            }

            if kind.is_branch() || kind.is_uninferable_discon() {
                core.park(pc, insn, State::Branching);
                return Ok(());
            }
            let next = match kind.inferable_jump_target() {
                Some((target, true)) => (i64::from(target) as u64) & !1,
                Some((target, false)) => pc.wrapping_add_signed(target.into()),
                None => after,
            } & mask;
            if next == pc {
                // Jump to itself, e.g. while waiting for an interrupt
                core.park(pc, insn, State::Synced);
                return Ok(());
            }
            pc = next;
        }
    }

    fn entry(&mut self, address: u64) -> Result<Entry, CrateError> {
        if let Some(entry) = self.cache.get(address) {
            return Ok(entry.clone());
        }
        let entry = Entry {
            instruction: self.image.disassemble_at(address)?,
            correlation: self.image.lookup(address),
        };
        self.cache.store(address, entry.clone());
        Ok(entry)
    }
}

/// Create the error for a message not resolving the instruction a core is
/// parked at
fn unexpected_evidence(core: &Core, message: &Message) -> CrateError {
    CrateError::UnexpectedEncoding {
        address: core.pc,
        cause: Error::UnexpectedEvidence {
            evidence: message.kind(),
            pending: core.pending_name(),
        }
        .into(),
    }
}

/// Builder for [`Tracer`]s
#[derive(Copy, Clone, Debug)]
pub struct Builder {
    core_mask: Mask,
    max_run: u64,
    return_stack: usize,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            core_mask: Mask::ALL,
            max_run: DEFAULT_MAX_RUN,
            return_stack: 0,
        }
    }
}

impl Builder {
    /// Create a new builder
    pub fn new() -> Self {
        Default::default()
    }

    /// Only reconstruct instructions of cores in the given [`Mask`]
    pub fn with_core_mask(self, core_mask: Mask) -> Self {
        Self { core_mask, ..self }
    }

    /// Set the maximum number of instructions reconstructed for one message
    pub fn with_max_run(self, max_run: u64) -> Self {
        Self { max_run, ..self }
    }

    /// Set the depth of each core's return address stack
    ///
    /// A depth of `0`, the default, disables implicit returns. Depths beyond
    /// [`MAX_RETURN_STACK`] are clamped.
    pub fn with_return_stack(self, depth: usize) -> Self {
        Self {
            return_stack: depth.min(MAX_RETURN_STACK),
            ..self
        }
    }

    /// Build a [`Tracer`] for the given image
    pub fn build(self, image: &ObjectImage) -> Tracer<'_> {
        self.build_with_cache(image, Default::default())
    }

    /// Build a [`Tracer`] using a specific [`InstructionCache`]
    pub fn build_with_cache<C: InstructionCache>(
        self,
        image: &ObjectImage,
        cache: C,
    ) -> Tracer<'_, C> {
        let address_mask = u64::MAX >> (u64::BITS - u32::from(image.base().address_bits()));
        Tracer {
            image,
            cache,
            cores: Default::default(),
            core_mask: self.core_mask,
            max_run: self.max_run,
            return_stack: self.return_stack,
            address_mask,
            partial: Default::default(),
        }
    }
}
