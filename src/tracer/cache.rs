// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use crate::image::Correlation;
use crate::instruction::Instruction;

/// Disassembled and correlated instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub instruction: Instruction,
    pub correlation: Correlation,
}

/// A cache for [`Entry`]s
pub trait InstructionCache {
    /// Store an [`Entry`] in the cache
    ///
    /// If the cache is full, this operation may evict other entries.
    fn store(&mut self, addr: u64, entry: Entry);

    /// Retrieve an [`Entry`] by address
    fn get(&self, addr: u64) -> Option<&Entry>;
}

/// Direct mapped [`InstructionCache`] with `N` slots
#[derive(Clone, Debug)]
pub struct DirectMappedCache<const N: usize> {
    slots: Vec<Option<(u64, Entry)>>,
}

impl<const N: usize> DirectMappedCache<N> {
    fn slot(addr: u64) -> usize {
        // Instructions are at least 16bit aligned
        ((addr >> 1) as usize).checked_rem(N).unwrap_or_default()
    }
}

impl<const N: usize> Default for DirectMappedCache<N> {
    fn default() -> Self {
        Self {
            slots: vec![None; N],
        }
    }
}

impl<const N: usize> InstructionCache for DirectMappedCache<N> {
    fn store(&mut self, addr: u64, entry: Entry) {
        if let Some(slot) = self.slots.get_mut(Self::slot(addr)) {
            *slot = Some((addr, entry));
        }
    }

    fn get(&self, addr: u64) -> Option<&Entry> {
        self.slots
            .get(Self::slot(addr))?
            .as_ref()
            .filter(|(a, _)| *a == addr)
            .map(|(_, e)| e)
    }
}

/// [`InstructionCache`] which never stores anything
#[derive(Copy, Clone, Debug, Default)]
pub struct NoCache;

impl InstructionCache for NoCache {
    fn store(&mut self, _: u64, _: Entry) {}

    fn get(&self, _: u64) -> Option<&Entry> {
        None
    }
}
