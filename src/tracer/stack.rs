// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Return address stack for implicit returns

use std::collections::VecDeque;

/// Return address stack
///
/// A stack of return addresses with a fixed maximum depth. Pushing onto a
/// full stack evicts the bottom address, which will then no longer be
/// obtainable via [`pop`][Self::pop]. A stack with a maximum depth of zero
/// never holds any address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReturnStack {
    data: VecDeque<u64>,
    max_depth: usize,
}

impl ReturnStack {
    /// Create a new, empty return stack with the given maximum depth
    pub fn new(max_depth: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(max_depth),
            max_depth,
        }
    }

    /// Push a return address
    pub fn push(&mut self, addr: u64) {
        if self.max_depth == 0 {
            return;
        }
        if self.data.len() == self.max_depth {
            self.data.pop_front();
        }
        self.data.push_back(addr);
    }

    /// Retrieve and remove the topmost return address
    pub fn pop(&mut self) -> Option<u64> {
        self.data.pop_back()
    }

    /// Get the current stack depth
    pub fn depth(&self) -> usize {
        self.data.len()
    }

    /// Get the maximum stack depth
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Remove all addresses
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
