// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Session statistics


use core::fmt;
use std::collections::BTreeMap;

use crate::message::Kind;
use crate::tracer::Record;

/// Accumulator for [`SessionStats`]
///
/// All operations are purely additive.
#[derive(Clone, Debug, Default)]
pub struct Stats {
    stats: SessionStats,
}

impl Stats {
    /// Count a message of the given [`Kind`]
    pub fn record_message(&mut self, kind: Kind) {
        *self.stats.messages.entry(kind).or_default() += 1;
    }

    /// Observe the running timestamp of a message
    pub fn record_timestamp(&mut self, timestamp: u64) {
        let stats = &mut self.stats;
        stats.first_timestamp.get_or_insert(timestamp);
        stats.last_timestamp = Some(timestamp);
    }

    /// Count a reconstructed instruction
    pub fn record_instruction(&mut self, record: &Record) {
        let stats = &mut self.stats;
        stats.instructions += 1;
        *stats.instructions_per_core.entry(record.core).or_default() += 1;
        if record.source.is_some() {
            stats.resolved += 1;
        } else {
            stats.correlation_misses += 1;
        }
    }

    /// Count a message which could not be decoded
    pub fn record_decode_error(&mut self) {
        self.stats.decode_errors += 1;
    }

    /// Count a message not used for reconstruction
    pub fn record_unsupported(&mut self) {
        self.stats.unsupported += 1;
    }

    /// Count a core's transition to the faulted state
    pub fn record_fault(&mut self) {
        self.stats.faults += 1;
    }

    /// Count a finalized print line
    pub fn record_print_line(&mut self) {
        self.stats.print_lines += 1;
    }

    /// Retrieve a snapshot of the statistics
    pub fn summary(&self) -> SessionStats {
        self.stats.clone()
    }
}

/// Statistics of a reconstruction session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Number of messages per [`Kind`]
    pub messages: BTreeMap<Kind, u64>,
    /// Number of reconstructed instructions
    pub instructions: u64,
    pub instructions_per_core: BTreeMap<u16, u64>,
    /// Instructions with a source location
    pub resolved: u64,
    /// Instructions without a source location
    pub correlation_misses: u64,
    pub decode_errors: u64,
    pub unsupported: u64,
    /// Number of transitions of any core to the faulted state
    pub faults: u64,
    pub print_lines: u64,
    pub first_timestamp: Option<u64>,
    pub last_timestamp: Option<u64>,
}

impl SessionStats {
    /// Retrieve the number of messages of the given [`Kind`]
    pub fn messages(&self, kind: Kind) -> u64 {
        self.messages.get(&kind).copied().unwrap_or_default()
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "messages:")?;
        for kind in Kind::ALL {
            let count = self.messages(kind);
            if count != 0 {
                writeln!(f, "  {kind}: {count}")?;
            }
        }
        writeln!(
            f,
            "instructions: {} (resolved: {}, correlation misses: {})",
            self.instructions, self.resolved, self.correlation_misses
        )?;
        for (core, count) in &self.instructions_per_core {
            writeln!(f, "  core {core}: {count}")?;
        }
        writeln!(f, "decode errors: {}", self.decode_errors)?;
        writeln!(f, "unsupported messages: {}", self.unsupported)?;
        writeln!(f, "fault transitions: {}", self.faults)?;
        writeln!(f, "print lines: {}", self.print_lines)?;
        if let Some((first, last)) = self.first_timestamp.zip(self.last_timestamp) {
            writeln!(f, "timestamps: {first}..{last}")?;
        }
        Ok(())
    }
}
