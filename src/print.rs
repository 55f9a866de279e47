// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Reassembly of instrumented print output
//!
//! Programs may print text by writing to stimulus channels. The trace carries
//! the written bytes as [`Fragment`]s, which the [`Assembler`] collects into
//! [`PrintLine`]s. Each core and channel has its own buffer, so output of
//! different channels never mixes.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use crate::message::Fragment;

/// Collects [`Fragment`]s into [`PrintLine`]s
#[derive(Clone, Debug)]
pub struct Assembler {
    limit: usize,
    buffers: BTreeMap<(u16, u8), Buffer>,
}

impl Assembler {
    /// Create a new assembler
    ///
    /// A line is finalized as incomplete once its buffer holds `limit` or more
    /// bytes. Lines may thus exceed the limit by less than the size of one
    /// fragment.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            buffers: Default::default(),
        }
    }

    /// Feed a fragment, returning a line if it was finalized
    pub fn feed(&mut self, fragment: &Fragment) -> Option<PrintLine> {
        let key = (fragment.core, fragment.channel);
        let buffer = self.buffers.entry(key).or_default();
        if buffer.text.is_empty() {
            if fragment.data.is_empty() {
                return None;
            }
            buffer.start = fragment.timestamp;
        }
        buffer.text.extend_from_slice(&fragment.data);
        buffer.last = fragment.timestamp;

        if fragment.terminator {
            Some(buffer.finalize(key, fragment.timestamp, true))
        } else if buffer.text.len() >= self.limit {
            Some(buffer.finalize(key, fragment.timestamp, false))
        } else {
            None
        }
    }

    /// Finalize all non-empty buffers as incomplete lines
    ///
    /// Lines are ordered by core and channel. A drained line ends with the
    /// timestamp of its last fragment.
    pub fn drain_all(&mut self) -> Vec<PrintLine> {
        let lines = self
            .buffers
            .iter_mut()
            .filter(|(_, b)| !b.text.is_empty())
            .map(|(key, b)| {
                let end = b.last;
                b.finalize(*key, end, false)
            })
            .collect();
        self.buffers.clear();
        lines
    }

    /// Determine whether any buffer holds unfinished text
    pub fn is_empty(&self) -> bool {
        self.buffers.values().all(|b| b.text.is_empty())
    }
}

#[derive(Clone, Debug, Default)]
struct Buffer {
    text: Vec<u8>,
    start: u64,
    last: u64,
}

impl Buffer {
    fn finalize(&mut self, (core, channel): (u16, u8), end: u64, complete: bool) -> PrintLine {
        let text = core::mem::take(&mut self.text);
        PrintLine {
            core,
            channel,
            text: String::from_utf8_lossy(&text).into_owned(),
            start: self.start,
            end,
            complete,
        }
    }
}

/// A line of print output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrintLine {
    pub core: u16,
    pub channel: u8,
    /// Text including the trailing newline, if any
    pub text: String,
    /// Timestamp of the first fragment
    pub start: u64,
    /// Timestamp of the finalizing fragment
    pub end: u64,
    /// Whether the line was terminated explicitly
    pub complete: bool,
}

impl PrintLine {
    /// Retrieve the text without line terminator
    pub fn trimmed(&self) -> &str {
        self.text
            .strip_suffix('\n')
            .map(|t| t.strip_suffix('\r').unwrap_or(t))
            .unwrap_or(&self.text)
    }

    /// Retrieve start and end of this line in seconds
    pub fn seconds(&self, frequency: u32) -> (f64, f64) {
        let f = f64::from(frequency);
        (self.start as f64 / f, self.end as f64 / f)
    }
}
