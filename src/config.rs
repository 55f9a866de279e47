// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Configuration and utilities
//!
//! The [`Configuration`] of a [`Session`][crate::session::Session] can be
//! deserialized from any format supported by `serde`. All fields are
//! optional and fall back to their default values. A TOML configuration may
//! look like this:
//!
//! ```toml
//! print_buffer_limit = 1024
//! print_channels = "0x3"
//! core_mask = 1
//! src_bits = 2
//! timestamp_width = 40
//! frequency = 100000000
//! address_width = { fixed = 32 }
//! return_stack = 16
//!
//! [verbosity]
//! source = false
//!
//! [source_path]
//! strip = "/build/firmware"
//! replace = "/home/user/firmware"
//! ```

pub mod serde_utils;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use crate::message::{DEFAULT_TIMESTAMP_WIDTH, MAX_SRC_BITS};
use crate::tracer::{DEFAULT_MAX_RUN, MAX_RETURN_STACK};

/// Configuration of a reconstruction session
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Configuration {
    /// Number of bytes after which a print line is finalized as incomplete
    pub print_buffer_limit: usize,
    /// Stimulus channels treated as print output
    pub print_channels: Mask,
    /// What to include when rendering records
    pub verbosity: Verbosity,
    /// Number of digits for rendering addresses
    pub address_width: AddressWidth,
    /// Cores for which instructions are reconstructed
    pub core_mask: Mask,
    /// Width of the core id in message headers
    pub src_bits: u8,
    /// Width of timestamps in bits
    pub timestamp_width: u8,
    /// Timestamp frequency in Hz, for converting timestamps to seconds
    pub frequency: Option<u32>,
    /// Maximum number of instructions reconstructed without trace evidence
    pub max_run: u64,
    /// Depth of the per-core return address stack
    ///
    /// A non-zero depth enables implicit returns: function returns are
    /// resolved from the stack instead of waiting for an indirect branch
    /// message.
    pub return_stack: usize,
    /// Substitution applied to source file paths before reading them
    pub source_path: Option<PathSubstitution>,
}

impl Configuration {
    /// Check whether all values are in their valid ranges
    pub fn validate(&self) -> Result<(), Error> {
        if self.print_buffer_limit == 0 {
            return Err(Error::PrintBufferLimit);
        }
        if self.src_bits > MAX_SRC_BITS {
            return Err(Error::SrcBits(self.src_bits));
        }
        if !(1..=64).contains(&self.timestamp_width) {
            return Err(Error::TimestampWidth(self.timestamp_width));
        }
        if let AddressWidth::Fixed(bits) = self.address_width {
            if !(1..=64).contains(&bits) {
                return Err(Error::AddressWidth(bits));
            }
        }
        if self.frequency == Some(0) {
            return Err(Error::Frequency);
        }
        if self.max_run == 0 {
            return Err(Error::MaxRun);
        }
        if self.return_stack > MAX_RETURN_STACK {
            return Err(Error::ReturnStack(self.return_stack));
        }
        Ok(())
    }

    /// Convert a timestamp to seconds, if a frequency is configured
    pub fn seconds(&self, timestamp: u64) -> Option<f64> {
        self.frequency
            .map(|f| timestamp as f64 / f64::from(f))
    }
}

/// See [`DEFAULT`] for default values of individual fields
impl Default for Configuration {
    fn default() -> Self {
        DEFAULT
    }
}

/// Default [`Configuration`]
pub const DEFAULT: Configuration = Configuration {
    print_buffer_limit: 4096,
    print_channels: Mask::ALL,
    verbosity: Verbosity::ALL,
    address_width: AddressWidth::Auto,
    core_mask: Mask::ALL,
    src_bits: 0,
    timestamp_width: DEFAULT_TIMESTAMP_WIDTH,
    frequency: None,
    max_run: DEFAULT_MAX_RUN,
    return_stack: 0,
    source_path: None,
};

/// Set of indices, e.g. of cores or channels
///
/// Indices beyond `63` are only contained in a mask with all bits set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Mask(pub u64);

impl Mask {
    /// Mask containing all indices
    pub const ALL: Self = Self(u64::MAX);

    /// Determine whether the given index is part of this mask
    pub fn contains(self, index: u16) -> bool {
        match 1u64.checked_shl(index.into()) {
            Some(bit) => self.0 & bit != 0,
            None => self == Self::ALL,
        }
    }
}

impl Default for Mask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Elements to include when rendering records
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Verbosity {
    pub address: bool,
    pub instruction: bool,
    pub source: bool,
    /// Text of the source line, if the source file can be read
    pub text: bool,
}

impl Verbosity {
    /// Include everything
    pub const ALL: Self = Self {
        address: true,
        instruction: true,
        source: true,
        text: true,
    };
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::ALL
    }
}

/// Prefix substitution for source file paths
///
/// Debug information usually refers to the paths of the machine the program
/// was built on. Paths starting with `strip` have that prefix replaced by
/// `replace`. Other paths are used as they are.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct PathSubstitution {
    pub strip: String,
    pub replace: String,
}

impl PathSubstitution {
    /// Apply the substitution to a path
    pub fn apply(&self, path: &str) -> PathBuf {
        match path.strip_prefix(self.strip.as_str()) {
            Some(rest) => {
                let rest = rest.trim_start_matches(['/', '\\']);
                PathBuf::from(&self.replace).join(rest)
            }
            None => PathBuf::from(path),
        }
    }
}

/// Width of rendered addresses
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressWidth {
    /// Derive the width from the highest address of the image
    #[default]
    Auto,
    /// Fixed number of bits
    Fixed(u8),
}

/// Invalid configuration values
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("print buffer limit must not be zero")]
    PrintBufferLimit,
    #[error("core id width {0} exceeds 16 bits")]
    SrcBits(u8),
    #[error("timestamp width {0} is not in 1..=64")]
    TimestampWidth(u8),
    #[error("address width {0} is not in 1..=64")]
    AddressWidth(u8),
    #[error("frequency must not be zero")]
    Frequency,
    #[error("maximum run length must not be zero")]
    MaxRun,
    #[error("return stack depth {0} exceeds {MAX_RETURN_STACK}")]
    ReturnStack(usize),
}
