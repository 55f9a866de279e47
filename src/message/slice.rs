// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Slice level field decoding
//!
//! Each byte of trace data is a slice carrying six bits of message data
//! (MDO) in bits 7 to 2 and two bits of framing information (MSEO) in bits 1
//! and 0. Fields are packed LSB first into the MDO bits of consecutive slices.

use super::error::FieldError;

/// Number of data bits per slice
pub const MDO_BITS: u8 = 6;

/// Slice continues the current field
pub const MSEO_NORMAL: u8 = 0b00;
/// Slice ends a variable field
pub const MSEO_END_FIELD: u8 = 0b01;
/// Reserved
pub const MSEO_RESERVED: u8 = 0b10;
/// Slice ends a message
pub const MSEO_END_MESSAGE: u8 = 0b11;

/// Slice sent between messages in the absence of trace data
pub const IDLE: u8 = MSEO_END_MESSAGE;

/// Retrieve the MSEO bits of a slice
pub const fn mseo(slice: u8) -> u8 {
    slice & 0b11
}

/// Retrieve the MDO bits of a slice
pub const fn mdo(slice: u8) -> u8 {
    slice >> 2
}

/// Decoder for the fields of a single message
///
/// The decoder operates on the slices of exactly one message, the last of
/// which carries an end of message marker.
#[derive(Clone, Debug)]
pub struct Decoder<'d> {
    slices: &'d [u8],
    index: usize,
    bit: u8,
}

impl<'d> Decoder<'d> {
    /// Create a new decoder for the slices of one message
    pub fn new(slices: &'d [u8]) -> Self {
        Self {
            slices,
            index: 0,
            bit: 0,
        }
    }

    /// Read a fixed width field
    ///
    /// The field may span multiple slices, but it may not cross the end of a
    /// variable field or message.
    pub fn read_fixed(&mut self, bits: u8) -> Result<u64, FieldError> {
        let mut value = 0u64;
        let mut extracted = 0;
        while extracted < bits {
            if self.bit == MDO_BITS {
                if mseo(self.current()?) != MSEO_NORMAL {
                    return Err(FieldError::Boundary);
                }
                self.next_slice()?;
            }
            let take = (MDO_BITS - self.bit).min(bits - extracted);
            let chunk = (mdo(self.current()?) >> self.bit) & ((1 << take) - 1);
            value |= u64::from(chunk) << extracted;
            extracted += take;
            self.bit += take;
        }
        Ok(value)
    }

    /// Read a variable width field
    ///
    /// The field starts at the current bit or, if the current slice is
    /// exhausted, at the next one. It extends to the end of the first slice
    /// marking the end of a field or message.
    pub fn read_var(&mut self) -> Result<u64, FieldError> {
        if self.bit == MDO_BITS {
            if mseo(self.current()?) == MSEO_END_MESSAGE {
                return Err(FieldError::MissingField);
            }
            self.next_slice()?;
        }

        let mut value = 0u64;
        let mut extracted = 0u32;
        loop {
            let slice = self.current()?;
            let chunk = u64::from(mdo(slice) >> self.bit);
            if extracted < u64::BITS {
                value |= chunk << extracted;
                if (chunk << extracted) >> extracted != chunk {
                    return Err(FieldError::Oversized);
                }
            } else if chunk != 0 {
                return Err(FieldError::Oversized);
            }
            extracted += u32::from(MDO_BITS - self.bit);
            self.bit = MDO_BITS;

            if mseo(slice) != MSEO_NORMAL {
                return Ok(value);
            }
            self.next_slice()?;
        }
    }

    /// Determine whether the message holds more fields
    pub fn has_more(&self) -> bool {
        match self.slices.get(self.index) {
            Some(s) if self.bit == MDO_BITS => {
                mseo(*s) != MSEO_END_MESSAGE && self.index + 1 < self.slices.len()
            }
            Some(_) => true,
            None => false,
        }
    }

    fn current(&self) -> Result<u8, FieldError> {
        self.slices
            .get(self.index)
            .copied()
            .ok_or(FieldError::MissingField)
    }

    fn next_slice(&mut self) -> Result<(), FieldError> {
        self.index += 1;
        self.bit = 0;
        self.current().map(|_| ())
    }
}
