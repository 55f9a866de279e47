// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Message encoder

use super::Raw;
use super::slice::{IDLE, MDO_BITS, MSEO_END_FIELD, MSEO_END_MESSAGE, MSEO_NORMAL};
use super::tcode::Field;

/// An encoder for [`Raw`] messages
///
/// The encoder produces slices in the format consumed by
/// [`Reader`][super::Reader]s. Fields of a message beyond the mandatory ones
/// defined by its [`TCode`][super::TCode]'s layout are encoded as variable
/// fields. Messages which are never reconstructed have all their fields
/// encoded as variable fields.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    data: Vec<u8>,
    src_bits: u8,
    current: u8,
    bit: u8,
}

impl Encoder {
    /// Create a new encoder
    pub(super) fn new(src_bits: u8) -> Self {
        Self {
            src_bits,
            ..Default::default()
        }
    }

    /// Encode one message
    pub fn encode(&mut self, message: &Raw) -> &mut Self {
        self.write_fixed(u8::from(message.tcode).into(), MDO_BITS);
        self.write_fixed(message.core.into(), self.src_bits);

        let layout = message.tcode.layout().unwrap_or_default();
        let count = message.fields.len();
        for (i, value) in message.fields.iter().enumerate() {
            match layout.get(i) {
                Some(Field::Fixed(bits)) => self.write_fixed(*value, *bits),
                _ => self.write_var(*value, i + 1 == count),
            }
        }
        if self.bit > 0 {
            self.flush(MSEO_END_MESSAGE);
        }
        self
    }

    /// Emit a number of idle slices
    pub fn idle(&mut self, count: usize) -> &mut Self {
        self.data.extend(core::iter::repeat_n(IDLE, count));
        self
    }

    /// Append raw bytes
    ///
    /// This allows constructing corrupted trace data for testing purposes.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Finish the encoding process, returning the encoded data
    pub fn finish(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.data)
    }

    fn write_fixed(&mut self, mut value: u64, mut bits: u8) {
        while bits > 0 {
            if self.bit == MDO_BITS {
                self.flush(MSEO_NORMAL);
            }
            let take = (MDO_BITS - self.bit).min(bits);
            self.current |= ((value & ((1 << take) - 1)) as u8) << self.bit;
            self.bit += take;
            value >>= take;
            bits -= take;
        }
    }

    fn write_var(&mut self, mut value: u64, last: bool) {
        if self.bit == MDO_BITS {
            self.flush(MSEO_NORMAL);
        }
        loop {
            let take = MDO_BITS - self.bit;
            self.current |= ((value & ((1 << take) - 1)) as u8) << self.bit;
            value >>= take;
            self.bit = MDO_BITS;
            if value == 0 {
                self.flush(if last { MSEO_END_MESSAGE } else { MSEO_END_FIELD });
                return;
            }
            self.flush(MSEO_NORMAL);
        }
    }

    fn flush(&mut self, mseo: u8) {
        self.data.push((self.current << 2) | mseo);
        self.current = 0;
        self.bit = 0;
    }
}
