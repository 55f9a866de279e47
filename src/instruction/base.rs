// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Base instruction set
//!
//! This module provides definitions for representing RISC-V base instruction
//! set variants such as `RV32I`.

/// RISC-V base instruction set variant
///
/// The RISC-V specification(s) define a small set of base instruction sets,
/// such as `RV32I`, and various extensions (such as `M` or `C`). An encoding
/// of any given instruction does not differ between sets of extensions
/// supported, but it may differ between base instruction sets. For example,
/// `0x2001` is `c.jal` on `RV32I` but `c.addiw` on `RV64I`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Set {
    Rv32I,
    #[default]
    Rv64I,
}

impl Set {
    /// Width of an address (or `XLEN`) in bits
    pub fn address_bits(self) -> u8 {
        match self {
            Self::Rv32I => 32,
            Self::Rv64I => 64,
        }
    }

    pub(super) fn is_rv64(self) -> bool {
        self == Self::Rv64I
    }
}
