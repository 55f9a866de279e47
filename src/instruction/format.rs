// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Variable instruction fields
//!
//! This module provides data types holding the variable fields of the
//! instruction encoding variants defined in The RISC-V Instruction Set Manual
//! Volume I, sections 2.2 "Base Instruction Formats" and 2.3 "Immediate
//! Encoding Variants". Each type comes with a [`From`] impl extracting the
//! fields from an instruction represented as an [`u32`]. Some types also impl
//! `From<u16>` for the compressed formats they correspond to.
//!
//! Immediates are stored as their values, not as the bit patterns found in
//! the encoded instruction.

use core::fmt;

/// Variable fields in R-type and CR-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeR {
    /// Destination register
    pub rd: Register,
    /// Source register 1
    pub rs1: Register,
    /// Source register 2
    pub rs2: Register,
}

impl From<u32> for TypeR {
    fn from(insn: u32) -> Self {
        Self {
            rd: rd_from(insn),
            rs1: rs1_from(insn),
            rs2: rs2_from(insn),
        }
    }
}

/// Extract fields from a CR-type instruction
///
/// The destination register doubles as source register 1.
impl From<u16> for TypeR {
    fn from(insn: u16) -> Self {
        let rd = rd_from(insn.into());
        Self {
            rd,
            rs1: rd,
            rs2: (insn >> 2) as u8 & REG_MASK,
        }
    }
}

/// Variable fields in I-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeI {
    /// Destination register
    pub rd: Register,
    /// Source register 1
    pub rs1: Register,
    /// Immediate, sign-extended from 12 bits
    pub imm: i16,
}

impl From<u32> for TypeI {
    fn from(insn: u32) -> Self {
        Self {
            rd: rd_from(insn),
            rs1: rs1_from(insn),
            imm: sign_extend(insn >> 20, 11) as i16,
        }
    }
}

/// Extract fields from a CI-type instruction
///
/// The 6 bit immediate is sign-extended and the destination register doubles
/// as source register 1, as for `c.addi`.
impl From<u16> for TypeI {
    fn from(insn: u16) -> Self {
        let insn: u32 = insn.into();
        let imm = ((insn >> 2) & 0x1f) | ((insn >> (12 - 5)) & 0x20);
        let rd = rd_from(insn);
        Self {
            rd,
            rs1: rd,
            imm: sign_extend(imm, 5) as i16,
        }
    }
}

/// Variable fields in S-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeS {
    /// Source register 1
    pub rs1: Register,
    /// Source register 2
    pub rs2: Register,
    /// Immediate, assembled from two fields and sign-extended from 12 bits
    pub imm: i16,
}

impl From<u32> for TypeS {
    fn from(insn: u32) -> Self {
        let imm = ((insn >> 7) & 0x01f) | ((insn >> (25 - 5)) & 0xfe0);
        Self {
            rs1: rs1_from(insn),
            rs2: rs2_from(insn),
            imm: sign_extend(imm, 11) as i16,
        }
    }
}

/// Variable fields in B-type and CB-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeB {
    /// Source register 1
    pub rs1: Register,
    /// Source register 2
    pub rs2: Register,
    /// Immediate
    ///
    /// The lowest bit is not encoded but always `0`. For 32 bit instructions,
    /// the value is in the range `-4096..=4094`, for 16 bit instructions in
    /// `-256..=254`.
    pub imm: i16,
}

impl From<u32> for TypeB {
    fn from(insn: u32) -> Self {
        let imm = ((insn >> 7) & 0x001e)
            | ((insn >> (25 - 5)) & 0x07e0)
            | ((insn << (11 - 7)) & 0x0800)
            | ((insn >> (31 - 12)) & 0x1000);
        Self {
            rs1: rs1_from(insn),
            rs2: rs2_from(insn),
            imm: sign_extend(imm, 12) as i16,
        }
    }
}

impl From<u16> for TypeB {
    fn from(insn: u16) -> Self {
        let insn: u32 = insn.into();
        let imm = ((insn >> (3 - 1)) & 0x006)
            | ((insn >> (10 - 3)) & 0x018)
            | ((insn << (5 - 2)) & 0x020)
            | ((insn << (7 - 6)) & 0x0c0)
            | ((insn >> (12 - 8)) & 0x100);
        Self {
            rs1: compressed_reg(insn >> 7),
            rs2: 0,
            imm: sign_extend(imm, 8) as i16,
        }
    }
}

/// Variable fields in U-type instructions
///
/// This type also holds the destination register and immediate of `c.lui`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeU {
    /// Destination register
    pub rd: Register,
    /// Immediate
    ///
    /// The lower 12 bits are always zero. For 16 bit instructions, the value
    /// is sign-extended from bit 17.
    pub imm: i32,
}

impl From<u32> for TypeU {
    fn from(insn: u32) -> Self {
        Self {
            rd: rd_from(insn),
            imm: (insn & 0xfffff000) as i32,
        }
    }
}

impl From<u16> for TypeU {
    fn from(insn: u16) -> Self {
        let insn: u32 = insn.into();
        let imm = ((insn << (12 - 2)) & 0x0001f000) | ((insn << (17 - 12)) & 0x00020000);
        Self {
            rd: rd_from(insn),
            imm: sign_extend(imm, 17),
        }
    }
}

/// Variable fields in J-type and CJ-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeJ {
    /// Destination register
    ///
    /// For compressed instructions, this is the implicit link register.
    pub rd: Register,
    /// Immediate
    ///
    /// The lowest bit is always `0`. The range is `-1048576..=1048574` for 32
    /// bit and `-2048..=2046` for 16 bit instructions.
    pub imm: i32,
}

impl From<u32> for TypeJ {
    fn from(insn: u32) -> Self {
        let imm = ((insn >> (21 - 1)) & 0x0007fe)
            | ((insn >> (20 - 11)) & 0x000800)
            | (insn & 0x0ff000)
            | ((insn >> (31 - 20)) & 0x100000);
        Self {
            rd: rd_from(insn),
            imm: sign_extend(imm, 20),
        }
    }
}

/// Extract the immediate of a CJ-type instruction
///
/// The link register is set to `x0`, which is correct for `c.j`. Callers
/// decoding `c.jal` need to set it to `x1`.
impl From<u16> for TypeJ {
    fn from(insn: u16) -> Self {
        let insn: u32 = insn.into();
        let imm = ((insn >> (3 - 1)) & 0x00e)
            | ((insn >> (11 - 4)) & 0x010)
            | ((insn << (5 - 2)) & 0x020)
            | ((insn >> (7 - 6)) & 0x040)
            | ((insn << (7 - 6)) & 0x080)
            | ((insn >> (9 - 8)) & 0x300)
            | ((insn << (10 - 8)) & 0x400)
            | ((insn >> (12 - 11)) & 0x800);
        Self {
            rd: 0,
            imm: sign_extend(imm, 11),
        }
    }
}

/// Register number
pub type Register = u8;

/// Immediate formatted as signed hexadecimal number
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Imm(pub i64);

impl fmt::Display for Imm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-{:#x}", self.0.unsigned_abs())
        } else {
            write!(f, "{:#x}", self.0)
        }
    }
}

/// Extract the destination register form a 32bit instruction
const fn rd_from(insn: u32) -> u8 {
    (insn >> 7) as u8 & REG_MASK
}

/// Extract source register 1 form a 32bit instruction
const fn rs1_from(insn: u32) -> u8 {
    (insn >> 15) as u8 & REG_MASK
}

/// Extract source register 2 form a 32bit instruction
const fn rs2_from(insn: u32) -> u8 {
    (insn >> 20) as u8 & REG_MASK
}

/// Map a 3 bit compressed register field to the register number
pub(super) const fn compressed_reg(field: u32) -> u8 {
    (field as u8 & 0x07) | 0x08
}

/// Convert an [`u32`] to an [`i32`], sign extending it from a given bit
pub(super) const fn sign_extend(value: u32, pos: u8) -> i32 {
    let mask = (1u32 << pos) - 1;
    if value & (1 << pos) != 0 {
        (value | !mask) as i32
    } else {
        (value & mask) as i32
    }
}

const REG_MASK: u8 = 0x1f;
