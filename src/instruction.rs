// Copyright (C) 2024, 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Instructions and their disassembly
//!
//! This module provides the [`Instruction`] type, which is decoded from
//! [`Bits`] for a given [`base::Set`]. Control flow relevant instructions are
//! represented by dedicated [`Kind`] variants, which the tracer inspects via
//! the [`Info`] trait. All other known instructions are represented by
//! [`Kind::Other`], which only carries what is needed for rendering.

pub mod base;
pub mod bits;
pub mod format;
pub mod info;
pub mod other;

mod compressed;


use core::fmt;

pub use bits::Bits;
pub use info::Info;
pub use other::{Operands, Other};

use format::{Imm, TypeB, TypeI, TypeJ, TypeR, TypeU};

/// Error disassembling an instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Not enough bytes for the instruction at hand
    #[error("not enough bytes for an instruction")]
    Truncated,
    /// The instruction length encoding denotes 80 bits or more
    #[error("unsupported instruction length")]
    UnsupportedLength,
    /// The bits do not encode any known instruction
    #[error("unknown instruction {0}")]
    Unknown(Bits),
}

/// Size of an [`Instruction`] in bytes
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Size {
    Compressed = 2,
    #[default]
    Normal = 4,
    Wide = 6,
    ExtraWide = 8,
}

impl From<Size> for u64 {
    fn from(size: Size) -> Self {
        size as u64
    }
}

/// A single disassembled RISC-V instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Raw bits this instruction was decoded from
    pub bits: Bits,
    /// What the instruction does
    pub kind: Kind,
}

impl Instruction {
    /// Extract and decode the instruction at the beginning of `data`
    ///
    /// Returns the instruction and the remaining bytes.
    pub fn extract(data: &[u8], base: base::Set) -> Result<(Self, &[u8]), Error> {
        let (bits, rest) = Bits::extract(data)?;
        Self::decode(bits, base).map(|i| (i, rest))
    }

    /// Decode an instruction from [`Bits`]
    pub fn decode(bits: Bits, base: base::Set) -> Result<Self, Error> {
        let kind = match bits {
            Bits::Bit16(insn) => compressed::decode(insn, base),
            Bits::Bit32(insn) => Kind::decode_32(insn, base),
            Bits::Bit48(_) | Bits::Bit64(_) => None,
        };
        kind.map(|kind| Self { bits, kind })
            .ok_or(Error::Unknown(bits))
    }

    /// Retrieve this instruction's [`Size`]
    pub fn size(&self) -> Size {
        self.bits.size()
    }

    /// Retrieve this instruction's mnemonic
    pub fn mnemonic(&self) -> &'static str {
        self.kind.mnemonic()
    }

    /// Retrieve a displayable form of this instruction's operands
    pub fn operands(&self) -> OperandsDisplay<'_> {
        OperandsDisplay(&self.kind)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

/// Instruction kinds
///
/// Control flow relevant instructions have their own variant. Everything else
/// is collected in [`Kind::Other`].
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Kind {
    // SYS (R)
    mret,
    sret,
    uret,
    dret,
    fence,
    sfence_vma,
    wfi,
    // I
    ecall,
    ebreak,
    // Zifencei
    fence_i,
    // B
    beq(TypeB),
    bne(TypeB),
    blt(TypeB),
    bge(TypeB),
    bltu(TypeB),
    bgeu(TypeB),
    // U
    auipc(TypeU),
    lui(TypeU),
    // CB
    c_beqz(TypeB),
    c_bnez(TypeB),
    // J
    jal(TypeJ),
    // CJ
    c_j(TypeJ),
    c_jal(TypeJ),
    // CU
    c_lui(TypeU),
    // CR
    c_jr(TypeR),
    c_jalr(TypeR),
    c_ebreak,
    // I
    jalr(TypeI),
    /// Any other known instruction
    Other(Other),
}

impl Kind {
    /// Retrieve the mnemonic of this kind of instruction
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::mret => "mret",
            Self::sret => "sret",
            Self::uret => "uret",
            Self::dret => "dret",
            Self::fence => "fence",
            Self::sfence_vma => "sfence.vma",
            Self::wfi => "wfi",
            Self::ecall => "ecall",
            Self::ebreak => "ebreak",
            Self::fence_i => "fence.i",
            Self::beq(_) => "beq",
            Self::bne(_) => "bne",
            Self::blt(_) => "blt",
            Self::bge(_) => "bge",
            Self::bltu(_) => "bltu",
            Self::bgeu(_) => "bgeu",
            Self::auipc(_) => "auipc",
            Self::lui(_) => "lui",
            Self::c_beqz(_) => "c.beqz",
            Self::c_bnez(_) => "c.bnez",
            Self::jal(_) => "jal",
            Self::c_j(_) => "c.j",
            Self::c_jal(_) => "c.jal",
            Self::c_lui(_) => "c.lui",
            Self::c_jr(_) => "c.jr",
            Self::c_jalr(_) => "c.jalr",
            Self::c_ebreak => "c.ebreak",
            Self::jalr(_) => "jalr",
            Self::Other(o) => o.mnemonic,
        }
    }

    /// Decode a 32bit ("normal") instruction
    ///
    /// Returns `None` if the instruction is not known.
    #[allow(clippy::unusual_byte_groupings)]
    pub fn decode_32(insn: u32, base: base::Set) -> Option<Self> {
        let funct3 = (insn >> 12) & 0x7;

        match insn & 0x7f {
            0b0001111 => match funct3 {
                0b000 => Some(Self::fence),
                0b001 => Some(Self::fence_i),
                _ => None,
            },
            0b0110111 => Some(Self::lui(insn.into())),
            0b0010111 => Some(Self::auipc(insn.into())),
            0b1100011 => match funct3 {
                0b000 => Some(Self::beq(insn.into())),
                0b001 => Some(Self::bne(insn.into())),
                0b100 => Some(Self::blt(insn.into())),
                0b101 => Some(Self::bge(insn.into())),
                0b110 => Some(Self::bltu(insn.into())),
                0b111 => Some(Self::bgeu(insn.into())),
                _ => None,
            },
            0b1100111 if funct3 == 0 => Some(Self::jalr(insn.into())),
            0b1101111 => Some(Self::jal(insn.into())),
            0b1110011 if funct3 == 0 => match insn >> 7 {
                0b000000000000_00000_000_00000 => Some(Self::ecall),
                0b000000000001_00000_000_00000 => Some(Self::ebreak),
                0b000000000010_00000_000_00000 => Some(Self::uret),
                0b000100000010_00000_000_00000 => Some(Self::sret),
                0b001100000010_00000_000_00000 => Some(Self::mret),
                0b011110110010_00000_000_00000 => Some(Self::dret),
                0b000100000101_00000_000_00000 => Some(Self::wfi),
                _ if (insn >> 25) == 0b0001001 && (insn >> 7) & 0x1f == 0 => {
                    Some(Self::sfence_vma)
                }
                _ => None,
            },
            _ => other::decode_32(insn, base).map(Self::Other),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands = OperandsDisplay(self).to_string();
        if operands.is_empty() {
            f.write_str(self.mnemonic())
        } else {
            write!(f, "{} {operands}", self.mnemonic())
        }
    }
}

/// Displayable operands of an instruction
///
/// Registers are rendered as `xN` (or `fN` for floating point registers),
/// immediates in signed hexadecimal notation.
#[derive(Copy, Clone, Debug)]
pub struct OperandsDisplay<'a>(&'a Kind);

impl fmt::Display for OperandsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Kind::beq(d)
            | Kind::bne(d)
            | Kind::blt(d)
            | Kind::bge(d)
            | Kind::bltu(d)
            | Kind::bgeu(d) => write!(f, "x{}, x{}, {}", d.rs1, d.rs2, Imm(d.imm.into())),
            Kind::c_beqz(d) | Kind::c_bnez(d) => write!(f, "x{}, {}", d.rs1, Imm(d.imm.into())),
            Kind::auipc(d) | Kind::lui(d) | Kind::c_lui(d) => {
                write!(f, "x{}, {}", d.rd, Imm((d.imm >> 12).into()))
            }
            Kind::jal(d) => write!(f, "x{}, {}", d.rd, Imm(d.imm.into())),
            Kind::c_j(d) | Kind::c_jal(d) => write!(f, "{}", Imm(d.imm.into())),
            Kind::c_jr(d) | Kind::c_jalr(d) => write!(f, "x{}", d.rs1),
            Kind::jalr(d) => write!(f, "x{}, x{}, {}", d.rd, d.rs1, Imm(d.imm.into())),
            Kind::Other(o) => fmt::Display::fmt(&o.operands, f),
            _ => Ok(()),
        }
    }
}
