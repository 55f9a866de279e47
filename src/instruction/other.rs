// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Instructions without control flow relevance
//!
//! The tracer never needs to look into these instructions, but they still need
//! to be decoded for rendering. This covers the `I`, `M`, `A`, `F`, `D`,
//! `Zicsr` and `C` extensions for both `RV32I` and `RV64I`.

use core::fmt;

use super::base;
use super::format::{Imm, Register, TypeI, TypeR, TypeS};

/// An instruction without control flow relevance
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Other {
    /// The instruction's mnemonic
    pub mnemonic: &'static str,
    /// The instruction's operands
    pub operands: Operands,
}

impl Other {
    pub(super) const fn new(mnemonic: &'static str, operands: Operands) -> Self {
        Self { mnemonic, operands }
    }
}

/// A register of either the integer or the floating point register file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reg {
    X(Register),
    F(Register),
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X(r) => write!(f, "x{r}"),
            Self::F(r) => write!(f, "f{r}"),
        }
    }
}

/// Operands of an [`Other`] instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operands {
    None,
    /// `rd, rs1, rs2`
    R(TypeR),
    /// `rd, rs1, imm`
    I(TypeI),
    /// `rd, rs1, shamt`
    Shift {
        rd: Register,
        rs1: Register,
        shamt: u8,
    },
    /// `rd, imm(rs1)`
    Load(TypeI),
    /// `rs2, imm(rs1)`
    Store(TypeS),
    /// `fd, imm(rs1)`
    FpLoad(TypeI),
    /// `fs2, imm(rs1)`
    FpStore(TypeS),
    /// `rd, csr, rs1`
    Csr {
        rd: Register,
        csr: u16,
        rs1: Register,
    },
    /// `rd, csr, uimm`
    CsrImm { rd: Register, csr: u16, uimm: u8 },
    /// `rd, rs2, (rs1)`
    Amo(TypeR),
    /// `rd, (rs1)`
    LoadReserved(TypeR),
    /// Up to four registers of mixed register files
    Fp {
        rd: Reg,
        rs1: Reg,
        rs2: Option<Reg>,
        rs3: Option<Reg>,
    },
}

impl fmt::Display for Operands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::R(d) => write!(f, "x{}, x{}, x{}", d.rd, d.rs1, d.rs2),
            Self::I(d) => write!(f, "x{}, x{}, {}", d.rd, d.rs1, Imm(d.imm.into())),
            Self::Shift { rd, rs1, shamt } => write!(f, "x{rd}, x{rs1}, {shamt:#x}"),
            Self::Load(d) => write!(f, "x{}, {}(x{})", d.rd, Imm(d.imm.into()), d.rs1),
            Self::Store(d) => write!(f, "x{}, {}(x{})", d.rs2, Imm(d.imm.into()), d.rs1),
            Self::FpLoad(d) => write!(f, "f{}, {}(x{})", d.rd, Imm(d.imm.into()), d.rs1),
            Self::FpStore(d) => write!(f, "f{}, {}(x{})", d.rs2, Imm(d.imm.into()), d.rs1),
            Self::Csr { rd, csr, rs1 } => write!(f, "x{rd}, {csr:#x}, x{rs1}"),
            Self::CsrImm { rd, csr, uimm } => write!(f, "x{rd}, {csr:#x}, {uimm:#x}"),
            Self::Amo(d) => write!(f, "x{}, x{}, (x{})", d.rd, d.rs2, d.rs1),
            Self::LoadReserved(d) => write!(f, "x{}, (x{})", d.rd, d.rs1),
            Self::Fp { rd, rs1, rs2, rs3 } => {
                write!(f, "{rd}, {rs1}")?;
                rs2.iter().chain(rs3).try_for_each(|r| write!(f, ", {r}"))
            }
        }
    }
}

/// Decode a 32bit instruction without control flow relevance
#[allow(clippy::unusual_byte_groupings)]
pub(super) fn decode_32(insn: u32, base: base::Set) -> Option<Other> {
    let funct3 = (insn >> 12) & 0x7;
    let funct7 = insn >> 25;
    let rv64 = base.is_rv64();

    let other = match insn & 0x7f {
        0b0000011 => {
            let mnemonic = match funct3 {
                0b000 => "lb",
                0b001 => "lh",
                0b010 => "lw",
                0b011 if rv64 => "ld",
                0b100 => "lbu",
                0b101 => "lhu",
                0b110 if rv64 => "lwu",
                _ => return None,
            };
            Other::new(mnemonic, Operands::Load(insn.into()))
        }
        0b0000111 => {
            let mnemonic = match funct3 {
                0b010 => "flw",
                0b011 => "fld",
                _ => return None,
            };
            Other::new(mnemonic, Operands::FpLoad(insn.into()))
        }
        0b0100011 => {
            let mnemonic = match funct3 {
                0b000 => "sb",
                0b001 => "sh",
                0b010 => "sw",
                0b011 if rv64 => "sd",
                _ => return None,
            };
            Other::new(mnemonic, Operands::Store(insn.into()))
        }
        0b0100111 => {
            let mnemonic = match funct3 {
                0b010 => "fsw",
                0b011 => "fsd",
                _ => return None,
            };
            Other::new(mnemonic, Operands::FpStore(insn.into()))
        }
        0b0010011 => {
            let mnemonic = match funct3 {
                0b000 => "addi",
                0b010 => "slti",
                0b011 => "sltiu",
                0b100 => "xori",
                0b110 => "ori",
                0b111 => "andi",
                _ => return shift_imm(insn, rv64, false),
            };
            Other::new(mnemonic, Operands::I(insn.into()))
        }
        0b0011011 if rv64 => match funct3 {
            0b000 => Other::new("addiw", Operands::I(insn.into())),
            _ => return shift_imm(insn, false, true),
        },
        0b0110011 => {
            let mnemonic = match (funct7, funct3) {
                (0b0000000, 0b000) => "add",
                (0b0100000, 0b000) => "sub",
                (0b0000000, 0b001) => "sll",
                (0b0000000, 0b010) => "slt",
                (0b0000000, 0b011) => "sltu",
                (0b0000000, 0b100) => "xor",
                (0b0000000, 0b101) => "srl",
                (0b0100000, 0b101) => "sra",
                (0b0000000, 0b110) => "or",
                (0b0000000, 0b111) => "and",
                (0b0000001, 0b000) => "mul",
                (0b0000001, 0b001) => "mulh",
                (0b0000001, 0b010) => "mulhsu",
                (0b0000001, 0b011) => "mulhu",
                (0b0000001, 0b100) => "div",
                (0b0000001, 0b101) => "divu",
                (0b0000001, 0b110) => "rem",
                (0b0000001, 0b111) => "remu",
                _ => return None,
            };
            Other::new(mnemonic, Operands::R(insn.into()))
        }
        0b0111011 if rv64 => {
            let mnemonic = match (funct7, funct3) {
                (0b0000000, 0b000) => "addw",
                (0b0100000, 0b000) => "subw",
                (0b0000000, 0b001) => "sllw",
                (0b0000000, 0b101) => "srlw",
                (0b0100000, 0b101) => "sraw",
                (0b0000001, 0b000) => "mulw",
                (0b0000001, 0b100) => "divw",
                (0b0000001, 0b101) => "divuw",
                (0b0000001, 0b110) => "remw",
                (0b0000001, 0b111) => "remuw",
                _ => return None,
            };
            Other::new(mnemonic, Operands::R(insn.into()))
        }
        0b0101111 => return atomic(insn, funct3, rv64),
        0b1110011 => {
            let csr = (insn >> 20) as u16;
            let rd = (insn >> 7) as u8 & 0x1f;
            let rs1 = (insn >> 15) as u8 & 0x1f;
            match funct3 {
                0b001 => Other::new("csrrw", Operands::Csr { rd, csr, rs1 }),
                0b010 => Other::new("csrrs", Operands::Csr { rd, csr, rs1 }),
                0b011 => Other::new("csrrc", Operands::Csr { rd, csr, rs1 }),
                0b101 => Other::new("csrrwi", Operands::CsrImm { rd, csr, uimm: rs1 }),
                0b110 => Other::new("csrrsi", Operands::CsrImm { rd, csr, uimm: rs1 }),
                0b111 => Other::new("csrrci", Operands::CsrImm { rd, csr, uimm: rs1 }),
                _ => return None,
            }
        }
        op @ (0b1000011 | 0b1000111 | 0b1001011 | 0b1001111) => {
            let fmt = funct7 & 0b11;
            let mnemonic = match op {
                0b1000011 => pick(fmt, "fmadd.s", "fmadd.d"),
                0b1000111 => pick(fmt, "fmsub.s", "fmsub.d"),
                0b1001011 => pick(fmt, "fnmsub.s", "fnmsub.d"),
                _ => pick(fmt, "fnmadd.s", "fnmadd.d"),
            }?;
            let r = TypeR::from(insn);
            let operands = Operands::Fp {
                rd: Reg::F(r.rd),
                rs1: Reg::F(r.rs1),
                rs2: Some(Reg::F(r.rs2)),
                rs3: Some(Reg::F((insn >> 27) as u8)),
            };
            Other::new(mnemonic, operands)
        }
        0b1010011 => return op_fp(insn, funct3, rv64),
        _ => return None,
    };
    Some(other)
}

/// Decode `slli`, `srli`, `srai` and their word variants
fn shift_imm(insn: u32, wide_shamt: bool, word: bool) -> Option<Other> {
    let (shamt, upper) = if wide_shamt {
        ((insn >> 20) & 0x3f, (insn >> 26) << 1)
    } else {
        ((insn >> 20) & 0x1f, insn >> 25)
    };
    let mnemonic = match ((insn >> 12) & 0x7, upper, word) {
        (0b001, 0b0000000, false) => "slli",
        (0b101, 0b0000000, false) => "srli",
        (0b101, 0b0100000, false) => "srai",
        (0b001, 0b0000000, true) => "slliw",
        (0b101, 0b0000000, true) => "srliw",
        (0b101, 0b0100000, true) => "sraiw",
        _ => return None,
    };
    let r = TypeR::from(insn);
    let operands = Operands::Shift {
        rd: r.rd,
        rs1: r.rs1,
        shamt: shamt as u8,
    };
    Some(Other::new(mnemonic, operands))
}

/// Decode `A` extension instructions
fn atomic(insn: u32, funct3: u32, rv64: bool) -> Option<Other> {
    const AMO: [(u32, &str, &str); 11] = [
        (0b00010, "lr.w", "lr.d"),
        (0b00011, "sc.w", "sc.d"),
        (0b00001, "amoswap.w", "amoswap.d"),
        (0b00000, "amoadd.w", "amoadd.d"),
        (0b00100, "amoxor.w", "amoxor.d"),
        (0b01100, "amoand.w", "amoand.d"),
        (0b01000, "amoor.w", "amoor.d"),
        (0b10000, "amomin.w", "amomin.d"),
        (0b10100, "amomax.w", "amomax.d"),
        (0b11000, "amominu.w", "amominu.d"),
        (0b11100, "amomaxu.w", "amomaxu.d"),
    ];

    let funct5 = insn >> 27;
    let (_, word, double) = AMO.iter().find(|(f, _, _)| *f == funct5)?;
    let mnemonic = match funct3 {
        0b010 => *word,
        0b011 if rv64 => *double,
        _ => return None,
    };
    let r = TypeR::from(insn);
    if funct5 == 0b00010 {
        (r.rs2 == 0).then_some(Other::new(mnemonic, Operands::LoadReserved(r)))
    } else {
        Some(Other::new(mnemonic, Operands::Amo(r)))
    }
}

/// Decode `F` and `D` extension computational instructions
fn op_fp(insn: u32, funct3: u32, rv64: bool) -> Option<Other> {
    use Reg::{F, X};

    let fmt = (insn >> 25) & 0b11;
    let r = TypeR::from(insn);
    let (mnemonic, rd, rs1, rs2) = match insn >> 27 {
        0b00000 => (pick(fmt, "fadd.s", "fadd.d")?, F(r.rd), F(r.rs1), Some(F(r.rs2))),
        0b00001 => (pick(fmt, "fsub.s", "fsub.d")?, F(r.rd), F(r.rs1), Some(F(r.rs2))),
        0b00010 => (pick(fmt, "fmul.s", "fmul.d")?, F(r.rd), F(r.rs1), Some(F(r.rs2))),
        0b00011 => (pick(fmt, "fdiv.s", "fdiv.d")?, F(r.rd), F(r.rs1), Some(F(r.rs2))),
        0b01011 if r.rs2 == 0 => (pick(fmt, "fsqrt.s", "fsqrt.d")?, F(r.rd), F(r.rs1), None),
        0b00100 => {
            let mnemonic = match funct3 {
                0b000 => pick(fmt, "fsgnj.s", "fsgnj.d"),
                0b001 => pick(fmt, "fsgnjn.s", "fsgnjn.d"),
                0b010 => pick(fmt, "fsgnjx.s", "fsgnjx.d"),
                _ => None,
            }?;
            (mnemonic, F(r.rd), F(r.rs1), Some(F(r.rs2)))
        }
        0b00101 => {
            let mnemonic = match funct3 {
                0b000 => pick(fmt, "fmin.s", "fmin.d"),
                0b001 => pick(fmt, "fmax.s", "fmax.d"),
                _ => None,
            }?;
            (mnemonic, F(r.rd), F(r.rs1), Some(F(r.rs2)))
        }
        0b10100 => {
            let mnemonic = match funct3 {
                0b000 => pick(fmt, "fle.s", "fle.d"),
                0b001 => pick(fmt, "flt.s", "flt.d"),
                0b010 => pick(fmt, "feq.s", "feq.d"),
                _ => None,
            }?;
            (mnemonic, X(r.rd), F(r.rs1), Some(F(r.rs2)))
        }
        0b01000 => {
            let mnemonic = match (fmt, r.rs2) {
                (0b00, 1) => "fcvt.s.d",
                (0b01, 0) => "fcvt.d.s",
                _ => return None,
            };
            (mnemonic, F(r.rd), F(r.rs1), None)
        }
        0b11000 => {
            let mnemonic = match r.rs2 {
                0 => pick(fmt, "fcvt.w.s", "fcvt.w.d"),
                1 => pick(fmt, "fcvt.wu.s", "fcvt.wu.d"),
                2 if rv64 => pick(fmt, "fcvt.l.s", "fcvt.l.d"),
                3 if rv64 => pick(fmt, "fcvt.lu.s", "fcvt.lu.d"),
                _ => None,
            }?;
            (mnemonic, X(r.rd), F(r.rs1), None)
        }
        0b11010 => {
            let mnemonic = match r.rs2 {
                0 => pick(fmt, "fcvt.s.w", "fcvt.d.w"),
                1 => pick(fmt, "fcvt.s.wu", "fcvt.d.wu"),
                2 if rv64 => pick(fmt, "fcvt.s.l", "fcvt.d.l"),
                3 if rv64 => pick(fmt, "fcvt.s.lu", "fcvt.d.lu"),
                _ => None,
            }?;
            (mnemonic, F(r.rd), X(r.rs1), None)
        }
        0b11100 if r.rs2 == 0 => {
            let mnemonic = match (funct3, fmt) {
                (0b000, 0b00) => "fmv.x.w",
                (0b000, 0b01) if rv64 => "fmv.x.d",
                (0b001, _) => pick(fmt, "fclass.s", "fclass.d")?,
                _ => return None,
            };
            (mnemonic, X(r.rd), F(r.rs1), None)
        }
        0b11110 if r.rs2 == 0 && funct3 == 0 => {
            let mnemonic = match fmt {
                0b00 => "fmv.w.x",
                0b01 if rv64 => "fmv.d.x",
                _ => return None,
            };
            (mnemonic, F(r.rd), X(r.rs1), None)
        }
        _ => return None,
    };
    let operands = Operands::Fp {
        rd,
        rs1,
        rs2,
        rs3: None,
    };
    Some(Other::new(mnemonic, operands))
}

/// Pick the single or double precision variant of a mnemonic
fn pick(fmt: u32, single: &'static str, double: &'static str) -> Option<&'static str> {
    match fmt {
        0b00 => Some(single),
        0b01 => Some(double),
        _ => None,
    }
}
