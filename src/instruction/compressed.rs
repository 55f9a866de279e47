// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Decoding of 16bit ("compressed") instructions

use super::Kind;
use super::base;
use super::format::{TypeI, TypeJ, TypeR, TypeS, TypeU, compressed_reg, sign_extend};
use super::other::{Operands, Other};

/// Decode a 16bit ("compressed") instruction
///
/// Returns `None` if the instruction is not known or reserved.
pub(super) fn decode(insn: u16, base: base::Set) -> Option<Kind> {
    let rv64 = base.is_rv64();
    let wide: u32 = insn.into();
    let func3 = insn >> 13;
    let other = |mnemonic, operands| Some(Kind::Other(Other::new(mnemonic, operands)));

    // Register fields of the CIW, CL, CS, CA and CB formats
    let rd_p = compressed_reg(wide >> 2);
    let rs1_p = compressed_reg(wide >> 7);

    match (insn & 0x3, func3) {
        (0b00, 0b000) => {
            let imm = ((wide >> 7) & 0x030)
                | ((wide >> 1) & 0x3c0)
                | ((wide >> 4) & 0x004)
                | ((wide >> 2) & 0x008);
            if imm == 0 {
                return None;
            }
            let operands = Operands::I(TypeI {
                rd: rd_p,
                rs1: 2,
                imm: imm as i16,
            });
            other("c.addi4spn", operands)
        }
        (0b00, 0b001) => other("c.fld", Operands::FpLoad(load_p(wide, offset_d(wide)))),
        (0b00, 0b010) => other("c.lw", Operands::Load(load_p(wide, offset_w(wide)))),
        (0b00, 0b011) if rv64 => other("c.ld", Operands::Load(load_p(wide, offset_d(wide)))),
        (0b00, 0b011) => other("c.flw", Operands::FpLoad(load_p(wide, offset_w(wide)))),
        (0b00, 0b101) => other("c.fsd", Operands::FpStore(store_p(wide, offset_d(wide)))),
        (0b00, 0b110) => other("c.sw", Operands::Store(store_p(wide, offset_w(wide)))),
        (0b00, 0b111) if rv64 => other("c.sd", Operands::Store(store_p(wide, offset_d(wide)))),
        (0b00, 0b111) => other("c.fsw", Operands::FpStore(store_p(wide, offset_w(wide)))),
        (0b01, 0b000) => {
            let data = TypeI::from(insn);
            if data.rd == 0 {
                other("c.nop", Operands::None)
            } else {
                other("c.addi", Operands::I(data))
            }
        }
        (0b01, 0b001) if rv64 => {
            let data = TypeI::from(insn);
            (data.rd != 0).then_some(())?;
            other("c.addiw", Operands::I(data))
        }
        (0b01, 0b001) => Some(Kind::c_jal(TypeJ {
            rd: 1,
            ..insn.into()
        })),
        (0b01, 0b010) => other("c.li", Operands::I(TypeI { rs1: 0, ..insn.into() })),
        (0b01, 0b011) => {
            let data = TypeU::from(insn);
            if data.rd == 2 {
                let imm = ((wide >> 3) & 0x200)
                    | ((wide >> 2) & 0x010)
                    | ((wide << 1) & 0x040)
                    | ((wide << 4) & 0x180)
                    | ((wide << 3) & 0x020);
                (imm != 0).then_some(())?;
                let operands = Operands::I(TypeI {
                    rd: 2,
                    rs1: 2,
                    imm: sign_extend(imm, 9) as i16,
                });
                other("c.addi16sp", operands)
            } else if data.rd != 0 && data.imm != 0 {
                Some(Kind::c_lui(data))
            } else {
                None
            }
        }
        (0b01, 0b100) => {
            let shamt = (((wide >> 7) & 0x20) | ((wide >> 2) & 0x1f)) as u8;
            let shift = Operands::Shift {
                rd: rs1_p,
                rs1: rs1_p,
                shamt,
            };
            let ca = Operands::R(TypeR {
                rd: rs1_p,
                rs1: rs1_p,
                rs2: rd_p,
            });
            match ((wide >> 10) & 0b11, (wide >> 12) & 1, (wide >> 5) & 0b11) {
                (0b00, _, _) if rv64 || shamt < 32 => other("c.srli", shift),
                (0b01, _, _) if rv64 || shamt < 32 => other("c.srai", shift),
                (0b10, _, _) => {
                    let operands = Operands::I(TypeI {
                        rd: rs1_p,
                        rs1: rs1_p,
                        imm: TypeI::from(insn).imm,
                    });
                    other("c.andi", operands)
                }
                (0b11, 0, 0b00) => other("c.sub", ca),
                (0b11, 0, 0b01) => other("c.xor", ca),
                (0b11, 0, 0b10) => other("c.or", ca),
                (0b11, 0, 0b11) => other("c.and", ca),
                (0b11, 1, 0b00) if rv64 => other("c.subw", ca),
                (0b11, 1, 0b01) if rv64 => other("c.addw", ca),
                _ => None,
            }
        }
        (0b01, 0b101) => Some(Kind::c_j(insn.into())),
        (0b01, 0b110) => Some(Kind::c_beqz(insn.into())),
        (0b01, 0b111) => Some(Kind::c_bnez(insn.into())),
        (0b10, 0b000) => {
            let data = TypeR::from(insn);
            let shamt = (((wide >> 7) & 0x20) | u32::from(data.rs2)) as u8;
            (rv64 || shamt < 32).then_some(())?;
            let operands = Operands::Shift {
                rd: data.rd,
                rs1: data.rd,
                shamt,
            };
            other("c.slli", operands)
        }
        (0b10, 0b001) => other("c.fldsp", Operands::FpLoad(load_sp(wide, offset_dsp(wide)))),
        (0b10, 0b010) => {
            let data = load_sp(wide, offset_wsp(wide));
            (data.rd != 0).then_some(())?;
            other("c.lwsp", Operands::Load(data))
        }
        (0b10, 0b011) if rv64 => {
            let data = load_sp(wide, offset_dsp(wide));
            (data.rd != 0).then_some(())?;
            other("c.ldsp", Operands::Load(data))
        }
        (0b10, 0b011) => other("c.flwsp", Operands::FpLoad(load_sp(wide, offset_wsp(wide)))),
        (0b10, 0b100) => {
            let data = TypeR::from(insn);
            let bit12 = (insn >> 12) & 0x1;
            match (bit12, data.rs1, data.rs2) {
                (0, r, 0) if r != 0 => Some(Kind::c_jr(data)),
                (0, r, _) if r != 0 => other("c.mv", Operands::R(TypeR { rs1: 0, ..data })),
                (1, 0, 0) => Some(Kind::c_ebreak),
                (1, _, 0) => Some(Kind::c_jalr(data)),
                (1, r, _) if r != 0 => other("c.add", Operands::R(data)),
                _ => None,
            }
        }
        (0b10, 0b101) => other("c.fsdsp", Operands::FpStore(store_sp(wide, store_dsp(wide)))),
        (0b10, 0b110) => other("c.swsp", Operands::Store(store_sp(wide, store_wsp(wide)))),
        (0b10, 0b111) if rv64 => other("c.sdsp", Operands::Store(store_sp(wide, store_dsp(wide)))),
        (0b10, 0b111) => other("c.fswsp", Operands::FpStore(store_sp(wide, store_wsp(wide)))),
        _ => None,
    }
}

/// Assemble a CL-type load
fn load_p(insn: u32, offset: u32) -> TypeI {
    TypeI {
        rd: compressed_reg(insn >> 2),
        rs1: compressed_reg(insn >> 7),
        imm: offset as i16,
    }
}

/// Assemble a CS-type store
fn store_p(insn: u32, offset: u32) -> TypeS {
    TypeS {
        rs1: compressed_reg(insn >> 7),
        rs2: compressed_reg(insn >> 2),
        imm: offset as i16,
    }
}

/// Assemble a stack pointer relative CI-type load
fn load_sp(insn: u32, offset: u32) -> TypeI {
    TypeI {
        rd: (insn >> 7) as u8 & 0x1f,
        rs1: 2,
        imm: offset as i16,
    }
}

/// Assemble a stack pointer relative CSS-type store
fn store_sp(insn: u32, offset: u32) -> TypeS {
    TypeS {
        rs1: 2,
        rs2: (insn >> 2) as u8 & 0x1f,
        imm: offset as i16,
    }
}

/// Offset of word sized CL and CS loads and stores
fn offset_w(insn: u32) -> u32 {
    ((insn >> 7) & 0x38) | ((insn >> 4) & 0x04) | ((insn << 1) & 0x40)
}

/// Offset of double word sized CL and CS loads and stores
fn offset_d(insn: u32) -> u32 {
    ((insn >> 7) & 0x38) | ((insn << 1) & 0xc0)
}

/// Offset of word sized stack pointer relative loads
fn offset_wsp(insn: u32) -> u32 {
    ((insn >> 7) & 0x20) | ((insn >> 2) & 0x1c) | ((insn << 4) & 0xc0)
}

/// Offset of double word sized stack pointer relative loads
fn offset_dsp(insn: u32) -> u32 {
    ((insn >> 7) & 0x20) | ((insn >> 2) & 0x18) | ((insn << 4) & 0x1c0)
}

/// Offset of word sized stack pointer relative stores
fn store_wsp(insn: u32) -> u32 {
    ((insn >> 7) & 0x3c) | ((insn >> 1) & 0xc0)
}

/// Offset of double word sized stack pointer relative stores
fn store_dsp(insn: u32) -> u32 {
    ((insn >> 7) & 0x38) | ((insn >> 1) & 0x1c0)
}
