// Copyright (C) 2024, 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Instruction information

use super::Kind;
use super::format::{Register, TypeI, TypeJ, TypeR};

/// Instruction information
///
/// This trait defines fns for querying control flow relevant information of
/// individual instructions.
pub trait Info {
    /// Determine the branch target
    ///
    /// If [`Self`] refers to a branch instruction, this fn returns the
    /// immediate, which is the branch target relative to this instruction.
    /// Returns `None` if [`Self`] does not refer to a (known) branch
    /// instruction. Jump instructions are not considered branch instructions.
    fn branch_target(&self) -> Option<i16>;

    /// Determine the inferable jump target
    ///
    /// If [`Self`] refers to a jump instruction that in itself determines the
    /// jump target, this fn returns that target relative to this instruction.
    /// A `jalr` is only considered inferable if its source register is the
    /// `zero` register. In that case the target is absolute, which is denoted
    /// by the second tuple element.
    ///
    /// Branch instructions are not considered jump instructions.
    fn inferable_jump_target(&self) -> Option<(i32, bool)>;

    /// Determine the uninferable jump target
    ///
    /// If [`Self`] refers to a jump instruction that in itself does not
    /// determine the jump target, this fn returns the register number (first
    /// tuple element) and the offset (second tuple element) from which the
    /// target is computed at run time.
    fn uninferable_jump_target(&self) -> Option<(Register, i16)>;

    /// Determine whether this instruction returns from a trap
    fn is_return_from_trap(&self) -> bool;

    /// Determine whether this instruction is an `ecall` or `ebreak`
    ///
    /// Returns `true` if this refers to either an `ecall`, `ebreak` or
    /// `c.ebreak`.
    fn is_ecall_or_ebreak(&self) -> bool;

    /// Determine whether this instruction can be considered a function call
    ///
    /// A call is a jump-and-link with a link register (`x1` or `x5`) as `rd`,
    /// unless it is a [swap][Self::is_swap].
    fn is_call(&self) -> bool;

    /// Determine whether this instruction can be considered a function return
    ///
    /// A return is a jump register instruction with a link register as `rs1`
    /// and a non-link register as `rd`.
    fn is_return(&self) -> bool;

    /// Determine whether this instruction is a co-routine swap
    ///
    /// A swap is a `jalr` or `c.jalr` with different link registers as `rd`
    /// and `rs1`.
    fn is_swap(&self) -> bool;

    /// Determin whether this instruction is a branch instruction
    fn is_branch(&self) -> bool {
        self.branch_target().is_some()
    }

    /// Determin whether this instruction is an inferable jump
    fn is_inferable_jump(&self) -> bool {
        self.inferable_jump_target().is_some()
    }

    /// Determin whether this instruction is an uninferable jump
    fn is_uninferable_jump(&self) -> bool {
        self.uninferable_jump_target().is_some()
    }

    /// Determine whether this instruction causes an uninferable discontinuity
    ///
    /// Returns `true` if [`Self`] refers to an instruction that causes a (PC)
    /// discontinuity with a target that can not be inferred from the
    /// instruction alone. This is the case if the instruction is either
    /// * an [uninferable jump][Self::is_uninferable_jump],
    /// * a [return from trap][Self::is_return_from_trap] or
    /// * an [`ecall` or `ebreak`][Self::is_ecall_or_ebreak].
    fn is_uninferable_discon(&self) -> bool {
        self.is_uninferable_jump() || self.is_return_from_trap() || self.is_ecall_or_ebreak()
    }
}

impl Info for Kind {
    fn branch_target(&self) -> Option<i16> {
        match self {
            Self::c_beqz(d) => Some(d.imm),
            Self::c_bnez(d) => Some(d.imm),
            Self::beq(d) => Some(d.imm),
            Self::bne(d) => Some(d.imm),
            Self::blt(d) => Some(d.imm),
            Self::bge(d) => Some(d.imm),
            Self::bltu(d) => Some(d.imm),
            Self::bgeu(d) => Some(d.imm),
            _ => None,
        }
    }

    fn inferable_jump_target(&self) -> Option<(i32, bool)> {
        match self {
            Self::jal(d) => Some((d.imm, false)),
            Self::c_jal(d) => Some((d.imm, false)),
            Self::c_j(d) => Some((d.imm, false)),
            Self::jalr(TypeI { rs1: 0, imm, .. }) => Some(((*imm).into(), true)),
            _ => None,
        }
    }

    fn uninferable_jump_target(&self) -> Option<(Register, i16)> {
        match self {
            Self::c_jalr(d) => Some((d.rs1, 0)),
            Self::c_jr(d) => Some((d.rs1, 0)),
            Self::jalr(d) => Some((d.rs1, d.imm)),
            _ => None,
        }
        .filter(|(r, _)| *r != 0)
    }

    fn is_return_from_trap(&self) -> bool {
        matches!(self, Self::uret | Self::sret | Self::mret | Self::dret)
    }

    fn is_ecall_or_ebreak(&self) -> bool {
        matches!(self, Self::ecall | Self::ebreak | Self::c_ebreak)
    }

    fn is_call(&self) -> bool {
        match self {
            Self::jal(TypeJ { rd, .. }) | Self::c_jal(TypeJ { rd, .. }) => is_link(*rd),
            Self::jalr(TypeI { rd, .. }) => is_link(*rd) && !self.is_swap(),
            Self::c_jalr(_) => !self.is_swap(),
            _ => false,
        }
    }

    fn is_return(&self) -> bool {
        match self {
            Self::jalr(TypeI { rd, rs1, .. }) => is_link(*rs1) && !is_link(*rd),
            Self::c_jr(TypeR { rs1, .. }) => is_link(*rs1),
            _ => false,
        }
    }

    fn is_swap(&self) -> bool {
        match self {
            Self::jalr(TypeI { rd, rs1, .. }) => is_link(*rd) && is_link(*rs1) && rd != rs1,
            // `c.jalr` links to `x1` implicitly
            Self::c_jalr(TypeR { rs1, .. }) => *rs1 == 5,
            _ => false,
        }
    }
}

/// Determine whether a register is one of the link registers `x1` and `x5`
fn is_link(reg: Register) -> bool {
    reg == 1 || reg == 5
}
