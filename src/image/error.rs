// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Image loading errors

/// Error loading an [`ObjectImage`][super::ObjectImage]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The image file could not be read
    #[error("could not read image")]
    Io(#[from] std::io::Error),
    /// The ELF structures could not be parsed
    #[error("could not parse ELF file")]
    Elf(#[from] elf::parse::ParseError),
    /// The line information could not be parsed
    #[error("could not parse line information")]
    Dwarf(#[from] gimli::Error),
    /// The image is not a RISC-V image
    #[error("unsupported machine {0:#x}")]
    Machine(u16),
    /// The image is not little endian
    #[error("image is not little endian")]
    BigEndian,
    /// The image contains neither symbols nor line information
    #[error("image contains neither symbols nor line information")]
    NoDebugInfo,
}
