// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Program images and debug information
//!
//! An [`ObjectImage`] holds the loaded sections, symbols and line information
//! of the program that was traced. It provides the instructions the tracer
//! walks and the [`Correlation`] of addresses with source code.
//!
//! Images are usually loaded from ELF files via [`ObjectImage::load`] or
//! [`ObjectImage::parse`]. Images for other container formats may be
//! assembled using a [`Builder`].

pub mod error;
pub mod files;
pub mod lines;
pub mod section;
pub mod symbols;


use core::fmt;
use std::path::Path;
use std::sync::Arc;

use elf::ElfBytes;
use elf::endian::{AnyEndian, EndianParse};

use crate::error::{Cause, Error as CrateError};
use crate::instruction::{Instruction, base};

pub use error::Error;
pub use files::SourceFiles;
pub use lines::LineRange;
pub use section::Section;
pub use symbols::Symbol;

/// A loaded program image
///
/// The image is immutable after loading and may be shared between sessions.
#[derive(Clone, Debug)]
pub struct ObjectImage {
    base: base::Set,
    sections: Vec<Section>,
    symbols: symbols::Table,
    lines: lines::Table,
}

impl ObjectImage {
    /// Load an image from the ELF file at the given path
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading image");
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Parse an image from the bytes of an ELF file
    ///
    /// Only little endian RISC-V images are supported. The image must contain
    /// a symbol table or line information.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let file = ElfBytes::<AnyEndian>::minimal_parse(data)?;
        let header = &file.ehdr;
        if header.e_machine != elf::abi::EM_RISCV {
            return Err(Error::Machine(header.e_machine));
        }
        if !header.endianness.is_little() {
            return Err(Error::BigEndian);
        }
        let base = match header.class {
            elf::file::Class::ELF32 => base::Set::Rv32I,
            elf::file::Class::ELF64 => base::Set::Rv64I,
        };

        let mut builder = Builder::new(base);
        for section in section::from_elf(&file)? {
            builder = builder.section(section);
        }
        for symbol in symbols::from_elf(&file)? {
            builder = builder.symbol(symbol);
        }
        for range in lines::from_elf(&file, base)? {
            builder = builder.line(range);
        }

        let image = builder.build();
        if image.symbols.is_empty() && image.lines.is_empty() {
            return Err(Error::NoDebugInfo);
        }
        tracing::debug!(
            sections = image.sections.len(),
            symbols = image.symbols.len(),
            lines = image.lines.len(),
            "image loaded"
        );
        Ok(image)
    }

    /// Create a [`Builder`] for an image of the given base instruction set
    pub fn builder(base: base::Set) -> Builder {
        Builder::new(base)
    }

    /// Retrieve the base instruction set of this image
    pub fn base(&self) -> base::Set {
        self.base
    }

    /// Retrieve all loaded sections, ordered by address
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Correlate an address with source code and symbols
    pub fn lookup(&self, address: u64) -> Correlation {
        let source = self
            .section_at(address)
            .and_then(|_| self.lines.find(address))
            .map(|range| Source {
                file: range.file.clone(),
                line: range.line,
                function: self.symbols.function(address),
            });
        Correlation {
            address,
            source,
            label: self.symbols.label(address),
        }
    }

    /// Disassemble the instruction at the given address
    ///
    /// The address must lie inside an executable section.
    pub fn disassemble_at(&self, address: u64) -> Result<Instruction, CrateError> {
        let unexpected = |cause| CrateError::UnexpectedEncoding { address, cause };
        let data = self
            .section_at(address)
            .filter(|s| s.executable)
            .and_then(|s| s.data_from(address))
            .ok_or(unexpected(Cause::NotExecutable))?;
        Instruction::extract(data, self.base)
            .map(|(insn, _)| insn)
            .map_err(|e| unexpected(e.into()))
    }

    /// Number of bits required for representing the highest section address
    pub fn address_bits(&self) -> u8 {
        let highest = self
            .sections
            .iter()
            .map(Section::last_address)
            .max()
            .unwrap_or_default();
        (u64::BITS - highest.leading_zeros()).max(1) as u8
    }

    fn section_at(&self, address: u64) -> Option<&Section> {
        let idx = self.sections.partition_point(|s| s.address <= address);
        self.sections[..idx]
            .iter()
            .rev()
            .find(|s| s.contains(address))
    }
}

/// Builder for [`ObjectImage`]s
#[derive(Clone, Debug, Default)]
pub struct Builder {
    base: base::Set,
    sections: Vec<Section>,
    symbols: Vec<Symbol>,
    lines: Vec<LineRange>,
}

impl Builder {
    /// Create a new, empty builder
    pub fn new(base: base::Set) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    /// Add a section
    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Add a symbol
    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.symbols.push(symbol);
        self
    }

    /// Map an address range to a source line
    pub fn line(mut self, range: LineRange) -> Self {
        self.lines.push(range);
        self
    }

    /// Build the image
    pub fn build(mut self) -> ObjectImage {
        self.sections.sort_by_key(|s| s.address);
        ObjectImage {
            base: self.base,
            sections: self.sections,
            symbols: symbols::Table::new(self.symbols),
            lines: lines::Table::new(self.lines),
        }
    }
}

/// Result of correlating an address via [`ObjectImage::lookup`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Correlation {
    pub address: u64,
    /// Source location, if line information covers the address
    pub source: Option<Source>,
    /// Closest preceding symbol
    pub label: Option<Label>,
}

impl Correlation {
    /// Retrieve the source location
    ///
    /// Fails with [`CrateError::CorrelationMiss`] if there is none.
    pub fn source(&self) -> Result<&Source, CrateError> {
        self.source
            .as_ref()
            .ok_or(CrateError::CorrelationMiss(self.address))
    }
}

/// Source location of an instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub file: Arc<str>,
    pub line: u32,
    /// Enclosing function
    pub function: Option<Arc<str>>,
}

impl Source {
    /// Retrieve the text of the source line via the given [`SourceFiles`]
    ///
    /// Returns `None` if the file can't be read or is shorter than expected.
    pub fn text(&self, files: &SourceFiles) -> Option<Arc<str>> {
        files.line(&self.file, self.line)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(function) = self.function.as_ref() {
            write!(f, "{function}:")?;
        }
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Closest preceding symbol of an address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub name: Arc<str>,
    /// Distance of the address from the symbol
    pub offset: u64,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}+{:#x}", self.name, self.offset)
        }
    }
}
