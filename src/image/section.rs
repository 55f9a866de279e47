// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Loaded sections

use elf::ElfBytes;
use elf::abi;
use elf::endian::AnyEndian;

use super::Error;

/// A section loaded into target memory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// Virtual address of the first byte
    pub address: u64,
    pub data: Vec<u8>,
    /// Whether the section holds instructions
    pub executable: bool,
}

impl Section {
    /// Create a new section
    pub fn new(name: impl Into<String>, address: u64, data: Vec<u8>, executable: bool) -> Self {
        Self {
            name: name.into(),
            address,
            data,
            executable,
        }
    }

    /// Determine whether the address lies inside this section
    pub fn contains(&self, address: u64) -> bool {
        address
            .checked_sub(self.address)
            .and_then(|o| usize::try_from(o).ok())
            .is_some_and(|o| o < self.data.len())
    }

    /// Retrieve the section's data starting at the given address
    pub fn data_from(&self, address: u64) -> Option<&[u8]> {
        let offset = address.checked_sub(self.address)?;
        self.data
            .get(usize::try_from(offset).ok()?..)
            .filter(|d| !d.is_empty())
    }

    /// Address of the last byte of this section
    pub fn last_address(&self) -> u64 {
        self.address
            .saturating_add(self.data.len() as u64)
            .saturating_sub(1)
    }
}

/// Extract all allocated sections with contents from an ELF file
pub(super) fn from_elf(file: &ElfBytes<'_, AnyEndian>) -> Result<Vec<Section>, Error> {
    let (Some(headers), Some(names)) = file.section_headers_with_strtab()? else {
        return Ok(Default::default());
    };

    let mut sections = Vec::new();
    for header in headers.iter() {
        let alloc = header.sh_flags & abi::SHF_ALLOC as u64 != 0;
        if !alloc || header.sh_type != abi::SHT_PROGBITS || header.sh_size == 0 {
            continue;
        }
        let name = names.get(header.sh_name as usize)?;
        let (data, compression) = file.section_data(&header)?;
        if compression.is_some() {
            tracing::warn!(name, "skipping compressed section");
            continue;
        }
        sections.push(Section::new(
            name,
            header.sh_addr,
            data.to_vec(),
            header.sh_flags & abi::SHF_EXECINSTR as u64 != 0,
        ));
    }
    Ok(sections)
}
