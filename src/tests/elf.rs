// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Minimal ELF32 writer for tests

/// `EM_RISCV`
pub const MACHINE_RISCV: u16 = 243;

const HEADER_SIZE: usize = 52;
const SECTION_HEADER_SIZE: usize = 40;
const SYMBOL_SIZE: usize = 16;

const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const SHF_ALLOC: u32 = 0x2;
const SHF_EXECINSTR: u32 = 0x4;
const STT_OBJECT: u8 = 1;
const STT_FUNC: u8 = 2;
const STB_GLOBAL: u8 = 1;

/// Builder for little endian ELF32 files with sections, symbols and an
/// optional `.debug_line` section
#[derive(Clone, Debug)]
pub struct Writer {
    machine: u16,
    sections: Vec<(String, u32, Vec<u8>, bool)>,
    symbols: Vec<(String, u32, u32, bool)>,
    debug_line: Option<Vec<u8>>,
}

impl Default for Writer {
    fn default() -> Self {
        Self {
            machine: MACHINE_RISCV,
            sections: Vec::new(),
            symbols: Vec::new(),
            debug_line: None,
        }
    }
}

impl Writer {
    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    /// Add an executable section holding the given instruction words
    pub fn code(self, name: &str, address: u32, words: &[u32]) -> Self {
        let data = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.section(name, address, data, true)
    }

    pub fn section(mut self, name: &str, address: u32, data: Vec<u8>, executable: bool) -> Self {
        self.sections.push((name.into(), address, data, executable));
        self
    }

    pub fn function(mut self, name: &str, address: u32, size: u32) -> Self {
        self.symbols.push((name.into(), address, size, true));
        self
    }

    pub fn object(mut self, name: &str, address: u32, size: u32) -> Self {
        self.symbols.push((name.into(), address, size, false));
        self
    }

    pub fn debug_line(mut self, program: Vec<u8>) -> Self {
        self.debug_line = Some(program);
        self
    }

    /// Produce the ELF file
    pub fn build(&self) -> Vec<u8> {
        let mut shstrtab = vec![0u8];
        let mut name = |n: &str| {
            let offset = shstrtab.len() as u32;
            shstrtab.extend_from_slice(n.as_bytes());
            shstrtab.push(0);
            offset
        };

        // (name, type, flags, addr, data, link, entsize)
        let mut headers: Vec<(u32, u32, u32, u32, Vec<u8>, u32, u32)> = Vec::new();
        for (n, address, data, executable) in &self.sections {
            let flags = SHF_ALLOC | if *executable { SHF_EXECINSTR } else { 0 };
            headers.push((name(n), SHT_PROGBITS, flags, *address, data.clone(), 0, 0));
        }
        if let Some(program) = self.debug_line.as_ref() {
            headers.push((name(".debug_line"), SHT_PROGBITS, 0, 0, program.clone(), 0, 0));
        }
        if !self.symbols.is_empty() {
            let mut strtab = vec![0u8];
            let mut symtab = vec![0u8; SYMBOL_SIZE];
            for (n, value, size, function) in &self.symbols {
                symtab.extend((strtab.len() as u32).to_le_bytes());
                strtab.extend_from_slice(n.as_bytes());
                strtab.push(0);
                symtab.extend(value.to_le_bytes());
                symtab.extend(size.to_le_bytes());
                let kind = if *function { STT_FUNC } else { STT_OBJECT };
                symtab.push((STB_GLOBAL << 4) | kind);
                symtab.push(0);
                // Any defined section will do
                symtab.extend(1u16.to_le_bytes());
            }
            // The string table follows the symbol table
            let link = headers.len() as u32 + 2;
            headers.push((
                name(".symtab"),
                SHT_SYMTAB,
                0,
                0,
                symtab,
                link,
                SYMBOL_SIZE as u32,
            ));
            headers.push((name(".strtab"), SHT_STRTAB, 0, 0, strtab, 0, 0));
        }
        let shstrndx = headers.len() as u32 + 1;
        let shstrtab_name = name(".shstrtab");
        headers.push((shstrtab_name, SHT_STRTAB, 0, 0, shstrtab.clone(), 0, 0));

        let mut data = vec![0u8; HEADER_SIZE];
        let mut table = vec![0u8; SECTION_HEADER_SIZE];
        for (name, kind, flags, address, content, link, entsize) in headers {
            while data.len() % 4 != 0 {
                data.push(0);
            }
            let fields = [
                name,
                kind,
                flags,
                address,
                data.len() as u32,
                content.len() as u32,
                link,
                // sh_info: one past the last local symbol
                if kind == SHT_SYMTAB { 1 } else { 0 },
                if kind == SHT_SYMTAB { 4 } else { 1 },
                entsize,
            ];
            table.extend(fields.iter().flat_map(|f| f.to_le_bytes()));
            data.extend(content);
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }
        let shoff = data.len() as u32;
        let shnum = (table.len() / SECTION_HEADER_SIZE) as u16;
        data.extend(table);

        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.extend([0x7f, b'E', b'L', b'F', 1, 1, 1, 0]);
        header.extend([0; 8]);
        header.extend(2u16.to_le_bytes());
        header.extend(self.machine.to_le_bytes());
        header.extend(1u32.to_le_bytes());
        header.extend(0u32.to_le_bytes());
        header.extend(0u32.to_le_bytes());
        header.extend(shoff.to_le_bytes());
        header.extend(0u32.to_le_bytes());
        header.extend((HEADER_SIZE as u16).to_le_bytes());
        header.extend(32u16.to_le_bytes());
        header.extend(0u16.to_le_bytes());
        header.extend((SECTION_HEADER_SIZE as u16).to_le_bytes());
        header.extend(shnum.to_le_bytes());
        header.extend((shstrndx as u16).to_le_bytes());
        data[..HEADER_SIZE].copy_from_slice(&header);
        data
    }
}

/// Produce a DWARF 3 line program for a single file
///
/// Each row maps the address to the line. The sequence ends at `end`.
pub fn line_program(file: &str, rows: &[(u32, u32)], end: u32) -> Vec<u8> {
    let mut header = vec![
        1,   // minimum_instruction_length
        1,   // default_is_stmt
        -5i8 as u8, // line_base
        14,  // line_range
        13,  // opcode_base
    ];
    header.extend([0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1]);
    // No include directories
    header.push(0);
    header.extend_from_slice(file.as_bytes());
    header.extend([0, 0, 0, 0]);
    header.push(0);

    let mut program = Vec::new();
    let mut address = None;
    let mut line = 1i64;
    for (row_address, row_line) in rows {
        match address {
            None => {
                program.extend([0x00, 5, 0x02]);
                program.extend(row_address.to_le_bytes());
            }
            Some(a) => {
                program.push(0x02);
                uleb(&mut program, u64::from(row_address - a));
            }
        }
        address = Some(*row_address);
        program.push(0x03);
        sleb(&mut program, i64::from(*row_line) - line);
        line = i64::from(*row_line);
        program.push(0x01);
    }
    program.push(0x02);
    uleb(&mut program, u64::from(end - address.unwrap_or(end)));
    program.extend([0x00, 1, 0x01]);

    let mut unit = Vec::new();
    unit.extend(3u16.to_le_bytes());
    unit.extend((header.len() as u32).to_le_bytes());
    unit.extend(header);
    unit.extend(program);

    let mut data = (unit.len() as u32).to_le_bytes().to_vec();
    data.extend(unit);
    data
}

fn uleb(data: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            data.push(byte);
            return;
        }
        data.push(byte | 0x80);
    }
}

fn sleb(data: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            data.push(byte);
            return;
        }
        data.push(byte | 0x80);
    }
}
