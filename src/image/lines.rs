// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Line information
//!
//! Line information is read from the `.debug_line` section directly, without
//! consulting any compilation unit. Hence, file names relative to the
//! compilation directory stay relative.

use std::collections::HashMap;
use std::sync::Arc;

use elf::ElfBytes;
use elf::endian::AnyEndian;
use gimli::{AttributeValue, DebugLineOffset, EndianSlice, LittleEndian};

use crate::instruction::base;

use super::Error;

type Slice<'d> = EndianSlice<'d, LittleEndian>;

/// Address range mapped to a single source line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineRange {
    /// First address of the range
    pub start: u64,
    /// First address after the range
    pub end: u64,
    pub file: Arc<str>,
    pub line: u32,
}

impl LineRange {
    /// Create a new line range
    pub fn new(start: u64, end: u64, file: &str, line: u32) -> Self {
        Self {
            start,
            end,
            file: file.into(),
            line,
        }
    }
}

/// Line ranges ordered for address lookup
#[derive(Clone, Debug, Default)]
pub(super) struct Table {
    ranges: Vec<LineRange>,
}

impl Table {
    pub fn new(mut ranges: Vec<LineRange>) -> Self {
        ranges.retain(|r| r.start < r.end);
        ranges.sort_by_key(|r| r.start);
        Self { ranges }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Find the range containing the address
    pub fn find(&self, address: u64) -> Option<&LineRange> {
        let idx = self.ranges.partition_point(|r| r.start <= address);
        self.ranges[..idx].iter().rev().find(|r| address < r.end)
    }
}

/// String sections referenced from line program headers
struct Strings<'d> {
    str: gimli::DebugStr<Slice<'d>>,
    line_str: gimli::DebugLineStr<Slice<'d>>,
}

impl<'d> Strings<'d> {
    fn resolve(&self, value: AttributeValue<Slice<'d>>) -> Option<String> {
        let string = match value {
            AttributeValue::String(s) => s,
            AttributeValue::DebugStrRef(offset) => self.str.get_str(offset).ok()?,
            AttributeValue::DebugLineStrRef(offset) => self.line_str.get_str(offset).ok()?,
            _ => return None,
        };
        Some(string.to_string_lossy().into_owned())
    }
}

/// Extract line ranges from the line programs of an ELF file
pub(super) fn from_elf(
    file: &ElfBytes<'_, AnyEndian>,
    base: base::Set,
) -> Result<Vec<LineRange>, Error> {
    let strings = Strings {
        str: gimli::DebugStr::new(section(file, ".debug_str")?, LittleEndian),
        line_str: gimli::DebugLineStr::new(section(file, ".debug_line_str")?, LittleEndian),
    };
    parse(section(file, ".debug_line")?, &strings, base.address_bits() / 8)
}

/// Retrieve the data of a debug section, or nothing if it is absent
fn section<'d>(file: &ElfBytes<'d, AnyEndian>, name: &str) -> Result<&'d [u8], Error> {
    let Some(header) = file.section_header_by_name(name)? else {
        return Ok(&[]);
    };
    match file.section_data(&header)? {
        (_, Some(_)) => {
            tracing::warn!(name, "skipping compressed debug section");
            Ok(&[])
        }
        (data, None) => Ok(data),
    }
}

fn parse<'d>(
    data: &'d [u8],
    strings: &Strings<'d>,
    address_size: u8,
) -> Result<Vec<LineRange>, Error> {
    let debug_line = gimli::DebugLine::new(data, LittleEndian);
    let mut ranges = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let program = debug_line.program(DebugLineOffset(offset), address_size, None, None)?;
        let header = program.header();
        offset += header.unit_length() + usize::from(header.format().initial_length_size());

        let mut files: HashMap<u64, Arc<str>> = HashMap::new();
        let mut current: Option<(u64, Arc<str>, u32)> = None;
        let mut rows = program.rows();
        while let Some((header, row)) = rows.next_row()? {
            if let Some((start, file, line)) = current.take() {
                if row.address() > start {
                    ranges.push(LineRange {
                        start,
                        end: row.address(),
                        file,
                        line,
                    });
                }
            }
            if row.end_sequence() {
                continue;
            }
            let Some(line) = row.line() else {
                continue;
            };
            let file = files
                .entry(row.file_index())
                .or_insert_with(|| {
                    row.file(header)
                        .map(|entry| {
                            let name = strings.resolve(entry.path_name()).unwrap_or_default();
                            let dir = entry.directory(header).and_then(|d| strings.resolve(d));
                            match dir {
                                Some(dir) if !dir.is_empty() && !name.starts_with('/') => {
                                    format!("{dir}/{name}").into()
                                }
                                _ => name.into(),
                            }
                        })
                        .unwrap_or_else(|| "??".into())
                })
                .clone();
            let line = u32::try_from(line.get()).unwrap_or(u32::MAX);
            current = Some((row.address(), file, line));
        }
    }
    Ok(ranges)
}
