// Copyright (C) 2024, 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

//! # Instruction trace reconstruction for RISC-V Nexus traces
//!
//! This crate reconstructs the sequence of executed instructions from a
//! Nexus trace captured on a RISC-V target, given the ELF file of the traced
//! program. Reconstructed instructions are correlated with the program's
//! debug information, i.e. source files, lines and functions.
//!
//! The crate is organized in layers, each of which may be used on its own:
//! - [`image`] loads executable sections, symbols and line information from
//!   an ELF file into an [`ObjectImage`],
//! - [`instruction`] disassembles the instructions of an image,
//! - [`message`] decodes the slices of a trace into logical messages,
//! - [`tracer`] replays messages against an image, yielding
//!   [`Record`][tracer::Record]s of retired instructions,
//! - [`print`] reassembles instrumented print output carried in the trace,
//! - [`stats`] accumulates statistics over a session.
//!
//! A [`Session`] ties all of those together.
//!
//! # Nexus features
//! - multi-core traces with configurable core id width
//! - branch history messages
//! - relative and full addresses
//! - running timestamps with wrap-around compensation
//! - print output via data acquisition messages
//!
//! # Example
//!
//! ```
//! use riscv_nexus::image::{ObjectImage, Section, Symbol};
//! use riscv_nexus::instruction::base;
//! use riscv_nexus::message::{self, Raw, TCode};
//!
//! // addi a0, a0, 1; ret
//! let code = b"\x13\x05\x15\x00\x67\x80\x00\x00";
//! let image = ObjectImage::builder(base::Set::Rv32I)
//!     .section(Section::new(".text", 0x80, code.to_vec(), true))
//!     .symbol(Symbol::function("main", 0x80, 8))
//!     .build();
//! let trace = message::builder()
//!     .encoder()
//!     .encode(&Raw::new(TCode::Sync, 0).with_fields([0, 0, 0x80 >> 1]))
//!     .finish();
//!
//! let mut session = riscv_nexus::start_session(&image, trace, Default::default()).unwrap();
//! let records = session.advance().unwrap();
//! assert_eq!(records.len(), 2);
//! assert_eq!(session.render(&records[1]), "84: 00008067 jalr x0, x1, 0x0 <main+0x4>");
//! assert!(matches!(session.advance(), Err(riscv_nexus::Error::EndOfTrace)));
//! ```

pub mod config;
pub mod error;
pub mod image;
pub mod instruction;
pub mod message;
pub mod print;
pub mod session;
pub mod stats;
pub mod tracer;


pub use error::Error;
pub use image::ObjectImage;
pub use session::Session;

/// Load an [`ObjectImage`] from the ELF file at the given path
pub fn open(path: impl AsRef<std::path::Path>) -> Result<ObjectImage, Error> {
    Ok(ObjectImage::load(path)?)
}

/// Start a [`Session`] reconstructing the given trace
pub fn start_session<D: AsRef<[u8]>>(
    image: &ObjectImage,
    trace: D,
    config: config::Configuration,
) -> Result<Session<'_, D>, Error> {
    Session::new(image, trace, config)
}
