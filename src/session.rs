// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Reconstruction sessions
//!
//! A [`Session`] ties together a [`message::Reader`], a [`Tracer`], a print
//! [`Assembler`] and the session's [`Stats`]. It is driven by repeated calls
//! to [`Session::advance`], each of which consumes exactly one message.


use crate::config::{AddressWidth, Configuration};
use crate::error::Error;
use crate::image::{ObjectImage, SourceFiles};
use crate::message::{self, Kind, Payload};
use crate::print::{Assembler, PrintLine};
use crate::stats::{SessionStats, Stats};
use crate::tracer::{self, Record, State, Tracer};

/// A reconstruction session over a single trace
///
/// # Example
///
/// ```no_run
/// use riscv_nexus::{Error, config::Configuration};
///
/// let image = riscv_nexus::open("program.elf").unwrap();
/// let trace = std::fs::read("program.rtd").unwrap();
/// let mut session = riscv_nexus::start_session(&image, trace, Configuration::default()).unwrap();
/// loop {
///     match session.advance() {
///         Ok(records) => records.iter().for_each(|r| println!("{}", session.render(r))),
///         Err(Error::EndOfTrace) => break,
///         Err(e) if e.is_recoverable() => eprintln!("{e}"),
///         Err(e) => panic!("{e}"),
///     }
/// }
/// println!("{}", session.close().stats);
/// ```
pub struct Session<'i, D> {
    config: Configuration,
    reader: message::Reader<D>,
    tracer: Tracer<'i>,
    assembler: Assembler,
    lines: Vec<PrintLine>,
    stats: Stats,
    files: SourceFiles,
    finished: bool,
    address_digits: usize,
}

impl<'i, D: AsRef<[u8]>> Session<'i, D> {
    /// Create a new session for the given image and trace data
    ///
    /// Fails with [`Error::Unsupported`] if the configuration is invalid.
    pub fn new(image: &'i ObjectImage, trace: D, config: Configuration) -> Result<Self, Error> {
        config.validate()?;
        let reader = message::builder()
            .with_src_bits(config.src_bits)
            .with_timestamp_width(config.timestamp_width)
            .build(trace);
        let tracer = tracer::builder()
            .with_core_mask(config.core_mask)
            .with_max_run(config.max_run)
            .with_return_stack(config.return_stack)
            .build(image);
        let address_bits = match config.address_width {
            AddressWidth::Auto => image.address_bits(),
            AddressWidth::Fixed(bits) => bits,
        };
        tracing::debug!(
            src_bits = config.src_bits,
            timestamp_width = config.timestamp_width,
            address_bits,
            return_stack = config.return_stack,
            "session started"
        );
        Ok(Self {
            assembler: Assembler::new(config.print_buffer_limit),
            files: SourceFiles::new(config.source_path.clone()),
            config,
            reader,
            tracer,
            lines: Default::default(),
            stats: Default::default(),
            finished: false,
            address_digits: usize::from(address_bits).div_ceil(4),
        })
    }

    /// Consume the next message
    ///
    /// Returns the [`Record`]s of all instructions reconstructed due to the
    /// message, which may be none. Records reconstructed before a previous
    /// call failed are returned ahead of them. If the trace ends after such a
    /// call, those records are returned by one more call before the end is
    /// reported.
    ///
    /// Once all messages are consumed, [`Error::EndOfTrace`] is returned for
    /// this and all future calls.
    pub fn advance(&mut self) -> Result<Vec<Record>, Error> {
        if self.finished {
            return Err(Error::EndOfTrace);
        }
        let message = match self.reader.next_message() {
            Ok(message) => message,
            Err(message::Error::EndOfTrace) => {
                let partial = self.tracer.take_partial();
                if !partial.is_empty() {
                    partial
                        .iter()
                        .for_each(|r| self.stats.record_instruction(r));
                    return Ok(partial);
                }
                tracing::debug!("end of trace");
                self.finished = true;
                self.stats.record_message(Kind::End);
                return Err(Error::EndOfTrace);
            }
            Err(err @ message::Error::Unsupported { .. }) => {
                tracing::debug!(error = %err, "skipping message");
                self.stats.record_unsupported();
                return Err(err.into());
            }
            Err(err) => {
                tracing::warn!(error = %err, pos = self.reader.byte_pos(), "could not decode message");
                self.stats.record_decode_error();
                for _ in 0..self.tracer.fault(err.core()) {
                    self.stats.record_fault();
                }
                return Err(err.into());
            }
        };
        tracing::trace!(%message, "advance");
        self.stats.record_message(message.kind());
        self.stats.record_timestamp(message.timestamp);

        let records = match &message.payload {
            Payload::PrintFragment(fragment) => {
                if self.config.print_channels.contains(fragment.channel.into()) {
                    if let Some(line) = self.assembler.feed(fragment) {
                        self.stats.record_print_line();
                        self.lines.push(line);
                    }
                }
                Vec::new()
            }
            _ => self.tracer.process(&message).inspect_err(|_| {
                self.stats.record_fault();
            })?,
        };

        let mut delivered = self.tracer.take_partial();
        delivered.extend(records);
        delivered
            .iter()
            .for_each(|r| self.stats.record_instruction(r));
        Ok(delivered)
    }

    /// Take all print lines finalized since the last call
    pub fn pending_print_lines(&mut self) -> Vec<PrintLine> {
        core::mem::take(&mut self.lines)
    }

    /// Retrieve a snapshot of the session's statistics
    pub fn stats(&self) -> SessionStats {
        self.stats.summary()
    }

    /// Retrieve the reconstruction [`State`] of a core
    pub fn state(&self, core: u16) -> State {
        self.tracer.state(core)
    }

    /// Restart the session from the beginning of the trace
    ///
    /// Statistics and buffered print output are discarded.
    pub fn reset(&mut self) {
        tracing::debug!("session reset");
        self.reader.reset();
        self.tracer.reset();
        self.assembler = Assembler::new(self.config.print_buffer_limit);
        self.lines.clear();
        self.stats = Default::default();
        self.finished = false;
    }

    /// Render a [`Record`] according to the configured verbosity
    pub fn render(&self, record: &Record) -> String {
        let verbosity = self.config.verbosity;
        let mut parts = Vec::new();
        if verbosity.address {
            parts.push(format!(
                "{:0width$x}:",
                record.address,
                width = self.address_digits
            ));
        }
        if verbosity.instruction {
            let bits = record.instruction.bits.to_string();
            parts.push(format!("{bits:<8} {}", record.instruction));
        }
        if verbosity.source {
            match (&record.source, &record.label) {
                (Some(source), _) => parts.push(source.to_string()),
                (None, Some(label)) => parts.push(format!("<{label}>")),
                (None, None) => parts.push("??".into()),
            }
        }
        if verbosity.text {
            if let Some(text) = record.source.as_ref().and_then(|s| s.text(&self.files)) {
                parts.push(format!("| {}", text.trim()));
            }
        }
        parts.join(" ")
    }

    /// Close the session
    ///
    /// Unfinished print lines are finalized as incomplete. Records not yet
    /// delivered after a failing [`advance`][Self::advance] are included in
    /// the [`Summary`].
    pub fn close(mut self) -> Summary {
        let mut print_lines = core::mem::take(&mut self.lines);
        for line in self.assembler.drain_all() {
            self.stats.record_print_line();
            print_lines.push(line);
        }
        let records = self.tracer.take_partial();
        records
            .iter()
            .for_each(|r| self.stats.record_instruction(r));
        tracing::debug!("session closed");
        Summary {
            stats: self.stats.summary(),
            print_lines,
            records,
        }
    }
}

/// Final outcome of a [`Session`]
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub stats: SessionStats,
    /// Print lines not yet taken, including unfinished ones
    pub print_lines: Vec<PrintLine>,
    /// Records not yet delivered
    pub records: Vec<Record>,
}
