// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Nexus trace decoder
//!
//!     Usage: decode [OPTIONS] <elf> <trace>
//!
//! This program reconstructs the instructions executed by the program provided
//! in the form of an ELF file from a Nexus trace file. Optionally, a session
//! configuration may be supplied in the form of a TOML file, e.g.
//!
//! ```toml
//! src_bits = 2
//! core_mask = "0x1"
//! frequency = 100000000
//!
//! [verbosity]
//! instruction = false
//! ```
//!
//! The program prints a single line for every reconstructed instruction and
//! every line of print output to stdout. Log output is controlled via the
//! `RUST_LOG` environment variable or the `--debug` flag.

use std::path::PathBuf;

use riscv_nexus::{Error, config::Configuration};

fn main() {
    let matches = clap::Command::new("Nexus trace decoder")
        .arg(clap::arg!(<elf> "Path to the ELF file").value_parser(clap::value_parser!(PathBuf)))
        .arg(
            clap::arg!(<trace> "Path to the trace file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::arg!(-c --config <FILE> "Session configuration")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::arg!(-s --stats "Print statistics after the trace was decoded")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::arg!(-d --debug "Enable additional debug output")
                .env("DEBUG")
                .action(clap::ArgAction::SetTrue)
                .value_parser(clap::builder::FalseyValueParser::new()),
        )
        .get_matches();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if matches.get_flag("debug") {
            "riscv_nexus=debug".into()
        } else {
            "warn".into()
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config: Configuration = matches
        .get_one::<PathBuf>("config")
        .map(|p| {
            let config = std::fs::read_to_string(p).expect("Could not load configuration");
            toml::from_str(config.as_ref()).expect("Could not parse configuration")
        })
        .unwrap_or_default();
    tracing::debug!(?config, "configuration");

    let elf = matches.get_one::<PathBuf>("elf").expect("No ELF file specified");
    let image = riscv_nexus::open(elf).expect("Could not load ELF file");
    let trace = matches
        .get_one::<PathBuf>("trace")
        .expect("No trace file specified");
    let trace = std::fs::read(trace).expect("Could not load trace file");

    let frequency = config.frequency;
    let mut session =
        riscv_nexus::start_session(&image, trace, config).expect("Could not start session");
    loop {
        match session.advance() {
            Ok(records) => records
                .iter()
                .for_each(|r| println!("[{}] {}", r.core, session.render(r))),
            Err(Error::EndOfTrace) => break,
            Err(e) if e.is_recoverable() => eprintln!("Skipping: {}", chain(&e)),
            Err(e) => panic!("Could not decode trace: {e}"),
        }
        session
            .pending_print_lines()
            .iter()
            .for_each(|l| print_line(l, frequency));
    }

    let summary = session.close();
    summary
        .print_lines
        .iter()
        .for_each(|l| print_line(l, frequency));
    if matches.get_flag("stats") {
        print!("{}", summary.stats);
    }
}

/// Render an error including all its causes
fn chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text = format!("{text}: {cause}");
        source = cause.source();
    }
    text
}

fn print_line(line: &riscv_nexus::print::PrintLine, frequency: Option<u32>) {
    let marker = if line.complete { "" } else { " (incomplete)" };
    match frequency {
        Some(f) => {
            let (start, end) = line.seconds(f);
            println!(
                "[{}:{}] {start:.6}s..{end:.6}s {}{marker}",
                line.core,
                line.channel,
                line.trimmed()
            );
        }
        None => println!(
            "[{}:{}] {}..{} {}{marker}",
            line.core,
            line.channel,
            line.start,
            line.end,
            line.trimmed()
        ),
    }
}
