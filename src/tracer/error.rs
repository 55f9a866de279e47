// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use crate::message;

/// Tracing specific errors
///
/// These errors denote disagreement between the trace and the instructions
/// found in the image. They are reported as the cause of an
/// [`UnexpectedEncoding`][crate::Error::UnexpectedEncoding].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A message does not resolve the instruction the tracer is waiting on
    ///
    /// `pending` is the mnemonic of the instruction waiting for resolution.
    #[error("{evidence} message does not resolve pending {pending}")]
    UnexpectedEvidence {
        evidence: message::Kind,
        pending: &'static str,
    },
    /// A message's instruction count does not end at an instruction the
    /// message may refer to
    ///
    /// `retired` is the number of half-words retired since the previous
    /// counted message when the mismatch was detected.
    #[error("instruction count {i_cnt} does not match {retired} retired half-words")]
    CountMismatch { i_cnt: u64, retired: u64 },
    /// No instruction requiring trace evidence was found within the given
    /// number of instructions
    #[error("no branch within {0} instructions")]
    RunLimit(u64),
}
