// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Result codes of the reconstruction API

use crate::{config, image, instruction, message, tracer};

/// Errors returned by the reconstruction API
///
/// Variants carry the underlying cause where there is one. Successful
/// operations are represented by the `Ok` arm of a [`Result`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// All trace messages were consumed
    #[error("end of trace")]
    EndOfTrace,
    /// The image could not be loaded
    #[error("bad image")]
    BadImage(#[from] image::Error),
    /// The trace data is malformed
    #[error("bad trace format")]
    BadTraceFormat(#[source] message::Error),
    /// There is no debug information for the given address
    #[error("no debug information for address {0:#x}")]
    CorrelationMiss(u64),
    /// Trace and image disagree on the instruction at the given address
    #[error("unexpected encoding at {address:#x}")]
    UnexpectedEncoding {
        address: u64,
        #[source]
        cause: Cause,
    },
    /// A message or setting is not supported
    #[error("unsupported")]
    Unsupported(#[source] Unsupported),
}

impl Error {
    /// Determine whether the reconstruction may continue after this error
    ///
    /// Errors concerning individual messages or instructions are recoverable.
    /// Errors concerning the image, the configuration and the end of the trace
    /// are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::BadTraceFormat(_)
                | Self::CorrelationMiss(_)
                | Self::UnexpectedEncoding { .. }
                | Self::Unsupported(Unsupported::Message(_))
        )
    }
}

impl From<message::Error> for Error {
    fn from(err: message::Error) -> Self {
        match err {
            message::Error::EndOfTrace => Self::EndOfTrace,
            message::Error::Unsupported { .. } => Self::Unsupported(Unsupported::Message(err)),
            err => Self::BadTraceFormat(err),
        }
    }
}

impl From<config::Error> for Error {
    fn from(err: config::Error) -> Self {
        Self::Unsupported(Unsupported::Configuration(err))
    }
}

/// Cause of an [`Error::UnexpectedEncoding`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Cause {
    /// The address is not inside any executable section
    #[error("address is not in an executable section")]
    NotExecutable,
    /// The bytes at the address do not form a known instruction
    #[error(transparent)]
    Instruction(#[from] instruction::Error),
    /// The trace contradicts the disassembled instructions
    #[error(transparent)]
    Trace(#[from] tracer::error::Error),
}

/// Things that may be unsupported
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Unsupported {
    /// A trace message not used for reconstruction
    #[error(transparent)]
    Message(message::Error),
    /// An invalid configuration value
    #[error(transparent)]
    Configuration(config::Error),
}
