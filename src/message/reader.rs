// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Message reader

use std::collections::{HashMap, VecDeque};

use super::error::Error;
use super::slice::{self, Decoder, MDO_BITS};
use super::tcode::Field;
use super::{Fragment, Message, Payload, Raw, TCode};

/// Number of stimulus channels carrying print data
const PRINT_CHANNELS: u64 = 32;

/// A reader for trace [`Message`]s
///
/// A reader is created via a [`Builder`][super::Builder]. It decodes the trace
/// data in a single pass, one message at a time. Framing errors are reported
/// for the affected message only: the reader always resumes at the message
/// boundary following a malformed message.
///
/// The reader keeps track of each core's reference address and running
/// timestamp, from which it reconstructs the full addresses and timestamps of
/// the [`Message`]s it emits.
///
/// # Example
///
/// ```
/// use riscv_nexus::message::{self, Payload, Raw, TCode};
///
/// let trace = message::builder()
///     .encoder()
///     .encode(&Raw::new(TCode::Sync, 0).with_fields([0, 0, 0x800]))
///     .finish();
/// let mut reader = message::builder().build(trace);
/// let message = reader.next_message().unwrap();
/// assert_eq!(message.payload, Payload::Sync { address: 0x1000, i_cnt: 0 });
/// assert_eq!(reader.next_message(), Err(message::Error::EndOfTrace));
/// ```
#[derive(Clone, Debug)]
pub struct Reader<D> {
    data: D,
    pos: usize,
    src_bits: u8,
    timestamp_width: u8,
    cores: HashMap<u16, CoreState>,
    pending: VecDeque<Message>,
}

impl<D: AsRef<[u8]>> Reader<D> {
    /// Create a new reader
    pub(super) fn new(data: D, src_bits: u8, timestamp_width: u8) -> Self {
        Self {
            data,
            pos: 0,
            src_bits,
            timestamp_width,
            cores: Default::default(),
            pending: Default::default(),
        }
    }

    /// Restart decoding from the first byte
    ///
    /// All per-core state is discarded.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.cores.clear();
        self.pending.clear();
    }

    /// Retrieve the current byte position
    pub fn byte_pos(&self) -> usize {
        self.pos
    }

    /// Decode the next logical [`Message`]
    ///
    /// A single wire-level message may expand to multiple logical messages,
    /// e.g. one [`Payload::DirectBranch`] per history bit. Those are returned
    /// by subsequent calls. Wire-level messages without any relevance for the
    /// reconstruction are skipped silently, unless they carry a timestamp.
    ///
    /// Returns [`Error::EndOfTrace`] once all data was consumed, on this and
    /// every subsequent call.
    pub fn next_message(&mut self) -> Result<Message, Error> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                tracing::trace!(%message, "decoded message");
                return Ok(message);
            }
            let raw = self.next_raw()?;
            self.expand(&raw)?;
        }
    }

    /// Decode the next wire-level [`Raw`] message
    ///
    /// Idle slices preceeding the message are skipped. No address or timestamp
    /// reconstruction takes place.
    pub fn next_raw(&mut self) -> Result<Raw, Error> {
        let data = self.data.as_ref();
        while data.get(self.pos) == Some(&slice::IDLE) {
            self.pos += 1;
        }

        let start = self.pos;
        let remaining = data.get(start..).unwrap_or_default();
        if remaining.is_empty() {
            return Err(Error::EndOfTrace);
        }
        let Some(len) = remaining
            .iter()
            .position(|s| slice::mseo(*s) == slice::MSEO_END_MESSAGE)
            .map(|p| p + 1)
        else {
            self.pos = data.len();
            return Err(Error::Truncated { pos: start });
        };
        self.pos = start + len;

        let slices = &remaining[..len];
        if slices
            .iter()
            .any(|s| slice::mseo(*s) == slice::MSEO_RESERVED)
        {
            return Err(Error::ReservedMseo { pos: start });
        }

        let malformed = |core, cause| Error::Malformed {
            pos: start,
            core,
            cause,
        };
        let mut decoder = Decoder::new(slices);
        let tcode = decoder
            .read_fixed(MDO_BITS)
            .map_err(|e| malformed(None, e))? as u8;
        let tcode =
            TCode::try_from(tcode).map_err(|tcode| Error::UnknownTCode { tcode, pos: start })?;
        let core = decoder
            .read_fixed(self.src_bits)
            .map_err(|e| malformed(None, e))? as u16;
        let Some(layout) = tcode.layout() else {
            return Err(Error::Unsupported { tcode, core });
        };

        let mut raw = Raw::new(tcode, core);
        for field in layout {
            let value = match field {
                Field::Fixed(bits) => decoder.read_fixed(*bits),
                Field::Var => decoder.read_var(),
            };
            raw.fields.push(value.map_err(|e| malformed(Some(core), e))?);
        }
        while decoder.has_more() {
            let value = decoder
                .read_var()
                .map_err(|e| malformed(Some(core), e))?;
            raw.fields.push(value);
        }
        Ok(raw)
    }

    /// Expand a wire-level message into logical messages
    fn expand(&mut self, raw: &Raw) -> Result<(), Error> {
        let fields = raw.fields.as_slice();
        let mandatory = raw.tcode.layout().map(<[_]>::len).unwrap_or_default();
        let (mandatory_fields, extra) = fields.split_at(mandatory.min(fields.len()));
        let field = |i: usize| mandatory_fields.get(i).copied().unwrap_or_default();
        let width = self.timestamp_width;
        let core = raw.core;
        let state = self.cores.entry(core).or_default();

        let unsupported = Error::Unsupported {
            tcode: raw.tcode,
            core,
        };
        // History carried in an optional field, preceeding the timestamp
        let extra_history = raw.tcode == TCode::Correlation && field(1) == 1;
        let timestamp = extra.get(usize::from(extra_history)).copied();
        if raw.tcode == TCode::Error {
            *state = Default::default();
        } else {
            state.update_timestamp(timestamp, raw.tcode.is_sync(), width);
        }
        let ts = state.timestamp;

        let mut out = Vec::new();

        match raw.tcode {
            TCode::Sync | TCode::DirectBranchSync => {
                state.address = field(2) << 1;
                out.push(Payload::Sync {
                    address: state.address,
                    i_cnt: state.i_cnt(field(1)),
                });
            }
            TCode::IndirectBranchSync => {
                state.address = field(3) << 1;
                out.push(Payload::Sync {
                    address: state.address,
                    i_cnt: state.i_cnt(field(2)),
                });
            }
            TCode::DirectBranch => out.push(Payload::DirectBranch {
                taken: true,
                i_cnt: state.i_cnt(field(0)),
            }),
            TCode::IndirectBranch => {
                state.address ^= field(2) << 1;
                let i_cnt = state.i_cnt(field(1));
                out.push(indirect(field(0), state.address, i_cnt));
            }
            TCode::IndirectBranchHistory => {
                state.address ^= field(2) << 1;
                history(field(3), &mut out);
                let i_cnt = state.i_cnt(field(1));
                out.push(indirect(field(0), state.address, i_cnt));
            }
            TCode::IndirectBranchHistorySync => {
                state.address = field(3) << 1;
                history(field(4), &mut out);
                out.push(Payload::Sync {
                    address: state.address,
                    i_cnt: state.i_cnt(field(2)),
                });
            }
            TCode::ResourceFull => match field(0) {
                0 => state.overflow = state.overflow.saturating_add(field(1)),
                1 => history(field(1), &mut out),
                _ => return Err(unsupported),
            },
            TCode::Correlation => {
                // Tracing stops, the count is not resolved to any address
                state.overflow = 0;
                if extra_history {
                    history(extra.first().copied().unwrap_or_default(), &mut out);
                }
            }
            TCode::DataAcquisition => {
                let channel = field(0) >> 2;
                if channel < PRINT_CHANNELS {
                    let count = 4 - (field(0) & 0b11) as usize;
                    let bytes = field(1).to_le_bytes();
                    fragments(&bytes[..count], &mut |data, terminator| {
                        out.push(Payload::PrintFragment(Fragment {
                            core,
                            channel: channel as u8,
                            data: data.into(),
                            terminator,
                            timestamp: ts,
                        }))
                    });
                }
            }
            TCode::Error => {
                tracing::warn!(core, code = field(1), "encoder reported lost messages");
                out.push(Payload::Error { code: field(1) });
            }
            TCode::OwnershipTrace | TCode::AuxAccessWrite => (),
            _ => return Err(unsupported),
        }

        if out.is_empty() && timestamp.is_some() {
            out.push(Payload::Timestamp);
        }
        self.pending.extend(out.into_iter().map(|payload| Message {
            core,
            timestamp: ts,
            payload,
        }));
        Ok(())
    }
}

/// Per-core state of a [`Reader`]
#[derive(Copy, Clone, Debug, Default)]
struct CoreState {
    address: u64,
    timestamp: u64,
    /// Instruction count reported via resource full messages
    overflow: u64,
}

impl CoreState {
    /// Combine a message's instruction count with any preceeding overflow
    fn i_cnt(&mut self, value: u64) -> u64 {
        core::mem::take(&mut self.overflow).saturating_add(value)
    }

    /// Update the running timestamp
    ///
    /// Full timestamps replace the lower `width` bits of the running
    /// timestamp, other ones are XORed to it. A resulting timestamp lower than
    /// the previous one is considered a wrap-around.
    fn update_timestamp(&mut self, value: Option<u64>, full: bool, width: u8) {
        let Some(value) = value else {
            return;
        };
        let wrap = 1u64.checked_shl(width.into()).unwrap_or_default();
        let last = self.timestamp;
        let ts = if full {
            value.wrapping_add(last & !wrap.wrapping_sub(1))
        } else if last != 0 {
            last ^ value
        } else {
            0
        };
        self.timestamp = if ts < last { ts.wrapping_add(wrap) } else { ts };
    }
}

/// Expand history bits into [`Payload::DirectBranch`]es, oldest first
///
/// The most significant set bit is a stop bit, not a branch outcome.
fn history(history: u64, out: &mut Vec<Payload>) {
    if history == 0 {
        return;
    }
    let stop = u64::BITS - 1 - history.leading_zeros();
    out.extend((0..stop).rev().map(|i| Payload::DirectBranch {
        taken: (history >> i) & 1 != 0,
        i_cnt: 0,
    }));
}

/// Create the payload for an indirect branch with the given branch type
fn indirect(btype: u64, address: u64, i_cnt: u64) -> Payload {
    if btype == 0 {
        Payload::IndirectBranch {
            target: address,
            i_cnt,
        }
    } else {
        Payload::Exception { address, i_cnt }
    }
}

/// Split written bytes into fragments at line terminators
///
/// Newlines are kept as part of the fragment they terminate, NUL bytes are
/// dropped. Consecutive NUL bytes only terminate once.
fn fragments(bytes: &[u8], emit: &mut impl FnMut(&[u8], bool)) {
    let mut start = 0;
    for (i, byte) in bytes.iter().enumerate() {
        match byte {
            b'\n' => {
                emit(&bytes[start..=i], true);
                start = i + 1;
            }
            0 => {
                if start < i || i == 0 {
                    emit(&bytes[start..i], true);
                }
                start = i + 1;
            }
            _ => (),
        }
    }
    if start < bytes.len() {
        emit(&bytes[start..], false);
    }
}
