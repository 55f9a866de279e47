// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
use super::*;

use crate::error::Cause;
use crate::image::{LineRange, Section, Symbol};
use crate::instruction::base;
use crate::message;

const ADDI: u32 = 0x00150513;
const BEQ_8: u32 = 0x00000463;
const J_8: u32 = 0x0080006f;
const J_BACK: u32 = 0xffdff06f;
const J_SELF: u32 = 0x0000006f;
const CALL_8: u32 = 0x008000ef;
const JR_A1: u32 = 0x00058067;
const RET: u32 = 0x00008067;
const ECALL: u32 = 0x00000073;

fn image(words: &[u32]) -> ObjectImage {
    let data = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    ObjectImage::builder(base::Set::Rv64I)
        .section(Section::new(".text", 0x100, data, true))
        .symbol(Symbol::function("f", 0x100, 0))
        .line(LineRange::new(0x100, 0x108, "f.c", 3))
        .build()
}

fn message(payload: Payload) -> Message {
    Message {
        core: 0,
        timestamp: 7,
        payload,
    }
}

fn sync(address: u64) -> Message {
    message(Payload::Sync { address, i_cnt: 0 })
}

fn indirect(target: u64, i_cnt: u64) -> Payload {
    Payload::IndirectBranch { target, i_cnt }
}

fn addresses(records: &[Record]) -> Vec<u64> {
    records.iter().map(|r| r.address).collect()
}

fn process(tracer: &mut Tracer<'_>, payload: Payload) -> Vec<u64> {
    let records = tracer
        .process(&message(payload))
        .expect("Could not process message");
    addresses(&records)
}

#[test]
fn sync_runs_to_branch() {
    let image = image(&[ADDI, ADDI, BEQ_8, ADDI]);
    let mut tracer = builder().build(&image);
    assert_eq!(tracer.state(0), State::Unsynced);
    let records = tracer.process(&sync(0x100)).expect("Could not process sync");
    assert_eq!(addresses(&records), [0x100, 0x104, 0x108]);
    assert_eq!(tracer.state(0), State::Branching);

    let record = &records[0];
    assert_eq!(record.core, 0);
    assert_eq!(record.timestamp, 7);
    assert_eq!(record.instruction.to_string(), "addi x10, x10, 0x1");
    assert_eq!(record.flow, Flow::Sequential);
    assert_eq!(record.correlation(), image.lookup(0x100));
    assert_eq!(records[1].source.as_ref().map(|s| s.line), Some(3));
    assert_eq!(records[2].source, None);
    assert_eq!(records[2].flow, Flow::Branch);
    assert_eq!(records[2].label.as_ref().map(|l| l.offset), Some(8));
}

#[test]
fn branch_taken() {
    let image = image(&[BEQ_8, ADDI, ADDI, BEQ_8]);
    let mut tracer = builder().build(&image);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), [0x100]);
    assert_eq!(
        process(&mut tracer, Payload::DirectBranch { taken: true, i_cnt: 0 }),
        [0x108, 0x10c]
    );
}

#[test]
fn branch_not_taken() {
    let image = image(&[BEQ_8, ADDI, ADDI, BEQ_8]);
    let mut tracer = builder().build(&image);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), [0x100]);
    assert_eq!(
        process(&mut tracer, Payload::DirectBranch { taken: false, i_cnt: 0 }),
        [0x104, 0x108, 0x10c]
    );
    assert_eq!(tracer.state(0), State::Branching);
}

#[test]
fn indirect_branch() {
    let image = image(&[ADDI, JR_A1, ADDI, RET]);
    let mut tracer = builder().build(&image);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), [0x100, 0x104]);
    assert_eq!(
        process(&mut tracer, Payload::IndirectBranch { target: 0x108, i_cnt: 0 }),
        [0x108, 0x10c]
    );
    assert_eq!(tracer.state(0), State::Branching);
}

#[test]
fn counted_not_taken_branch() {
    let image = image(&[ADDI, BEQ_8, ADDI, JR_A1]);
    let mut tracer = builder().build(&image);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), [0x100, 0x104]);
    assert_eq!(
        process(&mut tracer, indirect(0x100, 8)),
        [0x108, 0x10c, 0x100, 0x104]
    );
    assert_eq!(tracer.state(0), State::Branching);
    assert_eq!(
        process(&mut tracer, indirect(0x100, 8)),
        [0x108, 0x10c, 0x100, 0x104]
    );
}

#[test]
fn counted_taken_branch() {
    let image = image(&[ADDI, BEQ_8, ADDI, BEQ_8, ADDI, JR_A1]);
    let mut tracer = builder().build(&image);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), [0x100, 0x104]);
    assert_eq!(
        process(&mut tracer, Payload::DirectBranch { taken: true, i_cnt: 8 }),
        [0x108, 0x10c, 0x114]
    );
    assert_eq!(process(&mut tracer, indirect(0x104, 2)), [0x104]);
}

#[test]
fn count_mismatch() {
    let image = image(&[ADDI, BEQ_8, ADDI, JR_A1]);
    let mut tracer = builder().build(&image);
    process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 });
    assert!(matches!(
        tracer.process(&message(indirect(0x100, 1))),
        Err(CrateError::UnexpectedEncoding {
            address: 0x104,
            cause: Cause::Trace(Error::CountMismatch { i_cnt: 1, retired: 4 }),
        })
    ));
    assert_eq!(tracer.state(0), State::Faulted);
    assert!(tracer.take_partial().is_empty());

    process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 });
    assert!(matches!(
        tracer.process(&message(indirect(0x100, 999))),
        Err(CrateError::UnexpectedEncoding {
            address: 0x10c,
            cause: Cause::Trace(Error::CountMismatch { i_cnt: 999, retired: 8 }),
        })
    ));
    assert_eq!(tracer.state(0), State::Faulted);
    assert_eq!(addresses(&tracer.take_partial()), [0x108, 0x10c]);
}

#[test]
fn counted_self_jump() {
    let image = image(&[ADDI, J_SELF, ADDI, ECALL]);
    let mut tracer = builder().build(&image);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), [0x100, 0x104]);
    assert_eq!(tracer.state(0), State::Synced);
    assert_eq!(
        process(&mut tracer, Payload::Exception { address: 0x108, i_cnt: 8 }),
        [0x104, 0x104, 0x108, 0x10c]
    );
    assert_eq!(tracer.state(0), State::Branching);
}

#[test]
fn counted_sync() {
    let image = image(&[ADDI, BEQ_8, ADDI, JR_A1]);
    let mut tracer = builder().build(&image);
    process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 });
    assert_eq!(
        process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 8 }),
        [0x108, 0x10c, 0x100, 0x104]
    );

    // A sync resynchronizes even if its count does not match
    assert_eq!(
        process(&mut tracer, Payload::Sync { address: 0x108, i_cnt: 3 }),
        [0x108, 0x10c]
    );
    assert_eq!(tracer.state(0), State::Branching);
}

#[test]
fn history_outcomes_share_count() {
    let image = image(&[BEQ_8, ADDI, BEQ_8, ADDI, JR_A1]);
    let mut tracer = builder().build(&image);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), [0x100]);
    assert_eq!(
        process(&mut tracer, Payload::DirectBranch { taken: false, i_cnt: 0 }),
        [0x104, 0x108]
    );
    assert_eq!(
        process(&mut tracer, Payload::DirectBranch { taken: true, i_cnt: 0 }),
        [0x110]
    );
    assert_eq!(process(&mut tracer, indirect(0x100, 8)), [0x100]);

    process(&mut tracer, Payload::DirectBranch { taken: true, i_cnt: 0 });
    assert!(matches!(
        tracer.process(&message(indirect(0x100, 2))),
        Err(CrateError::UnexpectedEncoding {
            cause: Cause::Trace(Error::CountMismatch { i_cnt: 2, retired: 4 }),
            ..
        })
    ));
}

#[test]
fn implicit_returns() {
    // call 0x108; beq; addi; ret
    let image = image(&[CALL_8, BEQ_8, ADDI, RET]);
    let mut tracer = builder().with_return_stack(4).build(&image);
    let records = tracer.process(&sync(0x100)).expect("Could not process sync");
    assert_eq!(addresses(&records), [0x100, 0x108, 0x10c, 0x104]);
    assert_eq!(records[2].flow, Flow::Return);
    assert_eq!(tracer.stack_depth(0), 0);
    assert_eq!(tracer.state(0), State::Branching);

    let mut tracer = builder().build(&image);
    let records = tracer.process(&sync(0x100)).expect("Could not process sync");
    assert_eq!(addresses(&records), [0x100, 0x108, 0x10c]);
    assert_eq!(
        process(&mut tracer, Payload::IndirectBranch { target: 0x104, i_cnt: 6 }),
        [0x104]
    );
}

#[test]
fn return_stack_without_return() {
    // call 0x108; addi; addi; jr a1
    let image = image(&[CALL_8, ADDI, ADDI, JR_A1]);
    let mut tracer = builder().with_return_stack(4).build(&image);
    let records = tracer.process(&sync(0x100)).expect("Could not process sync");
    assert_eq!(addresses(&records), [0x100, 0x108, 0x10c]);
    assert_eq!(tracer.stack_depth(0), 1);
    assert_eq!(tracer.fault(Some(0)), 1);
    assert_eq!(tracer.stack_depth(0), 0);
}

#[test]
fn return_stack_eviction() {
    let mut stack = stack::ReturnStack::new(2);
    stack.push(1);
    stack.push(2);
    stack.push(3);
    assert_eq!(stack.depth(), 2);
    assert_eq!(stack.max_depth(), 2);
    assert_eq!(stack.pop(), Some(3));
    assert_eq!(stack.pop(), Some(2));
    assert_eq!(stack.pop(), None);

    let mut disabled = stack::ReturnStack::new(0);
    disabled.push(1);
    assert_eq!(disabled.pop(), None);
}

#[test]
fn inferable_jumps_are_followed() {
    let image = image(&[J_8, ADDI, CALL_8, ADDI, RET]);
    let mut tracer = builder().build(&image);
    let records = tracer.process(&sync(0x100)).expect("Could not process sync");
    assert_eq!(addresses(&records), [0x100, 0x108, 0x110]);
    let flows: Vec<_> = records.iter().map(|r| r.flow).collect();
    assert_eq!(flows, [Flow::Jump, Flow::Call, Flow::Return]);
}

#[test]
fn absolute_jump() {
    // jalr x0, 0x108(x0)
    let image = image(&[0x10800067, ADDI, RET]);
    let mut tracer = builder().build(&image);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), [0x100, 0x108]);
}

#[test]
fn self_jump_waits() {
    let image = image(&[ADDI, J_SELF, ADDI, ECALL]);
    let mut tracer = builder().build(&image);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), [0x100, 0x104]);
    assert_eq!(tracer.state(0), State::Synced);
    assert_eq!(
        process(&mut tracer, Payload::Exception { address: 0x108, i_cnt: 0 }),
        [0x108, 0x10c]
    );
    assert_eq!(tracer.state(0), State::Branching);
    let records = tracer
        .process(&message(Payload::Exception { address: 0x104, i_cnt: 0 }))
        .expect("Could not process exception");
    assert_eq!(records[0].flow, Flow::Jump);
    assert_eq!(tracer.state(0), State::Synced);

    // Nothing but an exception or sync resolves a self jump
    let result = tracer.process(&message(Payload::DirectBranch { taken: true, i_cnt: 0 }));
    assert!(matches!(
        result,
        Err(CrateError::UnexpectedEncoding {
            address: 0x104,
            cause: Cause::Trace(Error::UnexpectedEvidence {
                evidence: message::Kind::DirectBranch,
                pending: "jal",
            }),
        })
    ));
}

#[test]
fn ecall_is_resolved_by_exception() {
    let image = image(&[ECALL, ADDI, BEQ_8]);
    let mut tracer = builder().build(&image);
    let records = tracer.process(&sync(0x100)).expect("Could not process sync");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].flow, Flow::Exception);
    assert_eq!(
        process(&mut tracer, Payload::Exception { address: 0x104, i_cnt: 0 }),
        [0x104, 0x108]
    );
}

#[test]
fn unexpected_evidence() {
    let image = image(&[ADDI, BEQ_8, ADDI, ADDI]);
    let mut tracer = builder().build(&image);
    process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 });
    let result = tracer.process(&message(Payload::IndirectBranch { target: 0x100, i_cnt: 0 }));
    assert!(matches!(
        result,
        Err(CrateError::UnexpectedEncoding {
            address: 0x104,
            cause: Cause::Trace(Error::UnexpectedEvidence {
                evidence: message::Kind::IndirectBranch,
                pending: "beq",
            }),
        })
    ));
    assert_eq!(tracer.state(0), State::Faulted);

    // Faulted is only left via sync
    assert_eq!(process(&mut tracer, Payload::DirectBranch { taken: true, i_cnt: 0 }), []);
    assert_eq!(process(&mut tracer, Payload::Exception { address: 0x100, i_cnt: 0 }), []);
    assert_eq!(tracer.state(0), State::Faulted);
    assert_eq!(tracer.take_partial(), []);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), [0x100, 0x104]);
    assert_eq!(tracer.state(0), State::Branching);
}

#[test]
fn disassembly_failure_keeps_partial() {
    let image = image(&[ADDI, ADDI]);
    let mut tracer = builder().build(&image);
    let result = tracer.process(&sync(0x100));
    assert!(matches!(
        result,
        Err(CrateError::UnexpectedEncoding {
            address: 0x108,
            cause: Cause::NotExecutable,
        })
    ));
    assert_eq!(tracer.state(0), State::Faulted);
    assert_eq!(addresses(&tracer.take_partial()), [0x100, 0x104]);
    assert_eq!(tracer.take_partial(), []);
}

#[test]
fn unknown_instruction() {
    let image = image(&[ADDI, 0xffffffff]);
    let mut tracer = builder().build(&image);
    assert!(matches!(
        tracer.process(&sync(0x100)),
        Err(CrateError::UnexpectedEncoding {
            address: 0x104,
            cause: Cause::Instruction(_),
        })
    ));
}

#[test]
fn run_limit() {
    let image = image(&[J_8, ADDI, J_BACK]);
    let mut tracer = builder().with_max_run(10).build(&image);
    assert!(matches!(
        tracer.process(&sync(0x100)),
        Err(CrateError::UnexpectedEncoding {
            cause: Cause::Trace(Error::RunLimit(10)),
            ..
        })
    ));
    assert_eq!(tracer.take_partial().len(), 10);
    assert_eq!(tracer.state(0), State::Faulted);
}

#[test]
fn unsynced_ignores_messages() {
    let image = image(&[ADDI, BEQ_8]);
    let mut tracer = builder().build(&image);
    for payload in [
        Payload::DirectBranch { taken: true, i_cnt: 0 },
        Payload::IndirectBranch { target: 0x100, i_cnt: 0 },
        Payload::Exception { address: 0x100, i_cnt: 0 },
        Payload::Timestamp,
    ] {
        assert_eq!(process(&mut tracer, payload), []);
        assert_eq!(tracer.state(0), State::Unsynced);
    }
}

#[test]
fn error_message_unsyncs() {
    let image = image(&[ADDI, BEQ_8]);
    let mut tracer = builder().build(&image);
    process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 });
    assert_eq!(process(&mut tracer, Payload::Error { code: 1 }), []);
    assert_eq!(tracer.state(0), State::Unsynced);
    assert_eq!(process(&mut tracer, Payload::DirectBranch { taken: true, i_cnt: 0 }), []);
}

#[test]
fn core_mask() {
    let image = image(&[ADDI, BEQ_8]);
    let mut tracer = builder().with_core_mask(Mask(0b10)).build(&image);
    assert_eq!(process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 }), []);
    assert_eq!(tracer.state(0), State::Unsynced);

    let mut other = sync(0x100);
    other.core = 1;
    let records = tracer.process(&other).expect("Could not process sync");
    assert_eq!(addresses(&records), [0x100, 0x104]);
    assert!(records.iter().all(|r| r.core == 1));
    assert_eq!(tracer.fault(Some(0)), 0);
}

#[test]
fn cores_are_independent() {
    let image = image(&[ADDI, BEQ_8, ADDI, BEQ_8]);
    let mut tracer = builder().build(&image);
    process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 });
    let mut other = sync(0x108);
    other.core = 3;
    tracer.process(&other).expect("Could not process sync");

    assert_eq!(tracer.fault(Some(3)), 1);
    assert_eq!(tracer.fault(Some(3)), 0);
    assert_eq!(tracer.state(0), State::Branching);
    assert_eq!(tracer.fault(None), 1);
    assert_eq!(tracer.state(0), State::Faulted);
}

#[test]
fn reset() {
    let image = image(&[ADDI, BEQ_8]);
    let mut tracer = builder().build(&image);
    process(&mut tracer, Payload::Sync { address: 0x100, i_cnt: 0 });
    tracer.reset();
    assert_eq!(tracer.state(0), State::Unsynced);
}

#[test]
fn without_cache() {
    let image = image(&[ADDI, BEQ_8]);
    let mut tracer = builder().build_with_cache(&image, cache::NoCache);
    let records = tracer.process(&sync(0x100)).expect("Could not process sync");
    assert_eq!(addresses(&records), [0x100, 0x104]);
}

#[test]
fn cache_hits() {
    let image = image(&[ADDI]);
    let entry = Entry {
        instruction: image.disassemble_at(0x100).expect("Could not disassemble"),
        correlation: image.lookup(0x100),
    };
    let mut cache = cache::DirectMappedCache::<4>::default();
    cache.store(0x100, entry.clone());
    assert_eq!(cache.get(0x100), Some(&entry));
    assert_eq!(cache.get(0x108), None);
    // Same slot, different address
    cache.store(0x108, entry.clone());
    assert_eq!(cache.get(0x100), None);
    assert_eq!(cache.get(0x108), Some(&entry));
}
