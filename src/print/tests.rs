// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use super::*;

use proptest::prelude::*;

fn fragment(channel: u8, data: &[u8], terminator: bool, timestamp: u64) -> Fragment {
    Fragment {
        core: 0,
        channel,
        data: data.into(),
        terminator,
        timestamp,
    }
}

#[test]
fn single_line() {
    let mut assembler = Assembler::new(4096);
    assert_eq!(assembler.feed(&fragment(0, b"Hell", false, 10)), None);
    assert_eq!(assembler.feed(&fragment(0, b"o, w", false, 11)), None);
    assert_eq!(
        assembler.feed(&fragment(0, b"d!\n", true, 15)),
        Some(PrintLine {
            core: 0,
            channel: 0,
            text: "Hello, wd!\n".into(),
            start: 10,
            end: 15,
            complete: true,
        })
    );
    assert!(assembler.is_empty());
    assert_eq!(assembler.drain_all(), []);
}

#[test]
fn channels_do_not_mix() {
    let mut assembler = Assembler::new(4096);
    assert_eq!(assembler.feed(&fragment(1, b"ab", false, 1)), None);
    assert_eq!(assembler.feed(&fragment(2, b"xy", false, 2)), None);
    let line = assembler
        .feed(&fragment(1, b"c", true, 3))
        .expect("No line");
    assert_eq!((line.channel, line.text.as_str()), (1, "abc"));
    let line = assembler
        .feed(&fragment(2, b"z\n", true, 4))
        .expect("No line");
    assert_eq!((line.channel, line.text.as_str(), line.start), (2, "xyz\n", 2));
}

#[test]
fn cores_do_not_mix() {
    let mut assembler = Assembler::new(4096);
    let mut other = fragment(0, b"other", false, 5);
    other.core = 1;
    assert_eq!(assembler.feed(&fragment(0, b"own", false, 1)), None);
    assert_eq!(assembler.feed(&other), None);
    let line = assembler.feed(&fragment(0, b"", true, 7)).expect("No line");
    assert_eq!((line.core, line.text.as_str()), (0, "own"));
}

#[test]
fn limit_finalizes_incomplete() {
    let mut assembler = Assembler::new(6);
    assert_eq!(assembler.feed(&fragment(0, b"abcd", false, 1)), None);
    assert_eq!(
        assembler.feed(&fragment(0, b"efgh", false, 2)),
        Some(PrintLine {
            core: 0,
            channel: 0,
            text: "abcdefgh".into(),
            start: 1,
            end: 2,
            complete: false,
        })
    );
    assert!(assembler.is_empty());
}

#[test]
fn empty_terminator_is_ignored() {
    let mut assembler = Assembler::new(16);
    assert_eq!(assembler.feed(&fragment(0, b"", true, 1)), None);
    assert_eq!(assembler.feed(&fragment(0, b"ab", false, 2)), None);
    let line = assembler.feed(&fragment(0, b"", true, 3)).expect("No line");
    assert_eq!((line.text.as_str(), line.start, line.end), ("ab", 2, 3));
}

#[test]
fn drain() {
    let mut assembler = Assembler::new(4096);
    assembler.feed(&fragment(3, b"three", false, 30));
    assembler.feed(&fragment(1, b"one", false, 10));
    assembler.feed(&fragment(1, b" more", false, 12));
    let lines: Vec<_> = assembler
        .drain_all()
        .into_iter()
        .map(|l| (l.channel, l.text, l.start, l.end, l.complete))
        .collect();
    assert_eq!(
        lines,
        [
            (1, "one more".to_string(), 10, 12, false),
            (3, "three".to_string(), 30, 30, false),
        ]
    );
    assert_eq!(assembler.drain_all(), []);
}

#[test]
fn trimmed() {
    let line = |text: &str| PrintLine {
        core: 0,
        channel: 0,
        text: text.into(),
        start: 0,
        end: 0,
        complete: true,
    };
    assert_eq!(line("text\n").trimmed(), "text");
    assert_eq!(line("text\r\n").trimmed(), "text");
    assert_eq!(line("text").trimmed(), "text");
    assert_eq!(line("\n").trimmed(), "");
}

#[test]
fn seconds() {
    let line = PrintLine {
        core: 0,
        channel: 0,
        text: Default::default(),
        start: 50,
        end: 150,
        complete: true,
    };
    assert_eq!(line.seconds(100), (0.5, 1.5));
}

proptest! {
    #[test]
    fn fragments_concatenate(
        chunks in proptest::collection::vec(proptest::collection::vec(b'a'..=b'z', 1..=4), 1..32),
        first: u32,
    ) {
        let mut assembler = Assembler::new(4096);
        let count = chunks.len() as u64;
        let first = u64::from(first);
        for (i, chunk) in chunks.iter().enumerate() {
            let last = i as u64 + 1 == count;
            let line = assembler.feed(&fragment(0, chunk, last, first + i as u64));
            prop_assert_eq!(line.is_some(), last);
            if let Some(line) = line {
                let expected = chunks.concat();
                prop_assert_eq!(line.text.as_bytes(), expected.as_slice());
                prop_assert_eq!(line.start, first);
                prop_assert_eq!(line.end, first + count - 1);
                prop_assert!(line.complete);
            }
        }
        prop_assert!(assembler.is_empty());
    }
}
