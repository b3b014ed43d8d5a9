//! Terminal input is assembled into lines and handed to readers.
use std::{sync::Arc, thread, time::Duration};
use ticktty_core::{error::ResultCode, utils::Init};
use ticktty_kernel::DriverConfig;
use ticktty_port_std::SimConfig;

use crate::{wait_until, SeqTracker, System};

#[test]
fn reads_a_line() {
    let sys = System::boot(SimConfig::INIT, DriverConfig::INIT);
    let term = sys.port.terminal(0);
    term.type_input(b"hello\n");
    term.drain_input();

    let mut buf = [0xffu8; 16];
    assert_eq!(sys.port.sys_term_read(&mut buf, 0), (ResultCode::Success, 6));
    assert_eq!(&buf[..7], b"hello\n\0");
}

#[test]
fn lines_are_delivered_in_order() {
    let sys = System::boot(SimConfig::INIT, DriverConfig::INIT);
    let term = sys.port.terminal(3);
    term.type_input(b"one\ntwo\nthree\n");
    term.drain_input();

    let mut buf = [0u8; 16];
    for expected in [&b"one\n"[..], b"two\n", b"three\n"] {
        let (result, count) = sys.port.sys_term_read(&mut buf, 3);
        assert_eq!(result, ResultCode::Success);
        assert_eq!(&buf[..count], expected);
    }
}

#[test]
fn short_buffer_truncates() {
    let sys = System::boot(SimConfig::INIT, DriverConfig::INIT);
    let term = sys.port.terminal(0);
    term.type_input(b"abcdef\nxy\n");
    term.drain_input();

    let mut buf = [0xffu8; 8];
    assert_eq!(sys.port.sys_term_read(&mut buf[..3], 0), (ResultCode::Success, 3));
    assert_eq!(&buf[..4], b"abc\xff");

    // The rest of the truncated line is gone
    assert_eq!(sys.port.sys_term_read(&mut buf, 0), (ResultCode::Success, 3));
    assert_eq!(&buf[..4], b"xy\n\0");
}

#[test]
fn long_line_is_split() {
    let cfg = DriverConfig::build().max_line(8).finish();
    let sys = System::boot(SimConfig::INIT, cfg);
    let term = sys.port.terminal(1);
    term.type_input(b"0123456789\n");
    term.drain_input();

    let mut buf = [0u8; 16];
    assert_eq!(sys.port.sys_term_read(&mut buf, 1), (ResultCode::Success, 8));
    assert_eq!(&buf[..8], b"01234567");
    assert_eq!(sys.port.sys_term_read(&mut buf, 1), (ResultCode::Success, 3));
    assert_eq!(&buf[..3], b"89\n");
}

#[test]
fn full_queue_drops_lines() {
    let cfg = DriverConfig::build().line_queue_slots(2).finish();
    let sys = System::boot(SimConfig::INIT, cfg);
    let term = sys.port.terminal(0);
    term.type_input(b"a\nb\nc\n");
    term.drain_input();

    let mut buf = [0u8; 8];
    assert_eq!(sys.port.sys_term_read(&mut buf, 0), (ResultCode::Success, 2));
    assert_eq!(&buf[..2], b"a\n");
    assert_eq!(sys.port.sys_term_read(&mut buf, 0), (ResultCode::Success, 2));
    assert_eq!(&buf[..2], b"b\n");

    term.type_input(b"d\n");
    term.drain_input();
    assert_eq!(sys.port.sys_term_read(&mut buf, 0), (ResultCode::Success, 2));
    assert_eq!(&buf[..2], b"d\n");
}

/// 1. (`seq`: 0 → 1) `reader` starts waiting for a line.
/// 2. The main thread types a line.
/// 3. (`seq`: 1 → 2) `reader` receives it.
#[test]
fn read_blocks_until_a_line_arrives() {
    let sys = System::boot(SimConfig::INIT, DriverConfig::INIT);
    let seq = Arc::new(SeqTracker::default());

    let reader = {
        let port = Arc::clone(&sys.port);
        let seq = Arc::clone(&seq);
        thread::spawn(move || {
            seq.expect_and_replace(0, 1);
            let mut buf = [0u8; 8];
            let (result, count) = port.sys_term_read(&mut buf, 2);
            seq.expect_and_replace(1, 2);
            (result, buf[..count].to_vec())
        })
    };

    wait_until(|| seq.get() == 1);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(seq.get(), 1);

    let term = sys.port.terminal(2);
    term.type_input(b"hi\n");
    term.drain_input();

    assert_eq!(reader.join().unwrap(), (ResultCode::Success, b"hi\n".to_vec()));
}

#[test]
fn invalid_arguments() {
    let sys = System::boot(SimConfig::INIT, DriverConfig::INIT);
    let mut buf = [0u8; 8];
    assert_eq!(sys.port.sys_term_read(&mut buf, 4), (ResultCode::BadParam, 0));
    assert_eq!(sys.port.sys_term_read(&mut buf, -1), (ResultCode::BadParam, 0));
    assert_eq!(sys.port.sys_term_read(&mut [], 0), (ResultCode::BadParam, 0));
}

#[test]
fn shutdown_fails_blocked_reader() {
    let sys = System::boot(SimConfig::INIT, DriverConfig::INIT);
    let reader = {
        let port = Arc::clone(&sys.port);
        thread::spawn(move || port.sys_term_read(&mut [0u8; 8], 0))
    };
    thread::sleep(Duration::from_millis(20));

    sys.port.shutdown();
    assert_eq!(reader.join().unwrap(), (ResultCode::BadObjectState, 0));
}
