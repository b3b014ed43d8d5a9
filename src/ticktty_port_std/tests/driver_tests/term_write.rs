//! Terminal output is transmitted byte by byte, paced by transmit-ready
//! interrupts.
use std::{sync::Arc, thread, time::Duration};
use ticktty_core::{error::ResultCode, utils::Init};
use ticktty_kernel::DriverConfig;
use ticktty_port_std::SimConfig;

use crate::System;

fn sim() -> SimConfig {
    SimConfig {
        term_period: Some(Duration::from_millis(1)),
        ..SimConfig::INIT
    }
}

#[test]
fn writes_every_byte_in_order() {
    let sys = System::boot(sim(), DriverConfig::INIT);
    let data = b"hello, world\n";
    assert_eq!(
        sys.port.sys_term_write(data, 0),
        (ResultCode::Success, data.len())
    );
    assert_eq!(sys.port.terminal(0).transmitted(), data);
    assert!(sys.port.terminal(1).transmitted().is_empty());
}

#[test]
fn units_are_independent() {
    let sys = System::boot(sim(), DriverConfig::INIT);
    let writers: Vec<_> = (0..4)
        .map(|unit| {
            let port = Arc::clone(&sys.port);
            thread::spawn(move || port.sys_term_write(format!("unit {}\n", unit).as_bytes(), unit))
        })
        .collect();
    for writer in writers {
        assert_eq!(writer.join().unwrap(), (ResultCode::Success, 7));
    }
    for unit in 0..4 {
        assert_eq!(
            sys.port.terminal(unit).transmitted(),
            format!("unit {}\n", unit).as_bytes()
        );
    }
}

#[test]
fn concurrent_writes_do_not_interleave() {
    let sys = System::boot(sim(), DriverConfig::INIT);
    let letters = [b'a', b'b', b'c'];
    let writers: Vec<_> = letters
        .iter()
        .map(|&ch| {
            let port = Arc::clone(&sys.port);
            thread::spawn(move || port.sys_term_write(&[ch; 16], 2))
        })
        .collect();
    for writer in writers {
        assert_eq!(writer.join().unwrap(), (ResultCode::Success, 16));
    }

    let out = sys.port.terminal(2).transmitted();
    assert_eq!(out.len(), 48);
    let mut seen: Vec<u8> = out.chunks(16).map(|chunk| chunk[0]).collect();
    for chunk in out.chunks(16) {
        assert!(chunk.iter().all(|&b| b == chunk[0]), "{:?}", out);
    }
    seen.sort_unstable();
    assert_eq!(seen, letters);
}

#[test]
fn device_failure_reports_partial_count() {
    let sys = System::boot(sim(), DriverConfig::INIT);
    let term = sys.port.terminal(1);
    term.fail_output_after(3);

    assert_eq!(sys.port.sys_term_write(b"hello", 1), (ResultCode::Io, 3));
    assert_eq!(term.transmitted(), b"hel");

    // The unit is not left locked
    assert_eq!(sys.port.sys_term_write(b"x", 1), (ResultCode::Io, 0));
}

#[test]
fn invalid_arguments() {
    let sys = System::boot(sim(), DriverConfig::INIT);
    assert_eq!(sys.port.sys_term_write(b"x", 4), (ResultCode::BadParam, 0));
    assert_eq!(sys.port.sys_term_write(b"x", -2), (ResultCode::BadParam, 0));
    assert_eq!(sys.port.sys_term_write(b"", 0), (ResultCode::BadParam, 0));
    assert!(sys.port.terminal(0).transmitted().is_empty());
}
