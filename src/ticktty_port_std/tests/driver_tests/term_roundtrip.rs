//! Bytes written to a loopback terminal come back as input.
use std::{sync::Arc, thread};
use ticktty_core::{error::ResultCode, utils::Init};
use ticktty_kernel::DriverConfig;
use ticktty_port_std::SimConfig;

use crate::System;

#[test]
fn write_then_read() {
    let sys = System::boot(SimConfig::free_running().with_loopback(true), DriverConfig::INIT);
    assert_eq!(sys.port.sys_term_write(b"ping\n", 1), (ResultCode::Success, 5));

    let mut buf = [0u8; 16];
    assert_eq!(sys.port.sys_term_read(&mut buf, 1), (ResultCode::Success, 5));
    assert_eq!(&buf[..6], b"ping\n\0");
}

#[test]
fn reader_waits_for_writer() {
    let sys = System::boot(SimConfig::free_running(), DriverConfig::INIT);
    sys.port.terminal(3).set_loopback(true);

    let reader = {
        let port = Arc::clone(&sys.port);
        thread::spawn(move || {
            let mut buf = [0u8; 32];
            let mut lines = Vec::new();
            for _ in 0..2 {
                let (result, count) = port.sys_term_read(&mut buf, 3);
                assert_eq!(result, ResultCode::Success);
                lines.push(buf[..count].to_vec());
            }
            lines
        })
    };

    assert_eq!(sys.port.sys_term_write(b"first\nsecond\n", 3), (ResultCode::Success, 13));
    assert_eq!(
        reader.join().unwrap(),
        [b"first\n".to_vec(), b"second\n".to_vec()]
    );
}

#[test]
fn sleep_and_terminal_together() {
    let sys = System::boot(
        SimConfig::free_running().with_loopback(true),
        DriverConfig::build().ticks_per_second(5).finish(),
    );

    let sleeper = {
        let port = Arc::clone(&sys.port);
        thread::spawn(move || port.sys_sleep(1))
    };

    assert_eq!(sys.port.sys_term_write(b"x\n", 0), (ResultCode::Success, 2));
    let mut buf = [0u8; 4];
    assert_eq!(sys.port.sys_term_read(&mut buf, 0), (ResultCode::Success, 2));

    assert_eq!(sleeper.join().unwrap(), ResultCode::Success);
    assert!(sys.ticks() >= 5);
}
