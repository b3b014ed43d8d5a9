//! Sleeping contexts are resumed in the order of their deadlines, and
//! contexts sharing a deadline are resumed in the order they went to sleep.
use std::{
    sync::{mpsc, Arc},
    thread,
};
use ticktty_core::{
    error::ResultCode,
    port::{Pid, PortThreading},
    utils::Init,
};
use ticktty_kernel::DriverConfig;
use ticktty_port_std::SimConfig;

use crate::{wait_until, System};

/// Start a context sleeping for `seconds` seconds and wait until it's in the
/// wait queue.
fn spawn_sleeper(sys: &System, seconds: i32) -> (Pid, thread::JoinHandle<ResultCode>) {
    let expected = sys.sleepers() + 1;
    let (send, recv) = mpsc::channel();
    let port = Arc::clone(&sys.port);
    let handle = thread::spawn(move || {
        send.send(port.current_pid()).unwrap();
        port.sys_sleep(seconds)
    });
    let pid = recv.recv().unwrap();
    wait_until(|| sys.sleepers() == expected);
    (pid, handle)
}

#[test]
fn deadline_order_with_fifo_ties() {
    let sys = System::boot(SimConfig::INIT, DriverConfig::INIT);

    let (a, ha) = spawn_sleeper(&sys, 2);
    let (b, hb) = spawn_sleeper(&sys, 1);
    let (c, hc) = spawn_sleeper(&sys, 1);
    let (d, hd) = spawn_sleeper(&sys, 2);

    for _ in 0..9 {
        sys.tick(1);
        assert!(sys.port.unblock_history().is_empty());
    }
    sys.tick(1);
    assert_eq!(sys.ticks(), 10);
    assert_eq!(sys.port.unblock_history(), [b, c]);

    for _ in 0..9 {
        sys.tick(1);
        assert_eq!(sys.port.unblock_history(), [b, c]);
    }
    sys.tick(1);
    assert_eq!(sys.ticks(), 20);
    assert_eq!(sys.port.unblock_history(), [b, c, a, d]);

    for h in [ha, hb, hc, hd] {
        assert_eq!(h.join().unwrap(), ResultCode::Success);
    }
}

#[test]
fn deadlines_are_relative_to_the_call() {
    let sys = System::boot(SimConfig::INIT, DriverConfig::INIT);

    let (a, ha) = spawn_sleeper(&sys, 1);
    sys.tick(3);
    let (b, hb) = spawn_sleeper(&sys, 1);

    sys.tick(7);
    assert_eq!(sys.port.unblock_history(), [a]);

    sys.tick(2);
    assert_eq!(sys.port.unblock_history(), [a]);

    sys.tick(1);
    assert_eq!(sys.port.unblock_history(), [a, b]);

    assert_eq!(ha.join().unwrap(), ResultCode::Success);
    assert_eq!(hb.join().unwrap(), ResultCode::Success);
}
