//! The clock driver task
use ticktty_core::{device::DeviceClass, error::DeviceError, port::Port};

use crate::sleep::SleepScheduler;

/// The body of the clock driver task. Advances the tick counter once per
/// clock interrupt. Returns when the device reports shutdown or the sleep
/// facility stops working. On shutdown, every pending sleeper is resumed.
pub(crate) fn run<P: Port>(port: &P, sleep: &SleepScheduler<P>) {
    log::info!("clock driver started");

    loop {
        match port.wait_device(DeviceClass::Clock, 0) {
            Ok(_) => {}
            Err(DeviceError::Shutdown) => {
                if let Err(e) = sleep.shut_down() {
                    log::error!("clock driver: could not resume sleepers: {:?}", e);
                }
                log::info!("clock driver stopped");
                return;
            }
            Err(e) => {
                log::error!("clock driver: wait failed: {:?}", e);
                return;
            }
        }

        if let Err(e) = sleep.tick() {
            log::error!("clock driver: could not acquire the sleep lock: {:?}", e);
            return;
        }
    }
}
