// Main tick driver

use super::SessionController;
use crate::transport::TransportError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

/// Ticks the controller at its configured period until `shutdown` is set.
///
/// The controller is shut down (streaming stopped, transport closed) before
/// returning, whether the loop ended normally or on a transport error.
pub fn run_main_tick(
    controller: &mut SessionController,
    shutdown: &AtomicBool,
) -> Result<(), TransportError> {
    let period = controller.config().tick_interval;
    let mut overruns: u64 = 0;

    let result = loop {
        if shutdown.load(Ordering::Acquire) {
            break Ok(());
        }

        let started = Instant::now();
        if let Err(e) = controller.run_tick() {
            break Err(e);
        }

        let elapsed = started.elapsed();
        if elapsed < period {
            thread::sleep(period - elapsed);
        } else {
            overruns += 1;
            if overruns == 1 || overruns.is_multiple_of(100) {
                log_overrun(controller, elapsed.as_millis(), overruns);
            }
        }
    };

    controller.shutdown();
    result
}

fn log_overrun(controller: &SessionController, elapsed_ms: u128, overruns: u64) {
    controller.logger().warn(&format!(
        "Main tick overran its period: {} ms ({} overruns)",
        elapsed_ms, overruns
    ));
}
