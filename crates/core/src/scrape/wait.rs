use std::time::{Duration, Instant};

/// Re-checks `condition` every `interval` until it holds or `timeout` elapses.
///
/// Returns whether the condition held. The condition is always evaluated at
/// least once, and the total wait never exceeds `timeout`.
pub fn poll_until<F>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(interval.min(deadline - now));
    }
}
