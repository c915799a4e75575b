use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Runs `job` after `first_delay`, then every `period`, until `shutdown` resolves.
///
/// Each run is awaited before the next tick is taken, so runs never overlap. A
/// run that overshoots the period pushes the following ones back rather than
/// firing a burst to catch up. A pending shutdown wins over a due tick.
pub async fn run_every<S, F, Fut>(first_delay: Duration, period: Duration, shutdown: S, mut job: F)
where
    S: Future<Output = ()>,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + first_delay, period.max(MIN_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!("shutdown requested; scheduler stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        job().await;
    }
}
