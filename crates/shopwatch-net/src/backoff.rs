//! Retry pacing helpers.

use std::time::Duration;

use rand::Rng;

/// Delay before retrying after a connect/proxy-layer failure; the next
/// attempt draws a fresh proxy.
pub(crate) const PROXY_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Bounds of the randomized backoff after a bad status or timeout.
pub(crate) const STATUS_RETRY_RANGE: (f64, f64, f64) = (1.0, 3.0, 0.3);

/// Uniform random draw over the stepped range `{start, start+step, …}`,
/// always including `stop`. Results are rounded to two decimals and never
/// negative. A degenerate range collapses to `start`.
#[must_use]
pub fn rand_between(start: f64, stop: f64, step: f64) -> f64 {
    if stop <= start || step <= 0.0 {
        return round2(start.max(0.0));
    }

    let steps = ((stop - start) / step).floor() as u64;
    let covers_stop = (start + steps as f64 * step - stop).abs() < 1e-9;
    let upper = if covers_stop { steps } else { steps + 1 };

    let choice = rand::rng().random_range(0..=upper);
    let value = if choice > steps {
        stop
    } else {
        start + choice as f64 * step
    };
    round2(value.max(0.0))
}

pub(crate) async fn sleep_secs(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
