//! Waiting for the chain to reach a block timestamp.

use std::time::Duration;

use tracing::{debug, trace};

use crate::{ChainProvider, Result, WalletError};

/// The shortest delay between two polls. Shorter intervals, zero included, are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Bounds of a timestamp wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Delay between two block timestamp queries, at least [`MIN_POLL_INTERVAL`].
    pub poll_interval: Duration,
    /// Overall time to wait before giving up.
    pub timeout: Duration,
    /// The furthest a target may lie ahead of the latest block timestamp, in seconds. Targets
    /// further away fail immediately.
    pub max_distance: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(120),
            max_distance: 600,
        }
    }
}

impl WaitConfig {
    /// Sets the poll interval.
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the overall timeout.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum target distance.
    pub const fn with_max_distance(mut self, max_distance: u64) -> Self {
        self.max_distance = max_distance;
        self
    }
}

/// Waits until the latest block timestamp is at least `target` and returns it.
///
/// Fails with [`WalletError::TimestampWaitTimeout`] without polling if `target` lies more than
/// [`WaitConfig::max_distance`] seconds ahead, or once [`WaitConfig::timeout`] has elapsed.
pub async fn wait_for_timestamp<P: ChainProvider>(
    provider: &P,
    target: u64,
    config: &WaitConfig,
) -> Result<u64> {
    let mut latest = provider.latest_timestamp().await?;
    if latest >= target {
        return Ok(latest);
    }
    if target - latest > config.max_distance {
        debug!(target, latest, max_distance = config.max_distance, "Timestamp target too far");
        return Err(WalletError::TimestampWaitTimeout { target, latest });
    }

    debug!(target, latest, "Waiting for block timestamp");
    let outcome =
        tokio::time::timeout(config.timeout, poll(provider, target, config, &mut latest)).await;
    match outcome {
        Ok(result) => result,
        Err(_) => Err(WalletError::TimestampWaitTimeout { target, latest }),
    }
}

async fn poll<P: ChainProvider>(
    provider: &P,
    target: u64,
    config: &WaitConfig,
    latest: &mut u64,
) -> Result<u64> {
    let mut interval = tokio::time::interval(config.poll_interval.max(MIN_POLL_INTERVAL));
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        *latest = provider.latest_timestamp().await?;
        trace!(target, latest = *latest, "Polled block timestamp");
        if *latest >= target {
            return Ok(*latest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockChainProvider, MOCK_GENESIS_TIMESTAMP};

    #[tokio::test]
    async fn test_zero_poll_interval_is_clamped() {
        let provider = MockChainProvider::new().with_timestamp_step(10);
        let config = WaitConfig::default().with_poll_interval(Duration::ZERO);

        let target = MOCK_GENESIS_TIMESTAMP + 30;
        let reached = wait_for_timestamp(&provider, target, &config).await.unwrap();
        assert_eq!(reached, target);
        assert_eq!(provider.timestamp_queries(), 4);
    }

    #[tokio::test]
    async fn test_target_at_max_distance_is_polled() {
        let provider = MockChainProvider::new().with_timestamp_step(5);
        let config = WaitConfig::default()
            .with_poll_interval(Duration::from_millis(1))
            .with_max_distance(10);

        let target = MOCK_GENESIS_TIMESTAMP + 10;
        assert_eq!(wait_for_timestamp(&provider, target, &config).await.unwrap(), target);

        let far = MOCK_GENESIS_TIMESTAMP + 100;
        assert!(matches!(
            wait_for_timestamp(&provider, far, &config).await,
            Err(WalletError::TimestampWaitTimeout { target, .. }) if target == far
        ));
    }
}
