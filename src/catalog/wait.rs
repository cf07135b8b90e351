//! Bounded convergence waits.
//!
//! Every wait in the system is bounded: a fixed probe interval and a hard
//! timeout, after which [`ProviderError::ConvergenceTimeout`] is returned.
//! There are exactly two wait sites (instance termination during teardown,
//! gateway attachment during network bootstrap) and both go through
//! [`converge`].

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use super::resource::Kind;
use crate::error::{ProviderError, Result};

/// Probe interval and timeout bounding one convergence wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Delay between probes.
    pub interval: Duration,
    /// Total time allowed before giving up.
    pub timeout: Duration,
}

impl WaitPolicy {
    /// Creates a policy from an interval and timeout.
    #[must_use]
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Default policy for instance-termination waits.
    #[must_use]
    pub const fn instance_termination() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(600))
    }

    /// Default policy for internet-gateway attachment waits.
    #[must_use]
    pub const fn gateway_attachment() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_secs(120))
    }
}

/// Polls `probe` until it reports convergence or the policy's timeout
/// elapses.
///
/// The first probe runs immediately; an already-converged resource costs
/// one call and no sleep.
///
/// # Errors
///
/// Returns [`ProviderError::ConvergenceTimeout`] when the timeout elapses,
/// or the probe's own error as soon as one occurs.
pub async fn converge<F, Fut>(
    policy: WaitPolicy,
    kind: Kind,
    id: &str,
    target: &str,
    mut probe: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let started = Instant::now();

    loop {
        if probe().await? {
            return Ok(());
        }

        if started.elapsed() >= policy.timeout {
            return Err(ProviderError::ConvergenceTimeout {
                kind: kind.to_string(),
                id: id.to_string(),
                target: target.to_string(),
                waited_secs: started.elapsed().as_secs(),
            }
            .into());
        }

        sleep(policy.interval).await;
    }
}
