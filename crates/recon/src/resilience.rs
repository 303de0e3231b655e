//! Bounded retry and multi-strategy probing.
//!
//! - [`Resilience::retry`] re-runs one operation, optionally re-running a
//!   prelude (re-navigation) before each attempt.
//! - [`Resilience::probe`] walks an ordered list of [`Strategy`] values and
//!   returns the first that finds something.
//!
//! Both classify failures through [`StoreError::class`]: fatal errors stop
//! immediately, not-found is returned as-is, everything else is retried.

use std::fmt;
use std::thread;
use std::time::Duration;

use crate::error::{ErrorClass, StoreError};
use crate::store::Lookup;

// ── Policies ────────────────────────────────────────────────────────

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately. UI probes already wait out their own timeout.
    None,
    /// `initial`, `2 * initial`, `4 * initial`, … capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn interaction(max_tries: u32) -> Self {
        Self {
            max_tries,
            backoff: Backoff::None,
        }
    }

    pub fn network(max_tries: u32, initial: Duration, max: Duration) -> Self {
        Self {
            max_tries,
            backoff: Backoff::Exponential { initial, max },
        }
    }

    /// Wait after the `failed`-th failed attempt (1-based).
    pub fn delay_after(&self, failed: u32) -> Duration {
        match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(failed.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// Which policy an operation runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    /// Destination UI interaction: fixed timeout, no backoff.
    Interaction,
    /// Remote API call: exponential backoff.
    Network,
}

// ── Strategies ──────────────────────────────────────────────────────

/// One way of reaching a target, as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy<K> {
    pub label: String,
    pub target: K,
}

impl<K> Strategy<K> {
    pub fn new(label: impl Into<String>, target: K) -> Self {
        Self {
            label: label.into(),
            target,
        }
    }
}

/// Successful probe: the value and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probed<T> {
    pub value: T,
    pub strategy: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Every strategy failed or found nothing.
    Exhausted(Vec<StrategyFailure>),
    /// A strategy hit a fatal error; later strategies were not tried.
    Fatal(StoreError),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted(failures) => {
                write!(f, "all {} strategies failed", failures.len())?;
                for fail in failures {
                    write!(f, "; {}: {}", fail.label, fail.reason)?;
                }
                Ok(())
            }
            Self::Fatal(e) => write!(f, "probe aborted: {e}"),
        }
    }
}

impl std::error::Error for ProbeError {}

// ── Controller ──────────────────────────────────────────────────────

/// Retry/probe controller shared by one batch run.
pub struct Resilience {
    interaction: RetryPolicy,
    network: RetryPolicy,
    call_timeout: Duration,
    probe_timeout: Duration,
    sleep: Box<dyn FnMut(Duration)>,
}

impl fmt::Debug for Resilience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resilience")
            .field("interaction", &self.interaction)
            .field("network", &self.network)
            .field("call_timeout", &self.call_timeout)
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

impl Resilience {
    pub fn new(
        interaction: RetryPolicy,
        network: RetryPolicy,
        call_timeout: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            interaction,
            network,
            call_timeout,
            probe_timeout,
            sleep: Box::new(thread::sleep),
        }
    }

    /// Replace the sleeper (tests record delays instead of waiting).
    pub fn with_sleeper(mut self, sleep: impl FnMut(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn policy(&self, class: OpClass) -> RetryPolicy {
        match class {
            OpClass::Interaction => self.interaction,
            OpClass::Network => self.network,
        }
    }

    /// Run `op` under the policy for `class`.
    ///
    /// `prelude` runs before every attempt; its errors count against the
    /// same budget. Fatal and not-found errors return at once.
    pub fn retry<C, T>(
        &mut self,
        label: &str,
        class: OpClass,
        ctx: &mut C,
        mut op: impl FnMut(&mut C) -> Result<T, StoreError>,
        mut prelude: Option<&mut dyn FnMut(&mut C) -> Result<(), StoreError>>,
    ) -> Result<T, StoreError> {
        let policy = self.policy(class);
        let max_tries = policy.max_tries.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = match prelude.as_mut() {
                Some(pre) => pre(ctx).and_then(|()| op(ctx)),
                None => op(ctx),
            };

            let err = match result {
                Ok(value) => {
                    if attempt > 1 {
                        log::info!("{label}: succeeded on attempt {attempt}/{max_tries}");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            match err.class() {
                ErrorClass::Fatal => {
                    log::error!("{label}: fatal error, not retrying: {err}");
                    return Err(err);
                }
                ErrorClass::NotFound => return Err(err),
                ErrorClass::Transient | ErrorClass::Unexpected => {}
            }

            if attempt >= max_tries {
                log::warn!("{label}: giving up after {attempt} attempts: {err}");
                return Err(err);
            }

            let wait = policy.delay_after(attempt);
            log::warn!(
                "{label}: retry {}/{} in {}ms ({err})",
                attempt,
                max_tries - 1,
                wait.as_millis(),
            );
            if !wait.is_zero() {
                (self.sleep)(wait);
            }
        }
    }

    /// Try `strategies` in order, each with the probe timeout.
    pub fn probe<C, K, T>(
        &self,
        ctx: &mut C,
        strategies: &[Strategy<K>],
        mut exec: impl FnMut(&mut C, &K, Duration) -> Result<Lookup<T>, StoreError>,
    ) -> Result<Probed<T>, ProbeError> {
        let mut failures = Vec::with_capacity(strategies.len());

        for (index, strategy) in strategies.iter().enumerate() {
            match exec(ctx, &strategy.target, self.probe_timeout) {
                Ok(Lookup::Found(value)) => {
                    log::debug!("probe '{}' succeeded (strategy {})", strategy.label, index + 1);
                    return Ok(Probed {
                        value,
                        strategy: strategy.label.clone(),
                        index,
                    });
                }
                Ok(Lookup::NotFound) => {
                    log::debug!("probe '{}' found nothing", strategy.label);
                    failures.push(StrategyFailure {
                        label: strategy.label.clone(),
                        reason: "not found".into(),
                    });
                }
                Err(e) if e.is_fatal() => {
                    log::error!("probe '{}' hit fatal error: {e}", strategy.label);
                    return Err(ProbeError::Fatal(e));
                }
                Err(e) => {
                    log::info!("probe '{}' failed: {e}", strategy.label);
                    failures.push(StrategyFailure {
                        label: strategy.label.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(ProbeError::Exhausted(failures))
    }
}
