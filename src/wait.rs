// src/wait.rs
//! Randomized pauses and bounded polling.
//!
//! The site gives no reliable load-complete signal, so page loads are
//! followed by a base delay plus random jitter.

use anyhow::Result;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// `base_ms` plus a uniformly drawn jitter in `jitter_min_ms..=jitter_max_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settle {
    pub base_ms: u64,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
}

impl Default for Settle {
    fn default() -> Self {
        Self::none()
    }
}

impl Settle {
    pub const fn new(base_ms: u64, jitter_min_ms: u64, jitter_max_ms: u64) -> Self {
        Self {
            base_ms,
            jitter_min_ms,
            jitter_max_ms,
        }
    }

    pub const fn none() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn duration(&self) -> Duration {
        let jitter = if self.jitter_max_ms > self.jitter_min_ms {
            rand::thread_rng().gen_range(self.jitter_min_ms..=self.jitter_max_ms)
        } else {
            self.jitter_min_ms
        };
        Duration::from_millis(self.base_ms + jitter)
    }

    pub async fn wait(&self) {
        let pause = self.duration();
        if !pause.is_zero() {
            debug!("Settling for {} ms", pause.as_millis());
            tokio::time::sleep(pause).await;
        }
    }
}

/// Outcome of [`until_stable`].
#[derive(Debug, Clone, PartialEq)]
pub enum Stability<T> {
    /// Two consecutive probes returned the same value.
    Settled(T),
    /// The attempt budget ran out; holds the last value seen.
    Exhausted(T),
}

impl<T> Stability<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Settled(v) | Self::Exhausted(v) => v,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled(_))
    }
}

/// Call `probe` until it returns the same value twice in a row, pausing
/// with `pause` between calls. Probes at least once, at most
/// `max_attempts` times.
pub async fn until_stable<T, F>(max_attempts: u32, pause: &Settle, mut probe: F) -> Result<Stability<T>>
where
    T: PartialEq,
    F: FnMut() -> Result<T>,
{
    let mut last = probe()?;
    for _ in 1..max_attempts.max(1) {
        pause.wait().await;
        let current = probe()?;
        if current == last {
            return Ok(Stability::Settled(current));
        }
        last = current;
    }
    Ok(Stability::Exhausted(last))
}
