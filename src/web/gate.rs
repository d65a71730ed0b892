//! Admission control for generation requests.
//!
//! The pages allow one outbound call at a time, and the simple page
//! refuses new work for a short cooldown after each call completes.

use crate::error::{PixPromptError, Result};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Cooldown applied after every simple-page request.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(8);

/// Serializes generation requests and tracks the simple-page cooldown.
#[derive(Debug)]
pub struct GenerationGate {
    in_flight: Semaphore,
    cooldown: Duration,
    cooldown_until: Mutex<Option<Instant>>,
}

/// Held for the duration of one outbound call.
#[derive(Debug)]
pub struct GenerationPermit<'a> {
    _permit: SemaphorePermit<'a>,
}

impl Default for GenerationGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl GenerationGate {
    /// Creates a gate with the given post-request cooldown.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            in_flight: Semaphore::new(1),
            cooldown,
            cooldown_until: Mutex::new(None),
        }
    }

    /// Admits one request, or explains why it must wait.
    ///
    /// With `respect_cooldown` set, an active cooldown refuses the request
    /// before the in-flight slot is checked.
    pub fn try_begin(&self, respect_cooldown: bool) -> Result<GenerationPermit<'_>> {
        if respect_cooldown {
            if let Some(remaining) = self.cooldown_remaining() {
                return Err(PixPromptError::CoolingDown(remaining));
            }
        }
        let permit = self
            .in_flight
            .try_acquire()
            .map_err(|_| PixPromptError::Busy)?;
        Ok(GenerationPermit { _permit: permit })
    }

    /// Starts the cooldown, stretched to `at_least` when that is longer.
    ///
    /// Returns the cooldown actually applied.
    pub fn start_cooldown(&self, at_least: Option<Duration>) -> Duration {
        let length = at_least.map_or(self.cooldown, |hint| hint.max(self.cooldown));
        let mut until = self
            .cooldown_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *until = Some(Instant::now() + length);
        length
    }

    /// Time left before the simple page accepts another request.
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        let until = *self
            .cooldown_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        until
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .filter(|left| !left.is_zero())
    }
}

/// Rounds a remaining duration up to whole seconds for display.
pub fn whole_seconds(remaining: Duration) -> u64 {
    let secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_in_flight() {
        let gate = GenerationGate::default();
        let permit = gate.try_begin(false).unwrap();
        assert!(matches!(gate.try_begin(false), Err(PixPromptError::Busy)));
        drop(permit);
        assert!(gate.try_begin(false).is_ok());
    }

    #[test]
    fn test_cooldown_only_when_respected() {
        let gate = GenerationGate::new(Duration::from_secs(8));
        assert!(gate.cooldown_remaining().is_none());

        let applied = gate.start_cooldown(None);
        assert_eq!(applied, Duration::from_secs(8));
        assert!(matches!(
            gate.try_begin(true),
            Err(PixPromptError::CoolingDown(_))
        ));
        assert!(gate.try_begin(false).is_ok());
    }

    #[test]
    fn test_retry_hint_extends_cooldown() {
        let gate = GenerationGate::new(Duration::from_secs(8));
        assert_eq!(
            gate.start_cooldown(Some(Duration::from_secs(30))),
            Duration::from_secs(30)
        );
        assert_eq!(
            gate.start_cooldown(Some(Duration::from_secs(2))),
            Duration::from_secs(8)
        );
    }

    #[test]
    fn test_zero_cooldown_never_blocks() {
        let gate = GenerationGate::new(Duration::ZERO);
        gate.start_cooldown(None);
        assert!(gate.cooldown_remaining().is_none());
        assert!(gate.try_begin(true).is_ok());
    }

    #[test]
    fn test_whole_seconds() {
        assert_eq!(whole_seconds(Duration::from_secs(8)), 8);
        assert_eq!(whole_seconds(Duration::from_millis(7200)), 8);
        assert_eq!(whole_seconds(Duration::from_millis(1)), 1);
        assert_eq!(whole_seconds(Duration::ZERO), 0);
    }
}
