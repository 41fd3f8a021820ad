// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconnect policies for the messaging session.

use std::time::Duration;

/// Largest exponent applied to the initial delay.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Decides how a dropped session is re-established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Reconnect without delay.
    Immediate { max_attempts: Option<u32> },
    /// Wait `initial * 2^(attempt-1)`, capped at `max`, before reconnecting.
    Exponential {
        initial: Duration,
        max: Duration,
        max_attempts: Option<u32>,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Immediate { max_attempts: None }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (1-based, counting
    /// consecutive attempts since the session was last open).
    ///
    /// Returns `None` once the attempt budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if self.max_attempts().is_some_and(|max| attempt > max) {
            return None;
        }
        match self {
            Self::Immediate { .. } => Some(Duration::ZERO),
            Self::Exponential { initial, max, .. } => {
                let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
                let delay = initial.saturating_mul(2_u32.saturating_pow(exponent));
                Some(delay.min(*max))
            }
        }
    }

    pub fn max_attempts(&self) -> Option<u32> {
        match self {
            Self::Immediate { max_attempts } | Self::Exponential { max_attempts, .. } => {
                *max_attempts
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_immediate_and_unbounded() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Some(Duration::ZERO));
        assert_eq!(policy.delay_for(10_000), Some(Duration::ZERO));
        assert_eq!(policy.max_attempts(), None);
    }

    #[test]
    fn exponential_doubles_and_caps() {
        let policy = ReconnectPolicy::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(1000),
            max_attempts: None,
        };
        assert_eq!(policy.delay_for(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_for(4), Some(Duration::from_millis(800)));
        assert_eq!(policy.delay_for(5), Some(Duration::from_millis(1000)));
        assert_eq!(policy.delay_for(u32::MAX), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn bounded_policy_gives_up() {
        let policy = ReconnectPolicy::Immediate {
            max_attempts: Some(3),
        };
        assert!(policy.delay_for(3).is_some());
        assert!(policy.delay_for(4).is_none());
    }
}
