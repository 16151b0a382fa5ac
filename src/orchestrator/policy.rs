//! Timeout, retry and deadline policy

use std::time::Duration;

use rand::RngExt;

use crate::config::TripConfig;
use crate::models::Source;

/// Bounded retry with equal-jitter exponential backoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff_base: Duration::from_millis(250),
            backoff_max: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Upper bound of the wait before retry number `retry` (1-based):
    /// `base * 2^(retry-1)`, capped at `backoff_max`
    #[must_use]
    pub fn backoff_ceiling(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(1u32 << exponent)
            .min(self.backoff_max)
    }

    /// Wait before retry number `retry`, drawn from `[ceiling/2, ceiling]`
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let ceiling = self.backoff_ceiling(retry);
        let half = ceiling / 2;
        let spread = u64::try_from((ceiling - half).as_millis()).unwrap_or(u64::MAX);
        half + Duration::from_millis(rand::rng().random_range(0..=spread))
    }

    /// Longest a call with this per-attempt timeout can take including every retry
    #[must_use]
    pub fn worst_case(&self, timeout: Duration) -> Duration {
        let waits: Duration = (1..=self.max_retries).map(|r| self.backoff_ceiling(r)).sum();
        timeout.saturating_mul(1 + self.max_retries) + waits
    }
}

/// Added to the derived global deadline so timer overshoot on earlier attempts does not
/// clip the last one
pub const SCHEDULING_SLACK: Duration = Duration::from_millis(50);

/// Everything the orchestrator needs to bound one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorPolicy {
    pub retry: RetryPolicy,
    pub weather_timeout: Duration,
    pub insights_timeout: Duration,
    pub booking_timeout: Duration,
    /// Replaces the derived global deadline when set
    pub deadline_override: Option<Duration>,
    /// Raise `OrchestrationTimeout` instead of returning a partial plan
    pub strict_deadline: bool,
    pub synthesis_timeout: Duration,
}

impl Default for OrchestratorPolicy {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            weather_timeout: Duration::from_secs(5),
            insights_timeout: Duration::from_secs(5),
            booking_timeout: Duration::from_secs(5),
            deadline_override: None,
            strict_deadline: false,
            synthesis_timeout: Duration::from_secs(20),
        }
    }
}

impl From<&TripConfig> for OrchestratorPolicy {
    fn from(config: &TripConfig) -> Self {
        let orchestrator = &config.orchestrator;
        Self {
            retry: RetryPolicy {
                max_retries: orchestrator.max_retries,
                backoff_base: Duration::from_millis(orchestrator.backoff_base_ms),
                backoff_max: Duration::from_millis(orchestrator.backoff_max_ms),
            },
            weather_timeout: config.providers.weather.timeout(),
            insights_timeout: config.providers.insights.timeout(),
            booking_timeout: config.providers.booking.timeout(),
            deadline_override: orchestrator.global_deadline_ms.map(Duration::from_millis),
            strict_deadline: orchestrator.strict_deadline,
            synthesis_timeout: Duration::from_millis(orchestrator.synthesis_timeout_ms),
        }
    }
}

impl OrchestratorPolicy {
    #[must_use]
    pub fn timeout_for(&self, source: Source) -> Duration {
        match source {
            Source::Weather => self.weather_timeout,
            Source::Insights => self.insights_timeout,
            Source::Booking => self.booking_timeout,
        }
    }

    /// Deadline for the whole fan-out: the slowest provider's worst case, not the sum,
    /// plus [`SCHEDULING_SLACK`]. An override is used as is.
    #[must_use]
    pub fn global_deadline(&self) -> Duration {
        self.deadline_override.unwrap_or_else(|| {
            let slowest = Source::ALL
                .iter()
                .map(|s| self.retry.worst_case(self.timeout_for(*s)))
                .max()
                .unwrap_or_default();
            slowest + SCHEDULING_SLACK
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 250)]
    #[case(2, 500)]
    #[case(3, 1000)]
    #[case(4, 2000)]
    #[case(5, 2000)]
    #[case(40, 2000)]
    fn test_backoff_ceiling(#[case] retry: u32, #[case] expected_ms: u64) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_ceiling(retry), Duration::from_millis(expected_ms));
    }

    #[test]
    fn test_backoff_delay_stays_in_jitter_window() {
        let policy = RetryPolicy::default();
        for retry in 1..=4 {
            let ceiling = policy.backoff_ceiling(retry);
            for _ in 0..50 {
                let delay = policy.backoff_delay(retry);
                assert!(delay >= ceiling / 2, "{delay:?} below half of {ceiling:?}");
                assert!(delay <= ceiling, "{delay:?} above {ceiling:?}");
            }
        }
    }

    #[test]
    fn test_global_deadline_is_max_not_sum() {
        let policy = OrchestratorPolicy {
            weather_timeout: Duration::from_secs(2),
            insights_timeout: Duration::from_secs(3),
            booking_timeout: Duration::from_secs(5),
            ..OrchestratorPolicy::default()
        };
        // 5s * 2 attempts + 250ms backoff ceiling + slack
        assert_eq!(policy.global_deadline(), Duration::from_millis(10_300));
    }

    #[test]
    fn test_deadline_override() {
        let policy = OrchestratorPolicy {
            deadline_override: Some(Duration::from_secs(3)),
            ..OrchestratorPolicy::default()
        };
        assert_eq!(policy.global_deadline(), Duration::from_secs(3));
    }

    #[test]
    fn test_no_retries_means_single_timeout() {
        let retry = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(retry.worst_case(Duration::from_secs(5)), Duration::from_secs(5));
    }

    #[test]
    fn test_from_config() {
        let mut config = TripConfig::default();
        config.providers.booking.timeout_ms = 8_000;
        config.orchestrator.strict_deadline = true;
        let policy = OrchestratorPolicy::from(&config);
        assert_eq!(policy.timeout_for(Source::Booking), Duration::from_secs(8));
        assert_eq!(policy.timeout_for(Source::Weather), Duration::from_secs(5));
        assert!(policy.strict_deadline);
    }
}
