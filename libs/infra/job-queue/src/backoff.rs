// [libs/infra/job-queue/src/backoff.rs]
/*!
 * Exponential backoff for `ack_failure` (spec.md §4.F: "exponential
 * backoff default"). Doubles per attempt from `base_seconds`, capped
 * at `max_seconds` so a chronically failing job doesn't get scheduled
 * years out.
 */

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base_seconds: i64,
    pub max_seconds: i64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { base_seconds: 2, max_seconds: 3600 }
    }
}

impl BackoffPolicy {
    /// `attempts` is the attempt count *before* the current failure is
    /// recorded (i.e. the previous `attempts` value on the job row).
    pub fn delay_seconds(&self, attempts: u32) -> i64 {
        let factor = 1i64.checked_shl(attempts.min(20)).unwrap_or(i64::MAX);
        self.base_seconds.saturating_mul(factor).min(self.max_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_until_the_cap() {
        let policy = BackoffPolicy { base_seconds: 2, max_seconds: 100 };
        assert_eq!(policy.delay_seconds(0), 2);
        assert_eq!(policy.delay_seconds(1), 4);
        assert_eq!(policy.delay_seconds(2), 8);
        assert_eq!(policy.delay_seconds(10), 100);
    }
}
