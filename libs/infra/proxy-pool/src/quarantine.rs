// [libs/infra/proxy-pool/src/quarantine.rs]
/*!
 * Quarantine window growth on consecutive failures (spec.md §4.B).
 * Doubles per consecutive error from a 30-second floor, capped at six
 * hours so a proxy that later recovers isn't locked out indefinitely.
 */

const FLOOR_SECONDS: i64 = 30;
const CEILING_SECONDS: i64 = 6 * 3600;

pub fn quarantine_duration_seconds(consecutive_errors: u32) -> i64 {
    if consecutive_errors == 0 {
        return 0;
    }
    let factor = 1i64.checked_shl((consecutive_errors - 1).min(20)).unwrap_or(i64::MAX);
    FLOOR_SECONDS.saturating_mul(factor).min(CEILING_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_grows_and_then_caps() {
        assert_eq!(quarantine_duration_seconds(0), 0);
        assert_eq!(quarantine_duration_seconds(1), 30);
        assert_eq!(quarantine_duration_seconds(2), 60);
        assert_eq!(quarantine_duration_seconds(3), 120);
        assert_eq!(quarantine_duration_seconds(30), CEILING_SECONDS);
    }
}
