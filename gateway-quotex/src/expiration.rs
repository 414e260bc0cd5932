//! Option expiration alignment
//!
//! Non-OTC instruments expire on exchange minute boundaries: the upstream
//! wants an absolute expiration timestamp, not a duration, and it must land
//! on the first minute boundary at least `duration` seconds away.

/// Absolute expiration timestamp for an order placed at `now` (seconds since
/// epoch) with the requested `duration` in seconds.
pub fn next_expiration_time(now: i64, duration: i64) -> i64 {
    let mut expiration = now - now % 60 + 60;
    while expiration - now < duration {
        expiration += 60;
    }
    expiration
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lands_on_minute_boundary() {
        assert_eq!(next_expiration_time(130, 60) % 60, 0);
        assert_eq!(next_expiration_time(7, 300) % 60, 0);
    }

    #[test]
    fn test_at_least_duration_away() {
        // 130 -> next boundary 180 is only 50s out, so roll to 240.
        assert_eq!(next_expiration_time(130, 60), 240);
        // Exactly on a boundary: 120 + 60 = 180 is a full 60s away.
        assert_eq!(next_expiration_time(120, 60), 180);
    }

    #[test]
    fn test_long_durations_roll_forward() {
        let exp = next_expiration_time(1_700_000_015, 300);
        assert!(exp - 1_700_000_015 >= 300);
        assert!(exp - 1_700_000_015 < 360);
    }
}
