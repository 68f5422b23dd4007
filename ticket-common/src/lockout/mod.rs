use std::time::{Duration, SystemTime};

/// Failed sign-in attempts accrue within `attempt_window`. Reaching
/// `max_attempts` locks the account for `lockout_duration`.
#[derive(Clone, Copy, Debug)]
pub struct LockoutPolicy {
    pub max_attempts: i32,
    pub attempt_window: Duration,
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_window: Duration::from_secs(15 * 60),
            lockout_duration: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PreviousFailures {
    pub attempt_count: i32,
    pub last_failure_timestamp: SystemTime,
}

/// The attempt count a new failure should be recorded with. Counting restarts
/// only once the last failure fell out of the accrual window; serving a
/// lockout does not reset the count, so a failure right after a lock expires
/// locks the account again.
pub fn next_attempt_count(
    previous: Option<PreviousFailures>,
    now: SystemTime,
    policy: &LockoutPolicy,
) -> i32 {
    let Some(previous) = previous else {
        return 1;
    };

    let within_window = now
        .duration_since(previous.last_failure_timestamp)
        .map(|elapsed| elapsed <= policy.attempt_window)
        .unwrap_or(true);

    if within_window {
        previous.attempt_count + 1
    } else {
        1
    }
}

pub fn lock_expiration(
    attempt_count: i32,
    now: SystemTime,
    policy: &LockoutPolicy,
) -> Option<SystemTime> {
    if attempt_count >= policy.max_attempts {
        Some(now + policy.lockout_duration)
    } else {
        None
    }
}

pub fn attempts_remaining(attempt_count: i32, policy: &LockoutPolicy) -> i32 {
    (policy.max_attempts - attempt_count).max(0)
}

/// Minutes until a lock expires, rounded up so a partially elapsed minute
/// still counts.
pub fn remaining_lock_minutes(locked_until: SystemTime, now: SystemTime) -> u64 {
    match locked_until.duration_since(now) {
        Ok(remaining) => remaining.as_secs().div_ceil(60),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LockoutPolicy {
        LockoutPolicy::default()
    }

    #[test]
    fn test_first_failure_starts_at_one() {
        let now = SystemTime::now();
        assert_eq!(next_attempt_count(None, now, &policy()), 1);
    }

    #[test]
    fn test_failures_accrue_within_window() {
        let now = SystemTime::now();
        let previous = PreviousFailures {
            attempt_count: 1,
            last_failure_timestamp: now - Duration::from_secs(60),
        };

        assert_eq!(next_attempt_count(Some(previous), now, &policy()), 2);
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let now = SystemTime::now();
        let previous = PreviousFailures {
            attempt_count: 2,
            last_failure_timestamp: now - Duration::from_secs(16 * 60),
        };

        assert_eq!(next_attempt_count(Some(previous), now, &policy()), 1);
    }

    #[test]
    fn test_failure_after_served_lock_still_accrues() {
        let now = SystemTime::now();

        // The lock expired a minute ago but the last failure is inside the
        // accrual window, so the next failure locks the account again.
        let previous = PreviousFailures {
            attempt_count: 3,
            last_failure_timestamp: now - Duration::from_secs(60),
        };

        assert_eq!(next_attempt_count(Some(previous), now, &policy()), 4);
        assert!(lock_expiration(4, now, &policy()).is_some());
    }

    #[test]
    fn test_served_lock_outside_window_resets_count() {
        let now = SystemTime::now();
        let previous = PreviousFailures {
            attempt_count: 3,
            last_failure_timestamp: now - Duration::from_secs(20 * 60),
        };

        assert_eq!(next_attempt_count(Some(previous), now, &policy()), 1);
    }

    #[test]
    fn test_lock_begins_at_threshold() {
        let now = SystemTime::now();

        assert!(lock_expiration(1, now, &policy()).is_none());
        assert!(lock_expiration(2, now, &policy()).is_none());
        assert_eq!(
            lock_expiration(3, now, &policy()),
            Some(now + Duration::from_secs(5 * 60)),
        );
        assert!(lock_expiration(4, now, &policy()).is_some());
    }

    #[test]
    fn test_attempts_remaining_never_negative() {
        assert_eq!(attempts_remaining(1, &policy()), 2);
        assert_eq!(attempts_remaining(2, &policy()), 1);
        assert_eq!(attempts_remaining(3, &policy()), 0);
        assert_eq!(attempts_remaining(7, &policy()), 0);
    }

    #[test]
    fn test_remaining_lock_minutes_rounds_up() {
        let now = SystemTime::now();

        assert_eq!(
            remaining_lock_minutes(now + Duration::from_secs(300), now),
            5
        );
        assert_eq!(
            remaining_lock_minutes(now + Duration::from_secs(241), now),
            5
        );
        assert_eq!(remaining_lock_minutes(now + Duration::from_secs(30), now), 1);
        assert_eq!(remaining_lock_minutes(now - Duration::from_secs(1), now), 0);
    }
}
