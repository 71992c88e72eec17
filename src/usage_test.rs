use super::*;

#[test]
fn allows_up_to_limit() {
    let meter = UsageMeter::new();
    let user = Uuid::new_v4();
    let now = Instant::now();

    for i in 0..DEFAULT_DAILY_LIMIT {
        assert!(meter.check_at(user, now).is_ok(), "submission {i} should be allowed");
        meter.record_at(user, now);
    }
    assert!(matches!(
        meter.check_at(user, now),
        Err(UsageError::LimitReached { .. })
    ));
}

#[test]
fn ninth_of_ten_admits_then_refuses() {
    let meter = UsageMeter::new();
    let user = Uuid::new_v4();
    let now = Instant::now();

    // Counter at 9/10: the next attempt is admitted and fills the quota.
    for _ in 0..9 {
        meter.record_at(user, now);
    }
    assert!(meter.check_at(user, now).is_ok());
    meter.record_at(user, now);
    assert_eq!(meter.used_at(user, now), 10);

    // A second attempt is refused.
    assert!(matches!(
        meter.check_at(user, now),
        Err(UsageError::LimitReached { .. })
    ));
}

#[test]
fn window_expiry_frees_quota() {
    let meter = UsageMeter::new();
    let user = Uuid::new_v4();
    let start = Instant::now();

    for _ in 0..DEFAULT_DAILY_LIMIT {
        meter.record_at(user, start);
    }
    assert!(meter.check_at(user, start).is_err());

    let after_window = start + Duration::from_secs(DEFAULT_WINDOW_SECS) + Duration::from_millis(1);
    assert!(meter.check_at(user, after_window).is_ok());
    assert_eq!(meter.used_at(user, after_window), 0);
}

#[test]
fn distinct_users_do_not_interfere() {
    let meter = UsageMeter::new();
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    let now = Instant::now();

    for _ in 0..DEFAULT_DAILY_LIMIT {
        meter.record_at(user_a, now);
    }
    assert!(meter.check_at(user_a, now).is_err());
    assert!(meter.check_at(user_b, now).is_ok());
}

#[test]
fn remaining_counts_down() {
    let meter = UsageMeter::new();
    let user = Uuid::new_v4();
    let now = Instant::now();

    assert_eq!(meter.remaining(user), DEFAULT_DAILY_LIMIT);
    meter.record_at(user, now);
    meter.record_at(user, now);
    assert_eq!(meter.used_at(user, now), 2);
}

#[test]
fn check_never_records() {
    let meter = UsageMeter::new();
    let user = Uuid::new_v4();
    let now = Instant::now();

    for _ in 0..100 {
        let _ = meter.check_at(user, now);
    }
    assert_eq!(meter.used_at(user, now), 0);
}
