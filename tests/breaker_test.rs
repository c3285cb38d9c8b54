//! Tests for circuit-breaker state transitions through the public API.

use std::time::Duration;

use skald::{BreakerConfig, BreakerState, CircuitBreaker, SkaldError};

fn breaker(threshold: u32, recovery_ms: u64) -> CircuitBreaker {
    CircuitBreaker::new(
        BreakerConfig::new()
            .failure_threshold(threshold)
            .recovery_timeout(Duration::from_millis(recovery_ms)),
    )
}

#[test]
fn closed_until_threshold_consecutive_failures() {
    let cb = breaker(3, 60_000);

    for _ in 0..2 {
        cb.try_acquire().unwrap();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    cb.try_acquire().unwrap();
    cb.record_failure();
    assert_eq!(cb.state(), BreakerState::Open);
}

#[test]
fn open_breaker_fails_fast() {
    let cb = breaker(1, 60_000);
    cb.record_failure();

    for _ in 0..5 {
        assert!(matches!(cb.try_acquire(), Err(SkaldError::CircuitOpen)));
    }
}

#[test]
fn intervening_success_interrupts_the_streak() {
    let cb = breaker(3, 60_000);
    cb.record_failure();
    cb.record_failure();
    cb.record_success();
    cb.record_failure();
    cb.record_failure();
    // Two failures since the success: still below the threshold.
    assert_eq!(cb.state(), BreakerState::Closed);
}

#[tokio::test]
async fn recovery_cycle_open_half_open_closed() {
    let cb = breaker(1, 50);
    cb.record_failure();
    assert_eq!(cb.state(), BreakerState::Open);
    assert!(cb.try_acquire().is_err());

    tokio::time::sleep(Duration::from_millis(80)).await;

    // First caller after the timeout gets the HALF_OPEN trial.
    cb.try_acquire().unwrap();
    assert_eq!(cb.state(), BreakerState::HalfOpen);
    // Exactly one trial: a concurrent caller fails fast.
    assert!(matches!(cb.try_acquire(), Err(SkaldError::CircuitOpen)));

    cb.record_success();
    assert_eq!(cb.state(), BreakerState::Closed);
    assert_eq!(cb.failure_count(), 0);
}

#[tokio::test]
async fn failed_trial_reopens_immediately() {
    let cb = breaker(3, 50);
    for _ in 0..3 {
        cb.record_failure();
    }
    tokio::time::sleep(Duration::from_millis(80)).await;

    cb.try_acquire().unwrap();
    cb.record_failure();

    // A single failure reopened the breaker; no fresh threshold needed.
    assert_eq!(cb.state(), BreakerState::Open);
    assert!(matches!(cb.try_acquire(), Err(SkaldError::CircuitOpen)));
}

#[tokio::test]
async fn released_trial_lets_next_caller_probe() {
    let cb = breaker(1, 50);
    cb.record_failure();
    tokio::time::sleep(Duration::from_millis(80)).await;

    cb.try_acquire().unwrap();
    // The guarded call ended in a non-qualifying error: state must not
    // change, but the slot frees up.
    cb.release_trial();
    assert_eq!(cb.state(), BreakerState::HalfOpen);
    assert!(cb.try_acquire().is_ok());
}
