//! RateLimiter behaviour under a paused clock.

use std::sync::Arc;
use std::time::Duration;

use muninn::{RateLimitConfig, RateLimiter};
use tokio::time::Instant;

fn limiter(config: RateLimitConfig) -> RateLimiter {
    RateLimiter::new(config).unwrap()
}

#[tokio::test(start_paused = true)]
async fn third_call_waits_for_the_minute_window() {
    let limiter = limiter(RateLimitConfig::new().requests_per_minute(2));
    let start = Instant::now();

    limiter.wait_for_slot().await;
    limiter.wait_for_slot().await;
    assert!(start.elapsed() < Duration::from_secs(1));

    limiter.wait_for_slot().await;
    assert!(start.elapsed() >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn no_window_ever_exceeds_its_limit() {
    let limiter = limiter(RateLimitConfig::new().requests_per_minute(3));

    for _ in 0..10 {
        limiter.wait_for_slot().await;
        let stats = limiter.stats();
        assert!(stats.last_minute <= stats.minute_limit);
    }
}

#[tokio::test(start_paused = true)]
async fn hour_window_gates_independently_of_minute() {
    let limiter = limiter(
        RateLimitConfig::new()
            .requests_per_minute(100)
            .requests_per_hour(2),
    );
    let start = Instant::now();

    limiter.wait_for_slot().await;
    limiter.wait_for_slot().await;
    limiter.wait_for_slot().await;

    assert!(start.elapsed() >= Duration::from_secs(3600));
}

#[tokio::test(start_paused = true)]
async fn required_wait_probes_without_recording() {
    let limiter = limiter(RateLimitConfig::new().requests_per_minute(1));
    limiter.wait_for_slot().await;

    let wait = limiter.required_wait();
    assert!(wait > Duration::from_secs(50));
    // The probe must not have committed a grant.
    assert_eq!(limiter.stats().last_minute, 1);
}

#[tokio::test(start_paused = true)]
async fn stats_report_counts_and_limits_per_window() {
    let limiter = limiter(RateLimitConfig::new());
    limiter.wait_for_slot().await;
    limiter.wait_for_slot().await;

    let stats = limiter.stats();
    assert_eq!(stats.last_minute, 2);
    assert_eq!(stats.last_hour, 2);
    assert_eq!(stats.last_day, 2);
    assert_eq!(stats.minute_limit, 10);
    assert_eq!(stats.hour_limit, 100);
    assert_eq!(stats.day_limit, 500);
}

#[tokio::test(start_paused = true)]
async fn minute_window_refills_as_grants_age_out() {
    let limiter = limiter(RateLimitConfig::new().requests_per_minute(2));
    limiter.wait_for_slot().await;
    limiter.wait_for_slot().await;

    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(limiter.stats().last_minute, 0);

    let start = Instant::now();
    limiter.wait_for_slot().await;
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn concurrent_waiters_never_over_grant() {
    // 5 grants at 2/minute: two at t=0, two at t=60, one at t=120.
    let limiter = Arc::new(limiter(RateLimitConfig::new().requests_per_minute(2)));
    let start = Instant::now();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let limiter = Arc::clone(&limiter);
        handles.push(tokio::spawn(async move {
            limiter.wait_for_slot().await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(start.elapsed() >= Duration::from_secs(120));
    assert!(limiter.stats().last_minute <= 2);
}
