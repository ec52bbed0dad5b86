//! Timestamp and timer configuration tests for tickwork-core

use tickwork_core::{Timestamp, TimerConfig, MICROS_PER_MILLI};

#[test]
fn test_timestamp_conversions() {
    let ts = Timestamp::from_millis(1_500);
    assert_eq!(ts.as_micros(), 1_500 * MICROS_PER_MILLI);
    assert_eq!(ts.as_millis(), 1_500);
    assert_eq!(ts.as_secs(), 1);
}

#[test]
fn test_timestamp_ordering() {
    let earlier = Timestamp::from_micros(10);
    let later = earlier.saturating_add_micros(5);
    assert!(later > earlier);
    assert!(later.has_reached(earlier));
    assert!(!earlier.has_reached(later));
    assert_eq!(later.saturating_since(earlier), 5);
    assert_eq!(earlier.saturating_since(later), 0);
}

#[test]
fn test_timestamp_saturates() {
    assert_eq!(Timestamp::MAX.saturating_add_micros(1), Timestamp::MAX);
    assert_eq!(Timestamp::from_millis(u64::MAX), Timestamp::MAX);
}

#[test]
fn test_timer_config_for_scheduler_tick() {
    let cfg = TimerConfig::for_tick(16_000_000, 1_000).unwrap();
    assert_eq!(cfg.prescaler, 16_000);
    assert_eq!(cfg.period_counts(), 1);

    // 72 MHz / 1 kHz does not fit a 16-bit prescaler
    let cfg = TimerConfig::for_tick(72_000_000, 1_000).unwrap();
    assert_eq!(cfg.prescaler as u64 * cfg.period_counts(), 72_000);
}
