// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

#[parameterized(
    no_retries = { 0, 0.0 },
    sixty = { 60, 0.6 },
    sixty_one = { 61, 0.61 },
    saturates = { 250, 1.0 },
)]
fn score_is_retries_over_divisor(retries: u32, expected: f64) {
    let policy = DegradationPolicy::default();
    assert!((policy.score(retries) - expected).abs() < 1e-12);
}

#[parameterized(
    at_threshold_does_not_degrade = { 60, false },
    above_threshold_degrades = { 61, true },
    well_below = { 10, false },
)]
fn degrade_requires_score_strictly_above_threshold(retries: u32, degrades: bool) {
    assert_eq!(
        DegradationPolicy::default().should_degrade(retries),
        degrades
    );
}

#[test]
fn recovery_requires_confidence_above_floor() {
    let policy = DegradationPolicy::default();
    assert!(policy.confidence_permits_recovery(0.31));
    assert!(!policy.confidence_permits_recovery(0.3));
    assert!(!policy.confidence_permits_recovery(0.1));
}

#[test]
fn exhaustion_needs_both_spent_retries_and_low_confidence() {
    let policy = DegradationPolicy::default();
    assert!(!policy.is_exhausted(62, 0.1));
    assert!(!policy.is_exhausted(63, 0.9));
    assert!(policy.is_exhausted(63, 0.25));
}

#[test]
fn decay_reaches_floor_after_twelve_initiations() {
    let policy = DegradationPolicy::default();
    let mut confidence = 1.0;
    let mut initiations = 0;
    while policy.confidence_permits_recovery(confidence) {
        confidence = policy.decay(confidence);
        initiations += 1;
    }
    assert_eq!(initiations, 12);
}

#[test]
fn validate_rejects_zero_decay() {
    let policy = DegradationPolicy {
        confidence_decay: 0.0,
        ..DegradationPolicy::default()
    };
    assert!(policy.validate().is_err());
}

#[test]
fn closures_act_as_hooks() {
    let deny = |_: &RecoveryContext| false;
    let ctx = RecoveryContext {
        token_id: TokenId(1),
        retry_count: 3,
        confidence: 0.9,
        score: 0.03,
    };
    assert!(!deny.attempt(&ctx));
    assert!(AutoRecover.attempt(&ctx));
}

proptest! {
    #[test]
    fn decay_never_increases_confidence(start in 0.0f64..=1.0, rounds in 1usize..40) {
        let policy = DegradationPolicy::default();
        let mut confidence = start;
        for _ in 0..rounds {
            let next = policy.decay(confidence);
            prop_assert!(next <= confidence);
            confidence = next;
        }
    }

    #[test]
    fn score_stays_in_unit_interval(retries in any::<u32>()) {
        let score = DegradationPolicy::default().score(retries);
        prop_assert!((0.0..=1.0).contains(&score));
    }
}
