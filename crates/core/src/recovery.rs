// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Degradation and recovery policy
//!
//! The policy turns a machine's retry history into a degradation score,
//! decides when the machine must degrade, and gates recovery on a decaying
//! confidence score plus an injected [`RecoveryHook`]. Confidence decays every
//! time recovery is initiated, so a machine that keeps failing eventually
//! loses the right to recover and is freed once its retries run out.

use crate::config::ConfigError;
use crate::flags::Flag;
use crate::id::TokenId;
use crate::token::Token;
use serde::{Deserialize, Serialize};

/// Thresholds for the degrade/recover cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DegradationPolicy {
    /// Score above which an active machine may degrade
    pub degrade_threshold: f64,
    /// Confidence a degraded machine must exceed to recover
    pub recover_confidence_floor: f64,
    /// Factor applied to confidence each time recovery is initiated
    pub confidence_decay: f64,
    /// Retry count at which a degraded machine may be freed
    pub max_retries: u32,
    /// Retries that map to a score of 1.0
    pub score_divisor: u32,
}

impl Default for DegradationPolicy {
    fn default() -> Self {
        Self {
            degrade_threshold: 0.6,
            recover_confidence_floor: 0.3,
            confidence_decay: 0.9,
            max_retries: 63,
            score_divisor: 100,
        }
    }
}

impl DegradationPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("degrade_threshold", self.degrade_threshold),
            ("recover_confidence_floor", self.recover_confidence_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "degradation.{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if !(self.confidence_decay > 0.0 && self.confidence_decay <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "degradation.confidence_decay must be within (0, 1], got {}",
                self.confidence_decay
            )));
        }
        if self.score_divisor == 0 {
            return Err(ConfigError::Invalid(
                "degradation.score_divisor must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Degradation score for a retry count, saturating at 1.0
    pub fn score(&self, retries: u32) -> f64 {
        (f64::from(retries) / f64::from(self.score_divisor.max(1))).min(1.0)
    }

    pub fn should_degrade(&self, retries: u32) -> bool {
        self.score(retries) > self.degrade_threshold
    }

    pub fn confidence_permits_recovery(&self, confidence: f64) -> bool {
        confidence > self.recover_confidence_floor
    }

    /// Confidence after one more recovery initiation
    pub fn decay(&self, confidence: f64) -> f64 {
        confidence * self.confidence_decay
    }

    pub fn free_permitted(&self, retries: u32) -> bool {
        retries >= self.max_retries
    }

    /// Retries are spent and confidence is too low to ever recover
    pub fn is_exhausted(&self, retries: u32, confidence: f64) -> bool {
        self.free_permitted(retries) && !self.confidence_permits_recovery(confidence)
    }
}

/// Guard for the `Validate` transition
///
/// Real integrity or proof checks plug in here. Closures taking `&Token`
/// implement this trait.
pub trait IntegrityCheck: Send + Sync {
    fn verify(&self, token: &Token) -> bool;
}

impl<F> IntegrityCheck for F
where
    F: Fn(&Token) -> bool + Send + Sync,
{
    fn verify(&self, token: &Token) -> bool {
        self(token)
    }
}

/// Accepts any token whose allocated flag is set
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocatedCheck;

impl IntegrityCheck for AllocatedCheck {
    fn verify(&self, token: &Token) -> bool {
        token.flags().test(Flag::Allocated)
    }
}

/// What a recovery hook sees when asked to approve recovery
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryContext {
    pub token_id: TokenId,
    pub retry_count: u32,
    pub confidence: f64,
    pub score: f64,
}

/// Approval step for leaving the degraded state
///
/// Stands in for operator-mediated recovery. Consulted only once confidence
/// already permits recovery.
pub trait RecoveryHook: Send + Sync {
    fn attempt(&self, ctx: &RecoveryContext) -> bool;
}

impl<F> RecoveryHook for F
where
    F: Fn(&RecoveryContext) -> bool + Send + Sync,
{
    fn attempt(&self, ctx: &RecoveryContext) -> bool {
        self(ctx)
    }
}

/// Approves every recovery attempt
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoRecover;

impl RecoveryHook for AutoRecover {
    fn attempt(&self, _ctx: &RecoveryContext) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
