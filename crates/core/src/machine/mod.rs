// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token lifecycle state machine
//!
//! A [`StateMachine`] owns at most one [`Token`] and moves it through
//! `Nil -> Allocated -> Locked -> Active -> {Degraded, Shared} -> Freed`.
//! Every event is evaluated under the machine's mutex, so transitions on one
//! machine are serialized; the token's flag words stay readable from outside
//! at any time.
//!
//! Outcomes of [`StateMachine::step`]:
//! - `Ok(true)`: the transition was applied
//! - `Ok(false)`: the event has no transition from the current state, or its
//!   guard failed; nothing changed except the Degraded retry accounting
//! - `Err(_)`: misuse, such as unlocking a token owned by someone else

mod history;
mod state;

pub use history::{TransitionRecord, HISTORY_CAPACITY};
pub use state::{Event, State, Substate};

use crate::allocator::TokenAllocator;
use crate::bits::{DegradationMetrics, TokenType};
use crate::config::PhenoConfig;
use crate::flags::Flag;
use crate::id::OwnerId;
use crate::recovery::{
    AllocatedCheck, AutoRecover, DegradationPolicy, IntegrityCheck, RecoveryContext,
    RecoveryHook,
};
use crate::spin::SpinLock;
use crate::token::{Token, TokenError, TokenSnapshot};
use history::History;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

const DEFAULT_TOKEN_SIZE: usize = 4096;

/// Misuse reported by [`StateMachine::step`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("state machine is not initialized")]
    NotInitialized,
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Builder for [`StateMachine`]
pub struct StateMachineBuilder {
    allocator: Arc<dyn TokenAllocator>,
    integrity: Arc<dyn IntegrityCheck>,
    recovery: Arc<dyn RecoveryHook>,
    policy: DegradationPolicy,
    token_size: usize,
    kind: TokenType,
}

impl StateMachineBuilder {
    /// Guard for `Validate`; defaults to [`AllocatedCheck`]
    pub fn integrity(mut self, check: impl IntegrityCheck + 'static) -> Self {
        self.integrity = Arc::new(check);
        self
    }

    /// Approval for `Recover`; defaults to [`AutoRecover`]
    pub fn recovery(mut self, hook: impl RecoveryHook + 'static) -> Self {
        self.recovery = Arc::new(hook);
        self
    }

    pub fn policy(mut self, policy: DegradationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bytes requested from the allocator on `Alloc`
    pub fn token_size(mut self, size: usize) -> Self {
        self.token_size = size;
        self
    }

    /// Type word stamped on every token this machine allocates
    pub fn kind(mut self, kind: TokenType) -> Self {
        self.kind = kind;
        self
    }

    /// Take the degradation policy and token size from a loaded config
    pub fn config(self, config: &PhenoConfig) -> Self {
        self.policy(config.degradation.clone())
            .token_size(config.allocator.default_token_size)
    }

    pub fn build(self) -> StateMachine {
        StateMachine {
            allocator: self.allocator,
            integrity: self.integrity,
            recovery: self.recovery,
            policy: self.policy,
            token_size: self.token_size,
            kind: self.kind,
            inner: Mutex::new(Inner::default()),
            spin: SpinLock::new(),
        }
    }
}

struct Inner {
    state: State,
    substate: Substate,
    retry_count: u32,
    confidence: f64,
    initialized: bool,
    token: Option<Arc<Token>>,
    history: History,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: State::Nil,
            substate: Substate::None,
            retry_count: 0,
            confidence: 1.0,
            initialized: false,
            token: None,
            history: History::default(),
        }
    }
}

/// Token lifecycle engine
pub struct StateMachine {
    allocator: Arc<dyn TokenAllocator>,
    integrity: Arc<dyn IntegrityCheck>,
    recovery: Arc<dyn RecoveryHook>,
    policy: DegradationPolicy,
    token_size: usize,
    kind: TokenType,
    inner: Mutex<Inner>,
    spin: SpinLock,
}

impl StateMachine {
    pub fn builder(allocator: Arc<dyn TokenAllocator>) -> StateMachineBuilder {
        StateMachineBuilder {
            allocator,
            integrity: Arc::new(AllocatedCheck),
            recovery: Arc::new(AutoRecover),
            policy: DegradationPolicy::default(),
            token_size: DEFAULT_TOKEN_SIZE,
            kind: TokenType::default(),
        }
    }

    /// A machine in `Nil` with default guards and policy
    pub fn create(allocator: Arc<dyn TokenAllocator>) -> StateMachine {
        Self::builder(allocator).build()
    }

    /// Arm the machine for events
    ///
    /// Does not allocate; the token is produced by `Alloc`. Returns false
    /// only for a machine that has already been freed.
    pub fn initialize(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state.is_terminal() {
            return false;
        }
        inner.initialized = true;
        true
    }

    /// Apply `event` on behalf of the calling thread
    pub fn step(&self, event: Event) -> Result<bool, MachineError> {
        self.step_as(event, &OwnerId::current_thread())
    }

    /// Apply `event` on behalf of `owner`
    pub fn step_as(&self, event: Event, owner: &OwnerId) -> Result<bool, MachineError> {
        let mut inner = self.inner.lock();
        if !inner.initialized {
            return Err(MachineError::NotInitialized);
        }

        let from = inner.state;
        let applied = match (from, event) {
            (State::Nil, Event::Alloc) => self.alloc(&mut inner),
            (State::Allocated, Event::Lock) => self.lock(&mut inner, owner),
            (State::Allocated, Event::Free) => self.free_unlocked(&mut inner)?,
            (State::Locked, Event::Validate) => self.validate(&mut inner),
            (State::Locked, Event::Unlock) => self.unlock(&mut inner, owner)?,
            (State::Active, Event::Degrade) => self.degrade(&mut inner),
            (State::Active, Event::Share) | (State::Shared, Event::Share) => {
                self.share(&mut inner)
            }
            (State::Active, Event::Free) => self.force_free(&mut inner),
            (State::Degraded, _) => self.step_degraded(&mut inner, event),
            (State::Shared, Event::Free) => self.unshare(&mut inner),
            _ => false,
        };

        if applied {
            let record = TransitionRecord {
                from,
                event,
                to: inner.state,
            };
            inner.history.push(record);
            tracing::debug!(
                token_id = ?inner.token.as_ref().map(|t| t.id()),
                from = %from,
                event = %event,
                to = %inner.state,
                "transition applied"
            );
        } else {
            tracing::debug!(from = %from, event = %event, "transition rejected");
        }
        Ok(applied)
    }

    /// Count one failed operation against an Active or Degraded machine
    ///
    /// Returns the new retry count, or `None` in any other state.
    pub fn record_failure(&self) -> Option<u32> {
        let mut inner = self.inner.lock();
        if !matches!(inner.state, State::Active | State::Degraded) {
            return None;
        }
        inner.retry_count = inner.retry_count.saturating_add(1);
        self.publish_metrics(&inner);
        Some(inner.retry_count)
    }

    /// Switch what an Active machine is doing with its token
    ///
    /// Writing and Transforming mark the token dirty. Returns false outside
    /// Active or for [`Substate::None`].
    pub fn enter_substate(&self, substate: Substate) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != State::Active || substate == Substate::None {
            return false;
        }
        if substate.mutates() {
            if let Some(token) = &inner.token {
                token.flags().set(Flag::Dirty);
            }
        }
        tracing::debug!(from = %inner.substate, to = %substate, "substate changed");
        inner.substate = substate;
        true
    }

    pub fn state(&self) -> State {
        self.inner.lock().state
    }

    pub fn substate(&self) -> Substate {
        self.inner.lock().substate
    }

    pub fn retry_count(&self) -> u32 {
        self.inner.lock().retry_count
    }

    pub fn confidence(&self) -> f64 {
        self.inner.lock().confidence
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().initialized
    }

    pub fn policy(&self) -> &DegradationPolicy {
        &self.policy
    }

    /// The owned token, if one is allocated
    pub fn token(&self) -> Option<Arc<Token>> {
        self.inner.lock().token.clone()
    }

    /// Applied transitions, oldest first
    pub fn history(&self) -> Vec<TransitionRecord> {
        self.inner.lock().history.to_vec()
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        let inner = self.inner.lock();
        MachineSnapshot {
            state: inner.state,
            substate: inner.substate,
            retry_count: inner.retry_count,
            confidence: inner.confidence,
            initialized: inner.initialized,
            token: inner.token.as_ref().map(|token| token.snapshot()),
        }
    }

    /// Tear the machine down, releasing any token it still owns
    pub fn destroy(self) {
        drop(self);
    }

    fn alloc(&self, inner: &mut Inner) -> bool {
        if !self.allocator.has_capacity(self.token_size) {
            tracing::warn!(size = self.token_size, "alloc rejected: no capacity");
            return false;
        }
        let token = match Token::alloc(self.allocator.as_ref(), self.token_size) {
            Ok(token) => token.with_kind(self.kind),
            Err(e) => {
                tracing::warn!(size = self.token_size, error = %e, "alloc rejected");
                return false;
            }
        };
        token.flags().set(Flag::Allocated);
        tracing::info!(token_id = %token.id(), zone = %token.zone(), "token allocated");
        inner.token = Some(Arc::new(token));
        inner.state = State::Allocated;
        true
    }

    fn lock(&self, inner: &mut Inner, owner: &OwnerId) -> bool {
        let Some(token) = &inner.token else {
            return false;
        };
        if !token.lock(owner) {
            return false;
        }
        if !self.spin.try_lock() {
            // Roll back so the token is not left locked outside Locked
            if let Err(e) = token.unlock(owner) {
                tracing::warn!(token_id = %token.id(), error = %e, "lock rollback failed");
            }
            return false;
        }
        inner.state = State::Locked;
        true
    }

    fn unlock(&self, inner: &mut Inner, owner: &OwnerId) -> Result<bool, TokenError> {
        let Some(token) = &inner.token else {
            return Ok(false);
        };
        if let Err(e) = token.unlock(owner) {
            tracing::warn!(token_id = %token.id(), owner = %owner, error = %e, "unlock refused");
            return Err(e);
        }
        self.spin.unlock();
        inner.state = State::Allocated;
        Ok(true)
    }

    fn validate(&self, inner: &mut Inner) -> bool {
        let Some(token) = &inner.token else {
            return false;
        };
        if !token.validate_with(self.integrity.as_ref()) {
            return false;
        }
        token.flags().set(Flag::Coherent);
        token.flags().set(Flag::Processing);
        inner.state = State::Active;
        inner.substate = Substate::Reading;
        true
    }

    fn degrade(&self, inner: &mut Inner) -> bool {
        if !self.policy.should_degrade(inner.retry_count) {
            return false;
        }
        if let Some(token) = &inner.token {
            token.flags().clear(Flag::Coherent);
        }
        inner.state = State::Degraded;
        inner.substate = Substate::None;
        inner.confidence = self.policy.decay(inner.confidence);
        self.publish_metrics(inner);
        tracing::info!(
            retry_count = inner.retry_count,
            confidence = inner.confidence,
            "recovery initiated"
        );
        true
    }

    fn share(&self, inner: &mut Inner) -> bool {
        let Some(token) = &inner.token else {
            return false;
        };
        let refs = token.flags().increment_ref();
        token.flags().set(Flag::Shared);
        tracing::debug!(token_id = %token.id(), refs, "holder added");
        inner.state = State::Shared;
        inner.substate = Substate::None;
        true
    }

    fn unshare(&self, inner: &mut Inner) -> bool {
        let Some(token) = inner.token.clone() else {
            return false;
        };
        match token.flags().decrement_ref() {
            Some(0) => self.force_free(inner),
            Some(refs) => {
                tracing::debug!(token_id = %token.id(), refs, "holder released");
                false
            }
            None => false,
        }
    }

    /// Events in Degraded: evaluate, then account the retry
    fn step_degraded(&self, inner: &mut Inner, event: Event) -> bool {
        let applied = match event {
            Event::Recover => self.recover(inner),
            Event::Free if self.policy.free_permitted(inner.retry_count) => {
                self.force_free(inner)
            }
            _ => false,
        };
        if inner.state != State::Degraded {
            return applied;
        }

        inner.retry_count = inner.retry_count.saturating_add(1);
        self.publish_metrics(inner);
        if self.policy.is_exhausted(inner.retry_count, inner.confidence) {
            tracing::warn!(
                retry_count = inner.retry_count,
                confidence = inner.confidence,
                "degradation exhausted, freeing token"
            );
            return self.force_free(inner);
        }
        applied
    }

    fn recover(&self, inner: &mut Inner) -> bool {
        let Some(token) = inner.token.clone() else {
            return false;
        };
        let ctx = RecoveryContext {
            token_id: token.id(),
            retry_count: inner.retry_count,
            confidence: inner.confidence,
            score: self.policy.score(inner.retry_count),
        };
        let approved = self.policy.confidence_permits_recovery(inner.confidence)
            && self.recovery.attempt(&ctx);
        if !approved {
            tracing::info!(
                token_id = %token.id(),
                retry_count = inner.retry_count,
                confidence = inner.confidence,
                "recovery refused"
            );
            return false;
        }

        inner.retry_count = 0;
        inner.confidence = 1.0;
        token.flags().reset_metrics();
        token.flags().set(Flag::Coherent);
        inner.state = State::Active;
        inner.substate = Substate::Reading;
        tracing::info!(token_id = %token.id(), "token recovered");
        true
    }

    /// `Allocated -> Freed`: an unlocked, unshared token is freed normally
    fn free_unlocked(&self, inner: &mut Inner) -> Result<bool, TokenError> {
        let Some(token) = &inner.token else {
            return Ok(false);
        };
        token.free(self.allocator.as_ref())?;
        inner.token = None;
        inner.state = State::Freed;
        inner.substate = Substate::None;
        Ok(true)
    }

    /// Release the token regardless of lock or holders
    fn force_free(&self, inner: &mut Inner) -> bool {
        if let Some(token) = inner.token.take() {
            self.release_token(&token);
        }
        inner.state = State::Freed;
        inner.substate = Substate::None;
        true
    }

    fn release_token(&self, token: &Token) {
        token.reset_for_release();
        self.spin.unlock();
        match self.allocator.release(token.handle()) {
            Ok(()) => tracing::info!(token_id = %token.id(), zone = %token.zone(), "token freed"),
            Err(e) => tracing::warn!(token_id = %token.id(), error = %e, "release failed"),
        }
    }

    fn publish_metrics(&self, inner: &Inner) {
        let Some(token) = &inner.token else {
            return;
        };
        let metrics = DegradationMetrics::default()
            .with_score(self.policy.score(inner.retry_count))
            .with_confidence(inner.confidence)
            .with_retries(inner.retry_count);
        token.flags().store_metrics(metrics);
    }
}

impl Drop for StateMachine {
    fn drop(&mut self) {
        if let Some(token) = self.inner.get_mut().token.take() {
            self.release_token(&token);
        }
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

/// Read-only copy of a machine for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSnapshot {
    pub state: State,
    pub substate: Substate,
    pub retry_count: u32,
    pub confidence: f64,
    pub initialized: bool,
    pub token: Option<TokenSnapshot>,
}

impl fmt::Display for MachineSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<9} {:<12} retries={:<2} confidence={:.3}",
            self.state, self.substate, self.retry_count, self.confidence
        )?;
        if let Some(token) = &self.token {
            write!(f, "  {}", token)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
