// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tokens: owned units of memory/state
//!
//! A token carries its identity (id, tag, zone), a storage handle from its
//! allocator, and an [`AtomicFlagSet`]. Identity is fixed at construction;
//! after that a token changes only through its atomic words and its lock.

use crate::allocator::{AllocError, Allocation, StorageHandle, TokenAllocator, ZoneIndex};
use crate::bits::{DegradationMetrics, TokenType, ValueHeader};
use crate::flags::{AtomicFlagSet, Flag, FlagBits};
use crate::id::{OwnerId, TokenId};
use crate::recovery::{AllocatedCheck, IntegrityCheck};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Longest tag kept, in bytes
pub const MAX_TAG_LEN: usize = 15;

/// Misuse of the token API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token {token} is not locked by {owner}")]
    NotOwner { token: TokenId, owner: OwnerId },
    #[error("token {0} is not locked")]
    NotLocked(TokenId),
    #[error("token {0} is still locked")]
    StillLocked(TokenId),
    #[error("token {token} still has {refs} shared holder(s)")]
    StillReferenced { token: TokenId, refs: u32 },
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// An allocated unit tracked by a state machine
pub struct Token {
    id: TokenId,
    tag: String,
    zone: ZoneIndex,
    size: usize,
    handle: StorageHandle,
    kind: TokenType,
    header: ValueHeader,
    flags: AtomicFlagSet,
    owner: Mutex<Option<OwnerId>>,
}

impl Token {
    /// Allocate storage and build a token with every flag word zeroed
    pub fn alloc(allocator: &dyn TokenAllocator, size: usize) -> Result<Token, AllocError> {
        allocator.allocate(size).map(Token::from_allocation)
    }

    pub fn from_allocation(allocation: Allocation) -> Token {
        Token {
            id: allocation.id,
            tag: default_tag(allocation.id),
            zone: allocation.zone,
            size: allocation.size,
            handle: allocation.handle,
            kind: TokenType::default(),
            header: ValueHeader::default().with_data_size(allocation.size),
            flags: AtomicFlagSet::new(),
            owner: Mutex::new(None),
        }
    }

    /// Replace the allocator-assigned id, keeping a default tag in step
    pub fn with_id(mut self, id: TokenId) -> Token {
        if self.tag == default_tag(self.id) {
            self.tag = default_tag(id);
        }
        self.id = id;
        self
    }

    /// Set the display tag, truncated to [`MAX_TAG_LEN`] bytes
    pub fn with_tag(mut self, tag: &str) -> Token {
        self.tag = truncate_tag(tag);
        self
    }

    pub fn with_kind(mut self, kind: TokenType) -> Token {
        self.kind = kind;
        self
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn zone(&self) -> ZoneIndex {
        self.zone
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn handle(&self) -> StorageHandle {
        self.handle
    }

    pub fn kind(&self) -> TokenType {
        self.kind
    }

    pub fn header(&self) -> ValueHeader {
        self.header
    }

    pub fn flags(&self) -> &AtomicFlagSet {
        &self.flags
    }

    /// Current lock owner; `None` whenever the token is unlocked
    pub fn owner(&self) -> Option<OwnerId> {
        self.owner.lock().clone()
    }

    /// Try to take the lock for `owner`
    ///
    /// Never blocks. Returns false if someone already holds the lock.
    pub fn lock(&self, owner: &OwnerId) -> bool {
        let mut slot = self.owner.lock();
        if !self.flags.test_and_set(Flag::Locked) {
            return false;
        }
        *slot = Some(owner.clone());
        true
    }

    /// Release the lock held by `owner`
    pub fn unlock(&self, owner: &OwnerId) -> Result<(), TokenError> {
        let mut slot = self.owner.lock();
        if !self.flags.test(Flag::Locked) {
            return Err(TokenError::NotLocked(self.id));
        }
        if slot.as_ref() != Some(owner) {
            return Err(TokenError::NotOwner {
                token: self.id,
                owner: owner.clone(),
            });
        }
        *slot = None;
        self.flags.clear(Flag::Locked);
        Ok(())
    }

    /// Allocated flag set and the default integrity check passes
    pub fn validate(&self) -> bool {
        self.validate_with(&AllocatedCheck)
    }

    pub fn validate_with(&self, check: &dyn IntegrityCheck) -> bool {
        self.flags.test(Flag::Allocated) && check.verify(self)
    }

    /// Return storage to `allocator`
    ///
    /// Refused while the token is locked or shared holders remain.
    pub fn free(&self, allocator: &dyn TokenAllocator) -> Result<(), TokenError> {
        if self.flags.test(Flag::Locked) {
            return Err(TokenError::StillLocked(self.id));
        }
        let refs = self.flags.get_ref();
        if refs > 0 {
            return Err(TokenError::StillReferenced {
                token: self.id,
                refs,
            });
        }
        allocator.release(self.handle)?;
        self.flags.clear(Flag::Allocated);
        tracing::info!(token_id = %self.id, zone = %self.zone, "token freed");
        Ok(())
    }

    /// Clear lifecycle flags and ownership ahead of a forced release
    pub(crate) fn reset_for_release(&self) {
        *self.owner.lock() = None;
        self.flags.clear_all(&[
            Flag::Allocated,
            Flag::Locked,
            Flag::Processing,
            Flag::Coherent,
            Flag::Shared,
        ]);
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        TokenSnapshot {
            id: self.id,
            tag: self.tag.clone(),
            zone: self.zone.get(),
            size: self.size,
            kind: self.kind,
            flags: self.flags.bits(),
            ref_count: self.flags.get_ref(),
            metrics: self.flags.metrics(),
            owner: self.owner(),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("zone", &self.zone)
            .field("size", &self.size)
            .field("flags", &self.flags.bits())
            .field("ref_count", &self.flags.get_ref())
            .finish()
    }
}

fn default_tag(id: TokenId) -> String {
    format!("PHENO_{:08X}", id.0)
}

fn truncate_tag(tag: &str) -> String {
    let mut end = tag.len().min(MAX_TAG_LEN);
    while !tag.is_char_boundary(end) {
        end -= 1;
    }
    tag[..end].to_string()
}

/// Read-only copy of a token for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenSnapshot {
    pub id: TokenId,
    pub tag: String,
    pub zone: u8,
    pub size: usize,
    pub kind: TokenType,
    pub flags: FlagBits,
    pub ref_count: u32,
    pub metrics: DegradationMetrics,
    pub owner: Option<OwnerId>,
}

impl fmt::Display for TokenSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<15} zone={:<2} size={:<6} refs={} flags={}",
            self.id, self.tag, self.zone, self.size, self.ref_count, self.flags
        )
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
