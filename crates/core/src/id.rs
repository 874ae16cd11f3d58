// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token identifiers and lock owner identities

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Process-unique token identifier
///
/// Zero is reserved as the null id and is never handed out by [`TokenIdGen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u32);

impl TokenId {
    pub const NULL: TokenId = TokenId(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl From<u32> for TokenId {
    fn from(id: u32) -> Self {
        TokenId(id)
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Monotonic token id generator
///
/// Owned by an allocator and shared by cloning; clones draw from the same
/// counter.
#[derive(Clone, Debug)]
pub struct TokenIdGen {
    counter: Arc<AtomicU32>,
}

impl TokenIdGen {
    /// Base of the default id range, chosen so token ids never look like null
    pub const DEFAULT_BASE: u32 = 0x1000_0000;

    pub fn new(base: u32) -> Self {
        Self {
            counter: Arc::new(AtomicU32::new(base.max(1))),
        }
    }

    pub fn next(&self) -> TokenId {
        loop {
            let id = self.counter.fetch_add(1, Ordering::SeqCst);
            if id != 0 {
                return TokenId(id);
            }
        }
    }

    /// The id the next call to [`next`](Self::next) will return
    pub fn peek(&self) -> TokenId {
        TokenId(self.counter.load(Ordering::SeqCst))
    }
}

impl Default for TokenIdGen {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE)
    }
}

/// Opaque identity of whoever holds a token's lock
///
/// Owners compare by equality only. Callers supply their own identity, or use
/// [`OwnerId::current_thread`] to name the calling thread.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn current_thread() -> Self {
        Self(format!("{:?}", std::thread::current().id()))
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        OwnerId(s.to_string())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
