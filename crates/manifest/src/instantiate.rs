// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::parser::Manifest;
use pheno_core::{AllocError, Flag, Token, TokenAllocator, TokenId, ZoneIndex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstantiateError {
    #[error("cannot allocate token {id} (line {line}): {source}")]
    Alloc {
        id: TokenId,
        line: usize,
        #[source]
        source: AllocError,
    },
}

/// Allocate one token per manifest record, in its declared zone
///
/// Tokens keep the manifest's id and tag and start with the allocated flag
/// set. On failure, tokens already allocated are released again.
pub fn instantiate(
    manifest: &Manifest,
    allocator: &dyn TokenAllocator,
    size: usize,
) -> Result<Vec<Token>, InstantiateError> {
    let mut tokens = Vec::with_capacity(manifest.tokens.len());
    for record in &manifest.tokens {
        let allocated =
            ZoneIndex::new(record.zone).and_then(|zone| allocator.allocate_in(zone, size));
        let allocation = match allocated {
            Ok(allocation) => allocation,
            Err(source) => {
                for token in &tokens {
                    release(allocator, token);
                }
                return Err(InstantiateError::Alloc {
                    id: record.id,
                    line: record.line,
                    source,
                });
            }
        };
        let token = Token::from_allocation(allocation)
            .with_id(record.id)
            .with_tag(&record.tag);
        token.flags().set(Flag::Allocated);
        tracing::info!(
            token_id = %token.id(),
            zone = %token.zone(),
            tag = token.tag(),
            "token instantiated"
        );
        tokens.push(token);
    }
    Ok(tokens)
}

fn release(allocator: &dyn TokenAllocator, token: &Token) {
    if let Err(e) = token.free(allocator) {
        tracing::warn!(token_id = %token.id(), error = %e, "rollback release failed");
    }
}

#[cfg(test)]
#[path = "instantiate_tests.rs"]
mod tests;
