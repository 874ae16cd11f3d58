// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line parser for token manifests

use pheno_core::{TokenId, ZONE_COUNT};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static TOKEN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^TOKEN:\s*0[xX]([0-9a-fA-F]{1,8})\s+(\S+)\s+(\d+)\s*$")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static RELATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^RELATION:\s*0[xX]([0-9a-fA-F]{1,8})\s*->\s*0[xX]([0-9a-fA-F]{1,8})\s*:\s*(\S+)\s*$")
        .expect("constant regex pattern is valid")
});

/// Errors that stop a manifest from being read at all
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `TOKEN: 0x<id> <tag> <zone>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRecord {
    pub id: TokenId,
    pub tag: String,
    pub zone: u8,
    /// 1-based source line
    pub line: usize,
}

/// `RELATION: 0x<src> -> 0x<dst> : <tag>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationRecord {
    pub src: TokenId,
    pub dst: TokenId,
    pub tag: String,
    pub line: usize,
}

impl fmt::Display for RelationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} : {}", self.src, self.dst, self.tag)
    }
}

/// Why a line was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    MalformedToken,
    MalformedRelation,
    ZoneOutOfRange(String),
    NullId,
    DuplicateToken(TokenId),
    UnknownDirective,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MalformedToken => write!(f, "malformed TOKEN line"),
            SkipReason::MalformedRelation => write!(f, "malformed RELATION line"),
            SkipReason::ZoneOutOfRange(zone) => {
                write!(f, "zone {} is out of range (zones 0..{})", zone, ZONE_COUNT)
            }
            SkipReason::NullId => write!(f, "token id 0x00000000 is reserved"),
            SkipReason::DuplicateToken(id) => write!(f, "duplicate token {}", id),
            SkipReason::UnknownDirective => write!(f, "unknown directive"),
        }
    }
}

/// A skipped line and its diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub line: usize,
    pub reason: SkipReason,
    pub text: String,
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.reason, self.text)
    }
}

/// Parsed manifest, records in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub tokens: Vec<TokenRecord>,
    pub relations: Vec<RelationRecord>,
    pub skipped: Vec<Skipped>,
}

impl Manifest {
    /// Relations whose endpoints are both declared tokens
    pub fn resolved_relations(&self) -> impl Iterator<Item = &RelationRecord> {
        let ids: HashSet<TokenId> = self.tokens.iter().map(|t| t.id).collect();
        self.relations
            .iter()
            .filter(move |r| ids.contains(&r.src) && ids.contains(&r.dst))
    }
}

pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_manifest(&content))
}

pub fn parse_manifest(content: &str) -> Manifest {
    let mut manifest = Manifest::default();
    let mut seen = HashSet::new();

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let outcome = if text.starts_with("TOKEN:") {
            parse_token(text, line).and_then(|record| {
                if seen.insert(record.id) {
                    Ok(Parsed::Token(record))
                } else {
                    Err(SkipReason::DuplicateToken(record.id))
                }
            })
        } else if text.starts_with("RELATION:") {
            parse_relation(text, line).map(Parsed::Relation)
        } else {
            Err(SkipReason::UnknownDirective)
        };

        match outcome {
            Ok(Parsed::Token(record)) => manifest.tokens.push(record),
            Ok(Parsed::Relation(record)) => manifest.relations.push(record),
            Err(reason) => {
                tracing::warn!(line, %reason, "skipping manifest line");
                manifest.skipped.push(Skipped {
                    line,
                    reason,
                    text: text.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        tokens = manifest.tokens.len(),
        relations = manifest.relations.len(),
        skipped = manifest.skipped.len(),
        "parsed manifest"
    );
    manifest
}

enum Parsed {
    Token(TokenRecord),
    Relation(RelationRecord),
}

fn parse_id(hex: &str) -> Option<TokenId> {
    u32::from_str_radix(hex, 16).ok().map(TokenId)
}

fn parse_token(text: &str, line: usize) -> Result<TokenRecord, SkipReason> {
    let caps = TOKEN_LINE.captures(text).ok_or(SkipReason::MalformedToken)?;
    let id = parse_id(&caps[1]).ok_or(SkipReason::MalformedToken)?;
    if id.is_null() {
        return Err(SkipReason::NullId);
    }
    let zone = caps[3]
        .parse::<u8>()
        .ok()
        .filter(|zone| usize::from(*zone) < ZONE_COUNT)
        .ok_or_else(|| SkipReason::ZoneOutOfRange(caps[3].to_string()))?;
    Ok(TokenRecord {
        id,
        tag: caps[2].to_string(),
        zone,
        line,
    })
}

fn parse_relation(text: &str, line: usize) -> Result<RelationRecord, SkipReason> {
    let caps = RELATION_LINE
        .captures(text)
        .ok_or(SkipReason::MalformedRelation)?;
    let src = parse_id(&caps[1]).ok_or(SkipReason::MalformedRelation)?;
    let dst = parse_id(&caps[2]).ok_or(SkipReason::MalformedRelation)?;
    Ok(RelationRecord {
        src,
        dst,
        tag: caps[3].to_string(),
        line,
    })
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
