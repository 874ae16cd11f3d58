// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

#[test]
fn empty_document_yields_defaults() {
    let config = PhenoConfig::from_toml_str("").unwrap();
    assert_eq!(config, PhenoConfig::default());
    assert_eq!(config.allocator.id_base, 0x1000_0000);
    assert_eq!(config.degradation.max_retries, 63);
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let config = PhenoConfig::from_toml_str(
        r#"
        [allocator]
        max_tokens_per_zone = 8

        [degradation]
        confidence_decay = 0.5
        "#,
    )
    .unwrap();

    assert_eq!(config.allocator.max_tokens_per_zone, 8);
    assert_eq!(config.allocator.default_token_size, 4096);
    assert_eq!(config.degradation.confidence_decay, 0.5);
    assert_eq!(config.degradation.recover_confidence_floor, 0.3);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = PhenoConfig::from_toml_str("[allocator]\nzones = 4\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn zero_capacity_is_invalid() {
    let err = PhenoConfig::from_toml_str("[allocator]\nzone_capacity_bytes = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("zone_capacity_bytes")));
}

#[test]
fn out_of_range_threshold_is_invalid() {
    let err = PhenoConfig::from_toml_str("[degradation]\ndegrade_threshold = 1.5\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("degrade_threshold")));
}

#[test]
fn load_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[allocator]\nid_base = 4096").unwrap();

    let config = PhenoConfig::load(file.path()).unwrap();
    assert_eq!(config.allocator.id_base, 4096);
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = PhenoConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
