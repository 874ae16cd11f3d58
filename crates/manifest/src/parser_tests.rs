// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const SAMPLE: &str = "\
# sensor network
TOKEN: 0x10000001 SENSOR 3
TOKEN: 0x10000002 ACTUATOR 4

RELATION: 0x10000001 -> 0x10000002 : DRIVES
";

#[test]
fn parses_tokens_and_relations_in_order() {
    let manifest = parse_manifest(SAMPLE);
    assert_eq!(
        manifest.tokens,
        vec![
            TokenRecord {
                id: TokenId(0x1000_0001),
                tag: "SENSOR".to_string(),
                zone: 3,
                line: 2,
            },
            TokenRecord {
                id: TokenId(0x1000_0002),
                tag: "ACTUATOR".to_string(),
                zone: 4,
                line: 3,
            },
        ]
    );
    assert_eq!(manifest.relations.len(), 1);
    assert_eq!(
        manifest.relations[0].to_string(),
        "0x10000001 -> 0x10000002 : DRIVES"
    );
    assert!(manifest.skipped.is_empty());
}

#[parameterized(
    missing_zone = { "TOKEN: 0x10 SENSOR", SkipReason::MalformedToken },
    not_hex = { "TOKEN: 0xZZ SENSOR 1", SkipReason::MalformedToken },
    id_too_wide = { "TOKEN: 0x123456789 SENSOR 1", SkipReason::MalformedToken },
    zone_too_high = { "TOKEN: 0x10 SENSOR 16", SkipReason::ZoneOutOfRange("16".to_string()) },
    zone_overflows_u8 = { "TOKEN: 0x10 SENSOR 900", SkipReason::ZoneOutOfRange("900".to_string()) },
    null_id = { "TOKEN: 0x0 SENSOR 1", SkipReason::NullId },
    relation_without_arrow = { "RELATION: 0x1 0x2 : OWNS", SkipReason::MalformedRelation },
    relation_without_tag = { "RELATION: 0x1 -> 0x2 :", SkipReason::MalformedRelation },
    unknown = { "NODE: 0x1", SkipReason::UnknownDirective },
)]
fn malformed_lines_are_skipped(line: &str, reason: SkipReason) {
    let manifest = parse_manifest(line);
    assert!(manifest.tokens.is_empty());
    assert!(manifest.relations.is_empty());
    assert_eq!(
        manifest.skipped,
        vec![Skipped {
            line: 1,
            reason,
            text: line.to_string(),
        }]
    );
}

#[test]
fn duplicate_token_ids_keep_first_declaration() {
    let manifest = parse_manifest("TOKEN: 0x20 A 1\nTOKEN: 0x20 B 2\n");
    assert_eq!(manifest.tokens.len(), 1);
    assert_eq!(manifest.tokens[0].tag, "A");
    assert_eq!(
        manifest.skipped[0].reason,
        SkipReason::DuplicateToken(TokenId(0x20))
    );
    assert_eq!(manifest.skipped[0].line, 2);
}

#[test]
fn skipped_lines_do_not_stop_parsing() {
    let manifest = parse_manifest("garbage\nTOKEN: 0x30 OK 0\n  # indented comment\nTOKEN: bad\n");
    assert_eq!(manifest.tokens.len(), 1);
    assert_eq!(manifest.skipped.len(), 2);
    assert_eq!(
        manifest.skipped[1].to_string(),
        "line 4: malformed TOKEN line: TOKEN: bad"
    );
}

#[test]
fn uppercase_hex_prefix_and_padding_are_accepted() {
    let manifest = parse_manifest("  TOKEN:0XABCDEF01   tag   15  \nRELATION:0xabcdef01->0X2:LINK");
    assert_eq!(manifest.tokens[0].id, TokenId(0xABCD_EF01));
    assert_eq!(manifest.tokens[0].zone, 15);
    assert_eq!(manifest.relations[0].dst, TokenId(2));
    assert_eq!(manifest.relations[0].tag, "LINK");
}

#[test]
fn resolved_relations_need_both_endpoints() {
    let manifest = parse_manifest(
        "TOKEN: 0x1 A 0\nTOKEN: 0x2 B 0\nRELATION: 0x1 -> 0x2 : OK\nRELATION: 0x1 -> 0x9 : DANGLING\n",
    );
    let tags: Vec<&str> = manifest
        .resolved_relations()
        .map(|r| r.tag.as_str())
        .collect();
    assert_eq!(tags, ["OK"]);
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.tokens");
    std::fs::write(&path, SAMPLE).unwrap();

    let manifest = load_manifest(&path).unwrap();
    assert_eq!(manifest.tokens.len(), 2);
}

#[test]
fn load_reports_missing_file() {
    let err = load_manifest(Path::new("/nonexistent/net.tokens")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/net.tokens"));
}
