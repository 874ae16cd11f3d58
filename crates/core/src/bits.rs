// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Packed bit registers
//!
//! Each register is a fixed-width integer with explicit field ranges.
//! Writers saturate values to the field width instead of spilling into
//! neighbouring fields.
//!
//! | Register             | Field        | Bits    |
//! |----------------------|--------------|---------|
//! | `DegradationMetrics` | score        | 0..=9   |
//! |                      | confidence   | 10..=19 |
//! |                      | retries      | 20..=25 |
//! |                      | priority     | 26..=31 |
//! | `TokenType`          | category     | 0..=3   |
//! |                      | node_level   | 4..=6   |
//! |                      | cluster_id   | 7..=14  |
//! |                      | frame_ref    | 15..=22 |
//! |                      | degradation  | 23..=26 |
//! |                      | reserved     | 27..=31 |
//! | `ValueHeader`        | data_size    | 0..=15  |
//! |                      | encoding     | 16..=19 |
//! |                      | compression  | 20..=22 |
//! |                      | encrypted    | 23      |
//! |                      | frame_id     | 24..=39 |
//! |                      | timestamp    | 40..=63 |

use serde::Serialize;

/// A field inside a packed register
#[derive(Debug, Clone, Copy)]
struct Field {
    shift: u32,
    width: u32,
}

impl Field {
    const fn new(shift: u32, width: u32) -> Self {
        Self { shift, width }
    }

    const fn max(self) -> u64 {
        (1u64 << self.width) - 1
    }

    fn get(self, word: u64) -> u64 {
        (word >> self.shift) & self.max()
    }

    fn put(self, word: u64, value: u64) -> u64 {
        let mask = self.max() << self.shift;
        (word & !mask) | (value.min(self.max()) << self.shift)
    }
}

const UNIT_SCALE: f64 = 1023.0;

fn to_unit_raw(value: f64) -> u64 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * UNIT_SCALE).round() as u64
}

/// Score, confidence, retry count and priority of a degrading token
///
/// Score and confidence are stored as 10-bit fixed point over `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DegradationMetrics(u32);

impl DegradationMetrics {
    const SCORE: Field = Field::new(0, 10);
    const CONFIDENCE: Field = Field::new(10, 10);
    const RETRIES: Field = Field::new(20, 6);
    const PRIORITY: Field = Field::new(26, 6);

    /// Largest retry count the register can hold
    pub const MAX_RETRIES: u32 = 63;

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    fn field(self, field: Field) -> u64 {
        field.get(u64::from(self.0))
    }

    fn with_field(self, field: Field, value: u64) -> Self {
        Self(field.put(u64::from(self.0), value) as u32)
    }

    pub fn score(self) -> f64 {
        self.field(Self::SCORE) as f64 / UNIT_SCALE
    }

    pub fn with_score(self, score: f64) -> Self {
        self.with_field(Self::SCORE, to_unit_raw(score))
    }

    pub fn confidence(self) -> f64 {
        self.field(Self::CONFIDENCE) as f64 / UNIT_SCALE
    }

    pub fn with_confidence(self, confidence: f64) -> Self {
        self.with_field(Self::CONFIDENCE, to_unit_raw(confidence))
    }

    pub fn retries(self) -> u32 {
        self.field(Self::RETRIES) as u32
    }

    pub fn with_retries(self, retries: u32) -> Self {
        self.with_field(Self::RETRIES, u64::from(retries))
    }

    pub fn priority(self) -> u32 {
        self.field(Self::PRIORITY) as u32
    }

    pub fn with_priority(self, priority: u32) -> Self {
        self.with_field(Self::PRIORITY, u64::from(priority))
    }
}

/// Classification header of a token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TokenType(u32);

impl TokenType {
    const CATEGORY: Field = Field::new(0, 4);
    const NODE_LEVEL: Field = Field::new(4, 3);
    const CLUSTER_ID: Field = Field::new(7, 8);
    const FRAME_REF: Field = Field::new(15, 8);
    const DEGRADATION: Field = Field::new(23, 4);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    fn field(self, field: Field) -> u8 {
        field.get(u64::from(self.0)) as u8
    }

    fn with_field(self, field: Field, value: u8) -> Self {
        Self(field.put(u64::from(self.0), u64::from(value)) as u32)
    }

    pub fn category(self) -> u8 {
        self.field(Self::CATEGORY)
    }

    pub fn with_category(self, category: u8) -> Self {
        self.with_field(Self::CATEGORY, category)
    }

    pub fn node_level(self) -> u8 {
        self.field(Self::NODE_LEVEL)
    }

    pub fn with_node_level(self, level: u8) -> Self {
        self.with_field(Self::NODE_LEVEL, level)
    }

    pub fn cluster_id(self) -> u8 {
        self.field(Self::CLUSTER_ID)
    }

    pub fn with_cluster_id(self, cluster: u8) -> Self {
        self.with_field(Self::CLUSTER_ID, cluster)
    }

    pub fn frame_ref(self) -> u8 {
        self.field(Self::FRAME_REF)
    }

    pub fn with_frame_ref(self, frame: u8) -> Self {
        self.with_field(Self::FRAME_REF, frame)
    }

    /// Coarse degradation level, 0..=15
    pub fn degradation(self) -> u8 {
        self.field(Self::DEGRADATION)
    }

    pub fn with_degradation(self, level: u8) -> Self {
        self.with_field(Self::DEGRADATION, level)
    }
}

/// Header describing a token's data region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ValueHeader(u64);

impl ValueHeader {
    const DATA_SIZE: Field = Field::new(0, 16);
    const ENCODING: Field = Field::new(16, 4);
    const COMPRESSION: Field = Field::new(20, 3);
    const ENCRYPTED: Field = Field::new(23, 1);
    const FRAME_ID: Field = Field::new(24, 16);
    const TIMESTAMP: Field = Field::new(40, 24);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    fn with_field(self, field: Field, value: u64) -> Self {
        Self(field.put(self.0, value))
    }

    /// Data size in bytes; sizes above 64 KiB saturate at `0xFFFF`
    pub fn data_size(self) -> u32 {
        Self::DATA_SIZE.get(self.0) as u32
    }

    pub fn with_data_size(self, size: usize) -> Self {
        self.with_field(Self::DATA_SIZE, size as u64)
    }

    pub fn encoding(self) -> u8 {
        Self::ENCODING.get(self.0) as u8
    }

    pub fn with_encoding(self, encoding: u8) -> Self {
        self.with_field(Self::ENCODING, u64::from(encoding))
    }

    pub fn compression(self) -> u8 {
        Self::COMPRESSION.get(self.0) as u8
    }

    pub fn with_compression(self, level: u8) -> Self {
        self.with_field(Self::COMPRESSION, u64::from(level))
    }

    pub fn encrypted(self) -> bool {
        Self::ENCRYPTED.get(self.0) == 1
    }

    pub fn with_encrypted(self, encrypted: bool) -> Self {
        self.with_field(Self::ENCRYPTED, u64::from(encrypted))
    }

    pub fn frame_id(self) -> u16 {
        Self::FRAME_ID.get(self.0) as u16
    }

    pub fn with_frame_id(self, frame: u16) -> Self {
        self.with_field(Self::FRAME_ID, u64::from(frame))
    }

    /// Microsecond timestamp, 24 bits
    pub fn timestamp(self) -> u32 {
        Self::TIMESTAMP.get(self.0) as u32
    }

    pub fn with_timestamp(self, micros: u32) -> Self {
        self.with_field(Self::TIMESTAMP, u64::from(micros))
    }
}

#[cfg(test)]
#[path = "bits_tests.rs"]
mod tests;
