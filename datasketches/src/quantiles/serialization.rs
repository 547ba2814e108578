// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Binary serialization format constants for the classic quantiles
//! sketch.
//!
//! This crate does not distinguish compact vs. updatable byte images at
//! the in-memory representation level (there is no slack capacity to
//! preserve or discard, unlike a segment-backed implementation), so
//! `to_compact_bytes` and `to_updatable_bytes` share this single layout.
//! See `DESIGN.md` for the rationale.

/// Preamble layout, sequentially: preambleInts(1) + serVer(1) + familyId(1)
/// + flags(1) + k(2) + reserved(2) + n(8) + bitPattern(8) + minItem(8) +
/// maxItem(8) + baseBufferCount(4) + reserved(4) = 48 bytes, unlike the
/// HLL preamble this crate doesn't need byte-offset constants for: there
/// is only one on-disk shape here, so [`crate::codec::SketchSlice`] reads
/// it sequentially rather than indexing fixed offsets.
pub const PREAMBLE_INTS: u8 = 6;
pub const SER_VER: u8 = 1;

pub const DATA_START: usize = 48;

pub const FLAG_EMPTY: u8 = 1 << 0;
