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

//! Binary layout primitives: typed byte writers/readers, the family
//! registry, and the byte-addressable segment abstraction.

mod decode;
mod encode;
mod family;
mod segment;

pub(crate) use decode::SketchSlice;
pub(crate) use encode::SketchBytes;
pub use family::Family;
pub use segment::{BackingKind, HeapSegmentRequest, Segment, SegmentRequest};

/// Flag bit positions shared by both families' preamble `flags` byte.
pub(crate) mod flags {
    pub const EMPTY: u8 = 1 << 0;
    pub const COMPACT: u8 = 1 << 1;
    pub const ORDERED: u8 = 1 << 2;
    pub const READ_ONLY: u8 = 1 << 3;
    pub const OUT_OF_ORDER: u8 = 1 << 4;
    pub const REBUILD_REQUIRED: u8 = 1 << 5;
}
