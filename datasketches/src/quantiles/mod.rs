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

//! Classic quantiles sketch over `f64`.
//!
//! A merge-friendly rank/quantile summary built from a size-`2k` base
//! buffer plus a cascade of power-of-two-sized sorted levels, activated
//! by a bit pattern over the update count. This is the older
//! doubling-buffer algorithm (not the lazy-compaction KLL sketch):
//! every retained level is always exactly `k` long, and a level's
//! occupancy is tracked by a single bit rather than a capacity curve.

mod error_table;
mod serialization;
pub mod sketch;
pub mod sorted_view;

pub use error_table::normalized_rank_error;
pub use sketch::{DoublesSketch, DoublesSketchBuilder};

/// Default `k` used by [`DoublesSketchBuilder`] when unset.
pub const DEFAULT_K: u16 = 128;
/// Smallest supported `k`.
pub const MIN_K: u16 = 2;
/// Largest supported `k`.
pub const MAX_K: u16 = 32_768;

/// Selects whether a rank/quantile boundary includes or excludes the
/// query point itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// `getRank`: largest normalized weight at an item `<= q`.
    /// `getQuantile`: smallest item whose normalized weight is `>= r`.
    Inclusive,
    /// `getRank`: largest normalized weight at an item `< q`.
    /// `getQuantile`: smallest item whose normalized weight is `> r`.
    Exclusive,
}
