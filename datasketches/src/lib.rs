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

//! Probabilistic streaming summaries.
//!
//! This crate provides two sketch families that process a stream of
//! items in a single pass and answer approximate queries in sub-linear
//! space:
//!
//! - [`hll`]: a HyperLogLog cardinality estimator with coupon-collection,
//!   coupon-set, and dense-register phases, HIP and composite estimators,
//!   and mergeable unions.
//! - [`quantiles`]: a classic quantiles sketch (base buffer plus a
//!   power-of-two level cascade) answering rank, quantile, CDF, and PMF
//!   queries with a tight, mathematically characterized error bound.
//!
//! Both families share a binary serialization layout ([`codec`]), a
//! byte-addressable storage abstraction for off-heap use, and a common
//! error type ([`error`]).

pub mod codec;
pub mod common;
pub mod error;
pub mod hash;
pub mod hll;
pub mod quantiles;

pub use error::Error;
pub use error::ErrorKind;
