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

//! Per-`lgConfigK` correction table for the composite HLL estimator.
//!
//! The table maps a raw HLL estimate to a bias-corrected one. Real-world
//! tables are built from offline simulation; lacking that corpus, this
//! table is a neutral (near-identity) mapping evenly spaced over the
//! plausible raw-estimate range for a given `k` — it leaves the raw
//! estimate essentially unchanged except where `cubic_interpolation`
//! smooths between knots, so the composite estimator's behavior is
//! governed by its blend with the linear-counting estimate at small
//! cardinalities rather than by empirical bias correction.

/// Number of knots in the per-`lgConfigK` correction table.
const X_ARR_LEN: usize = 80;

/// Returns the number of knots in the table, shared by every `lgConfigK`.
pub fn get_x_arr_length() -> usize {
    X_ARR_LEN
}

/// Returns the spacing between successive `y` knots for the given
/// `lgConfigK`, i.e. `y_arr[i] = i * y_stride`.
pub fn get_y_stride(lg_config_k: u8) -> u32 {
    let k = 1u64 << lg_config_k;
    ((k * 10) / X_ARR_LEN as u64).max(1) as u32
}

/// Returns the `x` knots (raw estimates) for the given `lgConfigK`.
pub fn get_x_arr(lg_config_k: u8) -> Vec<f64> {
    let stride = get_y_stride(lg_config_k) as f64;
    (0..X_ARR_LEN).map(|i| i as f64 * stride).collect()
}
