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

//! Correction table for the coupon-mode (LIST/SET) cardinality estimate.
//!
//! A coupon packs a `slot` and a `value` into a fixed-width integer; the
//! number of *distinct* coupons collected undercounts the true
//! cardinality once the coupon space starts to fill, by the same
//! birthday-paradox logic as Flajolet's linear counting. `Y_ARR[i]` is
//! the closed-form linear-counting inverse `-U * ln(1 - X_ARR[i] / U)`
//! for a coupon universe of size `U`, sampled at `X_ARR[i]`; querying
//! between knots uses natural cubic interpolation.

use std::sync::LazyLock;

/// Size of the coupon universe coupons are drawn from: 26 bits of slot
/// address times 64 possible leading-zero-count values.
const COUPON_UNIVERSE: f64 = (1u64 << 26) as f64 * 64.0;

const NUM_POINTS: usize = 40;

/// `x` knots: raw distinct-coupon counts, log-spaced up to the largest
/// count LIST/SET mode ever holds before promoting to dense HLL.
pub static X_ARR: LazyLock<[f64; NUM_POINTS]> = LazyLock::new(|| {
    let mut arr = [0.0; NUM_POINTS];
    let max_x = (1u64 << 21) as f64; // well above 3K/4 for the largest lgK
    for (i, slot) in arr.iter_mut().enumerate() {
        let t = i as f64 / (NUM_POINTS - 1) as f64;
        *slot = max_x * t * t;
    }
    arr
});

/// `y` knots: `-U * ln(1 - x / U)`, the unbiased cardinality estimate
/// for `x` distinct coupons out of a universe of size `U`.
pub static Y_ARR: LazyLock<[f64; NUM_POINTS]> = LazyLock::new(|| {
    let mut arr = [0.0; NUM_POINTS];
    for (i, slot) in arr.iter_mut().enumerate() {
        let x = X_ARR[i];
        *slot = -COUPON_UNIVERSE * (1.0 - x / COUPON_UNIVERSE).ln();
    }
    arr
});
