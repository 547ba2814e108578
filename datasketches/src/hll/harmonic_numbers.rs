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

//! Linear-counting estimate for small cardinalities, expressed via
//! harmonic numbers rather than the usual `-m ln(V/m)` form.
//!
//! `bitmap_estimate(k, num_hit)` estimates the number of distinct items
//! that set `num_hit` of `k` bits in a bitmap, as `k * (H_k - H_{k - num_hit})`,
//! which is the expected number of draws (with replacement, from a
//! uniform alphabet of size `k`) needed to cover `num_hit` distinct
//! bits.

/// Euler-Mascheroni constant, used in the asymptotic expansion of `H_n`.
const EULER_MASCHERONI: f64 = 0.5772156649015329;

/// Approximates the `n`-th harmonic number `H_n = sum_{i=1}^{n} 1/i`.
///
/// Exact summation for small `n` avoids the asymptotic expansion's
/// relative error at small scale; the expansion is accurate to well
/// beyond `f64` precision once `n` is in the thousands, which covers
/// every `k` used by an HLL sketch (`k <= 2^21`).
fn harmonic_number(n: u32) -> f64 {
    if n == 0 {
        return 0.0;
    }
    if n < 64 {
        return (1..=n).map(|i| 1.0 / i as f64).sum();
    }
    let nf = n as f64;
    nf.ln() + EULER_MASCHERONI + 1.0 / (2.0 * nf) - 1.0 / (12.0 * nf * nf)
}

/// Estimates cardinality from the count of hit buckets out of `k`.
pub fn bitmap_estimate(k: u32, num_hit: u32) -> f64 {
    debug_assert!(num_hit <= k);
    (k as f64) * (harmonic_number(k) - harmonic_number(k - num_hit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hits_is_zero() {
        assert_eq!(bitmap_estimate(1024, 0), 0.0);
    }

    #[test]
    fn all_hits_uses_full_harmonic_span() {
        let est = bitmap_estimate(1024, 1024);
        assert!(est > 1024.0 * 5.0, "coupon-collector tail should dominate");
    }

    #[test]
    fn monotonic_in_num_hit() {
        let a = bitmap_estimate(4096, 1000);
        let b = bitmap_estimate(4096, 2000);
        assert!(b > a);
    }
}
