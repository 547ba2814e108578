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

//! Rank-error bound for the classic quantiles sketch.

/// Rank error at ~99% confidence normalizes to roughly `1.7/k`.
const RANK_ERROR_CONSTANT: f64 = 1.7;

/// PMF bucket error is somewhat wider than the plain rank error.
const PMF_ERROR_FACTOR: f64 = 1.33;

/// Normalized rank error for a sketch of size `k`.
///
/// `for_pmf` widens the bound for PMF bucket queries, which compound
/// error across two rank estimates per bucket.
pub fn normalized_rank_error(k: u16, for_pmf: bool) -> f64 {
    let base = RANK_ERROR_CONSTANT / k as f64;
    if for_pmf {
        base * PMF_ERROR_FACTOR
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_error_at_k_128_matches_documented_bound() {
        let eps = normalized_rank_error(128, false);
        assert!(eps <= 0.0175, "eps={eps}");
    }

    #[test]
    fn pmf_error_is_wider_than_rank_error() {
        let rank_eps = normalized_rank_error(200, false);
        let pmf_eps = normalized_rank_error(200, true);
        assert!(pmf_eps > rank_eps);
    }
}
