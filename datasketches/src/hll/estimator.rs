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

//! Historical Inverse Probability (HIP) cardinality estimator tracked
//! incrementally alongside the dense register arrays, plus the
//! composite estimator used once a sketch goes out of order (e.g.
//! after a downsampling merge where HIP can no longer be trusted).

use crate::hll::composite_interpolation;
use crate::hll::cubic_interpolation;
use crate::hll::harmonic_numbers;

/// Tracks the running HIP accumulator and the `kxq0`/`kxq1` terms used
/// to update it in O(1) per register update.
#[derive(Debug, Clone, Copy)]
pub struct HipEstimator {
    hip_accum: f64,
    kxq0: f64,
    kxq1: f64,
    out_of_order: bool,
}

impl PartialEq for HipEstimator {
    fn eq(&self, other: &Self) -> bool {
        self.hip_accum == other.hip_accum
            && self.kxq0 == other.kxq0
            && self.kxq1 == other.kxq1
            && self.out_of_order == other.out_of_order
    }
}

impl HipEstimator {
    pub fn new(lg_config_k: u8) -> Self {
        let k = (1u64 << lg_config_k) as f64;
        Self {
            hip_accum: 0.0,
            kxq0: k,
            kxq1: 0.0,
            out_of_order: false,
        }
    }

    /// Folds in one register transition `old_value -> new_value`. Must
    /// be called exactly once per accepted register update, before the
    /// register array itself is mutated.
    pub fn update(&mut self, lg_config_k: u8, old_value: u8, new_value: u8) {
        if !self.out_of_order {
            let k = (1u64 << lg_config_k) as f64;
            self.hip_accum += k / (self.kxq0 + self.kxq1);
        }
        self.update_kxq(old_value, new_value);
    }

    fn update_kxq(&mut self, old_value: u8, new_value: u8) {
        if old_value < 32 {
            self.kxq0 -= inv_pow2(old_value);
        } else {
            self.kxq1 -= inv_pow2(old_value);
        }
        if new_value < 32 {
            self.kxq0 += inv_pow2(new_value);
        } else {
            self.kxq1 += inv_pow2(new_value);
        }
    }

    pub fn estimate(&self, lg_config_k: u8, cur_min: u8, num_at_cur_min: u32) -> f64 {
        if self.out_of_order {
            self.get_composite_estimate(lg_config_k, cur_min, num_at_cur_min)
        } else {
            self.hip_accum
        }
    }

    /// Cubic-interpolation-corrected raw estimate (derived from the
    /// live `kxq0`/`kxq1` accumulators), blended with a linear-counting
    /// estimate at small cardinalities where the raw estimator is known
    /// to be biased high.
    fn get_composite_estimate(&self, lg_config_k: u8, cur_min: u8, num_at_cur_min: u32) -> f64 {
        let k = (1u64 << lg_config_k) as f64;
        let raw_est = get_raw_estimate(lg_config_k, self.kxq0, self.kxq1);

        let x_arr = composite_interpolation::get_x_arr(lg_config_k);
        let y_stride = composite_interpolation::get_y_stride(lg_config_k) as f64;
        let corrected = cubic_interpolation::using_x_arr_and_y_stride(&x_arr, y_stride, raw_est);

        let crossover = match lg_config_k {
            4 => 0.718,
            5 => 0.672,
            _ => 0.64,
        };

        if raw_est < crossover * k {
            let linear_counting_est = get_bitmap_estimate(lg_config_k, cur_min, num_at_cur_min);
            if linear_counting_est < corrected {
                return linear_counting_est;
            }
        }
        corrected
    }

    pub fn hip_accum(&self) -> f64 {
        self.hip_accum
    }

    pub fn kxq0(&self) -> f64 {
        self.kxq0
    }

    pub fn kxq1(&self) -> f64 {
        self.kxq1
    }

    pub fn is_out_of_order(&self) -> bool {
        self.out_of_order
    }

    pub fn set_out_of_order(&mut self, out_of_order: bool) {
        self.out_of_order = out_of_order;
        if out_of_order {
            self.hip_accum = 0.0;
        }
    }

    pub fn set_hip_accum(&mut self, value: f64) {
        self.hip_accum = value;
    }

    pub fn set_kxq0(&mut self, value: f64) {
        self.kxq0 = value;
    }

    pub fn set_kxq1(&mut self, value: f64) {
        self.kxq1 = value;
    }

    /// Recomputes `kxq0`/`kxq1` from scratch by scanning every register's
    /// current value, for use after registers were rewritten directly
    /// (merges, downsampling) rather than folded in one at a time via
    /// [`Self::update`].
    pub fn rebuild_kxq<'a>(&mut self, registers: impl Iterator<Item = &'a u8>) {
        let mut kxq0 = 0.0;
        let mut kxq1 = 0.0;
        for &value in registers {
            if value < 32 {
                kxq0 += inv_pow2(value);
            } else {
                kxq1 += inv_pow2(value);
            }
        }
        self.kxq0 = kxq0;
        self.kxq1 = kxq1;
    }
}

fn inv_pow2(value: u8) -> f64 {
    f64::from_bits((1023u64.wrapping_sub(value as u64)) << 52)
}

fn get_raw_estimate(lg_config_k: u8, kxq0: f64, kxq1: f64) -> f64 {
    let k = (1u64 << lg_config_k) as f64;
    let alpha = match lg_config_k {
        4 => 0.673,
        5 => 0.697,
        6 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / k),
    };
    alpha * k * k / (kxq0 + kxq1)
}

fn get_bitmap_estimate(lg_config_k: u8, cur_min: u8, num_at_cur_min: u32) -> f64 {
    let k = 1u32 << lg_config_k;
    if cur_min == 0 {
        let num_unhit = num_at_cur_min;
        if num_unhit == 0 {
            return k as f64 * (k as f64 / 0.5).ln();
        }
        harmonic_numbers::bitmap_estimate(k, k - num_unhit)
    } else {
        k as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_estimator_starts_at_zero() {
        let est = HipEstimator::new(10);
        assert_eq!(est.hip_accum(), 0.0);
        assert_eq!(est.kxq0(), 1024.0);
        assert_eq!(est.kxq1(), 0.0);
        assert!(!est.is_out_of_order());
    }

    #[test]
    fn update_accumulates_hip_estimate() {
        let mut est = HipEstimator::new(10);
        for _ in 0..100 {
            est.update(10, 0, 1);
        }
        assert!(est.hip_accum() > 0.0);
    }

    #[test]
    fn out_of_order_stops_hip_accumulation() {
        let mut est = HipEstimator::new(10);
        est.set_out_of_order(true);
        assert_eq!(est.hip_accum(), 0.0);
        est.update(10, 0, 1);
        assert_eq!(est.hip_accum(), 0.0);
    }

    #[test]
    fn inv_pow2_matches_definition() {
        assert_eq!(inv_pow2(0), 1.0);
        assert_eq!(inv_pow2(1), 0.5);
        assert_eq!(inv_pow2(2), 0.25);
    }

    #[test]
    fn rebuild_kxq_matches_incremental_updates() {
        let mut incremental = HipEstimator::new(4);
        incremental.update(4, 0, 3);
        incremental.update(4, 0, 6);

        let mut rebuilt = HipEstimator::new(4);
        let registers = [3u8, 6, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        rebuilt.rebuild_kxq(registers.iter());

        assert_eq!(rebuilt.kxq0(), incremental.kxq0());
        assert_eq!(rebuilt.kxq1(), incremental.kxq1());
    }

    #[test]
    fn composite_estimate_tracks_bitmap_at_zero_cur_min() {
        let mut hip = HipEstimator::new(10);
        hip.set_out_of_order(true);
        let est = hip.get_composite_estimate(10, 0, 1000);
        assert!(est > 0.0);
        assert!(est < 2000.0);
    }
}
