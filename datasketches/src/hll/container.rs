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

//! Base container for coupon storage with cardinality estimation.
//!
//! Shared by [`super::list::List`] and [`super::set::Set`]: a simple
//! array-based store for coupons with cubic-interpolation-based
//! cardinality estimation and confidence bounds.

use crate::hll::COUPON_RSE;
use crate::hll::coupon_mapping::{X_ARR, Y_ARR};
use crate::hll::cubic_interpolation::using_x_and_y_tables;

/// Sentinel value indicating an empty coupon slot.
pub const COUPON_EMPTY: u32 = 0;

/// Container for storing coupons with basic cardinality estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    /// Log2 of container size.
    pub lg_size: usize,
    /// Array of coupon values (0 = empty).
    pub coupons: Box<[u32]>,
    /// Number of non-empty coupons.
    pub len: usize,
}

impl Container {
    pub fn new(lg_size: usize) -> Self {
        Self {
            lg_size,
            coupons: vec![COUPON_EMPTY; 1 << lg_size].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn from_coupons(lg_size: usize, coupons: Box<[u32]>, len: usize) -> Self {
        Self {
            lg_size,
            coupons,
            len,
        }
    }

    pub fn is_full(&self) -> bool {
        self.len == self.coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lazily iterates the non-empty coupons in storage order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.coupons.iter().copied().filter(|c| *c != COUPON_EMPTY)
    }

    /// Cardinality estimate using cubic interpolation over the coupon
    /// mapping table.
    pub fn estimate(&self) -> f64 {
        let len = self.len as f64;
        let est = using_x_and_y_tables(&*X_ARR, &*Y_ARR, len);
        len.max(est)
    }

    pub fn upper_bound(&self, n_std_dev: f64) -> f64 {
        let len = self.len as f64;
        let est = using_x_and_y_tables(&*X_ARR, &*Y_ARR, len);
        let bound = est / (1.0 - n_std_dev * COUPON_RSE);
        len.max(bound)
    }

    pub fn lower_bound(&self, n_std_dev: f64) -> f64 {
        let len = self.len as f64;
        let est = using_x_and_y_tables(&*X_ARR, &*Y_ARR, len);
        let bound = est / (1.0 + n_std_dev * COUPON_RSE);
        len.max(bound)
    }
}
