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

//! Open-addressed hash set for storing unique coupons with linear
//! probing. Grows by doubling `lgCouponArrInts` as load factor climbs,
//! until the sketch promotes SET to HLL.

use crate::hll::KEY_MASK_26;
use crate::hll::RESIZE_DENOM;
use crate::hll::RESIZE_NUMER;
use crate::hll::container::{COUPON_EMPTY, Container};

pub const LG_INIT_SET_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    container: Container,
}

impl Default for Set {
    fn default() -> Self {
        Self::new(LG_INIT_SET_SIZE)
    }
}

impl Set {
    pub fn new(lg_size: usize) -> Self {
        Self {
            container: Container::new(lg_size),
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn len(&self) -> usize {
        self.container.len
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    pub fn lg_size(&self) -> usize {
        self.container.lg_size
    }

    /// True once the load factor would exceed 3/4 after one more insert.
    pub fn at_resize_threshold(&self) -> bool {
        (self.container.len + 1) * RESIZE_DENOM as usize
            >= self.container.coupons.len() * RESIZE_NUMER as usize
    }

    /// Inserts `coupon` into the set, ignoring duplicates.
    ///
    /// # Panics
    ///
    /// Panics if the set is completely full; callers must grow (or
    /// transition to HLL) before every insert that would cross the
    /// resize threshold.
    pub fn update(&mut self, coupon: u32) {
        let mask = (1u32 << self.container.lg_size) - 1;
        let mut probe = coupon & mask;
        let starting_position = probe;

        loop {
            let value = &mut self.container.coupons[probe as usize];
            if *value == COUPON_EMPTY {
                *value = coupon;
                self.container.len += 1;
                return;
            } else if *value == coupon {
                return;
            }

            let stride = ((coupon & KEY_MASK_26) >> self.container.lg_size) | 1;
            probe = (probe + stride) & mask;
            if probe == starting_position {
                panic!("coupon set full; caller must grow before inserting");
            }
        }
    }

    /// Grows the set's backing array to `lg_size`, rehashing every
    /// stored coupon.
    pub fn grow(&mut self, lg_size: usize) {
        debug_assert!(lg_size > self.container.lg_size);

        let mut grown = Set::new(lg_size);
        for coupon in self.container.iter() {
            grown.update(coupon);
        }
        self.container = grown.container;
    }
}
