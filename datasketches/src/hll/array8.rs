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

//! HLL_8: one byte per register. Simplest and fastest to update;
//! also the encoding [`super::union::HllUnion`] keeps its gadget in,
//! since every other encoding can merge into (and convert from) it.

use crate::codec::{SketchBytes, SketchSlice};
use crate::error::Error;
use crate::hll::estimator::HipEstimator;
use crate::hll::serialization::*;
use crate::hll::{get_slot, get_value};

#[derive(Debug, Clone)]
pub struct Array8 {
    lg_config_k: u8,
    bytes: Box<[u8]>,
    num_zeros: u32,
    estimator: HipEstimator,
}

impl PartialEq for Array8 {
    fn eq(&self, other: &Self) -> bool {
        self.lg_config_k == other.lg_config_k
            && self.bytes == other.bytes
            && self.num_zeros == other.num_zeros
            && self.estimator == other.estimator
    }
}

impl Array8 {
    pub fn new(lg_config_k: u8) -> Self {
        let k = 1usize << lg_config_k;
        Self {
            lg_config_k,
            bytes: vec![0u8; k].into_boxed_slice(),
            num_zeros: k as u32,
            estimator: HipEstimator::new(lg_config_k),
        }
    }

    pub fn lg_config_k(&self) -> u8 {
        self.lg_config_k
    }

    pub fn num_zeros(&self) -> u32 {
        self.num_zeros
    }

    pub fn num_registers(&self) -> usize {
        self.bytes.len()
    }

    pub fn size_bytes(&self) -> usize {
        HLL_BYTE_ARR_START + self.bytes.len()
    }

    pub fn get(&self, slot: u32) -> u8 {
        self.bytes[slot as usize]
    }

    pub fn values(&self) -> &[u8] {
        &self.bytes
    }

    fn put(&mut self, slot: u32, value: u8) {
        self.bytes[slot as usize] = value;
    }

    /// Sets `slot` to `value` directly, without going through the
    /// max-update rule. Used by union merge paths that have already
    /// resolved the max on the caller's side.
    pub fn set_register(&mut self, slot: u32, value: u8) {
        let old = self.bytes[slot as usize];
        if old == 0 && value != 0 {
            self.num_zeros -= 1;
        } else if old != 0 && value == 0 {
            self.num_zeros += 1;
        }
        self.bytes[slot as usize] = value;
    }

    pub fn update(&mut self, coupon: u32) {
        let slot = get_slot(coupon);
        let new_value = get_value(coupon);
        let old_value = self.get(slot);
        if new_value <= old_value {
            return;
        }

        self.estimator.update(self.lg_config_k, old_value, new_value);
        self.put(slot, new_value);
        if old_value == 0 {
            self.num_zeros -= 1;
        }
    }

    pub fn estimate(&self) -> f64 {
        self.estimator.estimate(self.lg_config_k, 0, self.num_zeros)
    }

    pub fn hip_accum(&self) -> f64 {
        self.estimator.hip_accum()
    }

    pub fn set_hip_accum(&mut self, value: f64) {
        self.estimator.set_hip_accum(value);
    }

    pub fn is_out_of_order(&self) -> bool {
        self.estimator.is_out_of_order()
    }

    pub fn set_out_of_order(&mut self, out_of_order: bool) {
        self.estimator.set_out_of_order(out_of_order);
    }

    /// Recomputes `num_zeros` and `kxq0`/`kxq1` from the register array
    /// and marks the HIP estimator out of order, for use after registers
    /// were rewritten directly (merges, downsampling) rather than
    /// through [`Self::update`].
    pub fn rebuild_estimator_from_registers(&mut self) {
        self.num_zeros = self.bytes.iter().filter(|v| **v == 0).count() as u32;
        self.estimator.rebuild_kxq(self.bytes.iter());
        self.set_out_of_order(true);
    }

    /// Merges another HLL_4/HLL_6-backed register array of the same
    /// `lgConfigK` into this one, register by register.
    pub fn merge_array_same_lgk(&mut self, src_values: &[u8]) {
        for (slot, value) in src_values.iter().enumerate() {
            if *value > self.bytes[slot] {
                self.set_register(slot as u32, *value);
            }
        }
        self.rebuild_estimator_from_registers();
    }

    /// Merges a register array built with a larger `lgConfigK`,
    /// downsampling it onto this array's (smaller) key space by folding
    /// every source slot onto the low `lgConfigK` bits it shares with
    /// the coupon's slot encoding (`hll/mod.rs`'s `get_slot`), keeping
    /// the max value seen per destination slot.
    pub fn merge_array_with_downsample(&mut self, src_values: &[u8], src_lg_k: u8) {
        debug_assert!(src_lg_k > self.lg_config_k);
        let dst_mask = (1u32 << self.lg_config_k) - 1;
        for (src_slot, value) in src_values.iter().enumerate() {
            if *value == 0 {
                continue;
            }
            let dst_slot = (src_slot as u32) & dst_mask;
            if *value > self.bytes[dst_slot as usize] {
                self.set_register(dst_slot, *value);
            }
        }
        self.rebuild_estimator_from_registers();
    }

    pub fn serialize(&self) -> SketchBytes {
        let mut out = SketchBytes::with_capacity(HLL_BYTE_ARR_START + self.bytes.len());

        out.write_u8(HLL_PREINTS);
        out.write_u8(SER_VER);
        out.write_u8(crate::codec::Family::HLL.id);
        out.write_u8(self.lg_config_k);
        out.write_u8(0);
        let flags = if self.estimator.is_out_of_order() {
            OUT_OF_ORDER_FLAG_MASK
        } else {
            0
        };
        out.write_u8(flags);
        out.write_u8(0);
        out.write_u8(mode_tag::HLL8);

        out.write_f64_le(self.estimator.hip_accum());
        out.write_f64_le(self.estimator.kxq0());
        out.write_f64_le(self.estimator.kxq1());
        out.write_u32_le(self.num_zeros);
        out.write_u32_le(0);

        out.write(&self.bytes);
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let mut slice = SketchSlice::new(bytes);
        let _preamble_ints = slice.read_u8("preambleInts")?;
        let _ser_ver = slice.read_u8("serVer")?;
        let family_id = slice.read_u8("familyId")?;
        crate::codec::Family::HLL.validate_id(family_id)?;
        let lg_config_k = slice.read_u8("lgConfigK")?;
        let _lg_arr = slice.read_u8("lgArr")?;
        let flags = slice.read_u8("flags")?;
        let _cur_min = slice.read_u8("curMin")?;
        let _mode = slice.read_u8("mode")?;

        let hip_accum = slice.read_f64_le("hipAccum")?;
        let kxq0 = slice.read_f64_le("kxq0")?;
        let kxq1 = slice.read_f64_le("kxq1")?;
        let num_zeros = slice.read_u32_le("numZeros")?;
        let _aux_count = slice.read_u32_le("auxCount")?;

        let k = 1usize << lg_config_k;
        let data = slice.read_vec("registerBytes", k)?;

        let mut estimator = HipEstimator::new(lg_config_k);
        estimator.set_hip_accum(hip_accum);
        estimator.set_kxq0(kxq0);
        estimator.set_kxq1(kxq1);
        estimator.set_out_of_order(flags & OUT_OF_ORDER_FLAG_MASK != 0);

        Ok(Self {
            lg_config_k,
            bytes: data.into_boxed_slice(),
            num_zeros,
            estimator,
        })
    }
}
