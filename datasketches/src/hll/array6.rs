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

//! HLL_6: 6 bits per register, packed across byte boundaries. A
//! middle ground between the compact-but-slow HLL_4 and the
//! simple-but-wide HLL_8.

use crate::codec::{SketchBytes, SketchSlice};
use crate::error::Error;
use crate::hll::estimator::HipEstimator;
use crate::hll::serialization::*;
use crate::hll::{get_slot, get_value};

const VAL_MASK_6: u32 = 0x3F;

#[derive(Debug, Clone)]
pub struct Array6 {
    lg_config_k: u8,
    bytes: Box<[u8]>,
    num_zeros: u32,
    estimator: HipEstimator,
}

impl PartialEq for Array6 {
    fn eq(&self, other: &Self) -> bool {
        self.lg_config_k == other.lg_config_k
            && self.bytes == other.bytes
            && self.num_zeros == other.num_zeros
            && self.estimator == other.estimator
    }
}

/// One extra byte of slack beyond the packed bit count so the last
/// slot's two-byte window read never runs past the end of the array.
fn num_bytes_for_k(k: usize) -> usize {
    ((k * 3) >> 2) + 1
}

impl Array6 {
    pub fn new(lg_config_k: u8) -> Self {
        let k = 1usize << lg_config_k;
        Self {
            lg_config_k,
            bytes: vec![0u8; num_bytes_for_k(k)].into_boxed_slice(),
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

    fn get_raw(&self, slot: u32) -> u8 {
        let bit_offset = slot as usize * 6;
        let byte_offset = bit_offset / 8;
        let shift = bit_offset % 8;
        let window = self.bytes[byte_offset] as u32 | ((self.bytes[byte_offset + 1] as u32) << 8);
        ((window >> shift) & VAL_MASK_6) as u8
    }

    fn put_raw(&mut self, slot: u32, value: u8) {
        let bit_offset = slot as usize * 6;
        let byte_offset = bit_offset / 8;
        let shift = bit_offset % 8;
        let mut window = self.bytes[byte_offset] as u32 | ((self.bytes[byte_offset + 1] as u32) << 8);
        window &= !(VAL_MASK_6 << shift);
        window |= (value as u32 & VAL_MASK_6) << shift;
        self.bytes[byte_offset] = (window & 0xFF) as u8;
        self.bytes[byte_offset + 1] = ((window >> 8) & 0xFF) as u8;
    }

    pub fn get(&self, slot: u32) -> u8 {
        self.get_raw(slot)
    }

    pub fn update(&mut self, coupon: u32) {
        let slot = get_slot(coupon);
        let new_value = get_value(coupon);
        let old_value = self.get_raw(slot);
        if new_value <= old_value {
            return;
        }

        self.estimator.update(self.lg_config_k, old_value, new_value);
        self.put_raw(slot, new_value);
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

    pub fn set_out_of_order(&mut self, out_of_order: bool) {
        self.estimator.set_out_of_order(out_of_order);
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
        out.write_u8(0); // cur_min unused for HLL6
        out.write_u8(mode_tag::HLL6);

        out.write_f64_le(self.estimator.hip_accum());
        out.write_f64_le(self.estimator.kxq0());
        out.write_f64_le(self.estimator.kxq1());
        out.write_u32_le(self.num_zeros);
        out.write_u32_le(0); // aux_count unused for HLL6

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
        let data = slice.read_vec("registerBytes", num_bytes_for_k(k))?;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hll::pack_coupon;

    #[test]
    fn new_array_registers_are_zero() {
        let arr = Array6::new(8);
        assert_eq!(arr.get(0), 0);
        assert_eq!(arr.num_zeros(), 256);
    }

    #[test]
    fn update_sets_register_and_clears_zero_count() {
        let mut arr = Array6::new(8);
        arr.update(pack_coupon(3, 9));
        assert_eq!(arr.get(3), 9);
        assert_eq!(arr.num_zeros(), 255);
    }

    #[test]
    fn update_ignores_lower_value() {
        let mut arr = Array6::new(8);
        arr.update(pack_coupon(3, 9));
        arr.update(pack_coupon(3, 4));
        assert_eq!(arr.get(3), 9);
    }

    #[test]
    fn packing_survives_odd_and_even_slots_across_byte_boundaries() {
        let mut arr = Array6::new(8);
        for slot in 0..256u32 {
            arr.update(pack_coupon(slot, ((slot % 63) + 1) as u8));
        }
        for slot in 0..256u32 {
            assert_eq!(arr.get(slot), ((slot % 63) + 1) as u8);
        }
    }

    #[test]
    fn serialize_deserialize_round_trip() {
        let mut arr = Array6::new(8);
        for i in 0..50u32 {
            arr.update(pack_coupon(i, ((i % 40) + 1) as u8));
        }
        let bytes = arr.serialize().into_bytes();
        let restored = Array6::deserialize(&bytes).unwrap();
        assert_eq!(restored.bytes, arr.bytes);
        assert_eq!(restored.num_zeros, arr.num_zeros);
    }

    #[test]
    fn hip_estimate_tracks_updates() {
        let mut arr = Array6::new(10);
        for i in 0..10_000u32 {
            arr.update(crate::hll::coupon(i, 10));
        }
        let est = arr.estimate();
        assert!(est > 5_000.0 && est < 20_000.0);
    }
}
