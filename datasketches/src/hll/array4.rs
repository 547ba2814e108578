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

//! HLL_4: 4 bits per register (nibble-packed), with a sparse
//! [`AuxMap`] holding exceptions whose true value exceeds
//! `cur_min + 14`. The densest encoding, trading CPU for the smallest
//! footprint.

use crate::codec::{SketchBytes, SketchSlice};
use crate::error::Error;
use crate::hll::aux_map::AuxMap;
use crate::hll::estimator::HipEstimator;
use crate::hll::serialization::*;
use crate::hll::{get_slot, get_value};

const AUX_TOKEN: u8 = 15;

#[derive(Debug, Clone)]
pub struct Array4 {
    lg_config_k: u8,
    bytes: Box<[u8]>,
    cur_min: u8,
    num_at_cur_min: u32,
    aux_map: Option<AuxMap>,
    estimator: HipEstimator,
}

impl PartialEq for Array4 {
    fn eq(&self, other: &Self) -> bool {
        self.lg_config_k == other.lg_config_k
            && self.bytes == other.bytes
            && self.cur_min == other.cur_min
            && self.num_at_cur_min == other.num_at_cur_min
            && self.estimator == other.estimator
    }
}

fn num_bytes_for_k(k: usize) -> usize {
    k.div_ceil(2)
}

impl Array4 {
    pub fn new(lg_config_k: u8) -> Self {
        let k = 1usize << lg_config_k;
        Self {
            lg_config_k,
            bytes: vec![0u8; num_bytes_for_k(k)].into_boxed_slice(),
            cur_min: 0,
            num_at_cur_min: k as u32,
            aux_map: None,
            estimator: HipEstimator::new(lg_config_k),
        }
    }

    pub fn lg_config_k(&self) -> u8 {
        self.lg_config_k
    }

    fn get_raw(&self, slot: u32) -> u8 {
        let byte = self.bytes[(slot / 2) as usize];
        if slot % 2 == 0 {
            byte & 0x0F
        } else {
            byte >> 4
        }
    }

    fn put_raw(&mut self, slot: u32, value: u8) {
        let idx = (slot / 2) as usize;
        let byte = self.bytes[idx];
        self.bytes[idx] = if slot % 2 == 0 {
            (byte & 0xF0) | (value & 0x0F)
        } else {
            (byte & 0x0F) | (value << 4)
        };
    }

    /// Current register value for `slot`, resolving the exception
    /// table if the raw nibble is the [`AUX_TOKEN`] sentinel.
    pub fn get(&self, slot: u32) -> Result<u8, Error> {
        let raw = self.get_raw(slot);
        if raw < AUX_TOKEN {
            Ok(self.cur_min + raw)
        } else {
            match &self.aux_map {
                Some(aux) => aux.must_find_value_for(slot),
                None => Err(Error::state(
                    "register holds AUX_TOKEN but sketch has no exception table",
                )
                .with_context("slot", slot)),
            }
        }
    }

    pub fn update(&mut self, coupon: u32) -> Result<(), Error> {
        let slot = get_slot(coupon);
        let new_value = get_value(coupon);
        let old_value = self.get(slot)?;
        if new_value <= old_value {
            return Ok(());
        }

        self.estimator.update(self.lg_config_k, old_value, new_value);

        let old_is_exception = old_value > self.cur_min + 14;
        let new_is_exception = new_value > self.cur_min + 14;

        match (old_is_exception, new_is_exception) {
            (false, false) => {
                self.put_raw(slot, new_value - self.cur_min);
            }
            (false, true) => {
                self.put_raw(slot, AUX_TOKEN);
                let aux = self.aux_map.get_or_insert_with(|| AuxMap::new(self.lg_config_k));
                aux.must_add(slot, new_value)?;
            }
            (true, _) => {
                let aux = self
                    .aux_map
                    .as_mut()
                    .expect("exception value implies an exception table");
                aux.must_replace(slot, new_value)?;
            }
        }

        if old_value == self.cur_min {
            self.num_at_cur_min -= 1;
            while self.num_at_cur_min == 0 {
                self.shift_to_bigger_cur_min()?;
            }
        }

        Ok(())
    }

    fn shift_to_bigger_cur_min(&mut self) -> Result<(), Error> {
        let k = 1usize << self.lg_config_k;
        self.cur_min += 1;
        let mut num_at_new_min = 0u32;
        let mut retired = Vec::new();

        for slot in 0..k as u32 {
            let raw = self.get_raw(slot);
            if raw == AUX_TOKEN {
                continue;
            }
            let decremented = raw.saturating_sub(1);
            self.put_raw(slot, decremented);
            if decremented == 0 {
                num_at_new_min += 1;
            }
        }

        if let Some(aux) = &mut self.aux_map {
            for (slot, value) in aux.iter() {
                if value <= self.cur_min + 14 {
                    retired.push((slot, value));
                }
            }
            for (slot, value) in &retired {
                self.put_raw(*slot, value - self.cur_min);
                aux.remove(*slot);
                if *value == self.cur_min {
                    num_at_new_min += 1;
                }
            }
        }

        self.num_at_cur_min = num_at_new_min;
        Ok(())
    }

    pub fn estimate(&self) -> f64 {
        self.estimator
            .estimate(self.lg_config_k, self.cur_min, self.num_at_cur_min)
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

    pub fn serialize(&self) -> SketchBytes {
        let k = 1usize << self.lg_config_k;
        let aux_count = self.aux_map.as_ref().map_or(0, |a| a.len());
        let mut out = SketchBytes::with_capacity(HLL_BYTE_ARR_START + self.bytes.len() + aux_count * 4);

        out.write_u8(HLL_PREINTS);
        out.write_u8(SER_VER);
        out.write_u8(crate::codec::Family::HLL.id);
        out.write_u8(self.lg_config_k);
        out.write_u8(0); // lg_arr: unused for dense encodings
        let flags = if self.estimator.is_out_of_order() {
            OUT_OF_ORDER_FLAG_MASK
        } else {
            0
        };
        out.write_u8(flags);
        out.write_u8(self.cur_min);
        out.write_u8(mode_tag::HLL4);

        out.write_f64_le(self.estimator.hip_accum());
        out.write_f64_le(self.estimator.kxq0());
        out.write_f64_le(self.estimator.kxq1());
        out.write_u32_le(self.num_at_cur_min);
        out.write_u32_le(aux_count as u32);

        out.write(&self.bytes);
        if let Some(aux) = &self.aux_map {
            for (slot, value) in aux.iter() {
                out.write_u32_le(crate::hll::pack_coupon(slot, value));
            }
        }

        debug_assert_eq!(out.len(), HLL_BYTE_ARR_START + num_bytes_for_k(k) + aux_count * 4);
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
        let cur_min = slice.read_u8("curMin")?;
        let _mode = slice.read_u8("mode")?;

        let hip_accum = slice.read_f64_le("hipAccum")?;
        let kxq0 = slice.read_f64_le("kxq0")?;
        let kxq1 = slice.read_f64_le("kxq1")?;
        let num_at_cur_min = slice.read_u32_le("numAtCurMin")?;
        let aux_count = slice.read_u32_le("auxCount")?;

        let k = 1usize << lg_config_k;
        let data = slice.read_vec("registerBytes", num_bytes_for_k(k))?;

        let mut aux_map = None;
        if aux_count > 0 {
            let mut map = AuxMap::new(lg_config_k);
            for _ in 0..aux_count {
                let packed = slice.read_u32_le("auxEntry")?;
                map.insert(get_slot(packed), get_value(packed));
            }
            aux_map = Some(map);
        }

        let mut estimator = HipEstimator::new(lg_config_k);
        estimator.set_hip_accum(hip_accum);
        estimator.set_kxq0(kxq0);
        estimator.set_kxq1(kxq1);
        estimator.set_out_of_order(flags & OUT_OF_ORDER_FLAG_MASK != 0);

        Ok(Self {
            lg_config_k,
            bytes: data.into_boxed_slice(),
            cur_min,
            num_at_cur_min,
            aux_map,
            estimator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hll::pack_coupon;

    #[test]
    fn new_array_starts_empty() {
        let arr = Array4::new(10);
        assert_eq!(arr.estimate(), 0.0);
    }

    #[test]
    fn update_raises_register_value() {
        let mut arr = Array4::new(10);
        arr.update(pack_coupon(5, 3)).unwrap();
        assert_eq!(arr.get(5).unwrap(), 3);
        arr.update(pack_coupon(5, 7)).unwrap();
        assert_eq!(arr.get(5).unwrap(), 7);
    }

    #[test]
    fn update_ignores_lower_value() {
        let mut arr = Array4::new(10);
        arr.update(pack_coupon(5, 7)).unwrap();
        arr.update(pack_coupon(5, 3)).unwrap();
        assert_eq!(arr.get(5).unwrap(), 7);
    }

    #[test]
    fn exception_values_round_trip_through_aux_map() {
        let mut arr = Array4::new(4);
        arr.update(pack_coupon(2, 20)).unwrap();
        assert_eq!(arr.get(2).unwrap(), 20);
    }

    #[test]
    fn serialize_deserialize_round_trip() {
        let mut arr = Array4::new(8);
        for i in 0..50u32 {
            arr.update(pack_coupon(i, ((i % 6) + 1) as u8)).unwrap();
        }
        let bytes = arr.serialize().into_bytes();
        let restored = Array4::deserialize(&bytes).unwrap();
        assert_eq!(restored.lg_config_k, arr.lg_config_k);
        assert_eq!(restored.bytes, arr.bytes);
        assert_eq!(restored.cur_min, arr.cur_min);
    }

    #[test]
    fn hip_estimate_tracks_updates() {
        let mut arr = Array4::new(10);
        for i in 0..10_000u32 {
            let coupon = crate::hll::coupon(i, 10);
            arr.update(coupon).unwrap();
        }
        let est = arr.estimate();
        assert!(est > 5_000.0 && est < 20_000.0);
    }
}
