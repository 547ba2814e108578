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

//! Combines multiple HLL sketches into a single cardinality estimate.
//!
//! The union keeps an internal "gadget" sketch that accumulates the
//! union of every sketch passed to [`HllUnion::update`]. Input
//! sketches may differ in `lgConfigK` (downsampled to the union's max)
//! and in mode (LIST/SET/dense array) or target type; the gadget
//! itself is always kept in [`HllType::Hll8`] so merges never lose
//! precision to a narrower register width along the way.

use crate::error::Error;
use crate::hll::array4::Array4;
use crate::hll::array6::Array6;
use crate::hll::array8::Array8;
use crate::hll::mode::Mode;
use crate::hll::{HllSketch, HllType, pack_coupon};

#[derive(Debug, Clone)]
pub struct HllUnion {
    lg_max_k: u8,
    gadget: HllSketch,
}

impl HllUnion {
    pub fn new(lg_max_k: u8) -> Result<Self, Error> {
        let gadget = HllSketch::new(lg_max_k, HllType::Hll8)?;
        Ok(Self { lg_max_k, gadget })
    }

    /// Folds `sketch` into the union.
    pub fn update(&mut self, sketch: &HllSketch) -> Result<(), Error> {
        if sketch.is_empty() {
            return Ok(());
        }

        let src_lg_k = sketch.lg_config_k();
        let dst_lg_k = self.gadget.lg_config_k();
        let src_mode = sketch.mode();

        match src_mode {
            Mode::List { .. } | Mode::Set { .. } => {
                merge_coupons_into_gadget(&mut self.gadget, src_mode)?;
            }

            Mode::Array4(_) | Mode::Array6(_) | Mode::Array8(_) => {
                let is_gadget_array = matches!(self.gadget.mode(), Mode::Array8(_));

                if is_gadget_array {
                    if src_lg_k < dst_lg_k {
                        let mut new_array = Array8::new(src_lg_k);
                        match self.gadget.mode() {
                            Mode::Array8(old_gadget) => {
                                merge_array_with_downsample(
                                    &mut new_array,
                                    src_lg_k,
                                    &Mode::Array8(old_gadget.clone()),
                                    dst_lg_k,
                                );
                            }
                            _ => unreachable!(
                                "gadget mode changed unexpectedly; should never be Array4/Array6"
                            ),
                        }

                        merge_array_same_lgk(&mut new_array, src_mode);
                        self.gadget = HllSketch::from_mode(
                            src_lg_k,
                            HllType::Hll8,
                            Mode::Array8(new_array),
                        );
                    } else {
                        match self.gadget.mode_mut() {
                            Mode::Array8(dst_array) => {
                                merge_array_into_array8(dst_array, dst_lg_k, src_mode, src_lg_k);
                            }
                            _ => unreachable!(
                                "gadget mode changed unexpectedly; should never be Array4/Array6"
                            ),
                        }
                    }
                } else {
                    let mut new_array = copy_or_downsample(src_mode, src_lg_k, self.lg_max_k);

                    let old_gadget_mode = self.gadget.mode();
                    merge_coupons_into_mode(&mut new_array, old_gadget_mode);

                    let final_lg_k = new_array.num_registers().trailing_zeros() as u8;
                    self.gadget =
                        HllSketch::from_mode(final_lg_k, HllType::Hll8, Mode::Array8(new_array));
                }
            }
        }
        Ok(())
    }

    /// Returns a copy of the internal gadget as the requested target type.
    pub fn get_result(&self, hll_type: HllType) -> HllSketch {
        let gadget_type = self.gadget.target_type();

        if hll_type == gadget_type {
            return self.gadget.clone();
        }

        match self.gadget.mode() {
            Mode::List { list, .. } => HllSketch::from_mode(
                self.gadget.lg_config_k(),
                hll_type,
                Mode::List {
                    list: list.clone(),
                    hll_type,
                },
            ),
            Mode::Set { set, .. } => HllSketch::from_mode(
                self.gadget.lg_config_k(),
                hll_type,
                Mode::Set {
                    set: set.clone(),
                    hll_type,
                },
            ),
            Mode::Array8(array8) => {
                convert_array8_to_type(array8, self.gadget.lg_config_k(), hll_type)
            }
            Mode::Array4(_) | Mode::Array6(_) => {
                unreachable!("gadget mode changed unexpectedly; should never be Array4/Array6")
            }
        }
    }

    pub fn reset(&mut self) {
        self.gadget = HllSketch::new(self.lg_max_k, HllType::Hll8)
            .expect("lg_max_k was already validated by HllUnion::new");
    }

    pub fn is_empty(&self) -> bool {
        self.gadget.is_empty()
    }

    pub fn estimate(&self) -> f64 {
        self.gadget.estimate()
    }

    pub fn lg_config_k(&self) -> u8 {
        self.gadget.lg_config_k()
    }

    pub fn lg_max_k(&self) -> u8 {
        self.lg_max_k
    }
}

fn merge_coupons_into_gadget(gadget: &mut HllSketch, src_mode: &Mode) -> Result<(), Error> {
    match src_mode {
        Mode::List { list, .. } => {
            for coupon in list.container().iter() {
                gadget.update_with_coupon(coupon)?;
            }
        }
        Mode::Set { set, .. } => {
            for coupon in set.container().iter() {
                gadget.update_with_coupon(coupon)?;
            }
        }
        Mode::Array4(_) | Mode::Array6(_) | Mode::Array8(_) => {
            unreachable!(
                "merge_coupons_into_gadget called with array mode; array modes should use merge_array_into_array8"
            );
        }
    }
    Ok(())
}

fn merge_coupons_into_mode(dst: &mut Array8, src_mode: &Mode) {
    match src_mode {
        Mode::List { list, .. } => {
            for coupon in list.container().iter() {
                dst.update(coupon);
            }
        }
        Mode::Set { set, .. } => {
            for coupon in set.container().iter() {
                dst.update(coupon);
            }
        }
        Mode::Array4(_) | Mode::Array6(_) | Mode::Array8(_) => {
            unreachable!(
                "merge_coupons_into_mode called with array mode; array modes should use copy_or_downsample"
            );
        }
    }
}

fn merge_array_into_array8(dst_array8: &mut Array8, dst_lg_k: u8, src_mode: &Mode, src_lg_k: u8) {
    assert!(
        src_lg_k >= dst_lg_k,
        "merge_array_into_array8 requires src_lg_k >= dst_lg_k (got src={src_lg_k}, dst={dst_lg_k})"
    );

    if dst_lg_k == src_lg_k {
        merge_array_same_lgk(dst_array8, src_mode);
    } else {
        merge_array_with_downsample(dst_array8, dst_lg_k, src_mode, src_lg_k);
    }
}

fn get_array_hip_accum(mode: &Mode) -> f64 {
    match mode {
        Mode::Array8(src) => src.hip_accum(),
        Mode::Array6(src) => src.hip_accum(),
        Mode::Array4(src) => src.hip_accum(),
        Mode::List { .. } | Mode::Set { .. } => {
            unreachable!("get_array_hip_accum called with non-array mode; List/Set not supported");
        }
    }
}

fn merge_array46_same_lgk(dst: &mut Array8, num_registers: usize, get_value: impl Fn(u32) -> u8) {
    for slot in 0..num_registers {
        let val = get_value(slot as u32);
        let current = dst.values()[slot];
        if val > current {
            dst.set_register(slot as u32, val);
        }
    }
    dst.rebuild_estimator_from_registers();
}

fn merge_array_same_lgk(dst: &mut Array8, src_mode: &Mode) {
    match src_mode {
        Mode::Array8(src) => {
            dst.merge_array_same_lgk(src.values());
        }
        Mode::Array6(src) => {
            merge_array46_same_lgk(dst, src.num_registers(), |slot| src.get(slot));
        }
        Mode::Array4(src) => {
            merge_array46_same_lgk(dst, src.num_registers(), |slot| {
                src.get(slot).unwrap_or(0)
            });
        }
        _ => {
            unreachable!("merge_array_same_lgk called with non-array mode; List/Set not supported")
        }
    }
}

fn merge_array46_with_downsample(
    dst: &mut Array8,
    dst_lg_k: u8,
    num_registers: usize,
    get_value: impl Fn(u32) -> u8,
) {
    let dst_mask = (1u32 << dst_lg_k) - 1;
    for src_slot in 0..num_registers {
        let val = get_value(src_slot as u32);
        if val > 0 {
            let dst_slot = src_slot as u32 & dst_mask;
            let current = dst.values()[dst_slot as usize];
            if val > current {
                dst.set_register(dst_slot, val);
            }
        }
    }
    dst.rebuild_estimator_from_registers();
}

fn merge_array_with_downsample(dst: &mut Array8, dst_lg_k: u8, src_mode: &Mode, src_lg_k: u8) {
    assert!(
        src_lg_k > dst_lg_k,
        "merge_array_with_downsample requires src_lg_k > dst_lg_k (got src={src_lg_k}, dst={dst_lg_k})"
    );

    match src_mode {
        Mode::Array8(src) => {
            dst.merge_array_with_downsample(src.values(), src_lg_k);
        }
        Mode::Array6(src) => {
            merge_array46_with_downsample(dst, dst_lg_k, src.num_registers(), |slot| src.get(slot));
        }
        Mode::Array4(src) => {
            merge_array46_with_downsample(dst, dst_lg_k, src.num_registers(), |slot| {
                src.get(slot).unwrap_or(0)
            });
        }
        _ => unreachable!(
            "merge_array_with_downsample called with non-array mode; List/Set not supported"
        ),
    }
}

fn convert_array8_to_type(src: &Array8, lg_config_k: u8, target_type: HllType) -> HllSketch {
    match target_type {
        HllType::Hll8 => HllSketch::from_mode(lg_config_k, target_type, Mode::Array8(src.clone())),
        HllType::Hll6 => {
            let mut array6 = Array6::new(lg_config_k);
            for slot in 0..src.num_registers() {
                let val = src.values()[slot];
                if val > 0 {
                    let clamped_val = val.min(63);
                    let coupon = pack_coupon(slot as u32, clamped_val);
                    array6.update(coupon);
                }
            }

            let src_est = src.estimate();
            let arr6_est = array6.estimate();
            if src_est > arr6_est {
                array6.set_hip_accum(src_est);
            }

            HllSketch::from_mode(lg_config_k, target_type, Mode::Array6(array6))
        }
        HllType::Hll4 => {
            let mut array4 = Array4::new(lg_config_k);
            for slot in 0..src.num_registers() {
                let val = src.values()[slot];
                if val > 0 {
                    let coupon = pack_coupon(slot as u32, val);
                    array4
                        .update(coupon)
                        .expect("array4 built fresh above never returns an exception error here");
                }
            }

            let src_est = src.estimate();
            let arr4_est = array4.estimate();
            if src_est > arr4_est {
                array4.set_hip_accum(src_est);
            }

            HllSketch::from_mode(lg_config_k, target_type, Mode::Array4(array4))
        }
    }
}

fn copy_array46_via_coupons(dst: &mut Array8, num_registers: usize, get_value: impl Fn(u32) -> u8) {
    for slot in 0..num_registers {
        let val = get_value(slot as u32);
        if val > 0 {
            let coupon = pack_coupon(slot as u32, val);
            dst.update(coupon);
        }
    }
}

fn copy_or_downsample(src_mode: &Mode, src_lg_k: u8, tgt_lg_k: u8) -> Array8 {
    if src_lg_k <= tgt_lg_k {
        let mut result = Array8::new(src_lg_k);
        let src_hip = get_array_hip_accum(src_mode);

        match src_mode {
            Mode::Array8(src) => {
                result.merge_array_same_lgk(src.values());
            }
            Mode::Array6(src) => {
                copy_array46_via_coupons(&mut result, src.num_registers(), |slot| src.get(slot));
            }
            Mode::Array4(src) => {
                copy_array46_via_coupons(&mut result, src.num_registers(), |slot| {
                    src.get(slot).unwrap_or(0)
                });
            }
            Mode::List { .. } | Mode::Set { .. } => {
                unreachable!(
                    "copy_or_downsample called with non-array mode; List/Set not supported"
                );
            }
        }

        result.set_hip_accum(src_hip);
        result
    } else {
        let mut result = Array8::new(tgt_lg_k);
        merge_array_with_downsample(&mut result, tgt_lg_k, src_mode, src_lg_k);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_basic_list_mode() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch1 = HllSketch::new(12, HllType::Hll8).unwrap();
        sketch1.update("foo").unwrap();
        sketch1.update("bar").unwrap();
        sketch1.update("baz").unwrap();

        let mut sketch2 = HllSketch::new(12, HllType::Hll8).unwrap();
        sketch2.update("bar").unwrap();
        sketch2.update("qux").unwrap();
        sketch2.update("quux").unwrap();

        union.update(&sketch1).unwrap();
        union.update(&sketch2).unwrap();

        let result = union.get_result(HllType::Hll8);

        let estimate = result.estimate();
        assert!(
            (4.0..=6.0).contains(&estimate),
            "Expected estimate around 5, got {estimate}"
        );
        assert!(!result.is_empty());
    }

    #[test]
    fn test_union_empty_sketch() {
        let mut union = HllUnion::new(10).unwrap();
        let empty_sketch = HllSketch::new(10, HllType::Hll8).unwrap();

        union.update(&empty_sketch).unwrap();

        assert!(union.is_empty());
    }

    #[test]
    fn test_union_estimate_accuracy() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch1 = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..500 {
            sketch1.update(i).unwrap();
        }

        let mut sketch2 = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 400..900 {
            sketch2.update(i).unwrap();
        }

        union.update(&sketch1).unwrap();
        union.update(&sketch2).unwrap();

        let result = union.get_result(HllType::Hll8);
        let estimate = result.estimate();

        assert!(
            estimate > 800.0 && estimate < 1000.0,
            "Expected estimate around 900, got {estimate}"
        );
    }

    #[test]
    fn test_union_array_to_array_same_lgk() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch1 = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..10_000 {
            sketch1.update(i).unwrap();
        }

        let mut sketch2 = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 5_000..15_000 {
            sketch2.update(i).unwrap();
        }

        assert!(matches!(sketch1.mode(), Mode::Array8(_)));
        assert!(matches!(sketch2.mode(), Mode::Array8(_)));

        union.update(&sketch1).unwrap();
        union.update(&sketch2).unwrap();

        let result = union.get_result(HllType::Hll8);
        let estimate = result.estimate();

        assert!(
            estimate > 14_000.0 && estimate < 16_000.0,
            "Expected estimate around 15000, got {estimate}"
        );
    }

    #[test]
    fn test_union_downsampling_src_larger() {
        let mut union = HllUnion::new(10).unwrap();

        let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..5_000 {
            sketch.update(i).unwrap();
        }

        union.update(&sketch).unwrap();

        let result = union.get_result(HllType::Hll8);
        let estimate = result.estimate();

        assert!(
            estimate > 4_000.0 && estimate < 6_000.0,
            "Expected estimate around 5000, got {estimate}"
        );
        assert_eq!(result.lg_config_k(), 10, "Result should be at lg_k=10");
    }

    #[test]
    fn test_union_gadget_downsizing_src_smaller() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch1 = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..10_000 {
            sketch1.update(i).unwrap();
        }
        union.update(&sketch1).unwrap();
        assert_eq!(union.lg_config_k(), 12, "Gadget should be at lg_k=12");

        let mut sketch2 = HllSketch::new(10, HllType::Hll8).unwrap();
        for i in 5_000..15_000 {
            sketch2.update(i).unwrap();
        }

        union.update(&sketch2).unwrap();

        let result = union.get_result(HllType::Hll8);
        let estimate = result.estimate();

        assert!(
            estimate > 13_000.0 && estimate < 17_000.0,
            "Expected estimate around 15000, got {estimate}"
        );
        assert_eq!(
            result.lg_config_k(),
            10,
            "Gadget should have downsized to lg_k=10"
        );
    }

    #[test]
    fn test_union_list_to_array() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch1 = HllSketch::new(12, HllType::Hll8).unwrap();
        sketch1.update("a").unwrap();
        sketch1.update("b").unwrap();
        sketch1.update("c").unwrap();
        assert!(matches!(sketch1.mode(), Mode::List { .. }));

        let mut sketch2 = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..10_000 {
            sketch2.update(i).unwrap();
        }
        assert!(matches!(sketch2.mode(), Mode::Array8(_)));

        union.update(&sketch1).unwrap();
        union.update(&sketch2).unwrap();

        let result = union.get_result(HllType::Hll8);
        let estimate = result.estimate();

        assert!(
            estimate > 9_500.0 && estimate < 10_500.0,
            "Expected estimate around 10000, got {estimate}"
        );
    }

    #[test]
    fn test_union_array_to_list() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch1 = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..10_000 {
            sketch1.update(i).unwrap();
        }
        assert!(matches!(sketch1.mode(), Mode::Array8(_)));

        let mut sketch2 = HllSketch::new(12, HllType::Hll8).unwrap();
        sketch2.update("a").unwrap();
        sketch2.update("b").unwrap();
        sketch2.update("c").unwrap();
        assert!(matches!(sketch2.mode(), Mode::List { .. }));

        union.update(&sketch1).unwrap();
        union.update(&sketch2).unwrap();

        let result = union.get_result(HllType::Hll8);
        let estimate = result.estimate();

        assert!(
            estimate > 9_500.0 && estimate < 10_500.0,
            "Expected estimate around 10000, got {estimate}"
        );
    }

    #[test]
    fn test_union_mixed_hll_types() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch1 = HllSketch::new(12, HllType::Hll4).unwrap();
        for i in 0..3_000 {
            sketch1.update(i).unwrap();
        }

        let mut sketch2 = HllSketch::new(12, HllType::Hll6).unwrap();
        for i in 2_000..5_000 {
            sketch2.update(i).unwrap();
        }

        let mut sketch3 = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 4_000..7_000 {
            sketch3.update(i).unwrap();
        }

        union.update(&sketch1).unwrap();
        union.update(&sketch2).unwrap();
        union.update(&sketch3).unwrap();

        let result = union.get_result(HllType::Hll8);
        let estimate = result.estimate();

        assert!(
            estimate > 6_000.0 && estimate < 8_000.0,
            "Expected estimate around 7000, got {estimate}"
        );
    }

    #[test]
    fn test_union_multiple_downsizing_operations() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch1 = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..5_000 {
            sketch1.update(i).unwrap();
        }
        union.update(&sketch1).unwrap();
        assert_eq!(union.lg_config_k(), 12);

        let mut sketch2 = HllSketch::new(10, HllType::Hll8).unwrap();
        for i in 4_000..8_000 {
            sketch2.update(i).unwrap();
        }
        union.update(&sketch2).unwrap();
        assert_eq!(union.lg_config_k(), 10);

        let mut sketch3 = HllSketch::new(8, HllType::Hll8).unwrap();
        for i in 7_000..10_000 {
            sketch3.update(i).unwrap();
        }
        union.update(&sketch3).unwrap();
        assert_eq!(union.lg_config_k(), 8);

        let result = union.get_result(HllType::Hll8);
        let estimate = result.estimate();

        assert!(
            estimate > 8_000.0 && estimate < 12_000.0,
            "Expected estimate around 10000, got {estimate}"
        );
    }

    #[test]
    fn test_union_get_result_type_conversion_hll6() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..5_000 {
            sketch.update(i).unwrap();
        }

        union.update(&sketch).unwrap();

        let result = union.get_result(HllType::Hll6);

        assert_eq!(result.target_type(), HllType::Hll6);

        let estimate = result.estimate();
        assert!(
            estimate > 4_000.0 && estimate < 6_000.0,
            "Expected estimate around 5000, got {estimate}"
        );
    }

    #[test]
    fn test_union_get_result_type_conversion_hll4() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..5_000 {
            sketch.update(i).unwrap();
        }

        union.update(&sketch).unwrap();

        let result = union.get_result(HllType::Hll4);

        assert_eq!(result.target_type(), HllType::Hll4);

        let estimate = result.estimate();
        assert!(
            estimate > 4_000.0 && estimate < 6_000.0,
            "Expected estimate around 5000, got {estimate}"
        );
    }

    #[test]
    fn test_union_get_result_no_conversion_needed() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..1_000 {
            sketch.update(i).unwrap();
        }

        union.update(&sketch).unwrap();

        let result = union.get_result(HllType::Hll8);

        assert_eq!(result.target_type(), HllType::Hll8);

        let estimate = result.estimate();
        assert!(
            estimate > 900.0 && estimate < 1_100.0,
            "Expected estimate around 1000, got {estimate}"
        );
    }

    #[test]
    fn test_union_get_result_from_list_mode() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
        sketch.update("a").unwrap();
        sketch.update("b").unwrap();
        sketch.update("c").unwrap();

        union.update(&sketch).unwrap();

        let result = union.get_result(HllType::Hll6);

        assert_eq!(result.target_type(), HllType::Hll6);
        assert!(matches!(result.mode(), Mode::List { .. }));

        let estimate = result.estimate();
        assert!(
            (3.0..=5.0).contains(&estimate),
            "Expected estimate around 3, got {estimate}"
        );
    }

    #[test]
    fn test_union_hll6_arrays_with_overlap() {
        let mut union = HllUnion::new(12).unwrap();

        let mut sketch1 = HllSketch::new(12, HllType::Hll6).unwrap();
        for i in 0..10_000 {
            sketch1.update(i).unwrap();
        }

        let mut sketch2 = HllSketch::new(12, HllType::Hll6).unwrap();
        for i in 5_000..15_000 {
            sketch2.update(i).unwrap();
        }

        union.update(&sketch1).unwrap();
        union.update(&sketch2).unwrap();

        let result = union.get_result(HllType::Hll6);
        let estimate = result.estimate();

        assert!(
            estimate > 13_000.0 && estimate < 17_000.0,
            "Expected estimate around 15000, got {estimate}. This suggests sketch2 overwrote sketch1 instead of merging."
        );
    }
}
