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

//! The public HyperLogLog sketch: a cardinality estimator that moves
//! from a sparse coupon [`List`] through a coupon [`Set`] into a dense
//! register array as it sees more distinct input, never under- or
//! over-counting a distinct value twice.

use std::hash::Hash;

use crate::common::NumStdDev;
use crate::error::Error;
use crate::hll::array4::Array4;
use crate::hll::array6::Array6;
use crate::hll::array8::Array8;
use crate::hll::container::{COUPON_EMPTY, Container};
use crate::hll::list::{LIST_TO_SET_THRESHOLD, List};
use crate::hll::mode::Mode;
use crate::hll::serialization::*;
use crate::hll::set::Set;
use crate::hll::{get_slot, get_value, HllType, coupon};

pub const MIN_LG_CONFIG_K: u8 = 4;
pub const MAX_LG_CONFIG_K: u8 = 21;

/// Below this `lgConfigK`, a coupon SET never pays for itself; a LIST
/// overflow promotes straight to a dense array instead.
const MIN_LG_CONFIG_K_FOR_SET: u8 = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct HllSketch {
    lg_config_k: u8,
    target_type: HllType,
    mode: Mode,
}

impl HllSketch {
    pub fn new(lg_config_k: u8, target_type: HllType) -> Result<Self, Error> {
        if !(MIN_LG_CONFIG_K..=MAX_LG_CONFIG_K).contains(&lg_config_k) {
            return Err(Error::arg("lgConfigK out of range [4, 21]")
                .with_context("lgConfigK", lg_config_k));
        }
        Ok(Self {
            lg_config_k,
            target_type,
            mode: Mode::List {
                list: List::default(),
                hll_type: target_type,
            },
        })
    }

    pub(crate) fn from_mode(lg_config_k: u8, target_type: HllType, mode: Mode) -> Self {
        Self {
            lg_config_k,
            target_type,
            mode,
        }
    }

    pub fn lg_config_k(&self) -> u8 {
        self.lg_config_k
    }

    pub fn target_type(&self) -> HllType {
        self.target_type
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn mode_mut(&mut self) -> &mut Mode {
        &mut self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.mode.is_empty()
    }

    pub fn reset(&mut self) {
        self.mode = Mode::List {
            list: List::default(),
            hll_type: self.target_type,
        };
    }

    /// Hashes `value` and folds it into the sketch.
    pub fn update<T: Hash>(&mut self, value: T) -> Result<(), Error> {
        let c = coupon(value, self.lg_config_k);
        self.update_with_coupon(c)
    }

    /// Folds an already-derived coupon into the sketch. Exposed for
    /// [`super::union::HllUnion`], which re-derives coupons from a
    /// donor sketch's stored registers rather than re-hashing input.
    pub fn update_with_coupon(&mut self, coupon: u32) -> Result<(), Error> {
        let needs_promotion = match &self.mode {
            Mode::List { list, .. } => list.would_overflow(coupon),
            Mode::Set { set, .. } => {
                set.at_resize_threshold() && {
                    let k = 1usize << self.lg_config_k;
                    (set.len() + 1) * 4 >= k * 3 || set.lg_size() >= self.lg_config_k as usize
                }
            }
            _ => false,
        };

        if needs_promotion {
            return match &self.mode {
                Mode::List { .. } => self.promote_from_list(coupon),
                Mode::Set { .. } => self.promote_set_to_array(Some(coupon)),
                _ => unreachable!("needs_promotion only set for LIST/SET modes"),
            };
        }

        match &mut self.mode {
            Mode::List { list, .. } => {
                list.update(coupon);
                Ok(())
            }
            Mode::Set { set, .. } => {
                if set.at_resize_threshold() {
                    set.grow(set.lg_size() + 1);
                }
                set.update(coupon);
                Ok(())
            }
            Mode::Array4(a) => a.update(coupon),
            Mode::Array6(a) => {
                a.update(coupon);
                Ok(())
            }
            Mode::Array8(a) => {
                a.update(coupon);
                Ok(())
            }
        }
    }

    fn promote_from_list(&mut self, incoming: u32) -> Result<(), Error> {
        let Mode::List { list, hll_type } = &self.mode else {
            unreachable!("promote_from_list called outside LIST mode")
        };
        let hll_type = *hll_type;
        let coupons: Vec<u32> = list.container().iter().collect();

        if self.lg_config_k < MIN_LG_CONFIG_K_FOR_SET {
            let mut array = new_array(self.lg_config_k, hll_type);
            for c in coupons.iter().copied().chain(std::iter::once(incoming)) {
                update_array(&mut array, c)?;
            }
            self.mode = array;
            return Ok(());
        }

        let mut set = Set::default();
        for c in coupons {
            set.update(c);
        }
        set.update(incoming);
        self.mode = Mode::Set { set, hll_type };
        Ok(())
    }

    fn promote_set_to_array(&mut self, incoming: Option<u32>) -> Result<(), Error> {
        let Mode::Set { set, hll_type } = &self.mode else {
            unreachable!("promote_set_to_array called outside SET mode")
        };
        let hll_type = *hll_type;
        let coupons: Vec<u32> = set.container().iter().collect();

        let mut array = new_array(self.lg_config_k, hll_type);
        for c in coupons.into_iter().chain(incoming) {
            update_array(&mut array, c)?;
        }
        self.mode = array;
        Ok(())
    }

    pub fn estimate(&self) -> f64 {
        self.mode.estimate()
    }

    pub fn is_out_of_order(&self) -> bool {
        match &self.mode {
            Mode::Array4(a) => a.is_out_of_order(),
            Mode::Array6(a) => a.is_out_of_order(),
            Mode::Array8(a) => a.is_out_of_order(),
            _ => false,
        }
    }

    pub fn upper_bound(&self, n_std_dev: NumStdDev) -> f64 {
        let n = num_std_dev_value(n_std_dev);
        match &self.mode {
            Mode::List { list, .. } => list.container().upper_bound(n),
            Mode::Set { set, .. } => set.container().upper_bound(n),
            _ => {
                let est = self.estimate();
                let rse = 1.04 / ((1u64 << self.lg_config_k) as f64).sqrt();
                est * (1.0 + n * rse)
            }
        }
    }

    pub fn lower_bound(&self, n_std_dev: NumStdDev) -> f64 {
        let n = num_std_dev_value(n_std_dev);
        match &self.mode {
            Mode::List { list, .. } => list.container().lower_bound(n),
            Mode::Set { set, .. } => set.container().lower_bound(n),
            _ => {
                let est = self.estimate();
                let rse = 1.04 / ((1u64 << self.lg_config_k) as f64).sqrt();
                (est * (1.0 - n * rse)).max(0.0)
            }
        }
    }

    pub fn to_compact_bytes(&self) -> Vec<u8> {
        match &self.mode {
            Mode::List { list, .. } => serialize_coupons(
                self.lg_config_k,
                self.target_type,
                mode_tag::LIST,
                list.container().coupons.iter().copied().filter(|c| *c != 0),
                list.len(),
            ),
            Mode::Set { set, .. } => serialize_coupons(
                self.lg_config_k,
                self.target_type,
                mode_tag::SET,
                set.container().coupons.iter().copied().filter(|c| *c != 0),
                set.len(),
            ),
            Mode::Array4(a) => a.serialize().into_bytes(),
            Mode::Array6(a) => a.serialize().into_bytes(),
            Mode::Array8(a) => a.serialize().into_bytes(),
        }
    }

    /// Lazily iterates every retained `(slot, value)` register pair,
    /// regardless of mode. Dispatches on the current mode via a small
    /// enum rather than a boxed trait object, since there is no
    /// user-facing need for the iterator kind to be polymorphic.
    pub fn iterator(&self) -> HllIter<'_> {
        match &self.mode {
            Mode::List { list, .. } => HllIter::Sparse {
                container: list.container(),
                pos: 0,
            },
            Mode::Set { set, .. } => HllIter::Sparse {
                container: set.container(),
                pos: 0,
            },
            Mode::Array4(array) => HllIter::Array4 {
                array,
                slot: 0,
                k: 1u32 << array.lg_config_k(),
            },
            Mode::Array6(array) => HllIter::Array6 {
                array,
                slot: 0,
                k: 1u32 << array.lg_config_k(),
            },
            Mode::Array8(array) => HllIter::Array8 {
                array,
                slot: 0,
                k: 1u32 << array.lg_config_k(),
            },
        }
    }

    pub fn heapify(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < MODE_BYTE + 1 {
            return Err(Error::insufficient_data("HLL preamble"));
        }
        crate::codec::Family::HLL.validate_id(bytes[FAMILY_BYTE])?;
        let lg_config_k = bytes[LG_K_BYTE];
        let mode_byte = bytes[MODE_BYTE];

        match mode_byte {
            mode_tag::LIST => {
                let (coupons, hll_type) = deserialize_coupons(bytes)?;
                let mut list = List::default();
                for c in coupons {
                    list.update(c);
                }
                Ok(Self::from_mode(
                    lg_config_k,
                    hll_type,
                    Mode::List { list, hll_type },
                ))
            }
            mode_tag::SET => {
                let (coupons, hll_type) = deserialize_coupons(bytes)?;
                let mut set = Set::default();
                for c in coupons {
                    set.update(c);
                }
                Ok(Self::from_mode(
                    lg_config_k,
                    hll_type,
                    Mode::Set { set, hll_type },
                ))
            }
            mode_tag::HLL4 => {
                let array = Array4::deserialize(bytes)?;
                Ok(Self::from_mode(lg_config_k, HllType::Hll4, Mode::Array4(array)))
            }
            mode_tag::HLL6 => {
                let array = Array6::deserialize(bytes)?;
                Ok(Self::from_mode(lg_config_k, HllType::Hll6, Mode::Array6(array)))
            }
            mode_tag::HLL8 => {
                let array = Array8::deserialize(bytes)?;
                Ok(Self::from_mode(lg_config_k, HllType::Hll8, Mode::Array8(array)))
            }
            other => Err(Error::deserial("unrecognized HLL mode byte")
                .with_context("mode", other)),
        }
    }
}

/// Lazy iterator over a sketch's retained `(slot, value)` pairs, one
/// variant per storage mode. See [`HllSketch::iterator`].
pub enum HllIter<'a> {
    /// LIST or SET mode: coupons packed as `(slot, value)` in storage order.
    Sparse { container: &'a Container, pos: usize },
    Array4 { array: &'a Array4, slot: u32, k: u32 },
    Array6 { array: &'a Array6, slot: u32, k: u32 },
    Array8 { array: &'a Array8, slot: u32, k: u32 },
}

impl<'a> Iterator for HllIter<'a> {
    type Item = (u32, u8);

    fn next(&mut self) -> Option<(u32, u8)> {
        match self {
            HllIter::Sparse { container, pos } => {
                while *pos < container.coupons.len() {
                    let c = container.coupons[*pos];
                    *pos += 1;
                    if c != COUPON_EMPTY {
                        return Some((get_slot(c), get_value(c)));
                    }
                }
                None
            }
            HllIter::Array4 { array, slot, k } => {
                if *slot >= *k {
                    return None;
                }
                let s = *slot;
                *slot += 1;
                Some((
                    s,
                    array
                        .get(s)
                        .expect("slot within bounds always resolves to a register value"),
                ))
            }
            HllIter::Array6 { array, slot, k } => {
                if *slot >= *k {
                    return None;
                }
                let s = *slot;
                *slot += 1;
                Some((s, array.get(s)))
            }
            HllIter::Array8 { array, slot, k } => {
                if *slot >= *k {
                    return None;
                }
                let s = *slot;
                *slot += 1;
                Some((s, array.get(s)))
            }
        }
    }
}

fn num_std_dev_value(n: NumStdDev) -> f64 {
    match n {
        NumStdDev::One => 1.0,
        NumStdDev::Two => 2.0,
        NumStdDev::Three => 3.0,
    }
}

fn new_array(lg_config_k: u8, hll_type: HllType) -> Mode {
    match hll_type {
        HllType::Hll4 => Mode::Array4(Array4::new(lg_config_k)),
        HllType::Hll6 => Mode::Array6(Array6::new(lg_config_k)),
        HllType::Hll8 => Mode::Array8(Array8::new(lg_config_k)),
    }
}

fn update_array(mode: &mut Mode, coupon: u32) -> Result<(), Error> {
    match mode {
        Mode::Array4(a) => a.update(coupon),
        Mode::Array6(a) => {
            a.update(coupon);
            Ok(())
        }
        Mode::Array8(a) => {
            a.update(coupon);
            Ok(())
        }
        _ => unreachable!("update_array called on a non-array mode"),
    }
}

fn serialize_coupons(
    lg_config_k: u8,
    target_type: HllType,
    mode_byte: u8,
    coupons: impl Iterator<Item = u32>,
    count: usize,
) -> Vec<u8> {
    use crate::codec::SketchBytes;

    let mut out = SketchBytes::with_capacity(8 + count * 4);
    out.write_u8(LIST_PREINTS.max(SET_PREINTS));
    out.write_u8(SER_VER);
    out.write_u8(crate::codec::Family::HLL.id);
    out.write_u8(lg_config_k);
    out.write_u8(target_type.bits_per_register());
    out.write_u8(0); // flags
    out.write_u8(0); // cur_min unused
    out.write_u8(mode_byte);
    out.write_u32_le(count as u32);
    for c in coupons {
        out.write_u32_le(c);
    }
    out.into_bytes()
}

fn deserialize_coupons(bytes: &[u8]) -> Result<(Vec<u32>, HllType), Error> {
    use crate::codec::SketchSlice;

    let mut slice = SketchSlice::new(bytes);
    let _preamble_ints = slice.read_u8("preambleInts")?;
    let _ser_ver = slice.read_u8("serVer")?;
    let _family_id = slice.read_u8("familyId")?;
    let _lg_config_k = slice.read_u8("lgConfigK")?;
    let bits_per_register = slice.read_u8("targetType")?;
    let _flags = slice.read_u8("flags")?;
    let _cur_min = slice.read_u8("curMin")?;
    let _mode = slice.read_u8("mode")?;
    let count = slice.read_u32_le("count")?;

    let hll_type = match bits_per_register {
        4 => HllType::Hll4,
        6 => HllType::Hll6,
        _ => HllType::Hll8,
    };

    let mut coupons = Vec::with_capacity(count as usize);
    for _ in 0..count {
        coupons.push(slice.read_u32_le("coupon")?);
    }
    Ok((coupons, hll_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sketch_is_empty() {
        let sketch = HllSketch::new(10, HllType::Hll8).unwrap();
        assert!(sketch.is_empty());
        assert_eq!(sketch.estimate(), 0.0);
    }

    #[test]
    fn rejects_out_of_range_lg_config_k() {
        assert!(HllSketch::new(3, HllType::Hll8).is_err());
        assert!(HllSketch::new(22, HllType::Hll8).is_err());
    }

    #[test]
    fn update_promotes_list_to_set_for_large_k() {
        let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..20u32 {
            sketch.update(i).unwrap();
        }
        assert!(matches!(sketch.mode(), Mode::Set { .. }));
    }

    #[test]
    fn update_promotes_list_straight_to_array_for_small_k() {
        let mut sketch = HllSketch::new(4, HllType::Hll8).unwrap();
        for i in 0..20u32 {
            sketch.update(i).unwrap();
        }
        assert!(matches!(sketch.mode(), Mode::Array8(_)));
    }

    #[test]
    fn estimate_is_reasonable_for_known_cardinality() {
        let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..5000u32 {
            sketch.update(i).unwrap();
        }
        let est = sketch.estimate();
        assert!(est > 4000.0 && est < 6000.0, "estimate was {est}");
    }

    #[test]
    fn compact_bytes_round_trip_in_list_mode() {
        let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
        sketch.update(1u32).unwrap();
        sketch.update(2u32).unwrap();
        let bytes = sketch.to_compact_bytes();
        let restored = HllSketch::heapify(&bytes).unwrap();
        assert!(matches!(restored.mode(), Mode::List { .. }));
        assert_eq!(restored.estimate(), sketch.estimate());
    }

    #[test]
    fn compact_bytes_round_trip_in_array_mode() {
        let mut sketch = HllSketch::new(4, HllType::Hll8).unwrap();
        for i in 0..500u32 {
            sketch.update(i).unwrap();
        }
        let bytes = sketch.to_compact_bytes();
        let restored = HllSketch::heapify(&bytes).unwrap();
        assert!((restored.estimate() - sketch.estimate()).abs() < 1e-9);
    }

    #[test]
    fn lower_bound_never_exceeds_upper_bound() {
        let mut sketch = HllSketch::new(10, HllType::Hll8).unwrap();
        for i in 0..1000u32 {
            sketch.update(i).unwrap();
        }
        assert!(sketch.lower_bound(NumStdDev::Two) <= sketch.upper_bound(NumStdDev::Two));
    }

    #[test]
    fn reset_returns_sketch_to_list_mode() {
        let mut sketch = HllSketch::new(10, HllType::Hll8).unwrap();
        for i in 0..1000u32 {
            sketch.update(i).unwrap();
        }
        sketch.reset();
        assert!(sketch.is_empty());
        assert!(matches!(sketch.mode(), Mode::List { .. }));
    }

    #[test]
    fn iterator_yields_one_pair_per_update_in_list_mode() {
        let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..4u32 {
            sketch.update(i).unwrap();
        }
        assert!(matches!(sketch.mode(), Mode::List { .. }));
        assert_eq!(sketch.iterator().count(), 4);
    }

    #[test]
    fn iterator_yields_one_pair_per_update_in_set_mode() {
        let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
        for i in 0..20u32 {
            sketch.update(i).unwrap();
        }
        assert!(matches!(sketch.mode(), Mode::Set { .. }));
        assert_eq!(sketch.iterator().count(), 20);
    }

    #[test]
    fn iterator_covers_every_slot_in_dense_array_modes() {
        for target in [HllType::Hll4, HllType::Hll6, HllType::Hll8] {
            let mut sketch = HllSketch::new(6, target).unwrap();
            for i in 0..500u32 {
                sketch.update(i).unwrap();
            }
            let k = 1usize << 6;
            assert_eq!(sketch.iterator().count(), k, "target={target:?}");
        }
    }

    #[test]
    fn iterator_slots_are_within_bounds_and_unique() {
        let mut sketch = HllSketch::new(8, HllType::Hll4).unwrap();
        for i in 0..2000u32 {
            sketch.update(i).unwrap();
        }
        let k = 1u32 << 8;
        let slots: std::collections::HashSet<u32> =
            sketch.iterator().map(|(slot, _)| slot).collect();
        assert_eq!(slots.len(), k as usize);
        assert!(slots.iter().all(|&s| s < k));
    }
}
