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

//! HyperLogLog cardinality estimation.
//!
//! A sketch starts as a sparse [`list::List`] of coupons, grows into an
//! open-addressed [`set::Set`] once it holds more than a handful of
//! distinct values, then promotes to a dense register array
//! ([`array4::Array4`], [`array6::Array6`] or [`array8::Array8`],
//! depending on the target encoding) once the coupon representation
//! stops paying for itself. See [`sketch::HllSketch`] for the public
//! entry point and [`union::HllUnion`] for combining sketches built
//! with different `lgConfigK` or target types.

pub mod array4;
pub mod array6;
pub mod array8;
pub mod aux_map;
mod composite_interpolation;
pub mod container;
mod coupon_mapping;
mod cubic_interpolation;
mod estimator;
mod harmonic_numbers;
pub mod list;
pub mod mode;
mod serialization;
pub mod set;
pub mod sketch;
pub mod union;

pub use sketch::{HllIter, HllSketch};
pub use union::HllUnion;

use std::hash::{Hash, Hasher};

use mur3::Hasher128;

/// Number of bits of a coupon dedicated to the register slot address.
pub const KEY_BITS_26: u32 = 26;
pub const KEY_MASK_26: u32 = (1 << KEY_BITS_26) - 1;

/// Relative standard error of the coupon-mode (LIST/SET) estimator.
pub const COUPON_RSE_FACTOR: f64 = 0.409;
pub const COUPON_RSE: f64 = COUPON_RSE_FACTOR / 32.0;

/// SET resizes once its load factor would exceed `RESIZE_NUMER /
/// RESIZE_DENOM`.
pub const RESIZE_NUMER: u32 = 3;
pub const RESIZE_DENOM: u32 = 4;

/// Target dense register encoding a sketch promotes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HllType {
    /// 4 bits per register plus a sparse exception table; smallest.
    Hll4,
    /// 6 bits per register, cross-byte packed.
    Hll6,
    /// 1 byte per register; fastest to update, largest.
    Hll8,
}

impl HllType {
    pub fn bits_per_register(self) -> u8 {
        match self {
            HllType::Hll4 => 4,
            HllType::Hll6 => 6,
            HllType::Hll8 => 8,
        }
    }
}

/// Extracts the register slot address (low 26 bits) from a coupon.
pub fn get_slot(coupon: u32) -> u32 {
    coupon & KEY_MASK_26
}

/// Extracts the register value (leading-zero-count + 1) from a coupon.
pub fn get_value(coupon: u32) -> u8 {
    (coupon >> KEY_BITS_26) as u8
}

/// Packs a register `slot` and `value` into a single coupon.
pub fn pack_coupon(slot: u32, value: u8) -> u32 {
    (slot & KEY_MASK_26) | ((value as u32) << KEY_BITS_26)
}

/// Hashes `value` and derives a coupon for a sketch of size `lg_config_k`.
pub fn coupon<H: Hash>(value: H, lg_config_k: u8) -> u32 {
    let mut hasher = Hasher128::with_seed(crate::hash::DEFAULT_UPDATE_SEED as u32);
    value.hash(&mut hasher);
    let (h0, _h1) = hasher.finish128();

    let k = 1u64 << lg_config_k;
    let slot = (h0 & (k - 1)) as u32;
    let bits = h0 >> lg_config_k;
    let value_bits = (bits.trailing_zeros() + 1).min(63) as u8;
    pack_coupon(slot, value_bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack_round_trip() {
        let packed = pack_coupon(12345, 17);
        assert_eq!(get_slot(packed), 12345);
        assert_eq!(get_value(packed), 17);
    }

    #[test]
    fn coupon_is_deterministic() {
        let a = coupon(42u64, 10);
        let b = coupon(42u64, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn coupon_slot_respects_lg_config_k() {
        let c = coupon(9001u64, 8);
        assert!(get_slot(c) < (1 << 8));
    }
}
