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

use datasketches::common::NumStdDev;
use datasketches::hll::{HllSketch, HllType};

#[test]
fn basic_cardinality_estimate_is_within_two_percent() {
    let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
    for i in 0..10_000u64 {
        sketch.update(i).unwrap();
    }
    let estimate = sketch.estimate();
    assert!(
        (estimate / 10_000.0 - 1.0).abs() < 0.02,
        "estimate={estimate}"
    );
    assert!(!sketch.is_out_of_order());
}

#[test]
fn list_promotes_to_set_at_eighth_distinct_coupon_for_large_lgk() {
    let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
    for i in 0..7u64 {
        sketch.update(i).unwrap();
    }
    assert!(matches!(sketch.mode(), datasketches::hll::mode::Mode::List { .. }));
    sketch.update(7u64).unwrap();
    sketch.update(8u64).unwrap();
    assert!(!matches!(sketch.mode(), datasketches::hll::mode::Mode::List { .. }));
}

#[test]
fn list_promotes_straight_to_dense_array_for_small_lgk() {
    let mut sketch = HllSketch::new(4, HllType::Hll8).unwrap();
    for i in 0..20u64 {
        sketch.update(i).unwrap();
    }
    assert!(matches!(
        sketch.mode(),
        datasketches::hll::mode::Mode::Array4(_)
            | datasketches::hll::mode::Mode::Array6(_)
            | datasketches::hll::mode::Mode::Array8(_)
    ));
}

#[test]
fn rejects_lg_config_k_outside_valid_range() {
    assert!(HllSketch::new(3, HllType::Hll8).is_err());
    assert!(HllSketch::new(22, HllType::Hll8).is_err());
}

#[test]
fn lower_bound_never_exceeds_upper_bound() {
    let mut sketch = HllSketch::new(10, HllType::Hll6).unwrap();
    for i in 0..5_000u64 {
        sketch.update(i).unwrap();
    }
    for n in [NumStdDev::One, NumStdDev::Two, NumStdDev::Three] {
        assert!(sketch.lower_bound(n) <= sketch.estimate());
        assert!(sketch.estimate() <= sketch.upper_bound(n));
    }
}

#[test]
fn reset_returns_sketch_to_empty_list_mode() {
    let mut sketch = HllSketch::new(10, HllType::Hll8).unwrap();
    for i in 0..1000u64 {
        sketch.update(i).unwrap();
    }
    sketch.reset();
    assert!(sketch.is_empty());
    assert!(matches!(sketch.mode(), datasketches::hll::mode::Mode::List { .. }));
}
