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

use datasketches::hll::{HllSketch, HllType, HllUnion};

fn sketch_over(lg_k: u8, range: std::ops::Range<u64>) -> HllSketch {
    let mut s = HllSketch::new(lg_k, HllType::Hll8).unwrap();
    for i in range {
        s.update(i).unwrap();
    }
    s
}

#[test]
fn union_of_three_sketches_is_order_independent() {
    let a = sketch_over(11, 0..3000);
    let b = sketch_over(11, 2000..6000);
    let c = sketch_over(11, 5000..9000);

    let mut forward = HllUnion::new(11).unwrap();
    forward.update(&a).unwrap();
    forward.update(&b).unwrap();
    forward.update(&c).unwrap();

    let mut backward = HllUnion::new(11).unwrap();
    backward.update(&c).unwrap();
    backward.update(&b).unwrap();
    backward.update(&a).unwrap();

    assert_eq!(forward.estimate(), backward.estimate());
}

#[test]
fn union_estimate_is_accurate_for_disjoint_inputs() {
    let a = sketch_over(12, 0..5000);
    let b = sketch_over(12, 5000..10000);

    let mut union = HllUnion::new(12).unwrap();
    union.update(&a).unwrap();
    union.update(&b).unwrap();

    let estimate = union.estimate();
    assert!((estimate / 10_000.0 - 1.0).abs() < 0.05, "estimate={estimate}");
}

#[test]
fn union_downsamples_a_larger_lgk_source() {
    let small_gadget = sketch_over(10, 0..2000);
    let large_source = sketch_over(14, 0..2000);

    let mut union = HllUnion::new(10).unwrap();
    union.update(&small_gadget).unwrap();
    union.update(&large_source).unwrap();

    assert!(union.estimate() > 0.0);
    assert!(union.lg_config_k() <= 10);
}

#[test]
fn get_result_reencodes_to_requested_type() {
    let a = sketch_over(10, 0..4000);
    let mut union = HllUnion::new(10).unwrap();
    union.update(&a).unwrap();

    let as_hll4 = union.get_result(HllType::Hll4);
    let as_hll6 = union.get_result(HllType::Hll6);
    assert_eq!(as_hll4.target_type(), HllType::Hll4);
    assert_eq!(as_hll6.target_type(), HllType::Hll6);
    assert!((as_hll4.estimate() / as_hll6.estimate() - 1.0).abs() < 0.05);
}

#[test]
fn union_of_empty_sketch_is_a_no_op() {
    let empty = HllSketch::new(12, HllType::Hll8).unwrap();
    let populated = sketch_over(12, 0..1000);

    let mut union = HllUnion::new(12).unwrap();
    union.update(&populated).unwrap();
    union.update(&empty).unwrap();

    assert!((union.estimate() / 1000.0 - 1.0).abs() < 0.05);
}
