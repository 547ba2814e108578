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

use datasketches::hll::{HllSketch, HllType};

#[test]
fn list_mode_round_trips_through_compact_bytes() {
    let mut sketch = HllSketch::new(12, HllType::Hll8).unwrap();
    for i in 0..5u64 {
        sketch.update(i).unwrap();
    }
    let bytes = sketch.to_compact_bytes();
    let restored = HllSketch::heapify(&bytes).unwrap();
    assert_eq!(restored.estimate(), sketch.estimate());
    assert_eq!(restored.lg_config_k(), sketch.lg_config_k());
}

#[test]
fn dense_array_mode_round_trips_for_each_target_type() {
    for target in [HllType::Hll4, HllType::Hll6, HllType::Hll8] {
        let mut sketch = HllSketch::new(10, target).unwrap();
        for i in 0..5_000u64 {
            sketch.update(i).unwrap();
        }
        let bytes = sketch.to_compact_bytes();
        let restored = HllSketch::heapify(&bytes).unwrap();
        assert_eq!(restored.estimate(), sketch.estimate(), "target={target:?}");
    }
}

#[test]
fn hll4_aux_exceptions_survive_round_trip_at_large_scale() {
    let mut sketch = HllSketch::new(15, HllType::Hll4).unwrap();
    for i in 0..(1u64 << 20) {
        sketch.update(i).unwrap();
    }
    let bytes = sketch.to_compact_bytes();
    let restored = HllSketch::heapify(&bytes).unwrap();
    assert_eq!(restored.estimate(), sketch.estimate());
    assert!((sketch.estimate() / (1u64 << 20) as f64 - 1.0).abs() < 0.05);
}
