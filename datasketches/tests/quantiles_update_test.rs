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

use datasketches::quantiles::{Criterion, DoublesSketch};

#[test]
fn quantile_of_a_million_sequential_values_is_accurate() {
    let mut sketch = DoublesSketch::builder().k(128).seed(1).build().unwrap();
    for i in 1..=1_000_000u64 {
        sketch.update(i as f64);
    }
    let median = sketch.get_quantile(0.5, Criterion::Inclusive).unwrap();
    assert!((median - 500_000.0).abs() < 10_000.0, "median={median}");
}

#[test]
fn exclusive_quantiles_on_reversed_small_input() {
    let mut sketch = DoublesSketch::builder().k(32).seed(2).build().unwrap();
    for i in (1..=8).rev() {
        sketch.update(i as f64);
    }
    assert_eq!(sketch.get_quantile(0.0, Criterion::Exclusive).unwrap(), 1.0);
    assert_eq!(sketch.get_quantile(1.0, Criterion::Exclusive).unwrap_err().kind(), datasketches::ErrorKind::InvalidArgument);
    assert_eq!(
        sketch.get_quantile(1.0 - f64::EPSILON, Criterion::Exclusive).unwrap(),
        8.0
    );
    assert_eq!(sketch.get_quantile(0.5, Criterion::Exclusive).unwrap(), 5.0);
}

#[test]
fn empty_sketch_queries_fail_with_state_error() {
    let sketch = DoublesSketch::builder().k(64).build().unwrap();
    let err = sketch.get_quantile(0.5, Criterion::Inclusive).unwrap_err();
    assert_eq!(err.kind(), datasketches::ErrorKind::State);
    assert!(sketch.min_item().is_err());
}

#[test]
fn merging_two_sketches_of_equal_k_preserves_total_count() {
    let mut a = DoublesSketch::builder().k(64).seed(10).build().unwrap();
    let mut b = DoublesSketch::builder().k(64).seed(11).build().unwrap();
    for i in 1..=20_000u64 {
        a.update(i as f64);
    }
    for i in 20_001..=40_000u64 {
        b.update(i as f64);
    }
    a.merge(&b).unwrap();
    assert_eq!(a.n(), 40_000);
    let median = a.get_quantile(0.5, Criterion::Inclusive).unwrap();
    assert!((median - 20_000.0).abs() < 2_000.0, "median={median}");
}

#[test]
fn nan_updates_are_silently_ignored() {
    let mut sketch = DoublesSketch::builder().k(32).build().unwrap();
    sketch.update(1.0);
    sketch.update(f64::NAN);
    sketch.update(2.0);
    assert_eq!(sketch.n(), 2);
}

#[test]
fn rank_error_bound_holds_for_k_128() {
    let mut sketch = DoublesSketch::builder().k(128).seed(5).build().unwrap();
    for i in 1..=50_000u64 {
        sketch.update(i as f64);
    }
    let r = sketch.get_rank(25_000.0, Criterion::Inclusive).unwrap();
    let lower = sketch.get_rank_lower_bound(r);
    let upper = sketch.get_rank_upper_bound(r);
    assert!(lower <= r && r <= upper);
    assert!(upper - lower <= 4.0 * 1.7 / 128.0 + 1e-9);
}
