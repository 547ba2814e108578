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

//! Tracks request latencies with a quantiles sketch and reports percentiles
//! along with the sketch's documented rank-error bound.

use datasketches::quantiles::{Criterion, DoublesSketch};

fn main() -> anyhow::Result<()> {
    let mut latencies = DoublesSketch::builder().k(128).seed(42).build()?;

    // A synthetic latency distribution: mostly fast, with a slow tail.
    for i in 0..100_000u64 {
        let millis = if i % 1000 == 0 {
            500.0 + (i % 50) as f64
        } else {
            10.0 + (i % 40) as f64
        };
        latencies.update(millis);
    }

    for p in [0.5, 0.9, 0.99, 0.999] {
        let q = latencies.get_quantile(p, Criterion::Inclusive)?;
        println!("p{:<5} ~= {:>7.1} ms", p * 100.0, q);
    }

    let rank = latencies.get_rank(100.0, Criterion::Inclusive)?;
    let lo = latencies.get_rank_lower_bound(rank);
    let hi = latencies.get_rank_upper_bound(rank);
    println!(
        "fraction of requests under 100ms: {:.4} (bound [{:.4}, {:.4}])",
        rank, lo, hi
    );

    let bytes = latencies.to_compact_bytes();
    println!("serialized sketch: {} bytes for n={}", bytes.len(), latencies.n());

    Ok(())
}
