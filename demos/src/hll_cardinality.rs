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

//! Estimates the number of distinct visitor ids in a synthetic log using an HLL sketch,
//! then unions in a second day's traffic to show overlapping visitors don't get double-counted.

use datasketches::hll::{HllSketch, HllType, HllUnion};

fn main() -> anyhow::Result<()> {
    let mut day_one = HllSketch::new(12, HllType::Hll4)?;
    for id in 0..50_000u64 {
        day_one.update(&id.to_le_bytes())?;
    }
    println!(
        "day one: {} distinct visitors (estimate {:.0})",
        50_000,
        day_one.estimate()
    );

    let mut day_two = HllSketch::new(12, HllType::Hll4)?;
    // Half of day two overlaps with day one's visitor ids.
    for id in 25_000..75_000u64 {
        day_two.update(&id.to_le_bytes())?;
    }
    println!(
        "day two: {} distinct visitors (estimate {:.0})",
        50_000,
        day_two.estimate()
    );

    let mut union = HllUnion::new(12)?;
    union.update(&day_one)?;
    union.update(&day_two)?;
    let combined = union.get_result(HllType::Hll4);
    println!(
        "combined: expected 75000 unique visitors, estimate {:.0} (lo {:.0}, hi {:.0})",
        combined.estimate(),
        combined.lower_bound(datasketches::common::NumStdDev::Two),
        combined.upper_bound(datasketches::common::NumStdDev::Two),
    );

    Ok(())
}
