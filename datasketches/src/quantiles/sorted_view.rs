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

//! A flattened, weight-sorted view over a sketch's retained items,
//! built fresh for each query. Base buffer items carry weight `1`;
//! an item retained in level `l` carries weight `2^(l+1)`, since each
//! compaction step that moves items into a level halves a `2k`-sized
//! population into `k` survivors.

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct SortedView {
    entries: Vec<Entry>,
    total_weight: u64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    item: f64,
    cumulative_weight: u64,
}

use super::Criterion;

impl SortedView {
    pub(crate) fn build(base_buffer: &[f64], levels: &[Vec<f64>]) -> Self {
        let mut raw: Vec<(f64, u64)> = Vec::with_capacity(base_buffer.len() + levels.iter().map(|l| l.len()).sum::<usize>());
        for &item in base_buffer {
            raw.push((item, 1));
        }
        for (lvl, level) in levels.iter().enumerate() {
            let weight = 1u64 << (lvl + 1);
            for &item in level {
                raw.push((item, weight));
            }
        }
        raw.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("finite f64"));

        let mut total_weight = 0u64;
        let entries = raw
            .into_iter()
            .map(|(item, weight)| {
                total_weight += weight;
                Entry {
                    item,
                    cumulative_weight: total_weight,
                }
            })
            .collect();

        Self {
            entries,
            total_weight,
        }
    }

    pub fn rank(&self, value: f64, criterion: Criterion) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let idx = match criterion {
            Criterion::Inclusive => upper_bound(&self.entries, value),
            Criterion::Exclusive => lower_bound(&self.entries, value),
        };
        if idx == 0 {
            return 0.0;
        }
        self.entries[idx - 1].cumulative_weight as f64 / self.total_weight as f64
    }

    pub fn quantile(&self, rank: f64, criterion: Criterion) -> f64 {
        let weight = match criterion {
            Criterion::Inclusive => (rank * self.total_weight as f64).ceil() as u64,
            Criterion::Exclusive => (rank * self.total_weight as f64) as u64,
        };
        let idx = match criterion {
            Criterion::Inclusive => lower_bound_by_weight(&self.entries, weight),
            Criterion::Exclusive => upper_bound_by_weight(&self.entries, weight),
        };
        if idx >= self.entries.len() {
            return self.entries[self.entries.len() - 1].item;
        }
        self.entries[idx].item
    }

    pub fn cdf(&self, split_points: &[f64], criterion: Criterion) -> Result<Vec<f64>, Error> {
        check_split_points(split_points)?;
        let mut ranks = Vec::with_capacity(split_points.len() + 1);
        for &point in split_points {
            ranks.push(self.rank(point, criterion));
        }
        ranks.push(1.0);
        Ok(ranks)
    }

    pub fn pmf(&self, split_points: &[f64], criterion: Criterion) -> Result<Vec<f64>, Error> {
        let mut buckets = self.cdf(split_points, criterion)?;
        for i in (1..buckets.len()).rev() {
            buckets[i] -= buckets[i - 1];
        }
        Ok(buckets)
    }
}

fn check_split_points(split_points: &[f64]) -> Result<(), Error> {
    for &point in split_points {
        if !point.is_finite() {
            return Err(Error::arg("split points must be finite").with_context("value", point));
        }
    }
    for window in split_points.windows(2) {
        if !(window[0] < window[1]) {
            return Err(Error::arg(
                "split points must be strictly ascending and unique",
            ));
        }
    }
    Ok(())
}

fn lower_bound(entries: &[Entry], value: f64) -> usize {
    let mut left = 0usize;
    let mut right = entries.len();
    while left < right {
        let mid = left + (right - left) / 2;
        if entries[mid].item < value {
            left = mid + 1;
        } else {
            right = mid;
        }
    }
    left
}

fn upper_bound(entries: &[Entry], value: f64) -> usize {
    let mut left = 0usize;
    let mut right = entries.len();
    while left < right {
        let mid = left + (right - left) / 2;
        if entries[mid].item > value {
            right = mid;
        } else {
            left = mid + 1;
        }
    }
    left
}

fn lower_bound_by_weight(entries: &[Entry], weight: u64) -> usize {
    let mut left = 0usize;
    let mut right = entries.len();
    while left < right {
        let mid = left + (right - left) / 2;
        if entries[mid].cumulative_weight < weight {
            left = mid + 1;
        } else {
            right = mid;
        }
    }
    left
}

fn upper_bound_by_weight(entries: &[Entry], weight: u64) -> usize {
    let mut left = 0usize;
    let mut right = entries.len();
    while left < right {
        let mid = left + (right - left) / 2;
        if entries[mid].cumulative_weight > weight {
            right = mid;
        } else {
            left = mid + 1;
        }
    }
    left
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_and_quantile_round_trip_on_uniform_data() {
        let base: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let view = SortedView::build(&base, &[]);
        assert_eq!(view.rank(5.0, Criterion::Inclusive), 0.5);
        assert_eq!(view.quantile(0.5, Criterion::Inclusive), 5.0);
    }

    #[test]
    fn exclusive_rank_excludes_the_query_point() {
        let base: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let view = SortedView::build(&base, &[]);
        assert_eq!(view.rank(5.0, Criterion::Exclusive), 0.4);
    }

    #[test]
    fn level_items_carry_doubled_weight_per_level() {
        let view = SortedView::build(&[], &[vec![1.0, 2.0]]);
        assert_eq!(view.total_weight, 4);
    }

    #[test]
    fn cdf_ends_at_one_and_is_monotonic() {
        let base: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let view = SortedView::build(&base, &[]);
        let cdf = view.cdf(&[25.0, 50.0, 75.0], Criterion::Inclusive).unwrap();
        assert_eq!(*cdf.last().unwrap(), 1.0);
        for window in cdf.windows(2) {
            assert!(window[1] >= window[0]);
        }
    }

    #[test]
    fn rejects_non_ascending_split_points() {
        let view = SortedView::build(&[1.0, 2.0], &[]);
        assert!(view.cdf(&[5.0, 1.0], Criterion::Inclusive).is_err());
    }
}
