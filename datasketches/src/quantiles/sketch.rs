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

use crate::codec::{BackingKind, Family, Segment, SegmentRequest, SketchBytes, SketchSlice};
use crate::common::{RandomSource, XorShift64};
use crate::error::Error;
use crate::quantiles::serialization::*;
use crate::quantiles::sorted_view::SortedView;
use crate::quantiles::{error_table, Criterion, DEFAULT_K, MAX_K, MIN_K};

/// A classic quantiles sketch over `f64`.
///
/// Holds a `2k`-sized base buffer of unsorted recent items plus a
/// cascade of `k`-sized sorted levels; level `l` is active iff bit `l`
/// of `bit_pattern` is set. See the module doc for the compaction
/// algorithm.
#[derive(Debug, Clone)]
pub struct DoublesSketch {
    k: u16,
    n: u64,
    bit_pattern: u64,
    base_buffer: Vec<f64>,
    levels: Vec<Vec<f64>>,
    min_item: Option<f64>,
    max_item: Option<f64>,
    rng: XorShift64,
    backing: Backing,
}

/// Where a sketch's serialized image currently lives.
enum Backing {
    /// Plain Rust collections; growth is ordinary `Vec` reallocation.
    Heap,
    /// Mirrored into a [`Segment`], grown through a [`SegmentRequest`]
    /// when the serialized image outgrows the current one.
    Segment(SegmentBacking),
}

struct SegmentBacking {
    segment: Segment,
    request: Option<Box<dyn SegmentRequest>>,
}

impl std::fmt::Debug for Backing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backing::Heap => write!(f, "Heap"),
            Backing::Segment(sb) => f
                .debug_struct("Segment")
                .field("len", &sb.segment.len())
                .field("read_only", &sb.segment.is_read_only())
                .finish(),
        }
    }
}

impl Clone for Backing {
    /// Detaches to heap-backed storage: the growth callback and the
    /// segment itself aren't meaningful to share with an independent
    /// copy.
    fn clone(&self) -> Self {
        Backing::Heap
    }
}

impl DoublesSketch {
    /// Returns a builder, mirroring the fluent-construction convention
    /// used elsewhere in this crate (e.g. an HLL `HllSketchBuilder`).
    pub fn builder() -> DoublesSketchBuilder {
        DoublesSketchBuilder::default()
    }

    fn new_with(k: u16, rng: XorShift64) -> Result<Self, Error> {
        if !(MIN_K..=MAX_K).contains(&k) {
            return Err(Error::arg(format!("k must be within [{MIN_K}, {MAX_K}], got {k}"))
                .with_context("k", k));
        }
        Ok(Self {
            k,
            n: 0,
            bit_pattern: 0,
            base_buffer: Vec::with_capacity(2 * k as usize),
            levels: Vec::new(),
            min_item: None,
            max_item: None,
            rng,
            backing: Backing::Heap,
        })
    }

    /// Views an already-serialized image as a read-only sketch backed
    /// by `segment`. Supports every query; the first [`Self::update`]
    /// that would need to write past what the segment can hold (it's
    /// read-only, so any write at all) transparently detaches the
    /// sketch to heap-backed storage rather than losing the write.
    pub fn wrap(segment: Segment) -> Result<Self, Error> {
        let mut sketch = Self::heapify(segment.as_slice())?;
        sketch.backing = Backing::Segment(SegmentBacking {
            segment,
            request: None,
        });
        Ok(sketch)
    }

    /// Builds a new, empty sketch whose serialized image lives in
    /// `segment`. Once the image outgrows `segment`'s capacity,
    /// `request` is asked for a bigger one: the current image is
    /// copied across and the old segment released through
    /// [`SegmentRequest::release`].
    pub fn writable_wrap(
        k: u16,
        segment: Segment,
        request: impl SegmentRequest + 'static,
    ) -> Result<Self, Error> {
        let mut sketch = Self::new_with(k, XorShift64::default())?;
        sketch.backing = Backing::Segment(SegmentBacking {
            segment,
            request: Some(Box::new(request)),
        });
        sketch.sync_segment();
        Ok(sketch)
    }

    /// Where this sketch's state currently lives.
    pub fn backing_kind(&self) -> BackingKind {
        match &self.backing {
            Backing::Heap => BackingKind::Heap,
            Backing::Segment(_) => BackingKind::Segment,
        }
    }

    /// Byte capacity of the backing segment, or `None` for a
    /// heap-backed sketch.
    pub fn segment_capacity(&self) -> Option<usize> {
        match &self.backing {
            Backing::Heap => None,
            Backing::Segment(sb) => Some(sb.segment.len()),
        }
    }

    /// Mirrors the current serialized image into the backing segment,
    /// growing it through the segment's [`SegmentRequest`] if it no
    /// longer fits. A no-op for heap-backed sketches.
    fn sync_segment(&mut self) {
        if !matches!(self.backing, Backing::Segment(_)) {
            return;
        }
        let bytes = self.serialize().into_bytes();
        let Backing::Segment(sb) = &mut self.backing else {
            unreachable!("checked above");
        };

        if !sb.segment.is_read_only() && bytes.len() <= sb.segment.len() {
            sb.segment
                .copy_from_slice(0, &bytes)
                .expect("writable segment within capacity always accepts a write");
            return;
        }

        match (&mut sb.request, sb.segment.is_read_only()) {
            (Some(request), false) => {
                let mut new_segment = request.request(bytes.len());
                new_segment
                    .copy_from_slice(0, &bytes)
                    .expect("freshly requested segment is writable and large enough");
                let old = std::mem::replace(&mut sb.segment, new_segment);
                request.release(old);
            }
            _ => {
                // No growth callback, or the view is read-only: fall back
                // to heap-backed storage rather than losing the write.
                self.backing = Backing::Heap;
            }
        }
    }

    /// Number of retained items per level, and the error-bound
    /// parameter: normalized rank error is roughly `1.7/k`.
    pub fn k(&self) -> u16 {
        self.k
    }

    /// Total number of items ever passed to [`Self::update`].
    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn min_item(&self) -> Result<f64, Error> {
        self.min_item
            .ok_or_else(|| Error::state("empty sketch has no minimum item"))
    }

    pub fn max_item(&self) -> Result<f64, Error> {
        self.max_item
            .ok_or_else(|| Error::state("empty sketch has no maximum item"))
    }

    /// Updates the sketch with one value. NaN values are silently
    /// dropped, per this crate's input-ignored policy.
    pub fn update(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }

        self.min_item = Some(self.min_item.map_or(value, |m| m.min(value)));
        self.max_item = Some(self.max_item.map_or(value, |m| m.max(value)));
        self.base_buffer.push(value);
        self.n += 1;

        let two_k = 2 * self.k as usize;
        if self.base_buffer.len() == two_k {
            let mut sorted = std::mem::replace(&mut self.base_buffer, Vec::with_capacity(two_k));
            sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite f64"));
            let take_odd = self.rng.next_bool();
            let zipped = zip_half(sorted, take_odd);
            self.propagate_carry_at(0, zipped);
        }

        self.sync_segment();
    }

    /// Carries `payload` (length `k`, sorted) up through the level
    /// cascade starting at `start_level`, merge-and-zipping with any
    /// already-occupied level along the way.
    fn propagate_carry_at(&mut self, start_level: usize, mut payload: Vec<f64>) {
        let mut lvl = start_level;
        loop {
            if lvl >= self.levels.len() {
                self.levels.resize_with(lvl + 1, Vec::new);
            }
            if self.bit_pattern & (1 << lvl) == 0 {
                self.levels[lvl] = payload;
                self.bit_pattern |= 1 << lvl;
                return;
            }
            let existing = std::mem::take(&mut self.levels[lvl]);
            let merged = merge_sorted(existing, payload);
            payload = zip_half(merged, self.rng.next_bool());
            self.bit_pattern &= !(1 << lvl);
            lvl += 1;
        }
    }

    fn sorted_view(&self) -> SortedView {
        let active_levels: Vec<Vec<f64>> = self
            .levels
            .iter()
            .enumerate()
            .map(|(lvl, level)| {
                if self.bit_pattern & (1 << lvl) != 0 {
                    level.clone()
                } else {
                    Vec::new()
                }
            })
            .collect();
        SortedView::build(&self.base_buffer, &active_levels)
    }

    /// Builds the lazily-constructed sorted view over currently
    /// retained items. Every call reflects the sketch's state as of
    /// the call (there is no view invalidation to manage since nothing
    /// is cached across updates).
    pub fn get_sorted_view(&self) -> SortedView {
        self.sorted_view()
    }

    pub fn get_rank(&self, value: f64, criterion: Criterion) -> Result<f64, Error> {
        if self.is_empty() {
            return Err(Error::state("rank query on an empty sketch"));
        }
        if value.is_nan() {
            return Err(Error::arg("rank query value must not be NaN"));
        }
        Ok(self.sorted_view().rank(value, criterion))
    }

    pub fn get_quantile(&self, rank: f64, criterion: Criterion) -> Result<f64, Error> {
        if self.is_empty() {
            return Err(Error::state("quantile query on an empty sketch"));
        }
        if rank.is_nan() || !(0.0..=1.0).contains(&rank) {
            return Err(Error::arg(format!("rank must be within [0,1], got {rank}"))
                .with_context("rank", rank));
        }
        if criterion == Criterion::Exclusive && rank >= 1.0 {
            return Err(Error::arg("rank=1 has no exclusive quantile boundary"));
        }
        if criterion == Criterion::Inclusive {
            if rank == 0.0 {
                return self.min_item();
            }
            if rank == 1.0 {
                return self.max_item();
            }
        }
        Ok(self.sorted_view().quantile(rank, criterion))
    }

    pub fn get_cdf(&self, split_points: &[f64], criterion: Criterion) -> Result<Vec<f64>, Error> {
        if self.is_empty() {
            return Err(Error::state("CDF query on an empty sketch"));
        }
        self.sorted_view().cdf(split_points, criterion)
    }

    pub fn get_pmf(&self, split_points: &[f64], criterion: Criterion) -> Result<Vec<f64>, Error> {
        if self.is_empty() {
            return Err(Error::state("PMF query on an empty sketch"));
        }
        self.sorted_view().pmf(split_points, criterion)
    }

    pub fn get_rank_lower_bound(&self, rank: f64) -> f64 {
        (rank - 2.0 * error_table::normalized_rank_error(self.k, false)).clamp(0.0, 1.0)
    }

    pub fn get_rank_upper_bound(&self, rank: f64) -> f64 {
        (rank + 2.0 * error_table::normalized_rank_error(self.k, false)).clamp(0.0, 1.0)
    }

    pub fn normalized_rank_error(&self, for_pmf: bool) -> f64 {
        error_table::normalized_rank_error(self.k, for_pmf)
    }

    /// Merges `other` into `self`. If `other.k()` is a power-of-two
    /// multiple of `self.k()`, downsamples `other`'s levels first;
    /// equal `k` merges directly; a smaller `self.k()` than what
    /// divides evenly is rejected (callers should downsample `self`
    /// instead).
    pub fn merge(&mut self, other: &Self) -> Result<(), Error> {
        if other.is_empty() {
            return Ok(());
        }
        match other.k.cmp(&self.k) {
            std::cmp::Ordering::Equal => {
                self.merge_same_k(other);
                Ok(())
            }
            std::cmp::Ordering::Greater => {
                if other.k % self.k != 0 {
                    return Err(Error::arg(format!(
                        "cannot downsample: target k={} does not divide source k={}",
                        self.k, other.k
                    )));
                }
                let ratio = (other.k / self.k) as u32;
                if !ratio.is_power_of_two() {
                    return Err(Error::arg(format!(
                        "downsample ratio must be a power of two, got {ratio}"
                    )));
                }
                self.merge_downsample(other, ratio.trailing_zeros() as usize);
                Ok(())
            }
            std::cmp::Ordering::Less => Err(Error::arg(
                "cannot merge a larger-k sketch into a smaller one without downsampling",
            )),
        }
    }

    fn merge_same_k(&mut self, other: &Self) {
        for &value in &other.base_buffer {
            self.update(value);
        }
        for (lvl, level) in other.levels.iter().enumerate() {
            if other.bit_pattern & (1 << lvl) != 0 {
                self.propagate_carry_at(lvl, level.clone());
            }
        }
        self.n += other.n - other.base_buffer.len() as u64;
    }

    fn merge_downsample(&mut self, other: &Self, shift: usize) {
        for &value in &other.base_buffer {
            self.update(value);
        }
        for (lvl, level) in other.levels.iter().enumerate() {
            if other.bit_pattern & (1 << lvl) != 0 {
                let downsampled = downsample_array(level.clone(), shift, &mut self.rng);
                self.propagate_carry_at(lvl + shift, downsampled);
            }
        }
        if let Some(m) = other.min_item {
            self.min_item = Some(self.min_item.map_or(m, |cur| cur.min(m)));
        }
        if let Some(m) = other.max_item {
            self.max_item = Some(self.max_item.map_or(m, |cur| cur.max(m)));
        }
        self.n += other.n - other.base_buffer.len() as u64;
    }

    /// Returns a new sketch holding the same data downsampled to
    /// `new_k`, the single-sketch specialization of the downsampling
    /// merge.
    pub fn down_sample(&self, new_k: u16) -> Result<Self, Error> {
        let mut target = DoublesSketch::new_with(new_k, self.rng)?;
        target.merge(self)?;
        Ok(target)
    }

    /// Returns a clone with no excess buffer capacity. This crate's
    /// in-memory representation never carries slack beyond a level's
    /// exact `k` length or the base buffer's live count, so this is a
    /// cheap no-op beyond `shrink_to_fit`; see `serialization.rs` for
    /// why `to_compact_bytes`/`to_updatable_bytes` share one encoding.
    pub fn compact(&self) -> Self {
        let mut out = self.clone();
        out.base_buffer.shrink_to_fit();
        out.levels.shrink_to_fit();
        out
    }

    pub fn reset(&mut self) {
        self.n = 0;
        self.bit_pattern = 0;
        self.base_buffer.clear();
        self.levels.clear();
        self.min_item = None;
        self.max_item = None;
    }

    pub fn to_compact_bytes(&self) -> Vec<u8> {
        self.serialize().into_bytes()
    }

    pub fn to_updatable_bytes(&self) -> Vec<u8> {
        self.serialize().into_bytes()
    }

    fn serialize(&self) -> SketchBytes {
        let active_levels_len: usize = self
            .levels
            .iter()
            .enumerate()
            .filter(|(lvl, _)| self.bit_pattern & (1 << lvl) != 0)
            .map(|(_, level)| level.len())
            .sum();
        let payload_doubles = self.base_buffer.len() + active_levels_len;
        let mut out = SketchBytes::with_capacity(DATA_START + payload_doubles * 8);

        out.write_u8(PREAMBLE_INTS);
        out.write_u8(SER_VER);
        out.write_u8(Family::QUANTILES.id);
        out.write_u8(if self.is_empty() { FLAG_EMPTY } else { 0 });
        out.write_u16_le(self.k);
        out.write_u16_le(0); // reserved, keeps the preamble 8-byte aligned

        out.write_u64_le(self.n);
        out.write_u64_le(self.bit_pattern);
        out.write_f64_le(self.min_item.unwrap_or(f64::NAN));
        out.write_f64_le(self.max_item.unwrap_or(f64::NAN));
        out.write_u32_le(self.base_buffer.len() as u32);
        out.write_u32_le(0); // reserved

        for &value in &self.base_buffer {
            out.write_f64_le(value);
        }
        for (lvl, level) in self.levels.iter().enumerate() {
            if self.bit_pattern & (1 << lvl) != 0 {
                for &value in level {
                    out.write_f64_le(value);
                }
            }
        }

        out
    }

    pub fn heapify(bytes: &[u8]) -> Result<Self, Error> {
        let mut slice = SketchSlice::new(bytes);
        let _preamble_ints = slice.read_u8("preambleInts")?;
        let ser_ver = slice.read_u8("serVer")?;
        if ser_ver != SER_VER {
            return Err(Error::unsupported_serial_version(SER_VER, ser_ver));
        }
        let family_id = slice.read_u8("familyId")?;
        Family::QUANTILES.validate_id(family_id)?;
        let flags = slice.read_u8("flags")?;
        let k = slice.read_u16_le("k")?;
        let _reserved = slice.read_u16_le("reserved")?;

        let n = slice.read_u64_le("n")?;
        let bit_pattern = slice.read_u64_le("bitPattern")?;
        let min_item = slice.read_f64_le("minItem")?;
        let max_item = slice.read_f64_le("maxItem")?;
        let base_buffer_count = slice.read_u32_le("baseBufferCount")? as usize;
        let _reserved2 = slice.read_u32_le("reserved")?;

        let mut base_buffer = Vec::with_capacity(base_buffer_count);
        for _ in 0..base_buffer_count {
            base_buffer.push(slice.read_f64_le("baseBufferItem")?);
        }

        let k_usize = k as usize;
        let num_levels = 64 - bit_pattern.leading_zeros() as usize;
        let mut levels = Vec::with_capacity(num_levels);
        for lvl in 0..num_levels {
            if bit_pattern & (1 << lvl) != 0 {
                let mut level = Vec::with_capacity(k_usize);
                for _ in 0..k_usize {
                    level.push(slice.read_f64_le("levelItem")?);
                }
                levels.push(level);
            } else {
                levels.push(Vec::new());
            }
        }

        Ok(Self {
            k,
            n,
            bit_pattern,
            base_buffer,
            levels,
            min_item: if flags & FLAG_EMPTY != 0 {
                None
            } else {
                Some(min_item)
            },
            max_item: if flags & FLAG_EMPTY != 0 {
                None
            } else {
                Some(max_item)
            },
            rng: XorShift64::default(),
            backing: Backing::Heap,
        })
    }
}

/// Merges two sorted slices (typically both length `k`) into one
/// sorted vector of their combined length.
fn merge_sorted(a: Vec<f64>, b: Vec<f64>) -> Vec<f64> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let mut ai = a.into_iter().peekable();
    let mut bi = b.into_iter().peekable();
    loop {
        match (ai.peek(), bi.peek()) {
            (Some(&x), Some(&y)) => {
                if x <= y {
                    out.push(ai.next().unwrap());
                } else {
                    out.push(bi.next().unwrap());
                }
            }
            (Some(_), None) => out.push(ai.next().unwrap()),
            (None, Some(_)) => out.push(bi.next().unwrap()),
            (None, None) => break,
        }
    }
    out
}

/// Halves a sorted buffer by keeping every other element, starting at
/// offset `0` or `1` chosen by a single random bit. This is the
/// information-discarding step that lets each surviving item stand in
/// for two, doubling its effective weight.
fn zip_half(sorted: Vec<f64>, take_odd: bool) -> Vec<f64> {
    let offset = if take_odd { 1 } else { 0 };
    sorted
        .into_iter()
        .skip(offset)
        .step_by(2)
        .collect()
}

fn downsample_array(mut items: Vec<f64>, times: usize, rng: &mut XorShift64) -> Vec<f64> {
    for _ in 0..times {
        items = zip_half(items, rng.next_bool());
    }
    items
}

/// Fluent builder for [`DoublesSketch`], following this crate's
/// builder convention for sketch construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct DoublesSketchBuilder {
    k: u16,
    seed: Option<u64>,
}

impl Default for DoublesSketchBuilder {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            seed: None,
        }
    }
}

impl DoublesSketchBuilder {
    pub fn k(mut self, k: u16) -> Self {
        self.k = k;
        self
    }

    /// Seeds the internal merge-and-zip PRNG for deterministic tests.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<DoublesSketch, Error> {
        let rng = match self.seed {
            Some(seed) => XorShift64::seeded(seed),
            None => XorShift64::default(),
        };
        DoublesSketch::new_with(self.k, rng)
    }
}
