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

//! Byte-addressable storage abstraction shared by both sketch families.
//!
//! A sketch is either on-heap (owns its typed arrays directly) or
//! segment-backed (views a caller-provided byte-addressable region). This
//! module models the latter: primitive get/set at byte offsets, a
//! read-only flag enforced at every mutating call, and a growth path that
//! asks a `SegmentRequest` collaborator for a larger region when the
//! current one is too small for a promoted phase.

use crate::error::Error;

/// A byte-addressable region that sketches can read from and, if not
/// read-only, write into at arbitrary offsets.
///
/// The in-repo implementation backs every segment with a `Vec<u8>`; a
/// true off-heap/arena-backed segment would implement the same primitive
/// get/set contract over foreign memory without changing call sites.
#[derive(Debug, Clone)]
pub struct Segment {
    bytes: Vec<u8>,
    read_only: bool,
}

impl Segment {
    /// Wraps `bytes` as a writable segment.
    pub fn writable(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            read_only: false,
        }
    }

    /// Wraps `bytes` as a read-only segment view.
    pub fn read_only(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            read_only: true,
        }
    }

    /// Allocates a new writable, zero-filled segment of `len` bytes.
    pub fn allocate(len: usize) -> Self {
        Self::writable(vec![0u8; len])
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    fn check_writable(&self) -> Result<(), Error> {
        if self.read_only {
            Err(Error::read_only(
                "attempted to mutate a read-only segment view",
            ))
        } else {
            Ok(())
        }
    }

    pub fn get_u8(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    pub fn set_u8(&mut self, offset: usize, value: u8) -> Result<(), Error> {
        self.check_writable()?;
        self.bytes[offset] = value;
        Ok(())
    }

    pub fn get_u16_le(&self, offset: usize) -> u16 {
        u16::from_le_bytes(self.bytes[offset..offset + 2].try_into().unwrap())
    }

    pub fn set_u16_le(&mut self, offset: usize, value: u16) -> Result<(), Error> {
        self.check_writable()?;
        self.bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn get_u32_le(&self, offset: usize) -> u32 {
        u32::from_le_bytes(self.bytes[offset..offset + 4].try_into().unwrap())
    }

    pub fn set_u32_le(&mut self, offset: usize, value: u32) -> Result<(), Error> {
        self.check_writable()?;
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn get_u64_le(&self, offset: usize) -> u64 {
        u64::from_le_bytes(self.bytes[offset..offset + 8].try_into().unwrap())
    }

    pub fn set_u64_le(&mut self, offset: usize, value: u64) -> Result<(), Error> {
        self.check_writable()?;
        self.bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn get_f64_le(&self, offset: usize) -> f64 {
        f64::from_le_bytes(self.bytes[offset..offset + 8].try_into().unwrap())
    }

    pub fn set_f64_le(&mut self, offset: usize, value: f64) -> Result<(), Error> {
        self.check_writable()?;
        self.bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn copy_from_slice(&mut self, offset: usize, src: &[u8]) -> Result<(), Error> {
        self.check_writable()?;
        self.bytes[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }
}

/// A collaborator that grants larger writable segments on demand and
/// reclaims the old one once the sketch has migrated its state.
///
/// If a sketch is not given a `SegmentRequest`, growth transparently
/// falls back to on-heap allocation via [`Segment::allocate`].
pub trait SegmentRequest {
    /// Returns a new writable segment of at least `min_bytes`.
    fn request(&mut self, min_bytes: usize) -> Segment;

    /// Signals that `old` is no longer needed and may be released.
    fn release(&mut self, old: Segment) {
        drop(old);
    }
}

/// The two places a sketch's state can live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingKind {
    /// The sketch owns plain Rust collections.
    Heap,
    /// The sketch's state lives inside a [`Segment`].
    Segment,
}

/// A [`SegmentRequest`] that satisfies growth with plain heap
/// allocation, sized exactly to what was asked for. Useful as a
/// default growth policy, and in tests that exercise the growth
/// contract without a real off-heap arena behind it.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapSegmentRequest;

impl SegmentRequest for HeapSegmentRequest {
    fn request(&mut self, min_bytes: usize) -> Segment {
        Segment::allocate(min_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_segment_rejects_writes() {
        let mut seg = Segment::read_only(vec![0u8; 8]);
        let err = seg.set_u8(0, 1).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ReadOnly);
    }

    #[test]
    fn round_trips_primitives() {
        let mut seg = Segment::allocate(16);
        seg.set_u64_le(0, 0x0102030405060708).unwrap();
        assert_eq!(seg.get_u64_le(0), 0x0102030405060708);
        seg.set_f64_le(8, 3.5).unwrap();
        assert_eq!(seg.get_f64_le(8), 3.5);
    }

    #[test]
    fn heap_segment_request_grants_exact_size() {
        let mut request = HeapSegmentRequest;
        let segment = request.request(64);
        assert_eq!(segment.len(), 64);
        assert!(!segment.is_read_only());
    }
}
