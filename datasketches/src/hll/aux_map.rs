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

//! Sparse overflow table for HLL_4 registers whose true value exceeds
//! `curMin + 14`. Open-addressed by slot, with geometric growth exactly
//! like the coupon hash set.

use crate::error::Error;

const LG_INIT_SIZE: u32 = 2;
const EMPTY_SLOT: u32 = u32::MAX;

/// Sparse `slot -> value` overflow table backing HLL_4's exception path.
pub struct AuxMap {
    lg_config_k: u8,
    lg_size: u32,
    slots: Box<[u32]>,
    values: Box<[u8]>,
    len: usize,
}

impl AuxMap {
    pub fn new(lg_config_k: u8) -> Self {
        Self::with_lg_size(lg_config_k, LG_INIT_SIZE)
    }

    fn with_lg_size(lg_config_k: u8, lg_size: u32) -> Self {
        let cap = 1usize << lg_size;
        Self {
            lg_config_k,
            lg_size,
            slots: vec![EMPTY_SLOT; cap].into_boxed_slice(),
            values: vec![0u8; cap].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn probe_mask(&self) -> u32 {
        (1 << self.lg_size) - 1
    }

    fn find_slot(&self, slot: u32) -> Result<usize, usize> {
        let mask = self.probe_mask();
        let mut probe = slot & mask;
        let stride = ((slot >> self.lg_size) | 1) & mask;
        loop {
            let at = probe as usize;
            if self.slots[at] == EMPTY_SLOT {
                return Err(at);
            }
            if self.slots[at] == slot {
                return Ok(at);
            }
            probe = (probe + stride) & mask;
        }
    }

    /// Unconditional insert used by internal bookkeeping (e.g. when
    /// `curMin` shifts and an exception remains an exception).
    pub fn insert(&mut self, slot: u32, value: u8) {
        if (self.len as f64) >= 0.75 * self.slots.len() as f64 {
            self.grow(self.lg_size + 1);
        }
        match self.find_slot(slot) {
            Ok(at) => self.values[at] = value,
            Err(at) => {
                self.slots[at] = slot;
                self.values[at] = value;
                self.len += 1;
            }
        }
    }

    /// Unconditional replace used by internal bookkeeping.
    pub fn replace(&mut self, slot: u32, value: u8) {
        self.insert(slot, value);
    }

    pub fn get(&self, slot: u32) -> Option<u8> {
        match self.find_slot(slot) {
            Ok(at) => Some(self.values[at]),
            Err(_) => None,
        }
    }

    /// Adds `slot -> value`, failing if `slot` is already present.
    pub fn must_add(&mut self, slot: u32, value: u8) -> Result<(), Error> {
        if self.get(slot).is_some() {
            return Err(Error::state("aux map slot already present").with_context("slot", slot));
        }
        self.insert(slot, value);
        Ok(())
    }

    /// Replaces the value stored for `slot`, failing if absent.
    pub fn must_replace(&mut self, slot: u32, value: u8) -> Result<(), Error> {
        if self.get(slot).is_none() {
            return Err(Error::state("aux map slot absent").with_context("slot", slot));
        }
        self.insert(slot, value);
        Ok(())
    }

    /// Returns the value stored for `slot`, failing if absent.
    pub fn must_find_value_for(&self, slot: u32) -> Result<u8, Error> {
        self.get(slot)
            .ok_or_else(|| Error::state("aux map slot absent").with_context("slot", slot))
    }

    /// Removes `slot`, if present. Used when a shifting `curMin`
    /// brings a former exception back within nibble range.
    pub fn remove(&mut self, slot: u32) {
        if let Ok(at) = self.find_slot(slot) {
            self.slots[at] = EMPTY_SLOT;
            self.values[at] = 0;
            self.len -= 1;
            // Re-insert every entry that shares this slot's probe
            // chain so gaps left by the tombstone don't break lookups.
            let tail: Vec<_> = self.iter().collect();
            let mut rebuilt = Self::with_lg_size(self.lg_config_k, self.lg_size);
            for (s, v) in tail {
                rebuilt.insert(s, v);
            }
            *self = rebuilt;
        }
    }

    fn grow(&mut self, lg_size: u32) {
        let mut grown = Self::with_lg_size(self.lg_config_k, lg_size);
        for (slot, value) in self.iter() {
            grown.insert(slot, value);
        }
        *self = grown;
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.slots
            .iter()
            .zip(self.values.iter())
            .filter(|(s, _)| **s != EMPTY_SLOT)
            .map(|(s, v)| (*s, *v))
    }
}

impl IntoIterator for AuxMap {
    type Item = (u32, u8);
    type IntoIter = std::vec::IntoIter<(u32, u8)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter().collect::<Vec<_>>().into_iter()
    }
}
