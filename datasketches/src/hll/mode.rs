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

//! The internal state of an [`super::sketch::HllSketch`] as it moves
//! through the LIST -> SET -> HLL phase transitions.

use crate::hll::HllType;
use crate::hll::array4::Array4;
use crate::hll::array6::Array6;
use crate::hll::array8::Array8;
use crate::hll::list::List;
use crate::hll::set::Set;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    List { list: List, hll_type: HllType },
    Set { set: Set, hll_type: HllType },
    Array4(Array4),
    Array6(Array6),
    Array8(Array8),
}

impl Mode {
    pub fn hll_type(&self) -> HllType {
        match self {
            Mode::List { hll_type, .. } => *hll_type,
            Mode::Set { hll_type, .. } => *hll_type,
            Mode::Array4(_) => HllType::Hll4,
            Mode::Array6(_) => HllType::Hll6,
            Mode::Array8(_) => HllType::Hll8,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Mode::List { list, .. } => list.is_empty(),
            Mode::Set { set, .. } => set.is_empty(),
            Mode::Array4(a) => a.estimate() == 0.0,
            Mode::Array6(a) => a.estimate() == 0.0,
            Mode::Array8(a) => a.estimate() == 0.0,
        }
    }

    pub fn estimate(&self) -> f64 {
        match self {
            Mode::List { list, .. } => list.container().estimate(),
            Mode::Set { set, .. } => set.container().estimate(),
            Mode::Array4(a) => a.estimate(),
            Mode::Array6(a) => a.estimate(),
            Mode::Array8(a) => a.estimate(),
        }
    }
}
