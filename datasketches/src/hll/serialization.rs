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

//! Byte-offset layout shared by the HLL preamble across LIST, SET and
//! all three dense array encodings.

/// Preamble ints for the dense array encodings (10 x 4-byte words,
/// i.e. 40 bytes: common preamble + HIP state + cur_min/num_at_cur_min
/// + aux count).
pub const HLL_PREINTS: u8 = 10;
/// Preamble ints for LIST mode (compact: just the common header).
pub const LIST_PREINTS: u8 = 1;
/// Preamble ints for SET mode.
pub const SET_PREINTS: u8 = 1;

pub const SER_VER: u8 = 1;

pub const PREAMBLE_INTS_BYTE: usize = 0;
pub const SER_VER_BYTE: usize = 1;
pub const FAMILY_BYTE: usize = 2;
pub const LG_K_BYTE: usize = 3;
pub const LG_ARR_BYTE: usize = 4;
pub const FLAGS_BYTE: usize = 5;
pub const HLL_CUR_MIN_BYTE: usize = 6;
pub const MODE_BYTE: usize = 7;

pub const HIP_ACCUM_DOUBLE_BYTE: usize = 8;
pub const KXQ0_DOUBLE_BYTE: usize = 16;
pub const KXQ1_DOUBLE_BYTE: usize = 24;
pub const CUR_MIN_COUNT_INT_BYTE: usize = 32;
pub const AUX_COUNT_BYTE: usize = 36;
pub const HLL_BYTE_ARR_START: usize = 40;

pub const OUT_OF_ORDER_FLAG_MASK: u8 = 16;

/// `Mode` tag byte values encoded at [`MODE_BYTE`].
pub mod mode_tag {
    pub const LIST: u8 = 0;
    pub const SET: u8 = 1;
    pub const HLL4: u8 = 2 | (0 << 2);
    pub const HLL6: u8 = 2 | (1 << 2);
    pub const HLL8: u8 = 2 | (2 << 2);
}
