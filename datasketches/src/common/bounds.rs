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

//! Confidence-interval helpers shared by sketch families.

/// Number of standard deviations used to size a confidence interval.
///
/// Error bound tables are indexed on this count rather than a raw
/// confidence percentage, matching the convention of the underlying
/// relative-error tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumStdDev {
    /// ~68.3% confidence.
    One,
    /// ~95.4% confidence.
    Two,
    /// ~99.7% confidence.
    Three,
}

impl NumStdDev {
    /// The multiplier into the relative-error table column for this level.
    pub fn as_index(self) -> usize {
        match self {
            NumStdDev::One => 0,
            NumStdDev::Two => 1,
            NumStdDev::Three => 2,
        }
    }
}

impl TryFrom<u8> for NumStdDev {
    type Error = crate::error::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(NumStdDev::One),
            2 => Ok(NumStdDev::Two),
            3 => Ok(NumStdDev::Three),
            other => Err(crate::error::Error::arg(format!(
                "numStdDev must be 1, 2, or 3, got {other}"
            ))),
        }
    }
}
