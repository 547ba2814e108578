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

use std::io;
use std::io::Cursor;
use std::io::Read;

use crate::error::Error;

/// A cursor over a borrowed byte slice with typed little-endian readers.
///
/// Every read maps an underlying `io::Error` (always an unexpected end of
/// the slice, since reads are always fixed-size) to a `MalformedDeserializeData`
/// error tagged with the field name being decoded.
pub(crate) struct SketchSlice<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> SketchSlice<'a> {
    pub fn new(slice: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(slice),
        }
    }

    pub fn remaining(&self) -> usize {
        let pos = self.cursor.position() as usize;
        self.cursor.get_ref().len().saturating_sub(pos)
    }

    fn read_exact_field(&mut self, field: &'static str, buf: &mut [u8]) -> Result<(), Error> {
        self.cursor
            .read_exact(buf)
            .map_err(|e| Error::insufficient_data_of(field, io_err(e)))
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.read_exact_field(field, &mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16_le(&mut self, field: &'static str) -> Result<u16, Error> {
        let mut buf = [0u8; 2];
        self.read_exact_field(field, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_u32_le(&mut self, field: &'static str) -> Result<u32, Error> {
        let mut buf = [0u8; 4];
        self.read_exact_field(field, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_i32_le(&mut self, field: &'static str) -> Result<i32, Error> {
        let mut buf = [0u8; 4];
        self.read_exact_field(field, &mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    pub fn read_u64_le(&mut self, field: &'static str) -> Result<u64, Error> {
        let mut buf = [0u8; 8];
        self.read_exact_field(field, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_f64_le(&mut self, field: &'static str) -> Result<f64, Error> {
        let mut buf = [0u8; 8];
        self.read_exact_field(field, &mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    pub fn read_vec(&mut self, field: &'static str, len: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0u8; len];
        self.read_exact_field(field, &mut buf)?;
        Ok(buf)
    }
}

fn io_err(e: io::Error) -> String {
    e.to_string()
}
