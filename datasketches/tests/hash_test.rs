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

use datasketches::hash::hash_128;

#[test]
fn hashes_the_documented_test_vector() {
    let key = "The quick brown fox jumps over the lazy dog";
    let (h1, h2) = hash_128(key.as_bytes(), 0);
    assert_eq!(h1, 0xe34bbc7bbc071b6c);
    assert_eq!(h2, 0x7a433ca9c49a9347);
}

#[test]
fn hash_is_stable_across_repeated_calls() {
    let key = b"datasketches";
    assert_eq!(hash_128(key, 42), hash_128(key, 42));
}

#[test]
fn different_seeds_produce_different_hashes() {
    let key = b"datasketches";
    assert_ne!(hash_128(key, 0), hash_128(key, 1));
}
