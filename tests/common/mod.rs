// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(dead_code)]

use bls12_381_plus::Scalar;
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use serde::Serialize;
use serde_json::Value;

pub const ATTR_UNIVERSE: [&str; 4] = ["1", "2", "3", "4"];
pub const ATTR_LIST: [&str; 2] = ["1", "2"];
pub const POLICY: &str = "((1 and 2) or (3 and 4))";
pub const MESSAGE: &[u8] = b"hello world";

pub const TRIALS: usize = 100;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn attrs(list: &[&str]) -> Vec<String> {
    list.iter().map(|a| a.to_string()).collect()
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A satisfying attribute set for `POLICY`, picked at random
pub fn random_satisfying_set<R: RngCore>(rng: &mut R) -> Vec<String> {
    match rng.gen_range(0..4) {
        0 => attrs(&["1", "2"]),
        1 => attrs(&["3", "4"]),
        2 => attrs(&["4", "3", "1"]),
        _ => attrs(&ATTR_UNIVERSE),
    }
}

pub fn random_message<R: RngCore>(rng: &mut R) -> Vec<u8> {
    let len = rng.gen_range(0..64);
    (0..len).map(|_| rng.gen()).collect()
}

/// Copies field `field` of `donor` into `target`, both serialized to JSON
pub fn swap_field<T: Serialize>(target: &T, donor: &T, field: &str) -> String {
    let mut target = serde_json::to_value(target).unwrap();
    let donor = serde_json::to_value(donor).unwrap();
    target[field] = donor[field].clone();
    target.to_string()
}

/// Overwrites field `field` of `target` with `value`
pub fn replace_field<T: Serialize, V: Serialize>(target: &T, field: &str, value: &V) -> String {
    let mut target = serde_json::to_value(target).unwrap();
    target[field] = serde_json::to_value(value).unwrap();
    target.to_string()
}

/// Replaces the first entry of a JSON map field with the first entry of the donor's
pub fn swap_first_map_entry<T: Serialize>(target: &T, donor: &T, field: &str) -> String {
    let mut target = serde_json::to_value(target).unwrap();
    let donor = serde_json::to_value(donor).unwrap();
    if let (Value::Object(t), Value::Object(d)) = (&mut target[field], &donor[field]) {
        let (key, _) = t.iter().next().map(|(k, v)| (k.clone(), v.clone())).unwrap();
        let value = d.get(&key).unwrap().clone();
        t.insert(key, value);
    }
    target.to_string()
}

/// Sets every listed scalar field to zero; map fields get all their entries zeroed
pub fn zero_scalars<T: Serialize>(target: &T, fields: &[&str]) -> String {
    let mut target = serde_json::to_value(target).unwrap();
    let zero = serde_json::to_value(Scalar::ZERO).unwrap();
    for field in fields {
        match &mut target[*field] {
            Value::Object(entries) => entries.values_mut().for_each(|v| *v = zero.clone()),
            value => *value = zero.clone(),
        }
    }
    target.to_string()
}
