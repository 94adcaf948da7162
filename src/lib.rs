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

//! Pairing-based attribute-based signatures over BLS12-381.
//!
//! A signer proves that their attributes satisfy a monotone boolean policy without
//! revealing which attributes were used. Key-policy schemes ([FABS-KP], [RD16-KP])
//! embed the policy in the key; signature-policy schemes ([FABS-SP], [KCGD14-SP])
//! embed the attributes in the key and choose the policy at signing time.
//!
//! [FABS-KP]: schemes::fabs_kp
//! [RD16-KP]: schemes::rd16_kp
//! [FABS-SP]: schemes::fabs_sp
//! [KCGD14-SP]: schemes::kcgd14_sp

#![allow(non_snake_case)]

/// Module for ciphersuites
pub mod ciphersuites;
/// Module for errors
pub mod errors;
/// Module for access policies and span programs
pub mod policy;
/// Module for the signature schemes
pub mod schemes;
/// Module for secret sharing
pub mod sharing;
/// Module for Schnorr proofs
pub mod schnorr;
/// Module for utilities
pub mod utils;
