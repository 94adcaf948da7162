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

//! The four attribute-based signature schemes. Each one is generic over an
//! [`AbsCiphersuite`](crate::ciphersuites::AbsCiphersuite) and can be turned off
//! through its Cargo feature:
//! ```toml
//! zkabs = { version = "0.1", default-features = false, features = ["fabs_sp"] }
//! ```

/// Module for the common scheme interface
pub mod algorithms;
#[cfg(feature = "fabs_kp")]
/// Module for key-policy FABS
pub mod fabs_kp;
#[cfg(feature = "fabs_sp")]
/// Module for signature-policy FABS
pub mod fabs_sp;
#[cfg(feature = "kcgd14_sp")]
/// Module for the linkable signature-policy scheme
pub mod kcgd14_sp;
#[cfg(feature = "rd16_kp")]
/// Module for the large-universe key-policy scheme
pub mod rd16_kp;
