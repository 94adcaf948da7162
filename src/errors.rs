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

use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed access policy: {0}")]
    MalformedPolicy(String),
    #[error("Policy not satisfied by the presented attributes")]
    PolicyNotSatisfied,
    #[error("Policy does not match the one embedded in the secret key")]
    PolicyMismatch,
    /// The large-universe bound `n` fixed at setup is too small for the pruned attribute set
    #[error("Parameter bound exceeded: {required} roots required, bound is {bound}")]
    ParameterBoundExceeded { required: usize, bound: usize },
    #[error("Attribute not in the attribute universe: {0}")]
    UnknownAttribute(String),
    #[error("Attribute not held by the secret key: {0}")]
    AttributeNotHeld(String),
    #[error("Error during setup")]
    SetupError(String),
    #[error("Error during key generation")]
    KeyGenError(String),
    #[error("Error during computation of a Signature")]
    SignatureGenerationError(String),
    #[error("Error during hash to scalar computation")]
    HashToScalarError,
    #[error("Error during serialization")]
    SerializationError(String),
    #[error("Error during deserialization")]
    DeserializationError(String),
}
