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

use rand::{CryptoRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::Error;

/// Where the access policy is fixed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyPlacement {
    /// Policy embedded in the secret key, attributes chosen at signing time
    KeyPolicy,
    /// Attributes embedded in the secret key, policy chosen at signing time
    SignaturePolicy,
}

/// Common interface of the attribute-based signature schemes.
///
/// Key-policy schemes take a policy string at key generation and verify against an
/// attribute list; signature-policy schemes do the opposite. The input types make
/// the placement explicit.
pub trait AttributeBasedSignature: Sized + 'static {
    const NAME: &'static str;
    const PLACEMENT: PolicyPlacement;

    /// Setup argument: nothing, a universe bound, or an attribute universe
    type SetupInput: ?Sized;
    type KeyInput: ?Sized;
    type VerifyInput: ?Sized;

    type PublicParameters: Clone + Serialize + DeserializeOwned;
    type MasterSecret: Clone + Serialize + DeserializeOwned;
    type SecretKey: Clone + Serialize + DeserializeOwned;
    type Signature: Clone + Serialize + DeserializeOwned;

    fn setup<R: RngCore + CryptoRng>(
        input: &Self::SetupInput,
        rng: &mut R,
    ) -> Result<(Self::PublicParameters, Self::MasterSecret), Error>;

    fn keygen<R: RngCore + CryptoRng>(
        mpk: &Self::PublicParameters,
        msk: &Self::MasterSecret,
        input: &Self::KeyInput,
        rng: &mut R,
    ) -> Result<Self::SecretKey, Error>;

    fn sign<R: RngCore + CryptoRng>(
        mpk: &Self::PublicParameters,
        sk: &Self::SecretKey,
        message: &[u8],
        policy: &str,
        attributes: &[String],
        rng: &mut R,
    ) -> Result<Self::Signature, Error>;

    /// Returns `false` on any failure, without telling which check failed
    fn verify(
        mpk: &Self::PublicParameters,
        signature: &Self::Signature,
        input: &Self::VerifyInput,
        message: &[u8],
    ) -> bool;
}
