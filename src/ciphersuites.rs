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

//! Ciphersuites fix the hash function and the domain separation tags used by every
//! hash-to-scalar and hash-to-G1 call of the schemes. Two signatures produced under
//! different ciphersuites never verify against each other.

use digest::HashMarker;
use elliptic_curve::hash2curve::{ExpandMsg, ExpandMsgXmd, ExpandMsgXof};
use sha2::Sha256;
use sha3::Shake256;

pub trait AbsCiphersuite: 'static + Eq {
    const ID: &'static [u8];
    /// Hash of an attribute name into G1
    const ATTRIBUTE_TO_G1_DST: &'static [u8];
    /// Hash of an attribute name into the scalar field
    const ATTRIBUTE_TO_SCALAR_DST: &'static [u8];
    /// Fiat-Shamir challenge
    const CHALLENGE_DST: &'static [u8];
    /// Commitment to a monotone span program
    const POLICY_DST: &'static [u8];
    /// Message digest bound into RD16 signatures
    const MESSAGE_DST: &'static [u8];
    /// Hash of a linkability scope into G1
    const SCOPE_DST: &'static [u8];
    const EXPAND_LEN: usize = 48;
    type HashAlg: HashMarker;
    type Expander: for<'a> ExpandMsg<'a>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bls12381Sha256;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bls12381Shake256;

impl AbsCiphersuite for Bls12381Sha256 {
    const ID: &'static [u8] = b"ABS_BLS12381G1_XMD:SHA-256_SSWU_RO_";
    const ATTRIBUTE_TO_G1_DST: &'static [u8] = b"ABS_BLS12381G1_XMD:SHA-256_SSWU_RO_ATTR_G1_";
    const ATTRIBUTE_TO_SCALAR_DST: &'static [u8] = b"ABS_BLS12381G1_XMD:SHA-256_SSWU_RO_ATTR_H2S_";
    const CHALLENGE_DST: &'static [u8] = b"ABS_BLS12381G1_XMD:SHA-256_SSWU_RO_CHALLENGE_H2S_";
    const POLICY_DST: &'static [u8] = b"ABS_BLS12381G1_XMD:SHA-256_SSWU_RO_POLICY_H2S_";
    const MESSAGE_DST: &'static [u8] = b"ABS_BLS12381G1_XMD:SHA-256_SSWU_RO_MSG_H2S_";
    const SCOPE_DST: &'static [u8] = b"ABS_BLS12381G1_XMD:SHA-256_SSWU_RO_SCOPE_G1_";
    type HashAlg = Sha256;
    type Expander = ExpandMsgXmd<Self::HashAlg>;
}

impl AbsCiphersuite for Bls12381Shake256 {
    const ID: &'static [u8] = b"ABS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_";
    const ATTRIBUTE_TO_G1_DST: &'static [u8] = b"ABS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_ATTR_G1_";
    const ATTRIBUTE_TO_SCALAR_DST: &'static [u8] = b"ABS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_ATTR_H2S_";
    const CHALLENGE_DST: &'static [u8] = b"ABS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_CHALLENGE_H2S_";
    const POLICY_DST: &'static [u8] = b"ABS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_POLICY_H2S_";
    const MESSAGE_DST: &'static [u8] = b"ABS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_MSG_H2S_";
    const SCOPE_DST: &'static [u8] = b"ABS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_SCOPE_G1_";
    type HashAlg = Shake256;
    type Expander = ExpandMsgXof<Self::HashAlg>;
}
