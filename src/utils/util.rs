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

use bls12_381_plus::{G1Projective, Scalar};
use elliptic_curve::hash2curve::{ExpandMsg, Expander};
use ff::{Field, PrimeField};
use rand::{CryptoRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};

use crate::{ciphersuites::AbsCiphersuite, errors::Error};

/// Number of bits of the scalar field modulus
pub const SCALAR_BITS: usize = Scalar::NUM_BITS as usize;

/// Canonical encoding length of a target group element
pub const GT_BYTES: usize = 576;

/// # Description
/// Hashes an octet string to a scalar through `expand_message` of the ciphersuite,
/// reducing `EXPAND_LEN` uniform bytes modulo the group order.
///
/// # Inputs:
/// * `msg_octets` (REQUIRED), the octet string to hash.
/// * `dst` (REQUIRED), domain separation tag.
///
/// # Output:
/// a [`Scalar`] or [`Error`].
pub fn hash_to_scalar<CS: AbsCiphersuite>(msg_octets: &[u8], dst: &[u8]) -> Result<Scalar, Error> {
    let mut uniform_bytes = vec![0u8; CS::EXPAND_LEN];
    CS::Expander::expand_message(&[msg_octets], &[dst], CS::EXPAND_LEN)
        .map_err(|_| Error::HashToScalarError)?
        .fill_bytes(&mut uniform_bytes);

    let okm: &[u8; 48] = uniform_bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::HashToScalarError)?;

    Ok(Scalar::from_okm(okm))
}

/// Hash-to-curve into G1 (`hash_to_curve` with the SSWU random oracle encoding)
pub fn hash_to_g1<CS: AbsCiphersuite>(msg_octets: &[u8], dst: &[u8]) -> G1Projective {
    G1Projective::hash::<CS::Expander>(msg_octets, dst)
}

/// `H(attr) ∈ G1`
pub fn attribute_to_g1<CS: AbsCiphersuite>(attribute: &str) -> G1Projective {
    hash_to_g1::<CS>(attribute.as_bytes(), CS::ATTRIBUTE_TO_G1_DST)
}

/// `H(attr) ∈ Zr`
pub fn attribute_to_scalar<CS: AbsCiphersuite>(attribute: &str) -> Result<Scalar, Error> {
    hash_to_scalar::<CS>(attribute.as_bytes(), CS::ATTRIBUTE_TO_SCALAR_DST)
}

pub fn i2osp(x: usize, x_len: usize) -> Vec<u8> {
    let bytes = (x as u64).to_be_bytes();
    if x_len >= bytes.len() {
        let mut out = vec![0u8; x_len - bytes.len()];
        out.extend_from_slice(&bytes);
        out
    } else {
        bytes[bytes.len() - x_len..].to_vec()
    }
}

pub fn get_random<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    Scalar::random(&mut *rng)
}

pub fn calculate_random_scalars<R: RngCore + CryptoRng>(rng: &mut R, count: usize) -> Vec<Scalar> {
    (0..count).map(|_| get_random(rng)).collect()
}

/// Little-endian bit decomposition of a scalar, always `SCALAR_BITS` long
pub fn scalar_to_bits_le(s: &Scalar) -> Vec<bool> {
    let bytes = s.to_le_bytes();
    (0..SCALAR_BITS)
        .map(|i| (bytes[i / 8] >> (i % 8)) & 1 == 1)
        .collect()
}

/// Deduplicates an attribute list keeping the first occurrence of each name
pub fn dedup_attributes<S: AsRef<str>>(attributes: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for attr in attributes {
        let attr = attr.as_ref();
        if !out.iter().any(|a| a == attr) {
            out.push(attr.to_owned());
        }
    }
    out
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string(value).map_err(|e| Error::SerializationError(e.to_string()))
}

pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, Error> {
    serde_json::from_str(json).map_err(|e| Error::DeserializationError(e.to_string()))
}

/// Serde adapter storing a target group element as the hex of its canonical encoding
pub(crate) mod gt_hex {
    use super::GT_BYTES;
    use bls12_381_plus::Gt;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(gt: &Gt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(gt.to_bytes()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Gt, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(encoded).map_err(D::Error::custom)?;
        let bytes: [u8; GT_BYTES] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("invalid length for a Gt element"))?;
        Option::<Gt>::from(Gt::from_bytes(&bytes)).ok_or_else(|| D::Error::custom("invalid Gt element"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphersuites::{Bls12381Sha256, Bls12381Shake256};

    #[test]
    fn hash_to_scalar_is_deterministic_and_domain_separated() {
        let a = hash_to_scalar::<Bls12381Sha256>(b"attribute", b"DST_A").unwrap();
        let b = hash_to_scalar::<Bls12381Sha256>(b"attribute", b"DST_A").unwrap();
        let c = hash_to_scalar::<Bls12381Sha256>(b"attribute", b"DST_B").unwrap();
        let d = hash_to_scalar::<Bls12381Shake256>(b"attribute", b"DST_A").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn attribute_hashes_differ_per_attribute() {
        assert_ne!(attribute_to_g1::<Bls12381Sha256>("1"), attribute_to_g1::<Bls12381Sha256>("2"));
        assert_ne!(
            attribute_to_scalar::<Bls12381Sha256>("1").unwrap(),
            attribute_to_scalar::<Bls12381Sha256>("2").unwrap()
        );
    }

    #[test]
    fn bits_recompose_to_scalar() {
        let s = Scalar::from(0b1011_0110u64) + Scalar::from(1u64 << 40);
        let bits = scalar_to_bits_le(&s);
        assert_eq!(bits.len(), SCALAR_BITS);
        let mut acc = Scalar::ZERO;
        let mut pow = Scalar::ONE;
        for bit in bits {
            if bit {
                acc += pow;
            }
            pow = pow.double();
        }
        assert_eq!(acc, s);
    }

    #[test]
    fn i2osp_pads_and_truncates() {
        assert_eq!(i2osp(258, 2), vec![1, 2]);
        assert_eq!(i2osp(1, 4), vec![0, 0, 0, 1]);
        assert_eq!(i2osp(7, 10).len(), 10);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_attributes(&["b", "a", "b"]), vec!["b".to_owned(), "a".to_owned()]);
    }
}
