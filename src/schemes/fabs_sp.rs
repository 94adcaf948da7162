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

//! Signature-policy FABS: keys carry attributes only, the policy is chosen when
//! signing and travels with the verification request.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use bls12_381_plus::{pairing, G1Projective, G2Projective, Gt, Scalar};
use group::{Curve, Group};
use log::debug;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::algorithms::{AttributeBasedSignature, PolicyPlacement};
use crate::{
    ciphersuites::{AbsCiphersuite, Bls12381Sha256, Bls12381Shake256},
    errors::Error,
    policy::{AccessPolicy, LeafLabel, MonotoneSpanProgram},
    schnorr::{recompute, Convention, Transcript},
    sharing::PublicCoefficients,
    utils::util::{attribute_to_g1, dedup_attributes, from_json, get_random, gt_hex, to_json},
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FabsSp<CS: AbsCiphersuite>(PhantomData<CS>);

pub type FabsSpSha256 = FabsSp<Bls12381Sha256>;
pub type FabsSpShake256 = FabsSp<Bls12381Shake256>;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FabsSpPublicParameters {
    pub g1: G1Projective,
    pub g2: G2Projective,
    pub g3: G1Projective,
    #[serde(with = "gt_hex")]
    pub e_alpha: Gt,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FabsSpMasterSecret {
    alpha: Scalar,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FabsSpSecretKey {
    sk_1: G1Projective,
    sk_2: BTreeMap<String, G1Projective>,
    sk_3: G2Projective,
}

impl FabsSpSecretKey {
    pub fn attributes(&self) -> Vec<&str> {
        self.sk_2.keys().map(|a| a.as_str()).collect()
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FabsSpSignature {
    A: G1Projective,
    B: G1Projective,
    C: G2Projective,
    c: Scalar,
    s_alpha: Scalar,
    /// One response per row of the policy's span program
    s_i: BTreeMap<LeafLabel, Scalar>,
}

impl FabsSpSignature {
    pub fn to_json(&self) -> Result<String, Error> {
        to_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        from_json(json)
    }
}

/// `g3^(M_i · a) · H(attr_i)` for every row
fn row_bases<CS: AbsCiphersuite>(
    g3: &G1Projective,
    msp: &MonotoneSpanProgram,
    a: &PublicCoefficients,
) -> BTreeMap<LeafLabel, G1Projective> {
    msp.rows()
        .iter()
        .map(|(label, row)| (label.clone(), g3 * a.project(row) + attribute_to_g1::<CS>(label.attribute())))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn challenge<CS: AbsCiphersuite>(
    policy_digest: &Scalar,
    A: &G1Projective,
    B: &G1Projective,
    C: &G2Projective,
    Y: &Gt,
    Z: &Gt,
    W: &G1Projective,
    message: &[u8],
) -> Result<Scalar, Error> {
    let mut transcript = Transcript::new(CS::ID);
    transcript
        .append_scalar(policy_digest)
        .append_g1(A)
        .append_g1(B)
        .append_g2(C)
        .append_gt(Y)
        .append_gt(Z)
        .append_g1(W)
        .append_bytes(message);
    transcript.challenge::<CS>()
}

impl<CS: AbsCiphersuite> FabsSp<CS> {
    fn check(
        mpk: &FabsSpPublicParameters,
        signature: &FabsSpSignature,
        policy: &str,
        message: &[u8],
    ) -> Result<(), &'static str> {
        let msp = AccessPolicy::parse(policy).map_err(|_| "malformed policy")?.to_msp();
        if !signature.s_i.keys().eq(msp.labels()) {
            return Err("responses do not match the policy rows");
        }
        if bool::from(signature.A.is_identity() | signature.B.is_identity() | signature.C.is_identity()) {
            return Err("identity element in signature body");
        }

        let digest = msp.digest::<CS>().map_err(|_| "policy hashing failed")?;
        let a = PublicCoefficients::derive::<CS>(&msp).map_err(|_| "policy hashing failed")?;

        let Y = pairing(&signature.A.to_affine(), &mpk.g2.to_affine())
            - pairing(&signature.B.to_affine(), &signature.C.to_affine());
        if bool::from(Y.is_identity()) {
            return Err("degenerate Y");
        }

        let c = signature.c;
        let Z = recompute(&[mpk.e_alpha * a.first()], &[signature.s_alpha], Y, c, Convention::Subtract);

        let bases = row_bases::<CS>(&mpk.g3, &msp, &a);
        let bases: Vec<G1Projective> = bases.into_values().collect();
        let responses: Vec<Scalar> = signature.s_i.values().copied().collect();
        let W = recompute(&bases, &responses, signature.B, c, Convention::Subtract);

        let c_prime = challenge::<CS>(&digest, &signature.A, &signature.B, &signature.C, &Y, &Z, &W, message)
            .map_err(|_| "challenge hashing failed")?;
        if c_prime != c {
            return Err("challenge mismatch");
        }
        Ok(())
    }
}

impl<CS: AbsCiphersuite> AttributeBasedSignature for FabsSp<CS> {
    const NAME: &'static str = "FABS-SP";
    const PLACEMENT: PolicyPlacement = PolicyPlacement::SignaturePolicy;

    type SetupInput = ();
    type KeyInput = [String];
    type VerifyInput = str;

    type PublicParameters = FabsSpPublicParameters;
    type MasterSecret = FabsSpMasterSecret;
    type SecretKey = FabsSpSecretKey;
    type Signature = FabsSpSignature;

    fn setup<R: RngCore + CryptoRng>(
        _input: &(),
        rng: &mut R,
    ) -> Result<(Self::PublicParameters, Self::MasterSecret), Error> {
        let g1 = G1Projective::random(&mut *rng);
        let g2 = G2Projective::random(&mut *rng);
        let g3 = G1Projective::random(&mut *rng);
        let alpha = get_random(rng);
        let e_alpha = pairing(&g1.to_affine(), &g2.to_affine()) * alpha;

        debug!("{}: setup done", Self::NAME);
        Ok((FabsSpPublicParameters { g1, g2, g3, e_alpha }, FabsSpMasterSecret { alpha }))
    }

    fn keygen<R: RngCore + CryptoRng>(
        mpk: &Self::PublicParameters,
        msk: &Self::MasterSecret,
        attributes: &[String],
        rng: &mut R,
    ) -> Result<Self::SecretKey, Error> {
        let r = get_random(rng);
        let sk_2 = dedup_attributes(attributes)
            .into_iter()
            .map(|attr| {
                let h = attribute_to_g1::<CS>(&attr) * r;
                (attr, h)
            })
            .collect::<BTreeMap<_, _>>();

        debug!("{}: key for {} attributes", Self::NAME, sk_2.len());
        Ok(FabsSpSecretKey {
            sk_1: mpk.g1 * msk.alpha + mpk.g3 * r,
            sk_2,
            sk_3: mpk.g2 * r,
        })
    }

    /// # Description
    /// Signs `message` under `policy` using the key's components for a minimal
    /// satisfying subset of `attributes`. The proof covers every row of the span
    /// program; rows outside the subset get a witness of zero.
    ///
    /// # Output:
    /// a [`FabsSpSignature`] or [`Error`].
    fn sign<R: RngCore + CryptoRng>(
        mpk: &Self::PublicParameters,
        sk: &Self::SecretKey,
        message: &[u8],
        policy: &str,
        attributes: &[String],
        rng: &mut R,
    ) -> Result<Self::Signature, Error> {
        let policy = AccessPolicy::parse(policy)?;
        let pruned = policy.prune_held(attributes, |a| sk.sk_2.contains_key(a))?;

        let mut sk_sum = G1Projective::IDENTITY;
        let mut h_sum = G1Projective::IDENTITY;
        for label in &pruned {
            let component = sk
                .sk_2
                .get(label.attribute())
                .ok_or_else(|| Error::AttributeNotHeld(label.attribute().to_owned()))?;
            sk_sum += component;
            h_sum += attribute_to_g1::<CS>(label.attribute());
        }

        let msp = policy.to_msp();
        let digest = msp.digest::<CS>()?;
        let a = PublicCoefficients::derive::<CS>(&msp)?;
        let a0 = a.first();
        debug!(
            "{}: {} of {} rows used, {} columns",
            Self::NAME,
            pruned.len(),
            msp.num_rows(),
            msp.num_cols()
        );

        let k = get_random(rng);
        let t = get_random(rng);
        let kt = k * t;
        let r_alpha = get_random(rng);
        let r_i: BTreeMap<LeafLabel, Scalar> = msp.labels().map(|l| (l.clone(), get_random(rng))).collect();

        let A = sk.sk_1 * (a0 * kt) + sk_sum * kt;
        let B = mpk.g3 * (a0 * k) + h_sum * k;
        let C = sk.sk_3 * t;

        let Y = mpk.e_alpha * (a0 * kt);
        let Z = mpk.e_alpha * (a0 * r_alpha);
        let bases = row_bases::<CS>(&mpk.g3, &msp, &a);
        let W = bases
            .iter()
            .fold(G1Projective::IDENTITY, |acc, (label, base)| acc + base * r_i[label]);

        let c = challenge::<CS>(&digest, &A, &B, &C, &Y, &Z, &W, message)?;

        let convention = Convention::Subtract;
        let s_i = r_i
            .into_iter()
            .map(|(label, r)| {
                let s = if pruned.contains(&label) { convention.respond(r, k, c) } else { r };
                (label, s)
            })
            .collect();

        Ok(FabsSpSignature { A, B, C, c, s_alpha: convention.respond(r_alpha, kt, c), s_i })
    }

    fn verify(
        mpk: &Self::PublicParameters,
        signature: &Self::Signature,
        policy: &str,
        message: &[u8],
    ) -> bool {
        match Self::check(mpk, signature, policy, message) {
            Ok(()) => true,
            Err(reason) => {
                debug!("{}: verification failed: {}", Self::NAME, reason);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn attrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn key_deduplicates_attributes() {
        let mut rng = StdRng::seed_from_u64(21);
        let (mpk, msk) = FabsSpSha256::setup(&(), &mut rng).unwrap();
        let sk = FabsSpSha256::keygen(&mpk, &msk, &attrs(&["2", "1", "2"]), &mut rng).unwrap();
        assert_eq!(sk.attributes(), vec!["1", "2"]);
    }

    #[test]
    fn signing_with_unheld_attribute_fails() {
        let mut rng = StdRng::seed_from_u64(22);
        let (mpk, msk) = FabsSpSha256::setup(&(), &mut rng).unwrap();
        let sk = FabsSpSha256::keygen(&mpk, &msk, &attrs(&["1"]), &mut rng).unwrap();
        let err = FabsSpSha256::sign(&mpk, &sk, b"m", "1 and 2", &attrs(&["1", "2"]), &mut rng).unwrap_err();
        assert_eq!(err, Error::AttributeNotHeld("2".to_owned()));
    }

    #[test]
    fn signature_is_bound_to_its_policy() {
        let mut rng = StdRng::seed_from_u64(23);
        let (mpk, msk) = FabsSpSha256::setup(&(), &mut rng).unwrap();
        let sk = FabsSpSha256::keygen(&mpk, &msk, &attrs(&["1", "2"]), &mut rng).unwrap();
        let sig = FabsSpSha256::sign(&mpk, &sk, b"m", "1 or 3", &attrs(&["1", "2"]), &mut rng).unwrap();
        assert!(FabsSpSha256::verify(&mpk, &sig, "(1 OR 3)", b"m"));
        assert!(!FabsSpSha256::verify(&mpk, &sig, "1 or 4", b"m"));
        assert!(!FabsSpSha256::verify(&mpk, &sig, "1 and 3", b"m"));
        assert!(!FabsSpSha256::verify(&mpk, &sig, "1 or", b"m"));
    }

    #[test]
    fn extra_claimed_attributes_do_not_block_signing() {
        let mut rng = StdRng::seed_from_u64(24);
        let (mpk, msk) = FabsSpSha256::setup(&(), &mut rng).unwrap();
        let sk = FabsSpSha256::keygen(&mpk, &msk, &attrs(&["3", "4"]), &mut rng).unwrap();
        let policy = "((1 and 2) or (3 and 4))";
        let sig = FabsSpSha256::sign(&mpk, &sk, b"m", policy, &attrs(&["1", "2", "3", "4"]), &mut rng).unwrap();
        assert!(FabsSpSha256::verify(&mpk, &sig, policy, b"m"));
    }

    #[test]
    fn responses_under_the_other_convention_are_rejected() {
        let mut rng = StdRng::seed_from_u64(25);
        let (mpk, msk) = FabsSpSha256::setup(&(), &mut rng).unwrap();
        let sk = FabsSpSha256::keygen(&mpk, &msk, &attrs(&["1", "2"]), &mut rng).unwrap();

        let mut replay = rng.clone();
        let sig = FabsSpSha256::sign(&mpk, &sk, b"m", "1 and 2", &attrs(&["1", "2"]), &mut rng).unwrap();
        let k = get_random(&mut replay);
        let t = get_random(&mut replay);
        let r_alpha = get_random(&mut replay);
        assert_eq!(sig.s_alpha, Convention::Subtract.respond(r_alpha, k * t, sig.c));

        let mut flipped = sig.clone();
        flipped.s_alpha = Convention::Add.respond(r_alpha, k * t, sig.c);
        assert!(!FabsSpSha256::verify(&mpk, &flipped, "1 and 2", b"m"));
        assert!(FabsSpSha256::verify(&mpk, &sig, "1 and 2", b"m"));
    }
}
