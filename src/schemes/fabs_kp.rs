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

//! Key-policy FABS: the access policy is fixed in the secret key, the signer picks
//! the attributes at signing time and the verifier checks against an attribute list.

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
    policy::{AccessPolicy, LeafLabel},
    schnorr::{recompute, Convention, Transcript},
    sharing::ShareVector,
    utils::util::{attribute_to_g1, from_json, get_random, gt_hex, i2osp, to_json},
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FabsKp<CS: AbsCiphersuite>(PhantomData<CS>);

pub type FabsKpSha256 = FabsKp<Bls12381Sha256>;
pub type FabsKpShake256 = FabsKp<Bls12381Shake256>;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FabsKpPublicParameters {
    pub g1: G1Projective,
    pub g2: G2Projective,
    /// `e(g1, g2)^alpha`
    #[serde(with = "gt_hex")]
    pub e_alpha: Gt,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FabsKpMasterSecret {
    alpha: Scalar,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FabsKpSecretKey {
    /// Canonical form of the embedded policy
    policy: String,
    sk_1: G2Projective,
    sk_2: BTreeMap<LeafLabel, G1Projective>,
}

impl FabsKpSecretKey {
    pub fn policy(&self) -> &str {
        &self.policy
    }

    pub fn components(&self) -> &BTreeMap<LeafLabel, G1Projective> {
        &self.sk_2
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FabsKpSignature {
    A: G1Projective,
    B: G1Projective,
    C: G2Projective,
    c: Scalar,
    s_alpha: Scalar,
    s_k: Scalar,
    /// One response per leaf of the attested satisfying set
    s_i: BTreeMap<LeafLabel, Scalar>,
}

impl FabsKpSignature {
    /// Attributes the signature attests to, without repetitions
    pub fn attested_attributes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.s_i.keys().map(|l| l.attribute()).collect();
        out.dedup();
        out
    }

    pub fn to_json(&self) -> Result<String, Error> {
        to_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        from_json(json)
    }
}

#[allow(clippy::too_many_arguments)]
fn challenge<CS: AbsCiphersuite>(
    A: &G1Projective,
    B: &G1Projective,
    C: &G2Projective,
    Y: &Gt,
    Z: &Gt,
    W: &G1Projective,
    labels: &[&LeafLabel],
    message: &[u8],
) -> Result<Scalar, Error> {
    let mut transcript = Transcript::new(CS::ID);
    transcript
        .append_g1(A)
        .append_g1(B)
        .append_g2(C)
        .append_gt(Y)
        .append_gt(Z)
        .append_g1(W);
    transcript.append_bytes(&i2osp(labels.len(), 8));
    for label in labels {
        transcript.append_str(&label.to_string());
    }
    transcript.append_bytes(message);
    transcript.challenge::<CS>()
}

impl<CS: AbsCiphersuite> FabsKp<CS> {
    fn check(
        mpk: &FabsKpPublicParameters,
        signature: &FabsKpSignature,
        attributes: &[String],
        message: &[u8],
    ) -> Result<(), &'static str> {
        if signature.s_i.is_empty() {
            return Err("no attested attributes");
        }
        if signature
            .s_i
            .keys()
            .any(|l| !attributes.iter().any(|a| a == l.attribute()))
        {
            return Err("attested attribute outside the presented set");
        }
        if bool::from(signature.A.is_identity() | signature.B.is_identity() | signature.C.is_identity()) {
            return Err("identity element in signature body");
        }

        let Y = pairing(&signature.A.to_affine(), &mpk.g2.to_affine())
            - pairing(&signature.B.to_affine(), &signature.C.to_affine());
        if bool::from(Y.is_identity()) {
            return Err("degenerate Y");
        }

        let c = signature.c;
        let Z = recompute(&[mpk.e_alpha], &[signature.s_alpha], Y, c, Convention::Subtract);

        let mut bases = vec![mpk.g1];
        let mut responses = vec![signature.s_k];
        for (label, s) in &signature.s_i {
            bases.push(attribute_to_g1::<CS>(label.attribute()));
            responses.push(*s);
        }
        let W = recompute(&bases, &responses, signature.B, c, Convention::Subtract);

        let labels: Vec<&LeafLabel> = signature.s_i.keys().collect();
        let c_prime = challenge::<CS>(&signature.A, &signature.B, &signature.C, &Y, &Z, &W, &labels, message)
            .map_err(|_| "challenge hashing failed")?;

        if c_prime != c {
            return Err("challenge mismatch");
        }
        Ok(())
    }
}

impl<CS: AbsCiphersuite> AttributeBasedSignature for FabsKp<CS> {
    const NAME: &'static str = "FABS-KP";
    const PLACEMENT: PolicyPlacement = PolicyPlacement::KeyPolicy;

    type SetupInput = ();
    type KeyInput = str;
    type VerifyInput = [String];

    type PublicParameters = FabsKpPublicParameters;
    type MasterSecret = FabsKpMasterSecret;
    type SecretKey = FabsKpSecretKey;
    type Signature = FabsKpSignature;

    fn setup<R: RngCore + CryptoRng>(
        _input: &(),
        rng: &mut R,
    ) -> Result<(Self::PublicParameters, Self::MasterSecret), Error> {
        let g1 = G1Projective::random(&mut *rng);
        let g2 = G2Projective::random(&mut *rng);
        let alpha = get_random(rng);
        let e_alpha = pairing(&g1.to_affine(), &g2.to_affine()) * alpha;

        debug!("{}: setup done", Self::NAME);
        Ok((FabsKpPublicParameters { g1, g2, e_alpha }, FabsKpMasterSecret { alpha }))
    }

    /// # Description
    /// Issues a key for `policy`: a share vector with `v[0] = alpha + r` is dealt over
    /// the rows of the policy's span program and each share is bound to its attribute
    /// with `H(attr)^r`.
    fn keygen<R: RngCore + CryptoRng>(
        mpk: &Self::PublicParameters,
        msk: &Self::MasterSecret,
        policy: &str,
        rng: &mut R,
    ) -> Result<Self::SecretKey, Error> {
        let policy = AccessPolicy::parse(policy)?;
        let msp = policy.to_msp();

        let r = get_random(rng);
        let v = ShareVector::new(msp.num_cols(), msk.alpha + r, rng);

        let sk_2 = v
            .shares(&msp)
            .into_iter()
            .map(|(label, lambda)| {
                let h = attribute_to_g1::<CS>(label.attribute());
                (label, mpk.g1 * lambda + h * r)
            })
            .collect();

        debug!("{}: key for {} rows, {} columns", Self::NAME, msp.num_rows(), msp.num_cols());
        Ok(FabsKpSecretKey { policy: policy.to_string(), sk_1: mpk.g2 * r, sk_2 })
    }

    fn sign<R: RngCore + CryptoRng>(
        mpk: &Self::PublicParameters,
        sk: &Self::SecretKey,
        message: &[u8],
        policy: &str,
        attributes: &[String],
        rng: &mut R,
    ) -> Result<Self::Signature, Error> {
        let policy = AccessPolicy::parse(policy)?;
        if policy.to_string() != sk.policy {
            return Err(Error::PolicyMismatch);
        }
        let pruned = policy.prune(attributes).ok_or(Error::PolicyNotSatisfied)?;
        debug!("{}: {} leaves satisfy the policy", Self::NAME, pruned.len());

        let mut sk_sum = G1Projective::IDENTITY;
        let mut hashes: BTreeMap<LeafLabel, G1Projective> = BTreeMap::new();
        for label in pruned {
            let component = sk
                .sk_2
                .get(&label)
                .ok_or_else(|| Error::SignatureGenerationError(format!("no key component for {}", label)))?;
            sk_sum += component;
            let h = attribute_to_g1::<CS>(label.attribute());
            hashes.insert(label, h);
        }
        let h_sum = hashes.values().fold(G1Projective::IDENTITY, |acc, h| acc + h);

        let k = get_random(rng);
        let t = get_random(rng);
        let kt = k * t;
        let r_alpha = get_random(rng);
        let r_k = get_random(rng);
        let r_i: BTreeMap<LeafLabel, Scalar> = hashes.keys().map(|l| (l.clone(), get_random(rng))).collect();

        let A = sk_sum * kt;
        let B = (mpk.g1 + h_sum) * k;
        let C = sk.sk_1 * t;

        let Y = mpk.e_alpha * kt;
        let Z = mpk.e_alpha * r_alpha;
        let W = hashes
            .iter()
            .fold(mpk.g1 * r_k, |acc, (label, h)| acc + h * r_i[label]);

        let labels: Vec<&LeafLabel> = hashes.keys().collect();
        let c = challenge::<CS>(&A, &B, &C, &Y, &Z, &W, &labels, message)?;

        let convention = Convention::Subtract;
        let s_i = r_i
            .into_iter()
            .map(|(label, r)| (label, convention.respond(r, k, c)))
            .collect();

        Ok(FabsKpSignature {
            A,
            B,
            C,
            c,
            s_alpha: convention.respond(r_alpha, kt, c),
            s_k: convention.respond(r_k, k, c),
            s_i,
        })
    }

    fn verify(
        mpk: &Self::PublicParameters,
        signature: &Self::Signature,
        attributes: &[String],
        message: &[u8],
    ) -> bool {
        match Self::check(mpk, signature, attributes, message) {
            Ok(()) => true,
            Err(reason) => {
                debug!("{}: verification failed: {}", Self::NAME, reason);
                false
            }
        }
    }
}
