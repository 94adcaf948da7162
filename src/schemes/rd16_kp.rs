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

//! Large-universe key-policy ABS.
//!
//! Attributes are hashed to scalars and never registered at setup. A signature over
//! a set of attributes uses the polynomial vanishing on their hashes; the public
//! generators `V` bound its degree to the `n` given at setup. The message enters
//! through a Waters-style hash `u0 + Σ u_b · bit_b(h)` over the bits of a scalar
//! digest.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use bls12_381_plus::{multi_miller_loop, pairing, G1Projective, G2Prepared, G2Projective, Gt, Scalar};
use group::{Curve, Group};
use log::debug;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::algorithms::{AttributeBasedSignature, PolicyPlacement};
use crate::{
    ciphersuites::{AbsCiphersuite, Bls12381Sha256, Bls12381Shake256},
    errors::Error,
    policy::{AccessPolicy, LeafLabel},
    schnorr::commit,
    sharing::{polynomial_from_roots, ShareVector},
    utils::util::{
        attribute_to_scalar, dedup_attributes, from_json, get_random, gt_hex, hash_to_scalar, i2osp,
        scalar_to_bits_le, to_json, SCALAR_BITS,
    },
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Rd16Kp<CS: AbsCiphersuite>(PhantomData<CS>);

pub type Rd16KpSha256 = Rd16Kp<Bls12381Sha256>;
pub type Rd16KpShake256 = Rd16Kp<Bls12381Shake256>;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rd16KpPublicParameters {
    pub g1: G1Projective,
    pub g2: G2Projective,
    /// `e(g1, g2)^alpha`
    #[serde(with = "gt_hex")]
    pub Y: Gt,
    /// `V[0..=n+1]`
    pub V: Vec<G1Projective>,
    /// `u[0..=SCALAR_BITS]`
    pub u: Vec<G1Projective>,
}

impl Rd16KpPublicParameters {
    /// Maximum number of distinct attributes a signature can attest to
    pub fn bound(&self) -> usize {
        self.V.len().saturating_sub(2)
    }

    fn is_well_formed(&self) -> bool {
        self.u.len() == SCALAR_BITS + 1 && self.V.len() >= 3
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rd16KpMasterSecret {
    alpha: Scalar,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rd16KeyComponent {
    D: G1Projective,
    D_prime: G2Projective,
    /// `D''[j]` for `j = 2..=n+1`
    D_dprime: Vec<G1Projective>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rd16KpSecretKey {
    policy: String,
    components: BTreeMap<LeafLabel, Rd16KeyComponent>,
}

impl Rd16KpSecretKey {
    pub fn policy(&self) -> &str {
        &self.policy
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rd16KpSignature {
    sigma_1: G2Projective,
    sigma_2: G2Projective,
    sigma_3: G1Projective,
    /// Sorted, without repetitions
    attributes: Vec<String>,
}

impl Rd16KpSignature {
    pub fn attested_attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn to_json(&self) -> Result<String, Error> {
        to_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        from_json(json)
    }
}

/// Distinct attribute hashes, checked against the degree bound
fn roots<CS: AbsCiphersuite>(attributes: &[String], bound: usize) -> Result<Vec<Scalar>, Error> {
    let mut roots: Vec<Scalar> = Vec::with_capacity(attributes.len());
    for attr in attributes {
        let x = attribute_to_scalar::<CS>(attr)?;
        if !roots.contains(&x) {
            roots.push(x);
        }
    }
    if roots.len() > bound {
        return Err(Error::ParameterBoundExceeded { required: roots.len(), bound });
    }
    Ok(roots)
}

/// Ascending coefficients of the vanishing polynomial, padded to `n + 1` entries
fn padded_coefficients(roots: &[Scalar], bound: usize) -> Vec<Scalar> {
    let mut y = polynomial_from_roots(roots);
    y.resize(bound + 1, Scalar::ZERO);
    y
}

/// `e1 = V0 + Σ_{k=1}^{n+1} V_k · y_{k-1}`
fn attribute_hash(V: &[G1Projective], y: &[Scalar]) -> G1Projective {
    V[0] + commit(&V[1..], y)
}

/// `e2 = u0 + Σ_b u_{b+1} · bit_b(H(m || sigma_2 || attributes))`
fn message_hash<CS: AbsCiphersuite>(
    u: &[G1Projective],
    message: &[u8],
    sigma_2: &G2Projective,
    attributes: &[String],
) -> Result<G1Projective, Error> {
    let mut input = Vec::new();
    input.extend_from_slice(&i2osp(message.len(), 8));
    input.extend_from_slice(message);
    input.extend_from_slice(&sigma_2.to_affine().to_compressed());
    input.extend_from_slice(&i2osp(attributes.len(), 8));
    for attr in attributes {
        input.extend_from_slice(&i2osp(attr.len(), 8));
        input.extend_from_slice(attr.as_bytes());
    }
    let h = hash_to_scalar::<CS>(&input, CS::MESSAGE_DST)?;

    let e2 = scalar_to_bits_le(&h)
        .into_iter()
        .zip(u[1..].iter())
        .filter(|(bit, _)| *bit)
        .fold(u[0], |acc, (_, ub)| acc + ub);
    Ok(e2)
}

impl<CS: AbsCiphersuite> Rd16Kp<CS> {
    fn check(
        mpk: &Rd16KpPublicParameters,
        signature: &Rd16KpSignature,
        attributes: &[String],
        message: &[u8],
    ) -> Result<(), &'static str> {
        if signature.attributes.is_empty() {
            return Err("no attested attributes");
        }
        if signature.attributes.iter().any(|a| !attributes.contains(a)) {
            return Err("attested attribute outside the presented set");
        }
        if !mpk.is_well_formed() {
            return Err("malformed public parameters");
        }
        // sigma_1 = g2^theta carries the message term
        if bool::from(signature.sigma_1.is_identity()) || bool::from(signature.sigma_2.is_identity()) {
            return Err("identity element in signature");
        }

        let bound = mpk.bound();
        let roots = roots::<CS>(&signature.attributes, bound).map_err(|_| "too many attested attributes")?;
        let y = padded_coefficients(&roots, bound);
        let e1 = attribute_hash(&mpk.V, &y);
        let e2 = message_hash::<CS>(&mpk.u, message, &signature.sigma_2, &signature.attributes)
            .map_err(|_| "message hashing failed")?;

        let g2 = G2Prepared::from(mpk.g2.to_affine());
        let sigma_2 = G2Prepared::from(signature.sigma_2.to_affine());
        let sigma_1 = G2Prepared::from(signature.sigma_1.to_affine());
        let lhs = multi_miller_loop(&[
            (&signature.sigma_3.to_affine(), &g2),
            (&(-e1).to_affine(), &sigma_2),
            (&(-e2).to_affine(), &sigma_1),
        ])
        .final_exponentiation();

        if lhs != mpk.Y {
            return Err("pairing equation does not hold");
        }
        Ok(())
    }
}

impl<CS: AbsCiphersuite> AttributeBasedSignature for Rd16Kp<CS> {
    const NAME: &'static str = "RD16-KP";
    const PLACEMENT: PolicyPlacement = PolicyPlacement::KeyPolicy;

    /// Maximum number of distinct attributes per signature
    type SetupInput = usize;
    type KeyInput = str;
    type VerifyInput = [String];

    type PublicParameters = Rd16KpPublicParameters;
    type MasterSecret = Rd16KpMasterSecret;
    type SecretKey = Rd16KpSecretKey;
    type Signature = Rd16KpSignature;

    fn setup<R: RngCore + CryptoRng>(
        n: &usize,
        rng: &mut R,
    ) -> Result<(Self::PublicParameters, Self::MasterSecret), Error> {
        let n = *n;
        if n == 0 {
            return Err(Error::SetupError("attribute bound must be positive".to_owned()));
        }

        let g1 = G1Projective::random(&mut *rng);
        let g2 = G2Projective::random(&mut *rng);
        let alpha = get_random(rng);
        let Y = pairing(&g1.to_affine(), &g2.to_affine()) * alpha;

        let V = (0..n + 2).map(|_| G1Projective::random(&mut *rng)).collect();
        let u = (0..=SCALAR_BITS).map(|_| G1Projective::random(&mut *rng)).collect();

        debug!("{}: setup with bound {}", Self::NAME, n);
        Ok((Rd16KpPublicParameters { g1, g2, Y, V, u }, Rd16KpMasterSecret { alpha }))
    }

    fn keygen<R: RngCore + CryptoRng>(
        mpk: &Self::PublicParameters,
        msk: &Self::MasterSecret,
        policy: &str,
        rng: &mut R,
    ) -> Result<Self::SecretKey, Error> {
        let policy = AccessPolicy::parse(policy)?;
        let msp = policy.to_msp();
        if mpk.V.len() < 3 {
            return Err(Error::KeyGenError("public parameters carry no generators".to_owned()));
        }
        let n = mpk.bound();

        let v = ShareVector::new(msp.num_cols(), msk.alpha, rng);
        let mut components = BTreeMap::new();
        for (label, lambda) in v.shares(&msp) {
            let r = get_random(rng);
            let x = attribute_to_scalar::<CS>(label.attribute())?;

            let mut D_dprime = Vec::with_capacity(n);
            let mut x_pow = x;
            for j in 2..=n + 1 {
                D_dprime.push((mpk.V[1] * (-x_pow) + mpk.V[j]) * r);
                x_pow *= x;
            }

            components.insert(
                label,
                Rd16KeyComponent { D: mpk.g1 * lambda + mpk.V[0] * r, D_prime: mpk.g2 * r, D_dprime },
            );
        }

        debug!("{}: key for {} rows", Self::NAME, components.len());
        Ok(Rd16KpSecretKey { policy: policy.to_string(), components })
    }

    fn sign<R: RngCore + CryptoRng>(
        mpk: &Self::PublicParameters,
        sk: &Self::SecretKey,
        message: &[u8],
        policy: &str,
        attributes: &[String],
        rng: &mut R,
    ) -> Result<Self::Signature, Error> {
        if !mpk.is_well_formed() {
            return Err(Error::SignatureGenerationError("malformed public parameters".to_owned()));
        }
        let policy = AccessPolicy::parse(policy)?;
        if policy.to_string() != sk.policy {
            return Err(Error::PolicyMismatch);
        }
        let pruned = policy.prune(attributes).ok_or(Error::PolicyNotSatisfied)?;

        let mut attested = dedup_attributes(&pruned.iter().map(|l| l.attribute()).collect::<Vec<_>>());
        attested.sort();

        let bound = mpk.bound();
        let roots = roots::<CS>(&attested, bound)?;
        let y = padded_coefficients(&roots, bound);
        debug!("{}: {} distinct attributes, bound {}", Self::NAME, roots.len(), bound);

        let theta = get_random(rng);
        let epsilon = get_random(rng);

        let mut sigma_2 = mpk.g2 * epsilon;
        let mut sigma_3 = G1Projective::IDENTITY;
        for label in &pruned {
            let component = sk
                .components
                .get(label)
                .ok_or_else(|| Error::SignatureGenerationError(format!("no key component for {}", label)))?;
            sigma_2 += component.D_prime;
            sigma_3 += component.D + commit(&component.D_dprime, &y[1..]);
        }

        let e1 = attribute_hash(&mpk.V, &y);
        let e2 = message_hash::<CS>(&mpk.u, message, &sigma_2, &attested)?;
        sigma_3 += e1 * epsilon + e2 * theta;

        Ok(Rd16KpSignature { sigma_1: mpk.g2 * theta, sigma_2, sigma_3, attributes: attested })
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

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn setup_sizes() {
        let mut rng = StdRng::seed_from_u64(31);
        let (mpk, _) = Rd16KpSha256::setup(&3, &mut rng).unwrap();
        assert_eq!(mpk.V.len(), 5);
        assert_eq!(mpk.u.len(), 256);
        assert_eq!(mpk.bound(), 3);
        assert!(matches!(Rd16KpSha256::setup(&0, &mut rng), Err(Error::SetupError(_))));
    }

    #[test]
    fn combined_key_terms_cancel_on_roots() {
        // D + Σ D''[j] y_{j-1} = g1^λ + e1^r for an attribute that is a root
        let mut rng = StdRng::seed_from_u64(32);
        let (mpk, msk) = Rd16KpSha256::setup(&2, &mut rng).unwrap();
        let sk = Rd16KpSha256::keygen(&mpk, &msk, "a", &mut rng).unwrap();
        let component = &sk.components[&LeafLabel::new("a", None)];

        let x = attribute_to_scalar::<Bls12381Sha256>("a").unwrap();
        let y = padded_coefficients(&[x], 2);
        let e1 = attribute_hash(&mpk.V, &y);
        let combined = component.D + commit(&component.D_dprime, &y[1..]);

        let lhs = pairing(&combined.to_affine(), &mpk.g2.to_affine());
        let rhs = mpk.Y + pairing(&e1.to_affine(), &component.D_prime.to_affine());
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn attested_attributes_are_sorted() {
        let mut rng = StdRng::seed_from_u64(33);
        let (mpk, msk) = Rd16KpSha256::setup(&3, &mut rng).unwrap();
        let sk = Rd16KpSha256::keygen(&mpk, &msk, "b and a", &mut rng).unwrap();
        let attrs = vec!["b".to_owned(), "a".to_owned()];
        let sig = Rd16KpSha256::sign(&mpk, &sk, b"m", "b and a", &attrs, &mut rng).unwrap();
        assert_eq!(sig.attested_attributes(), &["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn sign_rejects_truncated_parameters() {
        let mut rng = StdRng::seed_from_u64(34);
        let (mut mpk, msk) = Rd16KpSha256::setup(&3, &mut rng).unwrap();
        let sk = Rd16KpSha256::keygen(&mpk, &msk, "a", &mut rng).unwrap();
        mpk.u.truncate(8);
        let err = Rd16KpSha256::sign(&mpk, &sk, b"m", "a", &["a".to_owned()], &mut rng).unwrap_err();
        assert!(matches!(err, Error::SignatureGenerationError(_)));

        let (mut mpk, _) = Rd16KpSha256::setup(&3, &mut rng).unwrap();
        mpk.V.truncate(1);
        let err = Rd16KpSha256::sign(&mpk, &sk, b"m", "a", &["a".to_owned()], &mut rng).unwrap_err();
        assert!(matches!(err, Error::SignatureGenerationError(_)));
    }

    #[test]
    fn signature_without_message_term_is_rejected() {
        let mut rng = StdRng::seed_from_u64(35);
        let (mpk, msk) = Rd16KpSha256::setup(&3, &mut rng).unwrap();
        let sk = Rd16KpSha256::keygen(&mpk, &msk, "a", &mut rng).unwrap();
        let attrs = vec!["a".to_owned()];

        let mut replay = rng.clone();
        let sig = Rd16KpSha256::sign(&mpk, &sk, b"m", "a", &attrs, &mut rng).unwrap();
        let theta = get_random(&mut replay);
        assert_eq!(sig.sigma_1, mpk.g2 * theta);

        // the same signature re-randomised with theta = 0 no longer depends on the message
        let e2 = message_hash::<Bls12381Sha256>(&mpk.u, b"m", &sig.sigma_2, &attrs).unwrap();
        let mut degenerate = sig.clone();
        degenerate.sigma_1 = G2Projective::IDENTITY;
        degenerate.sigma_3 = sig.sigma_3 - e2 * theta;
        assert!(!Rd16KpSha256::verify(&mpk, &degenerate, &attrs, b"m"));
        assert!(!Rd16KpSha256::verify(&mpk, &degenerate, &attrs, b"other"));
        assert!(Rd16KpSha256::verify(&mpk, &sig, &attrs, b"m"));
    }
}
