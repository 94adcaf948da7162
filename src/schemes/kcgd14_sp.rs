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

//! Signature-policy ABS with user pseudonyms and optional linkability.
//!
//! Every user holds a pseudonym `(id, sk, pk = h1^sk)` and one Boneh-Boyen style
//! credential per attribute, `sigma_a = (g1 · pk)^(1 / (x_a + r_a y_a + id))`.
//! A signature commits to one credential slot per span program row (real ones on the
//! rows of a satisfying set, dummies elsewhere) and proves in zero knowledge that the
//! real slots open to valid credentials of a single pseudonym and that the selected
//! rows satisfy the policy. `pk` is never revealed. When a scope is given, the
//! signature also carries `nym = H(scope)^sk`, which is equal for all signatures of
//! the same user under that scope.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use bls12_381_plus::{pairing, G1Projective, G2Projective, Gt, Scalar};
use ff::Field;
use group::{Curve, Group};
use log::debug;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::algorithms::{AttributeBasedSignature, PolicyPlacement};
use crate::{
    ciphersuites::{AbsCiphersuite, Bls12381Sha256, Bls12381Shake256},
    errors::Error,
    policy::{AccessPolicy, LeafLabel, MonotoneSpanProgram},
    schnorr::{commit, recompute, Convention, Transcript},
    utils::util::{dedup_attributes, from_json, get_random, gt_hex, hash_to_g1, i2osp, to_json},
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Kcgd14Sp<CS: AbsCiphersuite>(PhantomData<CS>);

pub type Kcgd14SpSha256 = Kcgd14Sp<Bls12381Sha256>;
pub type Kcgd14SpShake256 = Kcgd14Sp<Bls12381Shake256>;

/// Public key of one attribute of the universe
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AttributePublicKey {
    pub X: G2Projective,
    pub Y: G2Projective,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Kcgd14PublicParameters {
    pub g1: G1Projective,
    pub h1: G1Projective,
    pub k1: G1Projective,
    pub k3: G1Projective,
    pub g2: G2Projective,
    pub k2: G2Projective,
    pub attributes: BTreeMap<String, AttributePublicKey>,
    /// `e(g1, g2)`
    #[serde(with = "gt_hex")]
    pub e_g1_g2: Gt,
    /// `e(k1, g2)`
    #[serde(with = "gt_hex")]
    pub e_k1_g2: Gt,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AttributeSecret {
    x: Scalar,
    y: Scalar,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Kcgd14MasterSecret {
    attributes: BTreeMap<String, AttributeSecret>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Credential {
    sigma: G1Projective,
    r: Scalar,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Kcgd14SecretKey {
    id: Scalar,
    sk: Scalar,
    pk: G1Projective,
    credentials: BTreeMap<String, Credential>,
}

impl Kcgd14SecretKey {
    pub fn attributes(&self) -> Vec<&str> {
        self.credentials.keys().map(|a| a.as_str()).collect()
    }

    /// `h1^sk`, the user's pseudonym public key. Never part of a signature.
    pub fn pseudonym(&self) -> &G1Projective {
        &self.pk
    }
}

/// Per-row scalars: witnesses, blinding factors and responses share this layout.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RowScalars {
    v: Scalar,
    t: Scalar,
    r: Scalar,
    rho_r: Scalar,
    rho_v: Scalar,
    r_rho_v: Scalar,
    id_rho_v: Scalar,
}

impl RowScalars {
    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            v: get_random(rng),
            t: get_random(rng),
            r: get_random(rng),
            rho_r: get_random(rng),
            rho_v: get_random(rng),
            r_rho_v: get_random(rng),
            id_rho_v: get_random(rng),
        }
    }

    fn respond(&self, witness: &Self, c: Scalar) -> Self {
        let add = Convention::Add;
        Self {
            v: add.respond(self.v, witness.v, c),
            t: add.respond(self.t, witness.t, c),
            r: add.respond(self.r, witness.r, c),
            rho_r: add.respond(self.rho_r, witness.rho_r, c),
            rho_v: add.respond(self.rho_v, witness.rho_v, c),
            r_rho_v: add.respond(self.r_rho_v, witness.r_rho_v, c),
            id_rho_v: add.respond(self.id_rho_v, witness.id_rho_v, c),
        }
    }
}

/// Public part of one credential slot, with its responses
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Kcgd14Row {
    v_hat: G1Projective,
    T: G1Projective,
    K: G2Projective,
    s: RowScalars,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LinkTag {
    scope: String,
    nym: G1Projective,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Kcgd14Signature {
    rows: BTreeMap<LeafLabel, Kcgd14Row>,
    U: G2Projective,
    Z: G1Projective,
    link: Option<LinkTag>,
    c: Scalar,
    s_id: Scalar,
    s_rho_id: Scalar,
    s_sk: Scalar,
    s_rho_sk: Scalar,
}

impl Kcgd14Signature {
    pub fn scope(&self) -> Option<&str> {
        self.link.as_ref().map(|l| l.scope.as_str())
    }

    /// True when both signatures carry a link tag for the same scope and the same
    /// pseudonym, i.e. they were produced by the same user under that scope.
    pub fn is_linked_to(&self, other: &Self) -> bool {
        match (&self.link, &other.link) {
            (Some(a), Some(b)) => a.scope == b.scope && a.nym == b.nym,
            _ => false,
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        to_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        from_json(json)
    }
}

/// Commitments hashed into the challenge, in transcript order
struct Commitments {
    V: Vec<G1Projective>,
    K_hat: Vec<G2Projective>,
    U_hat: G2Projective,
    Z_hat: G1Projective,
    N_hat: Option<G1Projective>,
    lambda: Vec<G1Projective>,
    B: Vec<Gt>,
}

/// GT part of the credential relation for one row:
/// `e(k1,X)·s_rho_v + e(k1,Y)·s_r_rho_v + e(k1,g2)·s_id_rho_v + e(T,k2)·(s_rho_r + s_rho_id)`
fn row_pairing_term(
    mpk: &Kcgd14PublicParameters,
    attribute: &AttributePublicKey,
    T: &G1Projective,
    s: &RowScalars,
    s_rho_id: Scalar,
) -> Gt {
    let k1 = mpk.k1.to_affine();
    let X_prime = pairing(&k1, &attribute.X.to_affine());
    let Y_prime = pairing(&k1, &attribute.Y.to_affine());
    let T_prime = pairing(&T.to_affine(), &mpk.k2.to_affine());
    commit(
        &[X_prime, Y_prime, mpk.e_k1_g2, T_prime],
        &[s.rho_v, s.r_rho_v, s.id_rho_v, s.rho_r + s_rho_id],
    )
}

/// `Σ_i M_ij s_t,i`
fn column_sum(msp: &MonotoneSpanProgram, j: usize, t: &BTreeMap<&LeafLabel, Scalar>) -> Scalar {
    t.iter().fold(Scalar::ZERO, |acc, (label, t)| acc + msp.entry(label, j) * t)
}

fn delta(j: usize) -> Scalar {
    if j == 0 {
        Scalar::ONE
    } else {
        Scalar::ZERO
    }
}

fn challenge<CS: AbsCiphersuite>(
    policy_digest: &Scalar,
    body: &[(G1Projective, G1Projective, G2Projective)],
    U: &G2Projective,
    Z: &G1Projective,
    link: Option<&LinkTag>,
    commitments: &Commitments,
    message: &[u8],
) -> Result<Scalar, Error> {
    let mut transcript = Transcript::new(CS::ID);
    transcript.append_scalar(policy_digest);
    transcript.append_bytes(&i2osp(body.len(), 8));
    for (v_hat, T, K) in body {
        transcript.append_g1(v_hat).append_g1(T).append_g2(K);
    }
    transcript.append_g2(U).append_g1(Z);
    if let Some(link) = link {
        transcript.append_str(&link.scope).append_g1(&link.nym);
    }

    commitments.V.iter().for_each(|p| {
        transcript.append_g1(p);
    });
    commitments.K_hat.iter().for_each(|p| {
        transcript.append_g2(p);
    });
    transcript.append_g2(&commitments.U_hat).append_g1(&commitments.Z_hat);
    if let Some(N_hat) = &commitments.N_hat {
        transcript.append_g1(N_hat);
    }
    commitments.lambda.iter().for_each(|p| {
        transcript.append_g1(p);
    });
    commitments.B.iter().for_each(|p| {
        transcript.append_gt(p);
    });

    transcript.append_bytes(message);
    transcript.challenge::<CS>()
}

impl<CS: AbsCiphersuite> Kcgd14Sp<CS> {
    /// # Description
    /// Signs like [`AttributeBasedSignature::sign`] and additionally attaches the
    /// scope pseudonym `H(scope)^sk`, so that signatures of the same user under the
    /// same scope can be linked with [`Kcgd14Signature::is_linked_to`].
    ///
    /// # Inputs:
    /// * `scope` (REQUIRED), the linkability domain.
    ///
    /// # Output:
    /// a [`Kcgd14Signature`] carrying a link tag, or [`Error`].
    pub fn sign_linkable<R: RngCore + CryptoRng>(
        mpk: &Kcgd14PublicParameters,
        sk: &Kcgd14SecretKey,
        message: &[u8],
        policy: &str,
        attributes: &[String],
        scope: &str,
        rng: &mut R,
    ) -> Result<Kcgd14Signature, Error> {
        Self::sign_with_scope(mpk, sk, message, policy, attributes, Some(scope), rng)
    }

    fn sign_with_scope<R: RngCore + CryptoRng>(
        mpk: &Kcgd14PublicParameters,
        sk: &Kcgd14SecretKey,
        message: &[u8],
        policy: &str,
        attributes: &[String],
        scope: Option<&str>,
        rng: &mut R,
    ) -> Result<Kcgd14Signature, Error> {
        let policy = AccessPolicy::parse(policy)?;
        let msp = policy.to_msp();

        for label in msp.labels() {
            if !mpk.attributes.contains_key(label.attribute()) {
                return Err(Error::UnknownAttribute(label.attribute().to_owned()));
            }
        }
        let pruned = policy.prune_held(attributes, |a| sk.credentials.contains_key(a))?;
        let digest = msp.digest::<CS>()?;
        debug!(
            "{}: {} of {} rows used, {} columns",
            Self::NAME,
            pruned.len(),
            msp.num_rows(),
            msp.num_cols()
        );

        let rho_id = get_random(rng);
        let rho_sk = get_random(rng);
        let U = mpk.g2 * sk.id + mpk.k2 * rho_id;
        let Z = sk.pk + mpk.k1 * rho_sk;
        let link = scope.map(|scope| {
            let base = hash_to_g1::<CS>(scope.as_bytes(), CS::SCOPE_DST);
            (base, LinkTag { scope: scope.to_owned(), nym: base * sk.sk })
        });

        let b_id = get_random(rng);
        let b_rho_id = get_random(rng);
        let b_sk = get_random(rng);
        let b_rho_sk = get_random(rng);

        let mut body = Vec::with_capacity(msp.num_rows());
        let mut witnesses = Vec::with_capacity(msp.num_rows());
        let mut blinds = Vec::with_capacity(msp.num_rows());
        let mut V = Vec::with_capacity(msp.num_rows());
        let mut K_hat = Vec::with_capacity(msp.num_rows());
        let mut row_terms = Vec::with_capacity(msp.num_rows());

        for label in msp.labels() {
            let attribute = &mpk.attributes[label.attribute()];
            let credential = if pruned.contains(label) { sk.credentials.get(label.attribute()) } else { None };

            let v = if credential.is_some() { Scalar::ONE } else { Scalar::ZERO };
            let r = credential.map(|cr| cr.r).unwrap_or(Scalar::ZERO);
            let sigma = credential.map(|cr| cr.sigma).unwrap_or(G1Projective::IDENTITY);
            let t = get_random(rng);
            let rho_v = get_random(rng);
            let rho_r = get_random(rng);

            let v_hat = mpk.g1 * v + mpk.k3 * t;
            let T = sigma + mpk.k1 * rho_v;
            let K = attribute.Y * r + mpk.k2 * rho_r;

            let w = RowScalars { v, t, r, rho_r, rho_v, r_rho_v: r * rho_v, id_rho_v: sk.id * rho_v };
            let b = RowScalars::random(rng);

            V.push(commit(&[mpk.g1, mpk.k3], &[b.v, b.t]));
            K_hat.push(commit(&[attribute.Y, mpk.k2], &[b.r, b.rho_r]));
            row_terms.push(row_pairing_term(mpk, attribute, &T, &b, b_rho_id));

            body.push((v_hat, T, K));
            witnesses.push(w);
            blinds.push(b);
        }

        let blind_t: BTreeMap<&LeafLabel, Scalar> = msp.labels().zip(blinds.iter().map(|b| b.t)).collect();
        let mut lambda = Vec::with_capacity(msp.num_cols());
        let mut B = Vec::with_capacity(msp.num_cols());
        for j in 0..msp.num_cols() {
            lambda.push(mpk.k3 * column_sum(&msp, j, &blind_t));

            let mut bases = row_terms.clone();
            let mut scalars: Vec<Scalar> = msp.labels().map(|l| msp.entry(l, j)).collect();
            bases.push(mpk.e_k1_g2);
            scalars.push(-(delta(j) * b_rho_sk));
            B.push(commit(&bases, &scalars));
        }

        let commitments = Commitments {
            V,
            K_hat,
            U_hat: commit(&[mpk.g2, mpk.k2], &[b_id, b_rho_id]),
            Z_hat: commit(&[mpk.h1, mpk.k1], &[b_sk, b_rho_sk]),
            N_hat: link.as_ref().map(|(base, _)| base * b_sk),
            lambda,
            B,
        };
        let link = link.map(|(_, tag)| tag);
        let c = challenge::<CS>(&digest, &body, &U, &Z, link.as_ref(), &commitments, message)?;

        let rows = msp
            .labels()
            .cloned()
            .zip(body.into_iter().zip(witnesses.iter().zip(blinds.iter())))
            .map(|(label, ((v_hat, T, K), (w, b)))| (label, Kcgd14Row { v_hat, T, K, s: b.respond(w, c) }))
            .collect();

        let add = Convention::Add;
        Ok(Kcgd14Signature {
            rows,
            U,
            Z,
            link,
            c,
            s_id: add.respond(b_id, sk.id, c),
            s_rho_id: add.respond(b_rho_id, rho_id, c),
            s_sk: add.respond(b_sk, sk.sk, c),
            s_rho_sk: add.respond(b_rho_sk, rho_sk, c),
        })
    }

    fn check(
        mpk: &Kcgd14PublicParameters,
        signature: &Kcgd14Signature,
        policy: &str,
        message: &[u8],
    ) -> Result<(), &'static str> {
        let msp = AccessPolicy::parse(policy).map_err(|_| "malformed policy")?.to_msp();
        if !signature.rows.keys().eq(msp.labels()) {
            return Err("rows do not match the policy");
        }
        let digest = msp.digest::<CS>().map_err(|_| "policy hashing failed")?;
        let c = signature.c;
        let add = Convention::Add;

        let U_hat = recompute(&[mpk.g2, mpk.k2], &[signature.s_id, signature.s_rho_id], signature.U, c, add);
        let Z_hat = recompute(&[mpk.h1, mpk.k1], &[signature.s_sk, signature.s_rho_sk], signature.Z, c, add);
        let N_hat = match &signature.link {
            Some(link) => {
                if bool::from(link.nym.is_identity()) {
                    return Err("identity pseudonym");
                }
                let base = hash_to_g1::<CS>(link.scope.as_bytes(), CS::SCOPE_DST);
                Some(recompute(&[base], &[signature.s_sk], link.nym, c, add))
            }
            None => None,
        };

        let UZ = pairing(&signature.Z.to_affine(), &mpk.g2.to_affine()) + mpk.e_g1_g2;

        let mut V = Vec::with_capacity(msp.num_rows());
        let mut K_hat = Vec::with_capacity(msp.num_rows());
        let mut row_terms = Vec::with_capacity(msp.num_rows());
        let mut P = Vec::with_capacity(msp.num_rows());
        for (label, row) in &signature.rows {
            let attribute = mpk.attributes.get(label.attribute()).ok_or("attribute outside the universe")?;
            let s = &row.s;

            V.push(recompute(&[mpk.g1, mpk.k3], &[s.v, s.t], row.v_hat, c, add));
            K_hat.push(recompute(&[attribute.Y, mpk.k2], &[s.r, s.rho_r], row.K, c, add));
            row_terms.push(row_pairing_term(mpk, attribute, &row.T, s, signature.s_rho_id));
            P.push(pairing(&row.T.to_affine(), &(attribute.X + row.K + signature.U).to_affine()));
        }

        let s_t: BTreeMap<&LeafLabel, Scalar> = signature.rows.iter().map(|(l, row)| (l, row.s.t)).collect();
        let v_hats: Vec<G1Projective> = signature.rows.values().map(|row| row.v_hat).collect();
        let mut lambda = Vec::with_capacity(msp.num_cols());
        let mut B = Vec::with_capacity(msp.num_cols());
        for j in 0..msp.num_cols() {
            let M_j: Vec<Scalar> = msp.labels().map(|l| msp.entry(l, j)).collect();

            let A_j = commit(&v_hats, &M_j) - mpk.g1 * delta(j);
            lambda.push(recompute(&[mpk.k3], &[column_sum(&msp, j, &s_t)], A_j, c, add));

            let E_j = commit(&P, &M_j) - UZ * delta(j);
            let mut bases = row_terms.clone();
            let mut scalars = M_j;
            bases.push(mpk.e_k1_g2);
            scalars.push(-(delta(j) * signature.s_rho_sk));
            B.push(recompute(&bases, &scalars, E_j, c, add));
        }

        let commitments = Commitments { V, K_hat, U_hat, Z_hat, N_hat, lambda, B };
        let body: Vec<(G1Projective, G1Projective, G2Projective)> =
            signature.rows.values().map(|row| (row.v_hat, row.T, row.K)).collect();
        let c_prime = challenge::<CS>(
            &digest,
            &body,
            &signature.U,
            &signature.Z,
            signature.link.as_ref(),
            &commitments,
            message,
        )
        .map_err(|_| "challenge hashing failed")?;

        if c_prime != c {
            return Err("challenge mismatch");
        }
        Ok(())
    }
}

impl<CS: AbsCiphersuite> AttributeBasedSignature for Kcgd14Sp<CS> {
    const NAME: &'static str = "KCGD14-SP";
    const PLACEMENT: PolicyPlacement = PolicyPlacement::SignaturePolicy;

    /// The attribute universe
    type SetupInput = [String];
    type KeyInput = [String];
    type VerifyInput = str;

    type PublicParameters = Kcgd14PublicParameters;
    type MasterSecret = Kcgd14MasterSecret;
    type SecretKey = Kcgd14SecretKey;
    type Signature = Kcgd14Signature;

    fn setup<R: RngCore + CryptoRng>(
        universe: &[String],
        rng: &mut R,
    ) -> Result<(Self::PublicParameters, Self::MasterSecret), Error> {
        let universe = dedup_attributes(universe);
        if universe.is_empty() {
            return Err(Error::SetupError("empty attribute universe".to_owned()));
        }

        let g1 = G1Projective::random(&mut *rng);
        let h1 = G1Projective::random(&mut *rng);
        let k1 = G1Projective::random(&mut *rng);
        let k3 = G1Projective::random(&mut *rng);
        let g2 = G2Projective::random(&mut *rng);
        let k2 = G2Projective::random(&mut *rng);

        let mut public = BTreeMap::new();
        let mut secret = BTreeMap::new();
        for attr in universe {
            let x = get_random(rng);
            let y = get_random(rng);
            public.insert(attr.clone(), AttributePublicKey { X: g2 * x, Y: g2 * y });
            secret.insert(attr, AttributeSecret { x, y });
        }

        let g2_affine = g2.to_affine();
        let e_g1_g2 = pairing(&g1.to_affine(), &g2_affine);
        let e_k1_g2 = pairing(&k1.to_affine(), &g2_affine);

        debug!("{}: setup for {} attributes", Self::NAME, public.len());
        Ok((
            Kcgd14PublicParameters { g1, h1, k1, k3, g2, k2, attributes: public, e_g1_g2, e_k1_g2 },
            Kcgd14MasterSecret { attributes: secret },
        ))
    }

    fn keygen<R: RngCore + CryptoRng>(
        mpk: &Self::PublicParameters,
        msk: &Self::MasterSecret,
        attributes: &[String],
        rng: &mut R,
    ) -> Result<Self::SecretKey, Error> {
        let attributes = dedup_attributes(attributes);
        if let Some(unknown) = attributes.iter().find(|a| !msk.attributes.contains_key(a.as_str())) {
            return Err(Error::UnknownAttribute(unknown.clone()));
        }

        let id = get_random(rng);
        let sk = get_random(rng);
        let pk = mpk.h1 * sk;
        let base = mpk.g1 + pk;

        let mut credentials = BTreeMap::new();
        for attr in attributes {
            let secret = &msk.attributes[&attr];
            let r = get_random(rng);
            let exponent = secret.x + r * secret.y + id;
            let inverse = Option::<Scalar>::from(exponent.invert())
                .ok_or_else(|| Error::KeyGenError(format!("degenerate credential exponent for {}", attr)))?;
            credentials.insert(attr, Credential { sigma: base * inverse, r });
        }

        debug!("{}: key for {} attributes", Self::NAME, credentials.len());
        Ok(Kcgd14SecretKey { id, sk, pk, credentials })
    }

    fn sign<R: RngCore + CryptoRng>(
        mpk: &Self::PublicParameters,
        sk: &Self::SecretKey,
        message: &[u8],
        policy: &str,
        attributes: &[String],
        rng: &mut R,
    ) -> Result<Self::Signature, Error> {
        Self::sign_with_scope(mpk, sk, message, policy, attributes, None, rng)
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
    fn credentials_satisfy_their_pairing_relation() {
        let mut rng = StdRng::seed_from_u64(41);
        let (mpk, msk) = Kcgd14SpSha256::setup(&attrs(&["1", "2", "3"]), &mut rng).unwrap();
        let sk = Kcgd14SpSha256::keygen(&mpk, &msk, &attrs(&["1", "3"]), &mut rng).unwrap();
        assert_eq!(sk.attributes(), vec!["1", "3"]);
        assert_eq!(*sk.pseudonym(), mpk.h1 * sk.sk);

        let rhs = pairing(&(mpk.g1 + sk.pk).to_affine(), &mpk.g2.to_affine());
        for (attr, credential) in &sk.credentials {
            let key = &mpk.attributes[attr];
            let g2_side = key.X + key.Y * credential.r + mpk.g2 * sk.id;
            assert_eq!(pairing(&credential.sigma.to_affine(), &g2_side.to_affine()), rhs);
        }
    }

    #[test]
    fn keygen_rejects_unknown_attribute() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mpk, msk) = Kcgd14SpSha256::setup(&attrs(&["1", "2"]), &mut rng).unwrap();
        let err = Kcgd14SpSha256::keygen(&mpk, &msk, &attrs(&["1", "9"]), &mut rng).unwrap_err();
        assert_eq!(err, Error::UnknownAttribute("9".to_owned()));
        assert!(matches!(Kcgd14SpSha256::setup(&[], &mut rng), Err(Error::SetupError(_))));
    }

    #[test]
    fn sign_rejects_policy_outside_universe() {
        let mut rng = StdRng::seed_from_u64(43);
        let (mpk, msk) = Kcgd14SpSha256::setup(&attrs(&["1", "2"]), &mut rng).unwrap();
        let sk = Kcgd14SpSha256::keygen(&mpk, &msk, &attrs(&["1"]), &mut rng).unwrap();
        let err = Kcgd14SpSha256::sign(&mpk, &sk, b"m", "1 or 7", &attrs(&["1"]), &mut rng).unwrap_err();
        assert_eq!(err, Error::UnknownAttribute("7".to_owned()));
    }

    #[test]
    fn unlinkable_signatures_have_no_scope() {
        let mut rng = StdRng::seed_from_u64(44);
        let (mpk, msk) = Kcgd14SpSha256::setup(&attrs(&["1", "2"]), &mut rng).unwrap();
        let sk = Kcgd14SpSha256::keygen(&mpk, &msk, &attrs(&["1", "2"]), &mut rng).unwrap();
        let a = Kcgd14SpSha256::sign(&mpk, &sk, b"m", "1 and 2", &attrs(&["1", "2"]), &mut rng).unwrap();
        let b = Kcgd14SpSha256::sign(&mpk, &sk, b"m", "1 and 2", &attrs(&["1", "2"]), &mut rng).unwrap();
        assert_eq!(a.scope(), None);
        assert!(!a.is_linked_to(&b));
        assert_ne!(a.Z, b.Z);
    }

    #[test]
    fn extra_claimed_attributes_do_not_block_signing() {
        let mut rng = StdRng::seed_from_u64(45);
        let universe = attrs(&["1", "2", "3", "4"]);
        let (mpk, msk) = Kcgd14SpSha256::setup(&universe, &mut rng).unwrap();
        let sk = Kcgd14SpSha256::keygen(&mpk, &msk, &attrs(&["3", "4"]), &mut rng).unwrap();
        let policy = "((1 and 2) or (3 and 4))";
        let sig = Kcgd14SpSha256::sign(&mpk, &sk, b"m", policy, &universe, &mut rng).unwrap();
        assert!(Kcgd14SpSha256::verify(&mpk, &sig, policy, b"m"));
    }

    #[test]
    fn responses_under_the_other_convention_are_rejected() {
        let mut rng = StdRng::seed_from_u64(46);
        let (mpk, msk) = Kcgd14SpSha256::setup(&attrs(&["1", "2"]), &mut rng).unwrap();
        let sk = Kcgd14SpSha256::keygen(&mpk, &msk, &attrs(&["1", "2"]), &mut rng).unwrap();

        let mut replay = rng.clone();
        let sig = Kcgd14SpSha256::sign(&mpk, &sk, b"m", "1 and 2", &attrs(&["1", "2"]), &mut rng).unwrap();
        let _rho_id = get_random(&mut replay);
        let _rho_sk = get_random(&mut replay);
        let b_id = get_random(&mut replay);
        assert_eq!(sig.s_id, Convention::Add.respond(b_id, sk.id, sig.c));

        let mut flipped = sig.clone();
        flipped.s_id = Convention::Subtract.respond(b_id, sk.id, sig.c);
        assert!(!Kcgd14SpSha256::verify(&mpk, &flipped, "1 and 2", b"m"));
        assert!(Kcgd14SpSha256::verify(&mpk, &sig, "1 and 2", b"m"));
    }
}
