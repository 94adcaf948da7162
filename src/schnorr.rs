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

//! Fiat-Shamir compiled Schnorr proofs of knowledge over linear relations in
//! G1, G2 and GT.
//!
//! A relation `P = Σ base_i · w_i` is proven by committing to `T = Σ base_i · β_i`,
//! hashing every public value and commitment into a challenge `c`, and answering
//! with one response per witness. The verifier rebuilds `T` from the responses and
//! `P`, hashes again and compares.

use bls12_381_plus::{G1Projective, G2Projective, Gt, Scalar};
use group::{Curve, Group};

use crate::{
    ciphersuites::AbsCiphersuite,
    errors::Error,
    utils::util::{hash_to_scalar, i2osp},
};

/// Sign of the challenge term in the responses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convention {
    /// `s = β − c·w`
    Subtract,
    /// `s = β + c·w`
    Add,
}

impl Convention {
    pub fn respond(self, blind: Scalar, witness: Scalar, c: Scalar) -> Scalar {
        match self {
            Convention::Subtract => blind - c * witness,
            Convention::Add => blind + c * witness,
        }
    }

    /// Multiplier of the public value when a commitment is rebuilt
    pub fn public_factor(self, c: Scalar) -> Scalar {
        match self {
            Convention::Subtract => c,
            Convention::Add => -c,
        }
    }
}

/// `Σ base_i · scalar_i`
pub fn commit<G: Group<Scalar = Scalar>>(bases: &[G], scalars: &[Scalar]) -> G {
    bases
        .iter()
        .zip(scalars.iter())
        .fold(G::identity(), |acc, (base, s)| acc + *base * *s)
}

/// Rebuilds a commitment from the responses and the proven public value
pub fn recompute<G: Group<Scalar = Scalar>>(
    bases: &[G],
    responses: &[Scalar],
    public: G,
    c: Scalar,
    convention: Convention,
) -> G {
    commit(bases, responses) + public * convention.public_factor(c)
}

/// Ordered, length-prefixed byte transcript hashed into the challenge.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    bytes: Vec<u8>,
}

impl Transcript {
    pub fn new(label: &[u8]) -> Self {
        let mut t = Self::default();
        t.append_bytes(label);
        t
    }

    pub fn append_g1(&mut self, p: &G1Projective) -> &mut Self {
        self.bytes.extend_from_slice(&p.to_affine().to_compressed());
        self
    }

    pub fn append_g2(&mut self, p: &G2Projective) -> &mut Self {
        self.bytes.extend_from_slice(&p.to_affine().to_compressed());
        self
    }

    pub fn append_gt(&mut self, p: &Gt) -> &mut Self {
        self.bytes.extend_from_slice(&p.to_bytes());
        self
    }

    pub fn append_scalar(&mut self, s: &Scalar) -> &mut Self {
        self.bytes.extend_from_slice(&s.to_be_bytes());
        self
    }

    pub fn append_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(&i2osp(data.len(), 8));
        self.bytes.extend_from_slice(data);
        self
    }

    pub fn append_str(&mut self, s: &str) -> &mut Self {
        self.append_bytes(s.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `c = H(transcript)` under the ciphersuite challenge tag
    pub fn challenge<CS: AbsCiphersuite>(&self) -> Result<Scalar, Error> {
        hash_to_scalar::<CS>(&self.bytes, CS::CHALLENGE_DST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphersuites::Bls12381Sha256;
    use crate::utils::util::{calculate_random_scalars, get_random};
    use bls12_381_plus::pairing;
    use rand::{rngs::StdRng, SeedableRng};

    fn check_relation<G: Group<Scalar = Scalar>>(bases: Vec<G>, rng: &mut StdRng, convention: Convention) {
        let witnesses = calculate_random_scalars(rng, bases.len());
        let blinds = calculate_random_scalars(rng, bases.len());
        let public = commit(&bases, &witnesses);
        let t = commit(&bases, &blinds);

        let c = get_random(rng);
        let responses: Vec<Scalar> = blinds
            .iter()
            .zip(witnesses.iter())
            .map(|(b, w)| convention.respond(*b, *w, c))
            .collect();

        assert!(recompute(&bases, &responses, public, c, convention) == t);

        let mut forged = responses.clone();
        forged[0] += Scalar::from(1u64);
        assert!(recompute(&bases, &forged, public, c, convention) != t);
    }

    #[test]
    fn responses_rebuild_commitments_in_every_group() {
        let mut rng = StdRng::seed_from_u64(1);
        for convention in [Convention::Subtract, Convention::Add] {
            let g1 = vec![G1Projective::random(&mut rng), G1Projective::random(&mut rng)];
            check_relation(g1, &mut rng, convention);

            let g2 = vec![G2Projective::random(&mut rng)];
            check_relation(g2, &mut rng, convention);

            let base = pairing(&G1Projective::random(&mut rng).to_affine(), &G2Projective::GENERATOR.to_affine());
            check_relation(vec![base, Gt::generator()], &mut rng, convention);
        }
    }

    #[test]
    fn conventions_are_not_interchangeable() {
        let mut rng = StdRng::seed_from_u64(2);
        let base = G1Projective::random(&mut rng);
        let (w, b, c) = (get_random(&mut rng), get_random(&mut rng), get_random(&mut rng));
        let s = Convention::Add.respond(b, w, c);
        let rebuilt = recompute(&[base], &[s], base * w, c, Convention::Subtract);
        assert!(rebuilt != base * b);
    }

    #[test]
    fn challenge_depends_on_order_and_framing() {
        let g = G1Projective::GENERATOR;
        let h = g.double();

        let mut t1 = Transcript::new(b"test");
        t1.append_g1(&g).append_g1(&h);
        let mut t2 = Transcript::new(b"test");
        t2.append_g1(&h).append_g1(&g);
        assert_ne!(
            t1.challenge::<Bls12381Sha256>().unwrap(),
            t2.challenge::<Bls12381Sha256>().unwrap()
        );

        let mut t3 = Transcript::new(b"");
        t3.append_bytes(b"ab").append_bytes(b"c");
        let mut t4 = Transcript::new(b"");
        t4.append_bytes(b"a").append_bytes(b"bc");
        assert_ne!(t3.as_bytes(), t4.as_bytes());
    }
}
