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

//! Linear secret sharing over a monotone span program, plus the two public
//! scalar vectors derived from policies: FABS-SP's coefficient vector and the
//! coefficients of a polynomial given by its roots (RD16).

use std::collections::BTreeMap;

use bls12_381_plus::Scalar;
use ff::Field;
use rand::{CryptoRng, RngCore};

use crate::{
    ciphersuites::AbsCiphersuite,
    errors::Error,
    policy::{LeafLabel, MonotoneSpanProgram},
    utils::util::{calculate_random_scalars, hash_to_scalar, i2osp},
};

/// Dot product of a row against the first `row.len()` entries of `v`
pub fn inner_product(row: &[Scalar], v: &[Scalar]) -> Scalar {
    row.iter().zip(v.iter()).fold(Scalar::ZERO, |acc, (m, x)| acc + m * x)
}

/// Random share vector `v` with `v[0]` fixed to the shared secret
#[derive(Clone, Debug)]
pub struct ShareVector(Vec<Scalar>);

impl ShareVector {
    /// # Description
    /// Draws `v = (secret0, v_1, ..., v_{num_cols-1})` with uniform `v_i`.
    ///
    /// # Inputs:
    /// * `num_cols` (REQUIRED), number of columns of the span program.
    /// * `secret0` (REQUIRED), the value placed at position 0.
    /// * `rng` (REQUIRED), random source.
    pub fn new<R: RngCore + CryptoRng>(num_cols: usize, secret0: Scalar, rng: &mut R) -> Self {
        let mut v = Vec::with_capacity(num_cols.max(1));
        v.push(secret0);
        v.extend(calculate_random_scalars(rng, num_cols.saturating_sub(1)));
        Self(v)
    }

    pub fn secret(&self) -> Scalar {
        self.0[0]
    }

    pub fn as_slice(&self) -> &[Scalar] {
        &self.0
    }

    /// Share of a single row, `row · v[..len(row)]`
    pub fn share(&self, row: &[Scalar]) -> Scalar {
        inner_product(row, &self.0)
    }

    /// Shares of every row of the program, all taken against this same vector
    pub fn shares(&self, msp: &MonotoneSpanProgram) -> BTreeMap<LeafLabel, Scalar> {
        msp.rows()
            .iter()
            .map(|(label, row)| (label.clone(), self.share(row)))
            .collect()
    }
}

/// Public coefficient vector `a[j] = H(j || H(M))`, one entry per program column
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicCoefficients(Vec<Scalar>);

impl PublicCoefficients {
    pub fn derive<CS: AbsCiphersuite>(msp: &MonotoneSpanProgram) -> Result<Self, Error> {
        let digest = msp.digest::<CS>()?.to_be_bytes();
        let a = (0..msp.num_cols())
            .map(|j| {
                let mut input = i2osp(j, 8);
                input.extend_from_slice(&digest);
                hash_to_scalar::<CS>(&input, CS::POLICY_DST)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(a))
    }

    pub fn first(&self) -> Scalar {
        self.0.first().copied().unwrap_or(Scalar::ZERO)
    }

    pub fn as_slice(&self) -> &[Scalar] {
        &self.0
    }

    /// `M_i · a` for one row
    pub fn project(&self, row: &[Scalar]) -> Scalar {
        inner_product(row, &self.0)
    }
}

/// Coefficients of `p(z) = Π (z - w)` over the given roots, lowest degree first
pub fn polynomial_from_roots(roots: &[Scalar]) -> Vec<Scalar> {
    let mut coefficients = vec![Scalar::ONE];
    for root in roots {
        // multiply by (z - root)
        let mut next = vec![Scalar::ZERO; coefficients.len() + 1];
        for (i, c) in coefficients.iter().enumerate() {
            next[i + 1] += c;
            next[i] -= c * root;
        }
        coefficients = next;
    }
    coefficients
}

/// Horner evaluation of an ascending coefficient vector
pub fn evaluate_polynomial(coefficients: &[Scalar], z: &Scalar) -> Scalar {
    coefficients
        .iter()
        .rev()
        .fold(Scalar::ZERO, |acc, c| acc * z + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphersuites::Bls12381Sha256;
    use crate::policy::AccessPolicy;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn pruned_shares_reconstruct_secret() {
        let mut rng = StdRng::seed_from_u64(7);
        let secret = Scalar::from(42u64);
        for (policy, attrs) in [
            ("((1 and 2) or (3 and 4))", vec!["3", "4"]),
            ("(a or b) and (c or (d and e))", vec!["a", "d", "e"]),
            ("x", vec!["x"]),
        ] {
            let policy = AccessPolicy::parse(policy).unwrap();
            let msp = policy.to_msp();
            let v = ShareVector::new(msp.num_cols(), secret, &mut rng);
            assert_eq!(v.as_slice().len(), msp.num_cols());
            assert_eq!(v.secret(), secret);

            let shares = v.shares(&msp);
            let pruned = policy.prune(&attrs).unwrap();
            let sum = pruned.iter().fold(Scalar::ZERO, |acc, l| acc + shares[l]);
            assert_eq!(sum, secret);
        }
    }

    #[test]
    fn unsatisfying_rows_do_not_reconstruct() {
        let mut rng = StdRng::seed_from_u64(9);
        let policy = AccessPolicy::parse("1 and 2").unwrap();
        let msp = policy.to_msp();
        let v = ShareVector::new(msp.num_cols(), Scalar::from(5u64), &mut rng);
        assert_ne!(v.share(msp.row(&LeafLabel::new("1", None)).unwrap()), Scalar::from(5u64));
    }

    #[test]
    fn public_coefficients_cover_every_column() {
        let msp = AccessPolicy::parse("((1 and 2) or (3 and 4))").unwrap().to_msp();
        let a = PublicCoefficients::derive::<Bls12381Sha256>(&msp).unwrap();
        assert_eq!(a.as_slice().len(), msp.num_cols());
        assert_eq!(a, PublicCoefficients::derive::<Bls12381Sha256>(&msp).unwrap());
        assert_ne!(a.as_slice()[0], a.as_slice()[2]);
        // rows of a satisfying set project to a[0]
        let p = msp.row(&LeafLabel::new("3", None)).unwrap();
        let q = msp.row(&LeafLabel::new("4", None)).unwrap();
        assert_eq!(a.project(p) + a.project(q), a.first());
    }

    #[test]
    fn polynomial_vanishes_on_roots() {
        let roots: Vec<Scalar> = [3u64, 11, 250].iter().map(|&x| Scalar::from(x)).collect();
        let coefficients = polynomial_from_roots(&roots);
        assert_eq!(coefficients.len(), 4);
        assert_eq!(coefficients[3], Scalar::ONE);
        assert_eq!(coefficients[0], -Scalar::from(3u64 * 11 * 250));
        for r in &roots {
            assert_eq!(evaluate_polynomial(&coefficients, r), Scalar::ZERO);
        }
        assert_ne!(evaluate_polynomial(&coefficients, &Scalar::from(4u64)), Scalar::ZERO);
        assert_eq!(polynomial_from_roots(&[]), vec![Scalar::ONE]);
    }
}
