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

use std::collections::BTreeMap;

use bls12_381_plus::Scalar;
use ff::Field;

use super::LeafLabel;
use crate::{ciphersuites::AbsCiphersuite, errors::Error, utils::util::{hash_to_scalar, i2osp}};

/// Monotone span program: one row per policy leaf, `num_cols` columns.
///
/// Rows are stored at their natural length, entries past the end are zero. For any
/// satisfying set of rows some linear combination of them equals `(1, 0, ..., 0)`;
/// for the minimal sets returned by pruning, the plain sum does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonotoneSpanProgram {
    rows: BTreeMap<LeafLabel, Vec<Scalar>>,
    num_cols: usize,
}

impl MonotoneSpanProgram {
    pub(crate) fn new(rows: BTreeMap<LeafLabel, Vec<Scalar>>, num_cols: usize) -> Self {
        Self { rows, num_cols }
    }

    pub fn rows(&self) -> &BTreeMap<LeafLabel, Vec<Scalar>> {
        &self.rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &LeafLabel> {
        self.rows.keys()
    }

    pub fn row(&self, label: &LeafLabel) -> Option<&[Scalar]> {
        self.rows.get(label).map(|r| r.as_slice())
    }

    /// Entry `M[label][col]`, zero past the stored row length
    pub fn entry(&self, label: &LeafLabel, col: usize) -> Scalar {
        self.rows
            .get(label)
            .and_then(|r| r.get(col).copied())
            .unwrap_or(Scalar::ZERO)
    }

    /// Canonical byte encoding, used to bind the program into hashes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&i2osp(self.num_cols, 8));
        out.extend_from_slice(&i2osp(self.rows.len(), 8));
        for (label, row) in &self.rows {
            let label = label.to_string();
            out.extend_from_slice(&i2osp(label.len(), 8));
            out.extend_from_slice(label.as_bytes());
            out.extend_from_slice(&i2osp(row.len(), 8));
            row.iter().for_each(|m| out.extend_from_slice(&m.to_be_bytes()));
        }
        out
    }

    /// `H(M)`: digest of the program under the ciphersuite policy tag
    pub fn digest<CS: AbsCiphersuite>(&self) -> Result<Scalar, Error> {
        hash_to_scalar::<CS>(&self.to_bytes(), CS::POLICY_DST)
    }
}
