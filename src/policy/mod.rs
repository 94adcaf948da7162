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

//! Access policies over attributes.
//!
//! A policy is a monotone boolean formula such as `((1 and 2) or (3 and 4))`. Once
//! parsed, every leaf receives a [`LeafLabel`]: attributes occurring once keep their
//! bare name, attributes occurring several times are told apart by an occurrence
//! index. The labelled tree is then compiled into a [`MonotoneSpanProgram`] and can be
//! pruned against a set of attributes to find a minimal satisfying set of leaves.

/// Module for monotone span programs
pub mod msp;
mod parser;

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use bls12_381_plus::Scalar;
use ff::Field;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
pub use msp::MonotoneSpanProgram;
use parser::Expr;

const INDEX_SEPARATOR: char = '#';

/// Label of a policy leaf: the attribute and, when the attribute occurs more than
/// once in the policy, the index of this occurrence.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LeafLabel {
    attribute: String,
    index: Option<usize>,
}

impl LeafLabel {
    pub fn new(attribute: &str, index: Option<usize>) -> Self {
        Self { attribute: attribute.to_owned(), index }
    }

    /// The attribute name with the occurrence index stripped
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

impl fmt::Display for LeafLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}{}{}", self.attribute, INDEX_SEPARATOR, i),
            None => write!(f, "{}", self.attribute),
        }
    }
}

impl From<LeafLabel> for String {
    fn from(label: LeafLabel) -> Self {
        label.to_string()
    }
}

impl TryFrom<String> for LeafLabel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.rsplit_once(INDEX_SEPARATOR) {
            Some((attribute, index)) => {
                let index = index
                    .parse::<usize>()
                    .map_err(|_| Error::DeserializationError(format!("invalid leaf label {}", value)))?;
                Ok(Self::new(attribute, Some(index)))
            }
            None => Ok(Self::new(&value, None)),
        }
    }
}

/// Strips the occurrence index from a leaf label
pub fn strip_index(label: &LeafLabel) -> &str {
    label.attribute()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyNode {
    Leaf(LeafLabel),
    And(Box<PolicyNode>, Box<PolicyNode>),
    Or(Box<PolicyNode>, Box<PolicyNode>),
}

impl PolicyNode {
    fn leaves<'a>(&'a self, out: &mut Vec<&'a LeafLabel>) {
        match self {
            PolicyNode::Leaf(label) => out.push(label),
            PolicyNode::And(l, r) | PolicyNode::Or(l, r) => {
                l.leaves(out);
                r.leaves(out);
            }
        }
    }

    fn required_leaves(&self, attributes: &[&str]) -> Option<Vec<LeafLabel>> {
        match self {
            PolicyNode::Leaf(label) => attributes
                .contains(&label.attribute())
                .then(|| vec![label.clone()]),
            PolicyNode::And(l, r) => {
                let mut left = l.required_leaves(attributes)?;
                let right = r.required_leaves(attributes)?;
                left.extend(right);
                Some(left)
            }
            PolicyNode::Or(l, r) => match (l.required_leaves(attributes), r.required_leaves(attributes)) {
                (Some(left), Some(right)) => {
                    if right.len() < left.len() {
                        Some(right)
                    } else {
                        Some(left)
                    }
                }
                (Some(left), None) => Some(left),
                (None, right) => right,
            },
        }
    }

    // Lewko-Waters conversion: OR copies the vector, AND splits it into
    // (v || 0...0 || 1) and (0...0 || -1) and grows the counter by one.
    fn to_rows(&self, vector: Vec<Scalar>, counter: &mut usize, rows: &mut BTreeMap<LeafLabel, Vec<Scalar>>) {
        match self {
            PolicyNode::Leaf(label) => {
                rows.insert(label.clone(), vector);
            }
            PolicyNode::Or(l, r) => {
                l.to_rows(vector.clone(), counter, rows);
                r.to_rows(vector, counter, rows);
            }
            PolicyNode::And(l, r) => {
                let mut left = vector;
                left.resize(*counter, Scalar::ZERO);
                left.push(Scalar::ONE);

                let mut right = vec![Scalar::ZERO; *counter];
                right.push(-Scalar::ONE);

                *counter += 1;
                l.to_rows(left, counter, rows);
                r.to_rows(right, counter, rows);
            }
        }
    }
}

impl fmt::Display for PolicyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyNode::Leaf(label) => write!(f, "{}", label.attribute()),
            PolicyNode::And(l, r) => write!(f, "({} and {})", l, r),
            PolicyNode::Or(l, r) => write!(f, "({} or {})", l, r),
        }
    }
}

/// A parsed, leaf-labelled access policy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessPolicy {
    root: PolicyNode,
}

impl AccessPolicy {
    /// # Description
    /// Parses a policy string and labels its leaves.
    ///
    /// # Inputs:
    /// * `policy` (REQUIRED), a formula over attributes joined by `and` / `or`, with parentheses.
    ///
    /// # Output:
    /// an [`AccessPolicy`] or [`Error::MalformedPolicy`].
    pub fn parse(policy: &str) -> Result<Self, Error> {
        let expr = parser::parse(policy)?;

        let mut occurrences: BTreeMap<String, usize> = BTreeMap::new();
        count_occurrences(&expr, &mut occurrences);

        let mut seen: BTreeMap<String, usize> = BTreeMap::new();
        let root = label_leaves(expr, &occurrences, &mut seen);

        Ok(Self { root })
    }

    pub fn root(&self) -> &PolicyNode {
        &self.root
    }

    /// Leaf labels in left-to-right order
    pub fn leaves(&self) -> Vec<&LeafLabel> {
        let mut out = Vec::new();
        self.root.leaves(&mut out);
        out
    }

    /// Distinct attribute names mentioned by the policy
    pub fn attributes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for label in self.leaves() {
            if !out.contains(&label.attribute()) {
                out.push(label.attribute());
            }
        }
        out
    }

    /// Compiles the policy into a monotone span program
    pub fn to_msp(&self) -> MonotoneSpanProgram {
        let mut rows = BTreeMap::new();
        let mut counter = 1usize;
        self.root.to_rows(vec![Scalar::ONE], &mut counter, &mut rows);
        MonotoneSpanProgram::new(rows, counter)
    }

    /// # Description
    /// Selects a minimal set of leaves satisfying the policy using only the given attributes.
    /// For an OR gate the satisfiable branch with fewer leaves is taken (the left one on ties).
    ///
    /// # Output:
    /// the satisfying leaf labels in policy order, or `None` if the attributes do not satisfy the policy.
    pub fn prune<S: AsRef<str>>(&self, attributes: &[S]) -> Option<Vec<LeafLabel>> {
        let attributes: Vec<&str> = attributes.iter().map(|a| a.as_ref()).collect();
        self.root.required_leaves(&attributes)
    }

    /// Prunes against the claimed `attributes` that also satisfy `held`.
    ///
    /// Fails with [`Error::AttributeNotHeld`] when only the full claimed list
    /// satisfies the policy, naming the first missing attribute it relies on.
    pub fn prune_held<S, F>(&self, attributes: &[S], held: F) -> Result<Vec<LeafLabel>, Error>
    where
        S: AsRef<str>,
        F: Fn(&str) -> bool,
    {
        let usable: Vec<&str> = attributes.iter().map(|a| a.as_ref()).filter(|a| held(*a)).collect();
        if let Some(pruned) = self.prune(&usable) {
            return Ok(pruned);
        }

        let claimed = self.prune(attributes).ok_or(Error::PolicyNotSatisfied)?;
        let missing = claimed
            .into_iter()
            .find(|l| !held(l.attribute()))
            .ok_or(Error::PolicyNotSatisfied)?;
        Err(Error::AttributeNotHeld(missing.attribute().to_owned()))
    }

    pub fn is_satisfied_by<S: AsRef<str>>(&self, attributes: &[S]) -> bool {
        self.prune(attributes).is_some()
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl FromStr for AccessPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn count_occurrences(expr: &Expr, occurrences: &mut BTreeMap<String, usize>) {
    match expr {
        Expr::Attribute(name) => *occurrences.entry(name.clone()).or_insert(0) += 1,
        Expr::And(l, r) | Expr::Or(l, r) => {
            count_occurrences(l, occurrences);
            count_occurrences(r, occurrences);
        }
    }
}

fn label_leaves(expr: Expr, occurrences: &BTreeMap<String, usize>, seen: &mut BTreeMap<String, usize>) -> PolicyNode {
    match expr {
        Expr::Attribute(name) => {
            let index = if occurrences.get(&name).copied().unwrap_or(0) > 1 {
                let next = seen.entry(name.clone()).or_insert(0);
                let index = *next;
                *next += 1;
                Some(index)
            } else {
                None
            };
            PolicyNode::Leaf(LeafLabel { attribute: name, index })
        }
        Expr::And(l, r) => {
            let left = label_leaves(*l, occurrences, seen);
            let right = label_leaves(*r, occurrences, seen);
            PolicyNode::And(Box::new(left), Box::new(right))
        }
        Expr::Or(l, r) => {
            let left = label_leaves(*l, occurrences, seen);
            let right = label_leaves(*r, occurrences, seen);
            PolicyNode::Or(Box::new(left), Box::new(right))
        }
    }
}
