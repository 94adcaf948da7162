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

use crate::errors::Error;
use pest::{iterators::Pair, Parser};
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "policy/policy.pest"]
struct PolicyParser;

/// Unlabelled policy tree, as produced by the parser
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Expr {
    Attribute(String),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

// Operands of an `expr`/`term` pair, folded left to right.
fn fold(pair: Pair<Rule>, combine: fn(Box<Expr>, Box<Expr>) -> Expr) -> Result<Expr, Error> {
    let mut operands = pair
        .into_inner()
        .filter(|p| !matches!(p.as_rule(), Rule::and_op | Rule::or_op))
        .map(build);

    let mut node = operands
        .next()
        .ok_or_else(|| Error::MalformedPolicy("missing operand".to_owned()))??;
    for rhs in operands {
        node = combine(Box::new(node), Box::new(rhs?));
    }
    Ok(node)
}

fn build(pair: Pair<Rule>) -> Result<Expr, Error> {
    match pair.as_rule() {
        Rule::expr => fold(pair, Expr::Or),
        Rule::term => fold(pair, Expr::And),
        Rule::attribute => Ok(Expr::Attribute(pair.as_str().to_owned())),
        rule => Err(Error::MalformedPolicy(format!("unexpected rule {:?}", rule))),
    }
}

pub(crate) fn parse(input: &str) -> Result<Expr, Error> {
    let policy = PolicyParser::parse(Rule::policy, input)
        .map_err(|e| Error::MalformedPolicy(e.to_string()))?
        .next()
        .ok_or_else(|| Error::MalformedPolicy("empty policy".to_owned()))?;

    let expr = policy
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| Error::MalformedPolicy("empty policy".to_owned()))?;

    build(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str) -> Box<Expr> {
        Box::new(Expr::Attribute(name.to_owned()))
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("a or b and c").unwrap();
        assert_eq!(expr, Expr::Or(attr("a"), Box::new(Expr::And(attr("b"), attr("c")))));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let expr = parse("(A AND B) Or C").unwrap();
        assert_eq!(expr, Expr::Or(Box::new(Expr::And(attr("A"), attr("B"))), attr("C")));
    }

    #[test]
    fn operators_are_left_associative() {
        let expr = parse("a and b and c").unwrap();
        assert_eq!(expr, Expr::And(Box::new(Expr::And(attr("a"), attr("b"))), attr("c")));
    }

    #[test]
    fn keyword_prefixes_are_attributes() {
        let expr = parse("android or oracle.db:rw").unwrap();
        assert_eq!(expr, Expr::Or(attr("android"), attr("oracle.db:rw")));
        let expr = parse("(x)and(y@z)").unwrap();
        assert_eq!(expr, Expr::And(attr("x"), attr("y@z")));
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "   ", "(a and b", "a and", "and a", "a b", "a & b", "()", "a or (b))", "a andb", "or"] {
            assert!(matches!(parse(bad), Err(Error::MalformedPolicy(_))), "accepted {:?}", bad);
        }
    }
}
