//! Interface to the grammar-based CIE parser.
//!
//! The grammar and the generated parser live outside this crate; callers plug
//! an implementation in through [`CieParser`].

use serde::Serialize;
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse CIE string: {0}")]
pub struct ParseError(pub String);

/// Parse tree node: a rule with children, or a terminal token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParseTree {
    Rule { rule: String, children: Vec<ParseTree> },
    Token { kind: String, value: String },
}

impl ParseTree {
    pub fn rule(rule: impl Into<String>, children: Vec<ParseTree>) -> Self {
        ParseTree::Rule {
            rule: rule.into(),
            children,
        }
    }

    pub fn token(kind: impl Into<String>, value: impl Into<String>) -> Self {
        ParseTree::Token {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Indented, one-node-per-line rendering.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_into(&mut out, 0);
        out
    }

    fn pretty_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        match self {
            ParseTree::Rule { rule, children } => {
                let _ = writeln!(out, "{pad}{rule}");
                for c in children {
                    c.pretty_into(out, depth + 1);
                }
            }
            ParseTree::Token { value, .. } => {
                let _ = writeln!(out, "{pad}{value}");
            }
        }
    }
}

/// Outcome of [`CieParser::parse_safe`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOutcome {
    pub success: bool,
    pub tree: Option<ParseTree>,
    pub error: Option<String>,
}

pub trait CieParser {
    fn parse(&self, text: &str) -> Result<ParseTree, ParseError>;

    /// Never fails; wraps the error message instead.
    fn parse_safe(&self, text: &str) -> ParseOutcome {
        match self.parse(text) {
            Ok(tree) => ParseOutcome {
                success: true,
                tree: Some(tree),
                error: None,
            },
            Err(e) => ParseOutcome {
                success: false,
                tree: None,
                error: Some(e.to_string()),
            },
        }
    }
}
