// src/depend/reduce.rs

//! USE-conditional reduction of dependency strings
//!
//! A dependency string such as
//!
//! ```text
//! dev-libs/a ssl? ( dev-libs/openssl:= ) || ( app-a/x app-b/y )
//! ```
//!
//! is parsed into a [`DepNode`] tree with every `flag? ( ... )` conditional
//! evaluated against a fixed set of enabled USE flags. Choice groups (`||`,
//! `^^`, `??`) are kept; plain parentheses outside a choice group are spliced
//! into their parent.

use super::atom::Atom;
use super::eapi::Eapi;
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static FLAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9+_@-]*$").unwrap());

/// A node of a reduced dependency tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepNode {
    Atom(Atom),
    /// `|| ( ... )`
    AnyOf(Vec<DepNode>),
    /// `^^ ( ... )`
    ExactlyOneOf(Vec<DepNode>),
    /// `?? ( ... )`
    AtMostOneOf(Vec<DepNode>),
    /// A parenthesized group inside a choice group
    AllOf(Vec<DepNode>),
}

/// Where a group sits, which decides whether nested groups survive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Plain,
    Choice,
}

struct Parser<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
    eapi: Eapi,
    use_flags: &'a HashSet<String>,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_open(&mut self, after: &str) -> Result<()> {
        match self.next() {
            Some("(") => Ok(()),
            other => Err(Error::ParseError(format!(
                "Expected '(' after '{}', found {}",
                after,
                other.map_or("end of string".to_string(), |t| format!("'{}'", t))
            ))),
        }
    }

    /// Parse tokens until the matching `)` (or end of input at depth 0)
    fn sequence(&mut self, context: Context, depth: usize) -> Result<Vec<DepNode>> {
        let mut nodes = Vec::new();

        loop {
            let Some(token) = self.next() else {
                if depth > 0 {
                    return Err(Error::ParseError("Missing ')' in dependency string".to_string()));
                }
                return Ok(nodes);
            };

            match token {
                ")" => {
                    if depth == 0 {
                        return Err(Error::ParseError("Unexpected ')' in dependency string".to_string()));
                    }
                    return Ok(nodes);
                }
                "(" => {
                    let children = self.sequence(context, depth + 1)?;
                    push_group(&mut nodes, children, context);
                }
                "||" | "^^" | "??" => {
                    if token == "^^" && !self.eapi.has_exactly_one_of()
                        || token == "??" && !self.eapi.has_at_most_one_of()
                    {
                        return Err(Error::ParseError(format!(
                            "'{}' groups are not allowed in EAPI {}",
                            token, self.eapi
                        )));
                    }
                    self.expect_open(token)?;
                    let children = self.sequence(Context::Choice, depth + 1)?;
                    if children.is_empty() {
                        continue;
                    }
                    nodes.push(match token {
                        "||" => DepNode::AnyOf(children),
                        "^^" => DepNode::ExactlyOneOf(children),
                        _ => DepNode::AtMostOneOf(children),
                    });
                }
                conditional if conditional.ends_with('?') => {
                    let flag = &conditional[..conditional.len() - 1];
                    let (negated, flag) = match flag.strip_prefix('!') {
                        Some(flag) => (true, flag),
                        None => (false, flag),
                    };
                    if !FLAG_RE.is_match(flag) {
                        return Err(Error::ParseError(format!(
                            "Invalid USE conditional '{}'",
                            conditional
                        )));
                    }
                    self.expect_open(conditional)?;
                    let children = self.sequence(context, depth + 1)?;
                    if self.use_flags.contains(flag) != negated {
                        push_group(&mut nodes, children, context);
                    }
                }
                atom => nodes.push(DepNode::Atom(Atom::parse(atom, self.eapi)?)),
            }
        }
    }
}

/// Attach a parenthesized group's children to its parent
fn push_group(nodes: &mut Vec<DepNode>, mut children: Vec<DepNode>, context: Context) {
    match context {
        Context::Plain => nodes.append(&mut children),
        Context::Choice => match children.len() {
            0 => {}
            1 => nodes.extend(children),
            _ => nodes.push(DepNode::AllOf(children)),
        },
    }
}

/// Parse `deps` under `eapi`, keeping only the branches enabled by `use_flags`
pub fn use_reduce(deps: &str, eapi: Eapi, use_flags: &HashSet<String>) -> Result<Vec<DepNode>> {
    let mut parser = Parser {
        tokens: deps.split_whitespace().collect(),
        pos: 0,
        eapi,
        use_flags,
    };
    parser.sequence(Context::Plain, 0)
}

/// Remove slot operators from every atom in the tree
pub fn strip_slots(nodes: &mut [DepNode]) {
    for node in nodes {
        match node {
            DepNode::Atom(atom) => atom.strip_slot_operator(),
            DepNode::AnyOf(children)
            | DepNode::ExactlyOneOf(children)
            | DepNode::AtMostOneOf(children)
            | DepNode::AllOf(children) => strip_slots(children),
        }
    }
}
