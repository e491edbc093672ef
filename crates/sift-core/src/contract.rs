//! The shape a tokenizer module must have before we trust it.
//!
//! A loaded module describes its exported members; [`validate`] compares that
//! description against [`TOKENIZER_CONTRACT`] and reports every difference.

use std::fmt;

/// How a member is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Async,
    Sync,
    Unknown(u32),
}

impl MemberKind {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => MemberKind::Async,
            1 => MemberKind::Sync,
            other => MemberKind::Unknown(other),
        }
    }
}

/// What a member returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Unit,
    Bool,
    Strings,
    Unknown(u32),
}

impl ReturnKind {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => ReturnKind::Unit,
            1 => ReturnKind::Bool,
            2 => ReturnKind::Strings,
            other => ReturnKind::Unknown(other),
        }
    }
}

/// Signature of one exported member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub kind: MemberKind,
    pub arity: u32,
    pub returns: ReturnKind,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            MemberKind::Async => "async fn".to_string(),
            MemberKind::Sync => "fn".to_string(),
            MemberKind::Unknown(k) => format!("<kind {k}> fn"),
        };
        let args = match self.arity {
            0 => String::new(),
            1 => "text".to_string(),
            n => (0..n).map(|i| format!("arg{i}")).collect::<Vec<_>>().join(", "),
        };
        let returns = match self.returns {
            ReturnKind::Unit => "()".to_string(),
            ReturnKind::Bool => "bool".to_string(),
            ReturnKind::Strings => "[string]".to_string(),
            ReturnKind::Unknown(r) => format!("<return {r}>"),
        };
        write!(f, "{kind}({args}) -> {returns}")
    }
}

/// A named member as declared by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub signature: Signature,
}

pub const INIT: &str = "init";
pub const IS_TOKENIZABLE: &str = "is_tokenizable";
pub const TOKENIZE: &str = "tokenize";

/// Exactly these members, nothing more.
pub const TOKENIZER_CONTRACT: [(&str, Signature); 3] = [
    (
        INIT,
        Signature {
            kind: MemberKind::Async,
            arity: 0,
            returns: ReturnKind::Unit,
        },
    ),
    (
        IS_TOKENIZABLE,
        Signature {
            kind: MemberKind::Sync,
            arity: 1,
            returns: ReturnKind::Bool,
        },
    ),
    (
        TOKENIZE,
        Signature {
            kind: MemberKind::Sync,
            arity: 1,
            returns: ReturnKind::Strings,
        },
    ),
];

/// One way a module deviates from the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Missing {
        name: &'static str,
        expected: Signature,
    },
    Unexpected(Member),
    Mismatch {
        name: &'static str,
        expected: Signature,
        found: Signature,
    },
    Duplicate(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing { name, expected } => write!(f, "- {name}: {expected}"),
            Violation::Unexpected(m) => write!(f, "+ {}: {}", m.name, m.signature),
            Violation::Mismatch {
                name,
                expected,
                found,
            } => write!(f, "~ {name}: expected {expected}, found {found}"),
            Violation::Duplicate(name) => write!(f, "! {name}: exported more than once"),
        }
    }
}

/// Renders violations as a diff, one line per violation.
pub fn render_diff(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Checks `members` against the tokenizer contract. Empty means valid.
pub fn validate(members: &[Member]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (i, member) in members.iter().enumerate() {
        if members[..i].iter().any(|m| m.name == member.name) {
            violations.push(Violation::Duplicate(member.name.clone()));
        }
    }

    for (name, expected) in TOKENIZER_CONTRACT {
        match members.iter().find(|m| m.name == name) {
            None => violations.push(Violation::Missing { name, expected }),
            Some(m) if m.signature != expected => violations.push(Violation::Mismatch {
                name,
                expected,
                found: m.signature,
            }),
            Some(_) => {}
        }
    }

    for member in members {
        if !TOKENIZER_CONTRACT.iter().any(|(name, _)| *name == member.name) {
            violations.push(Violation::Unexpected(member.clone()));
        }
    }

    violations
}
