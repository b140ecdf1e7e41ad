//! Core datatypes used to represent math symbols, expressions, hypotheses,
//! and assertions.
//!
//! Everything in a Metamath database is built out of whitespace-delimited
//! ASCII tokens.  Labels and math symbols live in disjoint namespaces but
//! share a representation, so a single `Token` type covers both.

use std::collections::BTreeSet;

/// Semantic type for tokens which have been copied onto the heap.
///
/// Tokens are always non-empty and consist of ASCII graphic characters; the
/// tokenizer rejects anything else before a token can be constructed.
pub type Token = Box<[u8]>;

/// Semantic type for tokens which have not been copied.
pub type TokenPtr<'a> = &'a [u8];

/// Transmutes a token into a Rust string for display purposes.
#[must_use]
pub fn as_str(ptr: TokenPtr<'_>) -> &str {
    std::str::from_utf8(ptr).expect("tokens are always printable ASCII")
}

/// An expression is an ordered sequence of math symbols.
///
/// The first symbol is always a constant (the type code, e.g. `wff` or `|-`);
/// each later symbol is either a constant or a variable which had an active
/// floating hypothesis at the moment the expression was parsed.
pub type Expression = Box<[Token]>;

/// Types of math symbols in declarations.
#[derive(Eq, PartialEq, Hash, Copy, Clone, Debug)]
pub enum SymbolType {
    /// `$v`
    Variable,
    /// `$c`
    Constant,
}

impl SymbolType {
    /// The name of the symbol kind as it appears in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SymbolType::Variable => "variable",
            SymbolType::Constant => "constant",
        }
    }

    /// The opposite symbol kind.
    #[must_use]
    pub const fn other(self) -> SymbolType {
        match self {
            SymbolType::Variable => SymbolType::Constant,
            SymbolType::Constant => SymbolType::Variable,
        }
    }
}

/// The seven kinds of keyword statement a database is built from.
#[derive(Eq, PartialEq, Hash, Copy, Clone, Debug)]
pub enum StatementType {
    /// `$c`
    Constant,
    /// `$v`
    Variable,
    /// `$d`
    Disjoint,
    /// `$f`
    Floating,
    /// `$e`
    Essential,
    /// `$a`
    Axiom,
    /// `$p`
    Provable,
}

impl StatementType {
    /// The keyword which introduces this kind of statement.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            StatementType::Constant => "$c",
            StatementType::Variable => "$v",
            StatementType::Disjoint => "$d",
            StatementType::Floating => "$f",
            StatementType::Essential => "$e",
            StatementType::Axiom => "$a",
            StatementType::Provable => "$p",
        }
    }
}

/// A hypothesis as recorded in the global table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hypothesis {
    /// The statement of the hypothesis.  For a floating hypothesis this is
    /// exactly `[typecode, variable]`.
    pub expression: Expression,
    /// True iff this is a `$f` (floating) hypothesis.
    pub floating: bool,
}

/// An axiom or a theorem.
///
/// Once constructed, an assertion is never modified; its hypothesis list and
/// disjoint-variable restrictions are fixed at the point of declaration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Assertion {
    /// Labels of the mandatory hypotheses, in declaration order (outermost
    /// scope first, declaration order within each scope).
    pub hypotheses: Vec<Token>,
    /// Mandatory disjoint-variable restrictions, as pairs `(a, b)` with
    /// `a < b`.
    pub disj_vars: BTreeSet<(Token, Token)>,
    /// Statement of the axiom or theorem.
    pub expression: Expression,
}
