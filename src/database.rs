//! The database driver.
//!
//! A [`Database`] owns the token FIFO, the global symbol tables, and the
//! scope stack, and makes one linear pass over the tokens: every statement
//! is parsed, checked, and (for `$p`) has its proof verified the moment it
//! is reached.  Declarations are therefore visible to everything after them
//! and to nothing before them.
//!
//! The global tables only ever grow; leaving a `${ ... $}` block retires the
//! *activity* of the declarations made inside it (tracked by the scope
//! stack) without removing them from the tables.

use crate::diag::{try_assert, Diagnostic, Result};
use crate::parser::{is_label_token, is_math_symbol_token, SourceReader};
use crate::scope::ScopeStack;
use crate::statement::{
    Assertion, Expression, Hypothesis, StatementType, SymbolType, Token, TokenPtr,
};
use crate::util::{HashMap, HashSet};
use itertools::Itertools;
use std::collections::{BTreeSet, VecDeque};

/// A single-use Metamath database verifier.
///
/// Feed it one database with [`Database::verify`] and discard it; running a
/// second database through the same instance is not supported.
#[derive(Default, Debug)]
pub struct Database {
    /// Token FIFO populated by the source reader and drained by the driver.
    pub(crate) tokens: VecDeque<Token>,
    /// Every constant ever declared.
    pub(crate) constants: HashSet<Token>,
    /// Every variable ever declared, active or not.
    pub(crate) variables: HashSet<Token>,
    /// Every hypothesis ever declared, keyed by label.
    pub(crate) hypotheses: HashMap<Token, Hypothesis>,
    /// Every assertion (axiom or theorem) ever declared, keyed by label.
    pub(crate) assertions: HashMap<Token, Assertion>,
    /// The stack of open scopes.
    pub(crate) scopes: ScopeStack,
}

impl Database {
    /// Creates a fresh verifier with empty tables and a single outermost
    /// scope.
    #[must_use]
    pub fn new() -> Database {
        Database::default()
    }

    /// Reads and verifies the named database.
    ///
    /// Sources are looked up in `data` first and on the filesystem second,
    /// so a test (or any other embedder) can inject database text without
    /// touching disk.  Returns `Ok(())` only if every statement parses and
    /// every proof checks.
    pub fn verify(&mut self, start: &str, data: &[(String, Vec<u8>)]) -> Result<()> {
        let mut reader = SourceReader::new(data);
        reader.read(start)?;
        self.tokens = reader.into_tokens();
        self.run()
    }

    /// Look up an assertion by label.
    #[must_use]
    pub fn assertion(&self, label: &[u8]) -> Option<&Assertion> {
        self.assertions.get(label)
    }

    /// Look up a hypothesis by label.
    #[must_use]
    pub fn hypothesis(&self, label: &[u8]) -> Option<&Hypothesis> {
        self.hypotheses.get(label)
    }

    /// Top-level loop: dispatch each token by kind until the FIFO is empty.
    fn run(&mut self) -> Result<()> {
        while let Some(token) = self.tokens.pop_front() {
            if is_label_token(&token) {
                self.parse_label(token)?;
                continue;
            }
            match &*token {
                b"$d" => self.parse_disjoint()?,
                b"${" => self.scopes.open(),
                b"$}" => self.scopes.close()?,
                b"$c" => self.parse_constants()?,
                b"$v" => self.parse_variables()?,
                _ => return Err(Diagnostic::UnexpectedToken(token)),
            }
        }

        try_assert!(self.scopes.depth() == 1, Diagnostic::UnclosedGroup);
        Ok(())
    }

    /// Determine if a token is used as a label anywhere in the database.
    fn label_used(&self, label: TokenPtr<'_>) -> bool {
        self.hypotheses.contains_key(label) || self.assertions.contains_key(label)
    }

    /// Parse a `$c` statement.  Valid only in the outermost scope.
    fn parse_constants(&mut self) -> Result<()> {
        try_assert!(self.scopes.depth() == 1, Diagnostic::ConstantNotTopLevel);

        let mut list_empty = true;
        loop {
            let Some(token) = self.tokens.pop_front() else {
                return Err(Diagnostic::UnterminatedStatement(StatementType::Constant));
            };
            if &*token == b"$." {
                break;
            }
            list_empty = false;

            try_assert!(
                is_math_symbol_token(&token),
                Diagnostic::NotMathSymbol(SymbolType::Constant, token)
            );
            try_assert!(
                !self.variables.contains(&*token),
                Diagnostic::SymbolRedeclared(SymbolType::Constant, token)
            );
            try_assert!(
                !self.label_used(&token),
                Diagnostic::LabelReusedAsSymbol(SymbolType::Constant, token)
            );
            try_assert!(
                self.constants.insert(token.clone()),
                Diagnostic::DuplicateConstant(token)
            );
        }

        try_assert!(
            !list_empty,
            Diagnostic::EmptyStatement(StatementType::Constant)
        );
        Ok(())
    }

    /// Parse a `$v` statement.
    fn parse_variables(&mut self) -> Result<()> {
        let mut list_empty = true;
        loop {
            let Some(token) = self.tokens.pop_front() else {
                return Err(Diagnostic::UnterminatedStatement(StatementType::Variable));
            };
            if &*token == b"$." {
                break;
            }
            list_empty = false;

            try_assert!(
                is_math_symbol_token(&token),
                Diagnostic::NotMathSymbol(SymbolType::Variable, token)
            );
            try_assert!(
                !self.constants.contains(&*token),
                Diagnostic::SymbolRedeclared(SymbolType::Variable, token)
            );
            try_assert!(
                !self.label_used(&token),
                Diagnostic::LabelReusedAsSymbol(SymbolType::Variable, token)
            );
            // A variable may be redeclared once it has gone out of scope, so
            // only *active* redeclaration is an error.
            try_assert!(
                !self.scopes.is_active_variable(&token),
                Diagnostic::DuplicateVariable(token)
            );

            self.variables.insert(token.clone());
            self.scopes.innermost_mut().active_variables.insert(token);
        }

        try_assert!(
            !list_empty,
            Diagnostic::EmptyStatement(StatementType::Variable)
        );
        Ok(())
    }

    /// Parse a `$d` statement: two or more distinct active variables.
    fn parse_disjoint(&mut self) -> Result<()> {
        let mut dvars: HashSet<Token> = HashSet::default();
        loop {
            let Some(token) = self.tokens.pop_front() else {
                return Err(Diagnostic::UnterminatedStatement(StatementType::Disjoint));
            };
            if &*token == b"$." {
                break;
            }

            try_assert!(
                self.scopes.is_active_variable(&token),
                Diagnostic::DjNotVariable(token)
            );
            try_assert!(
                dvars.insert(token.clone()),
                Diagnostic::DjRepeatedVariable(token)
            );
        }

        try_assert!(dvars.len() >= 2, Diagnostic::DisjointSingle);
        self.scopes.innermost_mut().disj_vars.push(dvars);
        Ok(())
    }

    /// Parse a labeled statement: the label has been consumed, the next
    /// token selects `$f`, `$e`, `$a`, or `$p`.
    fn parse_label(&mut self, label: Token) -> Result<()> {
        try_assert!(
            !self.constants.contains(&*label),
            Diagnostic::SymbolReusedAsLabel(SymbolType::Constant, label)
        );
        try_assert!(
            !self.variables.contains(&*label),
            Diagnostic::SymbolReusedAsLabel(SymbolType::Variable, label)
        );
        try_assert!(!self.label_used(&label), Diagnostic::DuplicateLabel(label));

        let Some(kind) = self.tokens.pop_front() else {
            return Err(Diagnostic::UnfinishedLabel);
        };
        match &*kind {
            b"$p" => self.parse_provable(label),
            b"$e" => self.parse_essential(label),
            b"$a" => self.parse_axiom(label),
            b"$f" => self.parse_floating(label),
            _ => Err(Diagnostic::UnexpectedToken(kind)),
        }
    }

    /// Read an expression from the FIFO, consuming (and discarding) the
    /// given terminator token.
    ///
    /// The first symbol must be a constant; each later symbol must be a
    /// constant or a variable with an active floating hypothesis.
    fn read_expression(
        &mut self,
        stype: StatementType,
        label: &Token,
        terminator: &[u8],
    ) -> Result<Expression> {
        let Some(typecode) = self.tokens.pop_front() else {
            return Err(Diagnostic::UnfinishedStatement(stype, label.clone()));
        };
        try_assert!(
            self.constants.contains(&*typecode),
            Diagnostic::ExprNotConstantPrefix(stype, label.clone(), typecode)
        );

        let mut expression = vec![typecode];
        loop {
            let Some(token) = self.tokens.pop_front() else {
                return Err(Diagnostic::UnfinishedStatement(stype, label.clone()));
            };
            if &*token == terminator {
                break;
            }
            try_assert!(
                self.constants.contains(&*token)
                    || self.scopes.get_floating_hyp(&token).is_some(),
                Diagnostic::ExprBadSymbol(stype, label.clone(), token)
            );
            expression.push(token);
        }

        Ok(expression.into())
    }

    /// Parse a `$f` statement: exactly a constant and an active variable
    /// which does not already have a floating hypothesis.
    fn parse_floating(&mut self, label: Token) -> Result<()> {
        let Some(typecode) = self.tokens.pop_front() else {
            return Err(Diagnostic::UnfinishedStatement(
                StatementType::Floating,
                label,
            ));
        };
        try_assert!(
            self.constants.contains(&*typecode),
            Diagnostic::ExprNotConstantPrefix(StatementType::Floating, label, typecode)
        );

        let Some(variable) = self.tokens.pop_front() else {
            return Err(Diagnostic::UnfinishedStatement(
                StatementType::Floating,
                label,
            ));
        };
        try_assert!(
            self.scopes.is_active_variable(&variable),
            Diagnostic::FloatNotVariable(label, variable)
        );
        try_assert!(
            self.scopes.get_floating_hyp(&variable).is_none(),
            Diagnostic::FloatRedeclared(variable, label)
        );

        let Some(terminator) = self.tokens.pop_front() else {
            return Err(Diagnostic::UnfinishedStatement(
                StatementType::Floating,
                label,
            ));
        };
        try_assert!(
            &*terminator == b"$.",
            Diagnostic::FloatNotTerminated(label, terminator)
        );

        let expression: Expression = vec![typecode, variable.clone()].into();
        self.hypotheses.insert(
            label.clone(),
            Hypothesis {
                expression,
                floating: true,
            },
        );
        let scope = self.scopes.innermost_mut();
        scope.active_hyp.push(label.clone());
        scope.floating_hyp.insert(variable, label);
        Ok(())
    }

    /// Parse an `$e` statement.
    fn parse_essential(&mut self, label: Token) -> Result<()> {
        let expression = self.read_expression(StatementType::Essential, &label, b"$.")?;
        self.hypotheses.insert(
            label.clone(),
            Hypothesis {
                expression,
                floating: false,
            },
        );
        self.scopes.innermost_mut().active_hyp.push(label);
        Ok(())
    }

    /// Parse an `$a` statement.
    fn parse_axiom(&mut self, label: Token) -> Result<()> {
        let expression = self.read_expression(StatementType::Axiom, &label, b"$.")?;
        self.construct_assertion(&label, expression);
        Ok(())
    }

    /// Parse a `$p` statement: the theorem's expression, then its proof.
    fn parse_provable(&mut self, label: Token) -> Result<()> {
        let expression = self.read_expression(StatementType::Provable, &label, b"$=")?;
        let theorem = self.construct_assertion(&label, expression);
        self.parse_proof(&label, &theorem)
    }

    /// Construct an [`Assertion`] from an expression: determine the
    /// mandatory hypotheses and disjoint-variable restrictions, record the
    /// result under `label`, and return a copy for immediate use.
    ///
    /// The scope stack is walked from the innermost scope outward, and each
    /// scope's hypotheses in reverse declaration order, prepending matches;
    /// the variables of an essential hypothesis join the used set as it is
    /// passed, so a floating hypothesis declared further out is still picked
    /// up for them.
    pub(crate) fn construct_assertion(&mut self, label: &Token, expression: Expression) -> Assertion {
        let mut vars_used: HashSet<Token> = expression
            .iter()
            .filter(|token| self.variables.contains(token.as_ref()))
            .cloned()
            .collect();

        let mut mandatory: VecDeque<Token> = VecDeque::new();
        for scope in self.scopes.iter_innermost() {
            for hyp_label in scope.active_hyp.iter().rev() {
                let hyp = &self.hypotheses[hyp_label];
                if hyp.floating {
                    if vars_used.contains(hyp.expression[1].as_ref()) {
                        mandatory.push_front(hyp_label.clone());
                    }
                } else {
                    mandatory.push_front(hyp_label.clone());
                    for symbol in &*hyp.expression {
                        if self.variables.contains(symbol.as_ref()) {
                            vars_used.insert(symbol.clone());
                        }
                    }
                }
            }
        }

        let mut disj_vars = BTreeSet::new();
        for scope in self.scopes.iter_innermost() {
            for group in &scope.disj_vars {
                // Intersect the group with the used variables; every ordered
                // pair of survivors is a mandatory restriction.
                let dset: BTreeSet<&Token> = group
                    .iter()
                    .filter(|var| vars_used.contains(var.as_ref()))
                    .collect();
                for (first, second) in dset.iter().copied().tuple_combinations() {
                    disj_vars.insert((first.clone(), second.clone()));
                }
            }
        }

        let assertion = Assertion {
            hypotheses: mandatory.into_iter().collect(),
            disj_vars,
            expression,
        };
        self.assertions.insert(label.clone(), assertion.clone());
        assertion
    }
}
