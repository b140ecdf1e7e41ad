//! Tracking of declarations across nested `${ ... $}` blocks.
//!
//! A scope holds everything that dies with its block: the variables it
//! activates, the hypotheses it declares, its disjoint-variable groups, and
//! the map from each variable to its active floating hypothesis.  The global
//! symbol tables live elsewhere; popping a scope only retires *activity*,
//! never the declarations themselves.
//!
//! All queries walk the stack innermost-first.

use crate::diag::{try_assert, Diagnostic, Result};
use crate::statement::{Token, TokenPtr};
use crate::util::{HashMap, HashSet};

/// Transient state introduced by one `${ ... $}` block, or by the outermost
/// scope.
#[derive(Default, Debug)]
pub(crate) struct Scope {
    /// Variables activated in this block.
    pub(crate) active_variables: HashSet<Token>,
    /// Labels of hypotheses declared in this block, in declaration order.
    pub(crate) active_hyp: Vec<Token>,
    /// Disjoint-variable groups declared by `$d` statements in this block.
    pub(crate) disj_vars: Vec<HashSet<Token>>,
    /// Map from variable to the label of its active floating hypothesis.
    pub(crate) floating_hyp: HashMap<Token, Token>,
}

/// The stack of open scopes: one entry per unmatched `${`, plus the
/// outermost scope, which is always present.
#[derive(Debug)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        ScopeStack {
            scopes: vec![Scope::default()],
        }
    }
}

impl ScopeStack {
    /// Open a new scope for a `${` token.
    pub(crate) fn open(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Close the innermost scope for a `$}` token, discarding its contents.
    pub(crate) fn close(&mut self) -> Result<()> {
        try_assert!(self.scopes.len() > 1, Diagnostic::UnmatchedCloseGroup);
        self.scopes.pop();
        Ok(())
    }

    /// Number of open scopes, counting the outermost one.
    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// The innermost open scope, where new declarations land.
    pub(crate) fn innermost_mut(&mut self) -> &mut Scope {
        self.scopes
            .last_mut()
            .expect("the outermost scope is never popped")
    }

    /// Iterate over the open scopes, innermost first.
    pub(crate) fn iter_innermost(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter().rev()
    }

    /// Determine if a symbol is an active variable.
    pub(crate) fn is_active_variable(&self, symbol: TokenPtr<'_>) -> bool {
        self.iter_innermost()
            .any(|scope| scope.active_variables.contains(symbol))
    }

    /// Find the active floating hypothesis corresponding to a variable, if
    /// there is one.
    pub(crate) fn get_floating_hyp(&self, var: TokenPtr<'_>) -> Option<&Token> {
        self.iter_innermost()
            .find_map(|scope| scope.floating_hyp.get(var))
    }

    /// Determine if a label names an active hypothesis.
    pub(crate) fn is_active_hyp(&self, label: TokenPtr<'_>) -> bool {
        self.iter_innermost()
            .any(|scope| scope.active_hyp.iter().any(|hyp| &**hyp == label))
    }

    /// Determine if there is an active disjoint-variable restriction on two
    /// *different* variables.
    pub(crate) fn is_dvr(&self, var1: TokenPtr<'_>, var2: TokenPtr<'_>) -> bool {
        if var1 == var2 {
            return false;
        }
        self.iter_innermost().any(|scope| {
            scope
                .disj_vars
                .iter()
                .any(|group| group.contains(var1) && group.contains(var2))
        })
    }
}
