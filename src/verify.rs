//! The proof verifier itself.
//!
//! Checking a proof is a kind of interpretation: there is a stack of known
//! results, and each step is an operation which pops zero or more results
//! off the stack, does local checks, and pushes a new result.  A step naming
//! a hypothesis pushes its statement verbatim; a step naming a previously
//! declared assertion unifies that assertion's mandatory hypotheses against
//! the stack top, checks the disjoint-variable restrictions under the
//! resulting substitution, and pushes the substituted conclusion.
//!
//! Both proof formats reduce to the same machine.  A regular proof is a
//! plain list of step labels.  A compressed proof carries a label roster and
//! a base-20/base-5 digit string; the decoded numbers index, in order, the
//! theorem's mandatory hypotheses, the roster, and the steps saved with `Z`.

use crate::database::Database;
use crate::diag::{try_assert, Diagnostic, Result};
use crate::statement::{as_str, Assertion, StatementType, Token, TokenPtr};
use crate::util::HashMap;

/// Check if a token consists solely of upper-case letters or question marks.
fn is_upper_or_q(token: TokenPtr<'_>) -> bool {
    token
        .iter()
        .all(|&ch| ch.is_ascii_uppercase() || ch == b'?')
}

/// Get the raw numbers from the compressed proof format.
///
/// `A` through `T` close out a number; `U` through `Y` accumulate into it
/// base 5; `Z` marks a save point and is translated as 0.
pub(crate) fn proof_numbers(label: &Token, proof: &[u8]) -> Result<Vec<usize>> {
    let mut numbers = Vec::with_capacity(proof.len());
    let mut num = 0usize;
    let mut just_got_num = false;

    for &ch in proof {
        match ch {
            b'A'..=b'T' => {
                let addval = usize::from(ch - b'A' + 1);
                try_assert!(
                    num <= (usize::MAX - addval) / 20,
                    Diagnostic::ProofNumberOverflow(label.clone())
                );
                numbers.push(20 * num + addval);
                num = 0;
                just_got_num = true;
            }
            b'U'..=b'Y' => {
                let addval = usize::from(ch - b'T');
                try_assert!(
                    num <= (usize::MAX - addval) / 5,
                    Diagnostic::ProofNumberOverflow(label.clone())
                );
                num = 5 * num + addval;
                just_got_num = false;
            }
            b'Z' => {
                try_assert!(
                    just_got_num,
                    Diagnostic::ProofInvalidSave(label.clone())
                );
                numbers.push(0);
                just_got_num = false;
            }
            _ => return Err(Diagnostic::ProofBogusCharacter(label.clone())),
        }
    }

    try_assert!(num == 0, Diagnostic::ProofIncompleteNumber(label.clone()));
    Ok(numbers)
}

/// Make a substitution of variables: each symbol with an entry in the map is
/// replaced by its expansion, everything else is copied through.
fn make_substitution(
    original: &[Token],
    substitutions: &HashMap<Token, Vec<Token>>,
) -> Vec<Token> {
    let mut destination = Vec::with_capacity(original.len());
    for token in original {
        match substitutions.get(token) {
            None => destination.push(token.clone()),
            Some(expansion) => destination.extend_from_slice(expansion),
        }
    }
    destination
}

impl Database {
    /// Read the proof of a `$p` statement from the FIFO and verify it.
    /// The statement's expression and `$=` have already been consumed.
    pub(crate) fn parse_proof(&mut self, label: &Token, theorem: &Assertion) -> Result<()> {
        try_assert!(
            !self.tokens.is_empty(),
            Diagnostic::UnfinishedStatement(StatementType::Provable, label.clone())
        );

        if matches!(self.tokens.front(), Some(token) if &**token == b"(") {
            self.tokens.pop_front();
            self.parse_compressed_proof(label, theorem)
        } else {
            self.parse_regular_proof(label, theorem)
        }
    }

    /// Read a compressed proof: `( L1 ... Ln )` followed by the digit
    /// string, terminated by `$.`.
    fn parse_compressed_proof(&mut self, label: &Token, theorem: &Assertion) -> Result<()> {
        let mut labels: Vec<Token> = Vec::new();
        loop {
            let Some(token) = self.tokens.pop_front() else {
                return Err(Diagnostic::UnfinishedStatement(
                    StatementType::Provable,
                    label.clone(),
                ));
            };
            if &*token == b")" {
                break;
            }
            try_assert!(
                &token != label,
                Diagnostic::ProofSelfReference(label.clone())
            );
            // Mandatory hypotheses are implicit in a compressed proof and
            // may not also appear in the roster.
            try_assert!(
                !theorem.hypotheses.contains(&token),
                Diagnostic::ProofMandatoryHyp(label.clone(), token)
            );
            try_assert!(
                self.assertions.contains_key(&*token) || self.scopes.is_active_hyp(&token),
                Diagnostic::StepMissing(label.clone(), token)
            );
            labels.push(token);
        }

        let mut proof: Vec<u8> = Vec::new();
        loop {
            let Some(token) = self.tokens.pop_front() else {
                return Err(Diagnostic::UnfinishedStatement(
                    StatementType::Provable,
                    label.clone(),
                ));
            };
            if &*token == b"$." {
                break;
            }
            try_assert!(
                is_upper_or_q(&token),
                Diagnostic::ProofBogusCharacter(label.clone())
            );
            proof.extend_from_slice(&token);
        }

        try_assert!(!proof.is_empty(), Diagnostic::ProofEmpty(label.clone()));

        if proof.contains(&b'?') {
            log::warn!("Proof of theorem {} is incomplete", as_str(label));
            return Ok(());
        }

        let numbers = proof_numbers(label, &proof)?;
        self.verify_compressed_proof(label, theorem, &labels, &numbers)
    }

    /// Read a regular proof: a list of step labels terminated by `$.`.
    fn parse_regular_proof(&mut self, label: &Token, theorem: &Assertion) -> Result<()> {
        let mut proof: Vec<Token> = Vec::new();
        let mut incomplete = false;
        loop {
            let Some(token) = self.tokens.pop_front() else {
                return Err(Diagnostic::UnfinishedStatement(
                    StatementType::Provable,
                    label.clone(),
                ));
            };
            if &*token == b"$." {
                break;
            }
            if &*token == b"?" {
                incomplete = true;
            } else {
                try_assert!(
                    &token != label,
                    Diagnostic::ProofSelfReference(label.clone())
                );
                try_assert!(
                    self.assertions.contains_key(&*token)
                        || self.scopes.is_active_hyp(&token),
                    Diagnostic::StepMissing(label.clone(), token)
                );
            }
            proof.push(token);
        }

        try_assert!(!proof.is_empty(), Diagnostic::ProofEmpty(label.clone()));

        if incomplete {
            log::warn!("Proof of theorem {} is incomplete", as_str(label));
            return Ok(());
        }

        self.verify_regular_proof(label, theorem, &proof)
    }

    /// Run the stack machine over a validated list of step labels.
    fn verify_regular_proof(
        &self,
        label: &Token,
        theorem: &Assertion,
        proof: &[Token],
    ) -> Result<()> {
        let mut stack: Vec<Vec<Token>> = Vec::new();
        for step in proof {
            // A hypothesis is simply pushed; anything else is an assertion.
            if let Some(hyp) = self.hypotheses.get(&**step) {
                stack.push(hyp.expression.to_vec());
            } else {
                self.verify_assertion_ref(label, step, &mut stack)?;
            }
        }
        self.finish_proof(label, theorem, &stack)
    }

    /// Run the stack machine over a decoded compressed proof.
    fn verify_compressed_proof(
        &self,
        label: &Token,
        theorem: &Assertion,
        labels: &[Token],
        numbers: &[usize],
    ) -> Result<()> {
        let mut stack: Vec<Vec<Token>> = Vec::new();
        let mut saved_steps: Vec<Vec<Token>> = Vec::new();
        let mandatory = theorem.hypotheses.len();
        let roster = mandatory + labels.len();

        for &number in numbers {
            if number == 0 {
                // A save marker: remember the current stack top.
                let top = stack
                    .last()
                    .expect("the decoder only emits a save after a full step");
                saved_steps.push(top.clone());
            } else if number <= mandatory {
                let hyp = &self.hypotheses[&theorem.hypotheses[number - 1]];
                stack.push(hyp.expression.to_vec());
            } else if number <= roster {
                let step = &labels[number - mandatory - 1];
                if let Some(hyp) = self.hypotheses.get(&**step) {
                    stack.push(hyp.expression.to_vec());
                } else {
                    self.verify_assertion_ref(label, step, &mut stack)?;
                }
            } else {
                try_assert!(
                    number <= roster + saved_steps.len(),
                    Diagnostic::ProofStepOutOfRange(label.clone())
                );
                stack.push(saved_steps[number - roster - 1].clone());
            }
        }

        self.finish_proof(label, theorem, &stack)
    }

    /// Verify a proof step referencing an assertion: unify its mandatory
    /// hypotheses against the stack top, check the disjoint-variable
    /// restrictions, and replace the consumed slots with the substituted
    /// conclusion.
    fn verify_assertion_ref(
        &self,
        label: &Token,
        step: &Token,
        stack: &mut Vec<Vec<Token>>,
    ) -> Result<()> {
        let assertion = &self.assertions[step];
        try_assert!(
            stack.len() >= assertion.hypotheses.len(),
            Diagnostic::ProofUnderflow(label.clone())
        );
        let base = stack.len() - assertion.hypotheses.len();

        // Determine the substitutions and check that we can unify.  A
        // floating hypothesis binds its variable to the slot's tail; an
        // essential hypothesis must match the slot exactly under the
        // bindings collected so far.
        let mut substitutions: HashMap<Token, Vec<Token>> = HashMap::default();
        for (index, hyp_label) in assertion.hypotheses.iter().enumerate() {
            let hypothesis = &self.hypotheses[hyp_label];
            let slot = &stack[base + index];
            if hypothesis.floating {
                try_assert!(
                    hypothesis.expression[0] == slot[0],
                    Diagnostic::ProofUnificationFailure(label.clone())
                );
                substitutions.insert(hypothesis.expression[1].clone(), slot[1..].to_vec());
            } else {
                let expected = make_substitution(&hypothesis.expression, &substitutions);
                try_assert!(
                    expected == *slot,
                    Diagnostic::ProofUnificationFailure(label.clone())
                );
            }
        }

        stack.truncate(base);

        for (var1, var2) in &assertion.disj_vars {
            let exp1 = &substitutions[var1];
            let exp2 = &substitutions[var2];

            // Every variable of one image must be disjoint from every
            // variable of the other.
            for sym1 in exp1.iter().filter(|sym| self.variables.contains(sym.as_ref())) {
                for sym2 in exp2.iter().filter(|sym| self.variables.contains(sym.as_ref())) {
                    try_assert!(
                        self.scopes.is_dvr(sym1, sym2),
                        Diagnostic::ProofDvViolation(label.clone())
                    );
                }
            }
        }

        stack.push(make_substitution(&assertion.expression, &substitutions));
        Ok(())
    }

    /// Final check: the stack must hold exactly the theorem's statement.
    fn finish_proof(
        &self,
        label: &Token,
        theorem: &Assertion,
        stack: &[Vec<Token>],
    ) -> Result<()> {
        try_assert!(stack.len() == 1, Diagnostic::ProofExcessEnd(label.clone()));
        if stack[0][..] != theorem.expression[..] {
            // A proof of the wrong statement is reported without failing
            // the run.
            log::error!("Proof of theorem {} proves wrong statement", as_str(label));
        }
        Ok(())
    }
}
