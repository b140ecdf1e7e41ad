//! Datatypes to represent diagnostics emitted by the verifier.
//!
//! This is an enum-based representation suited for programmatic
//! interpretation and testing; the `Display` impl renders each code as the
//! one-line human-readable message printed on the diagnostic stream.
//!
//! Each diagnostic is fatal to the run.  The two non-fatal conditions (an
//! incomplete proof, and a proof which proves the wrong statement) are
//! reported through the `log` facade instead and do not appear here.

use crate::statement::{as_str, StatementType, SymbolType, Token};
use std::error::Error;
use std::fmt;

/// Result type used by all fallible operations in the verifier.
pub type Result<T> = std::result::Result<T, Diagnostic>;

// Databases are very fragile and there are very few situations where errors
// are recoverable, so we bail out using Result on any error.
macro_rules! try_assert {
    ( $cond:expr , $($arg:tt)+ ) => {
        if !$cond {
            return Err($($arg)+);
        }
    }
}
pub(crate) use try_assert;

/// List of all diagnostic codes.  For the rendering of each, see the source
/// of the `Display` impl.
#[derive(Debug, Clone, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Diagnostic {
    BadCharacter(u8),
    BadCommentEnd,
    BadIncludeDelimiter(Token),
    ConstantNotTopLevel,
    DisjointSingle,
    DjNotVariable(Token),
    DjRepeatedVariable(Token),
    DuplicateConstant(Token),
    DuplicateLabel(Token),
    DuplicateVariable(Token),
    EmptyStatement(StatementType),
    ExprBadSymbol(StatementType, Token, Token),
    ExprNotConstantPrefix(StatementType, Token, Token),
    FilenameDollar(Token),
    FloatNotTerminated(Token, Token),
    FloatNotVariable(Token, Token),
    FloatRedeclared(Token, Token),
    IoError(String),
    LabelReusedAsSymbol(SymbolType, Token),
    NestedComment,
    NotMathSymbol(SymbolType, Token),
    ProofBogusCharacter(Token),
    ProofDvViolation(Token),
    ProofEmpty(Token),
    ProofExcessEnd(Token),
    ProofIncompleteNumber(Token),
    ProofInvalidSave(Token),
    ProofMandatoryHyp(Token, Token),
    ProofNumberOverflow(Token),
    ProofSelfReference(Token),
    ProofStepOutOfRange(Token),
    ProofUnderflow(Token),
    ProofUnificationFailure(Token),
    StepMissing(Token, Token),
    SymbolRedeclared(SymbolType, Token),
    SymbolReusedAsLabel(SymbolType, Token),
    UnclosedComment,
    UnclosedGroup,
    UnclosedInclude,
    UnexpectedToken(Token),
    UnfinishedLabel,
    UnfinishedStatement(StatementType, Token),
    UnmatchedCloseGroup,
    UnterminatedStatement(StatementType),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Diagnostic::*;
        match self {
            BadCharacter(byte) => {
                write!(f, "Invalid character read with code 0x{byte:x}")
            }
            BadCommentEnd => write!(f, "Characters $) found in a comment"),
            BadIncludeDelimiter(_) => {
                write!(f, "Didn't find closing file inclusion delimiter")
            }
            ConstantNotTopLevel => write!(f, "$c statement occurs in inner block"),
            DisjointSingle => write!(f, "Not enough items in $d statement"),
            DjNotVariable(token) => write!(
                f,
                "Token {} is not an active variable, but was found in a $d statement",
                as_str(token)
            ),
            DjRepeatedVariable(token) => {
                write!(f, "$d statement mentions {} twice", as_str(token))
            }
            DuplicateConstant(token) => {
                write!(f, "Attempt to redeclare constant {}", as_str(token))
            }
            DuplicateLabel(label) => write!(f, "Attempt to reuse label {}", as_str(label)),
            DuplicateVariable(token) => {
                write!(f, "Attempt to redeclare active variable {}", as_str(token))
            }
            EmptyStatement(stype) => write!(f, "Empty {} statement", stype.keyword()),
            ExprBadSymbol(stype, label, token) => write!(
                f,
                "In {} statement {} token {} found which is not a constant or \
                 variable in an active $f statement",
                stype.keyword(),
                as_str(label),
                as_str(token)
            ),
            ExprNotConstantPrefix(stype, label, token) => write!(
                f,
                "First symbol in {} statement {} is {} which is not a constant",
                stype.keyword(),
                as_str(label),
                as_str(token)
            ),
            FilenameDollar(token) => {
                write!(f, "Filename {} contains a $", as_str(token))
            }
            FloatNotTerminated(label, token) => write!(
                f,
                "Expected end of $f statement {} but found {}",
                as_str(label),
                as_str(token)
            ),
            FloatNotVariable(label, token) => write!(
                f,
                "Second symbol in $f statement {} is {} which is not an active variable",
                as_str(label),
                as_str(token)
            ),
            FloatRedeclared(var, label) => write!(
                f,
                "The variable {} appears in a second $f statement {}",
                as_str(var),
                as_str(label)
            ),
            IoError(filename) => write!(f, "Could not open {filename}"),
            LabelReusedAsSymbol(stype, token) => write!(
                f,
                "Attempt to reuse label {} as a {}",
                as_str(token),
                stype.name()
            ),
            NestedComment => write!(f, "Characters $( found in a comment"),
            NotMathSymbol(stype, token) => write!(
                f,
                "Attempt to declare {} as a {}",
                as_str(token),
                stype.name()
            ),
            ProofBogusCharacter(label) => write!(
                f,
                "Bogus character found in compressed proof of {}",
                as_str(label)
            ),
            ProofDvViolation(label) => write!(
                f,
                "In proof of theorem {} disjoint variable restriction violated",
                as_str(label)
            ),
            ProofEmpty(label) => write!(f, "Theorem {} has no proof", as_str(label)),
            ProofExcessEnd(label) => write!(
                f,
                "Proof of theorem {} does not end with only one item on the stack",
                as_str(label)
            ),
            ProofIncompleteNumber(label) => write!(
                f,
                "Compressed proof of theorem {} ends in unfinished number",
                as_str(label)
            ),
            ProofInvalidSave(label) => write!(
                f,
                "Stray Z found in compressed proof of {}",
                as_str(label)
            ),
            ProofMandatoryHyp(label, hyp) => write!(
                f,
                "Compressed proof of theorem {} has mandatory hypothesis {} in label list",
                as_str(label),
                as_str(hyp)
            ),
            ProofNumberOverflow(label) => write!(
                f,
                "Overflow computing numbers in compressed proof of {}",
                as_str(label)
            ),
            ProofSelfReference(label) => {
                write!(f, "Proof of theorem {} refers to itself", as_str(label))
            }
            ProofStepOutOfRange(label) => write!(
                f,
                "Number in compressed proof of {} is too high",
                as_str(label)
            ),
            ProofUnderflow(label) => write!(
                f,
                "In proof of theorem {} not enough items found on stack",
                as_str(label)
            ),
            ProofUnificationFailure(label) => {
                write!(f, "In proof of theorem {} unification failed", as_str(label))
            }
            StepMissing(label, step) => write!(
                f,
                "Proof of theorem {} refers to {} which is not an active statement",
                as_str(label),
                as_str(step)
            ),
            SymbolRedeclared(stype, token) => write!(
                f,
                "Attempt to redeclare {} {} as a {}",
                stype.other().name(),
                as_str(token),
                stype.name()
            ),
            SymbolReusedAsLabel(stype, token) => write!(
                f,
                "Attempt to reuse {} {} as a label",
                stype.name(),
                as_str(token)
            ),
            UnclosedComment => write!(f, "Unclosed comment"),
            UnclosedGroup => write!(f, "${{ without corresponding $}}"),
            UnclosedInclude => write!(f, "Unfinished file inclusion command"),
            UnexpectedToken(token) => {
                write!(f, "Unexpected token {} encountered", as_str(token))
            }
            UnfinishedLabel => write!(f, "Unfinished labeled statement"),
            UnfinishedStatement(stype, label) => write!(
                f,
                "Unfinished {} statement {}",
                stype.keyword(),
                as_str(label)
            ),
            UnmatchedCloseGroup => write!(f, "$}} without corresponding ${{"),
            UnterminatedStatement(stype) => {
                write!(f, "Unterminated {} statement", stype.keyword())
            }
        }
    }
}

impl Error for Diagnostic {}
