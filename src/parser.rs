//! The streaming tokenizer and source reader.
//!
//! The tokenizer splits a byte buffer into maximal runs of non-whitespace
//! and enforces the printable-ASCII character class.  The source reader sits
//! on top of it: it strips `$( ... $)` comments, follows `$[ path $]` file
//! inclusions (splicing the included tokens inline, with include-once
//! semantics across the whole run), and pushes everything that survives onto
//! the token FIFO which the driver later drains.
//!
//! Sources are looked up by name, first in a caller-supplied list of
//! injected `(name, text)` pairs and then on the filesystem.  The injection
//! path is what the test suite uses.

use crate::diag::{try_assert, Diagnostic, Result};
use crate::statement::{as_str, Token, TokenPtr};
use crate::util::HashSet;
use std::collections::VecDeque;
use std::fs;
use std::mem;

/// Bitmask of allowed whitespace characters.
///
/// A Metamath database is required to consist of graphic characters, SP, HT,
/// NL, FF, and CR.  Vertical tab is deliberately absent.
const MM_VALID_SPACES: u64 =
    (1u64 << 9) | (1u64 << 10) | (1u64 << 12) | (1u64 << 13) | (1u64 << 32);

/// Check if a character is valid Metamath whitespace.
pub(crate) const fn is_mm_space(byte: u8) -> bool {
    byte <= 32 && (MM_VALID_SPACES & (1u64 << byte)) != 0
}

/// Check if a token is a label token: alphanumerics plus `.`, `-`, `_`.
#[must_use]
pub fn is_label_token(token: TokenPtr<'_>) -> bool {
    token
        .iter()
        .all(|&ch| ch.is_ascii_alphanumeric() || ch == b'.' || ch == b'-' || ch == b'_')
}

/// Check if a token is a math symbol token, i.e. contains no `$`.
#[must_use]
pub fn is_math_symbol_token(token: TokenPtr<'_>) -> bool {
    !token.contains(&b'$')
}

/// Check whether a token contains a two-character sequence anywhere in it.
fn contains_sequence(token: TokenPtr<'_>, needle: &[u8; 2]) -> bool {
    token.windows(2).any(|window| window == needle)
}

/// State used by the scanning process for a single source.
struct Scanner<'a> {
    /// Text being tokenized.
    buffer: &'a [u8],
    /// Current position; always points at whitespace or the start of a token.
    position: usize,
}

impl<'a> Scanner<'a> {
    const fn new(buffer: &'a [u8]) -> Scanner<'a> {
        Scanner {
            buffer,
            position: 0,
        }
    }

    /// Get a single whitespace-delimited token, or `None` at end of input.
    ///
    /// Every byte of a token must be printable ASCII (0x21 through 0x7E);
    /// anything else, inside or outside a token, is a lexical error.
    fn next_token(&mut self) -> Result<Option<TokenPtr<'a>>> {
        let len = self.buffer.len();
        let mut ix = self.position;

        while ix < len && is_mm_space(self.buffer[ix]) {
            ix += 1;
        }

        let start = ix;
        while ix < len && !is_mm_space(self.buffer[ix]) {
            let ch = self.buffer[ix];
            try_assert!((0x21..=0x7E).contains(&ch), Diagnostic::BadCharacter(ch));
            ix += 1;
        }

        self.position = ix;
        Ok(if start == ix {
            None
        } else {
            Some(&self.buffer[start..ix])
        })
    }
}

/// Progress through a `$[ path $]` inclusion directive.
enum Inclusion {
    /// Not inside an inclusion directive.
    None,
    /// `$[` seen; the next token is the filename.
    Filename,
    /// Filename seen; the next token must be `$]`.
    Terminator(Token),
}

/// Reads tokens for named sources into the shared FIFO, following file
/// inclusions as it goes.
pub(crate) struct SourceReader<'a> {
    /// Injected sources, consulted before the filesystem.
    data: &'a [(String, Vec<u8>)],
    /// Names of sources already read; re-inclusion is a successful no-op.
    included: HashSet<String>,
    /// The token FIFO being populated.
    tokens: VecDeque<Token>,
}

impl<'a> SourceReader<'a> {
    pub(crate) fn new(data: &'a [(String, Vec<u8>)]) -> SourceReader<'a> {
        SourceReader {
            data,
            included: HashSet::default(),
            tokens: VecDeque::new(),
        }
    }

    /// Surrender the accumulated FIFO.
    pub(crate) fn into_tokens(self) -> VecDeque<Token> {
        self.tokens
    }

    fn injected_text(&self, name: &str) -> Option<&'a [u8]> {
        self.data
            .iter()
            .find(|(source, _)| source == name)
            .map(|(_, text)| text.as_slice())
    }

    /// Read and tokenize the named source, splicing its tokens onto the end
    /// of the FIFO.  A source that was already read is skipped.
    pub(crate) fn read(&mut self, name: &str) -> Result<()> {
        if !self.included.insert(name.to_owned()) {
            return Ok(());
        }

        match self.injected_text(name) {
            Some(text) => self.scan(text),
            None => {
                let text =
                    fs::read(name).map_err(|_| Diagnostic::IoError(name.to_owned()))?;
                self.scan(&text)
            }
        }
    }

    fn scan(&mut self, text: &[u8]) -> Result<()> {
        let mut scanner = Scanner::new(text);
        let mut in_comment = false;
        let mut inclusion = Inclusion::None;

        while let Some(token) = scanner.next_token()? {
            if in_comment {
                if token == b"$)" {
                    in_comment = false;
                    continue;
                }
                try_assert!(
                    !contains_sequence(token, b"$("),
                    Diagnostic::NestedComment
                );
                try_assert!(
                    !contains_sequence(token, b"$)"),
                    Diagnostic::BadCommentEnd
                );
                continue;
            }

            // Comments are recognized everywhere outside comments, even in
            // the middle of an inclusion directive.
            if token == b"$(" {
                in_comment = true;
                continue;
            }

            match mem::replace(&mut inclusion, Inclusion::None) {
                Inclusion::Filename => {
                    try_assert!(
                        !token.contains(&b'$'),
                        Diagnostic::FilenameDollar(token.into())
                    );
                    inclusion = Inclusion::Terminator(token.into());
                    continue;
                }
                Inclusion::Terminator(name) => {
                    try_assert!(
                        token == b"$]",
                        Diagnostic::BadIncludeDelimiter(token.into())
                    );
                    self.read(as_str(&name))?;
                    continue;
                }
                Inclusion::None => {}
            }

            if token == b"$[" {
                inclusion = Inclusion::Filename;
                continue;
            }

            self.tokens.push_back(token.into());
        }

        try_assert!(!in_comment, Diagnostic::UnclosedComment);
        try_assert!(
            matches!(inclusion, Inclusion::None),
            Diagnostic::UnclosedInclude
        );
        Ok(())
    }
}
