use crate::database::Database;
use crate::diag::Diagnostic;
use crate::statement::{StatementType, SymbolType, Token};
use assert_matches::assert_matches;

fn tok(text: &[u8]) -> Token {
    text.into()
}

fn verify(text: &[u8]) -> Result<Database, Diagnostic> {
    verify_files("test.mm", &[("test.mm", text)])
}

fn verify_files(start: &str, data: &[(&str, &[u8])]) -> Result<Database, Diagnostic> {
    let data: Vec<(String, Vec<u8>)> = data
        .iter()
        .map(|&(name, text)| (name.to_owned(), text.to_vec()))
        .collect();
    let mut db = Database::new();
    db.verify(start, &data)?;
    Ok(db)
}

fn mkdb(text: &[u8]) -> Database {
    verify(text).expect("database should verify")
}

fn errof(text: &[u8]) -> Diagnostic {
    verify(text).expect_err("database should fail to verify")
}

macro_rules! fail_test {
    ($name:ident, $text:expr, $diag:expr) => {
        #[test]
        fn $name() {
            assert_eq!(errof($text), $diag);
        }
    };
}

#[test]
fn test_empty_database() {
    assert!(verify(b"").is_ok());
}

#[test]
fn test_valid_whitespace() {
    assert!(verify(b" \t\r\n\x0C").is_ok());
}

#[test]
fn test_constants_only() {
    let db = mkdb(b"$c 0 + = -> ( ) term wff |- $.");
    assert_eq!(db.constants.len(), 9);
    assert!(db.constants.contains(&tok(b"term")));
    assert!(db.constants.contains(&tok(b"|-")));
    assert!(db.variables.is_empty());
}

fail_test!(test_invalid_c0, b"$c \x01 $.", Diagnostic::BadCharacter(1));
fail_test!(test_invalid_vt, b"$c \x0Bx $.", Diagnostic::BadCharacter(0x0B));
fail_test!(test_invalid_del, b"$c X\x7F $.", Diagnostic::BadCharacter(0x7F));
fail_test!(test_invalid_utf8, b"$c \xC3\xA9 $.", Diagnostic::BadCharacter(0xC3));

#[test]
fn test_comment_transparency() {
    let plain = mkdb(b"$c a b $.");
    let commented = mkdb(b"$( leading note $) $c a $( inner note $) b $.");
    assert_eq!(plain.constants, commented.constants);
}

#[test]
fn test_comment_tolerates_dollar_tokens() {
    assert!(verify(b"$( tokens like $c $v $. are fine here $)").is_ok());
}

fail_test!(test_unclosed_comment, b"$( unterminated", Diagnostic::UnclosedComment);
fail_test!(
    test_comment_open_in_comment,
    b"$( a $( b $)",
    Diagnostic::NestedComment
);
fail_test!(
    test_comment_end_inside_token,
    b"$( a x$) $c a $.",
    Diagnostic::BadCommentEnd
);

#[test]
fn test_inclusion() {
    let db = verify_files(
        "A",
        &[("A", b"$[ B $] $c a $."), ("B", b"$c b $.")],
    )
    .expect("inclusion should verify");
    assert!(db.constants.contains(&tok(b"a")));
    assert!(db.constants.contains(&tok(b"b")));
}

#[test]
fn test_include_once() {
    // A second inclusion is a no-op; reprocessing B would redeclare b.
    let db = verify_files(
        "A",
        &[("A", b"$[ B $] $[ B $] $c a $."), ("B", b"$c b $.")],
    )
    .expect("repeated inclusion should verify");
    assert_eq!(db.constants.len(), 2);
}

#[test]
fn test_include_cycle() {
    let db = verify_files(
        "A",
        &[("A", b"$[ B $] $c a $."), ("B", b"$[ A $] $c b $.")],
    )
    .expect("cyclic inclusion should verify");
    assert_eq!(db.constants.len(), 2);
}

#[test]
fn test_include_filename_dollar() {
    assert_eq!(
        verify_files("A", &[("A", b"$[ B$ $]")]).expect_err("filename is invalid"),
        Diagnostic::FilenameDollar(tok(b"B$"))
    );
}

#[test]
fn test_include_bad_delimiter() {
    assert_eq!(
        verify_files("A", &[("A", b"$[ B x $]"), ("B", b"")])
            .expect_err("missing delimiter"),
        Diagnostic::BadIncludeDelimiter(tok(b"x"))
    );
}

fail_test!(test_unfinished_include, b"$[ B", Diagnostic::UnclosedInclude);
fail_test!(test_bare_include, b"$[", Diagnostic::UnclosedInclude);

#[test]
fn test_missing_file() {
    let mut db = Database::new();
    assert_matches!(
        db.verify("does-not-exist.mm", &[]),
        Err(Diagnostic::IoError(_))
    );
}

#[test]
fn test_empty_group() {
    assert!(verify(b"${ $}").is_ok());
}

fail_test!(test_unmatched_close, b"$}", Diagnostic::UnmatchedCloseGroup);
fail_test!(test_unclosed_group, b"${", Diagnostic::UnclosedGroup);
fail_test!(
    test_constant_in_block,
    b"${ $c a $. $}",
    Diagnostic::ConstantNotTopLevel
);

fail_test!(
    test_empty_constant_statement,
    b"$c $.",
    Diagnostic::EmptyStatement(StatementType::Constant)
);
fail_test!(
    test_empty_variable_statement,
    b"$v $.",
    Diagnostic::EmptyStatement(StatementType::Variable)
);
fail_test!(
    test_unterminated_constant_statement,
    b"$c a",
    Diagnostic::UnterminatedStatement(StatementType::Constant)
);
fail_test!(
    test_unterminated_variable_statement,
    b"$v x",
    Diagnostic::UnterminatedStatement(StatementType::Variable)
);

fail_test!(
    test_constant_redeclared_inline,
    b"$c a a $.",
    Diagnostic::DuplicateConstant(tok(b"a"))
);
fail_test!(
    test_constant_redeclared,
    b"$c a $. $c a $.",
    Diagnostic::DuplicateConstant(tok(b"a"))
);
fail_test!(
    test_variable_redeclared_while_active,
    b"$v x $. $v x $.",
    Diagnostic::DuplicateVariable(tok(b"x"))
);

#[test]
fn test_variable_redeclared_after_scope() {
    // Only *active* redeclaration is an error.
    assert!(verify(b"${ $v x $. $} $v x $.").is_ok());
}

fail_test!(
    test_variable_then_constant,
    b"$v x $. $c x $.",
    Diagnostic::SymbolRedeclared(SymbolType::Constant, tok(b"x"))
);
fail_test!(
    test_constant_then_variable,
    b"$c x $. $v x $.",
    Diagnostic::SymbolRedeclared(SymbolType::Variable, tok(b"x"))
);
fail_test!(
    test_constant_with_dollar,
    b"$c a$b $.",
    Diagnostic::NotMathSymbol(SymbolType::Constant, tok(b"a$b"))
);
fail_test!(
    test_variable_with_dollar,
    b"$v a$b $.",
    Diagnostic::NotMathSymbol(SymbolType::Variable, tok(b"a$b"))
);

fail_test!(
    test_constant_reused_as_label,
    b"$c wff $. wff $a wff $.",
    Diagnostic::SymbolReusedAsLabel(SymbolType::Constant, tok(b"wff"))
);
fail_test!(
    test_variable_reused_as_label,
    b"$c wff $. $v x $. x $a wff $.",
    Diagnostic::SymbolReusedAsLabel(SymbolType::Variable, tok(b"x"))
);
fail_test!(
    test_label_reused_as_constant,
    b"$c wff $. $v x $. wx $f wff x $. $c wx $.",
    Diagnostic::LabelReusedAsSymbol(SymbolType::Constant, tok(b"wx"))
);
fail_test!(
    test_label_reused_as_variable,
    b"$c wff $. ax $a wff $. $v ax $.",
    Diagnostic::LabelReusedAsSymbol(SymbolType::Variable, tok(b"ax"))
);
fail_test!(
    test_label_reused,
    b"$c wff $. ax $a wff $. ax $a wff $.",
    Diagnostic::DuplicateLabel(tok(b"ax"))
);

#[test]
fn test_disjoint_pair() {
    assert!(verify(b"$v x y $. $d x y $.").is_ok());
}

fail_test!(
    test_disjoint_repeat,
    b"$v x y $. $d x x $.",
    Diagnostic::DjRepeatedVariable(tok(b"x"))
);
fail_test!(
    test_disjoint_single,
    b"$v x $. $d x $.",
    Diagnostic::DisjointSingle
);
fail_test!(
    test_disjoint_not_variable,
    b"$c a $. $v x $. $d x a $.",
    Diagnostic::DjNotVariable(tok(b"a"))
);
fail_test!(
    test_disjoint_unterminated,
    b"$v x y $. $d x y",
    Diagnostic::UnterminatedStatement(StatementType::Disjoint)
);

#[test]
fn test_floating_hypothesis() {
    let db = mkdb(b"$c wff $. $v x $. wx $f wff x $.");
    let hyp = db.hypothesis(b"wx").expect("wx should be recorded");
    assert!(hyp.floating);
    assert_eq!(*hyp.expression, [tok(b"wff"), tok(b"x")]);
}

fail_test!(
    test_floating_redeclared,
    b"$c wff term $. $v x $. wx $f wff x $. tx $f term x $.",
    Diagnostic::FloatRedeclared(tok(b"x"), tok(b"tx"))
);
fail_test!(
    test_floating_not_variable,
    b"$c wff a $. wx $f wff a $.",
    Diagnostic::FloatNotVariable(tok(b"wx"), tok(b"a"))
);
fail_test!(
    test_floating_type_not_constant,
    b"$v x $. wx $f x x $.",
    Diagnostic::ExprNotConstantPrefix(StatementType::Floating, tok(b"wx"), tok(b"x"))
);
fail_test!(
    test_floating_extra_symbol,
    b"$c wff $. $v x y $. wx $f wff x y $.",
    Diagnostic::FloatNotTerminated(tok(b"wx"), tok(b"y"))
);
fail_test!(
    test_floating_unfinished,
    b"$c wff $. $v x $. wx $f wff x",
    Diagnostic::UnfinishedStatement(StatementType::Floating, tok(b"wx"))
);

#[test]
fn test_essential_hypothesis() {
    let db = mkdb(b"$c wff $. $v x $. wx $f wff x $. e1 $e wff x $.");
    let hyp = db.hypothesis(b"e1").expect("e1 should be recorded");
    assert!(!hyp.floating);
    assert_eq!(*hyp.expression, [tok(b"wff"), tok(b"x")]);
}

fail_test!(
    test_essential_variable_without_floating,
    b"$c wff $. $v x $. e1 $e wff x $.",
    Diagnostic::ExprBadSymbol(StatementType::Essential, tok(b"e1"), tok(b"x"))
);
fail_test!(
    test_essential_not_constant_prefix,
    b"$c wff $. $v x $. wx $f wff x $. e1 $e x wff $.",
    Diagnostic::ExprNotConstantPrefix(StatementType::Essential, tok(b"e1"), tok(b"x"))
);

#[test]
fn test_typecode_only_expression() {
    let db = mkdb(b"$c wff $. ax $a wff $.");
    let assertion = db.assertion(b"ax").expect("ax should be recorded");
    assert_eq!(*assertion.expression, [tok(b"wff")]);
    assert!(assertion.hypotheses.is_empty());
}

fail_test!(test_unexpected_keyword, b"$q", Diagnostic::UnexpectedToken(tok(b"$q")));
fail_test!(
    test_unexpected_terminator,
    b"$.",
    Diagnostic::UnexpectedToken(tok(b"$."))
);
fail_test!(test_unfinished_label, b"foo", Diagnostic::UnfinishedLabel);
fail_test!(
    test_label_before_non_statement,
    b"foo bar",
    Diagnostic::UnexpectedToken(tok(b"bar"))
);
