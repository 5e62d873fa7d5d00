// tests/lexer_tests.rs

use hdfq::ast::Token;
use hdfq::lexer::{LexError, Lexer, tokenize};

fn lex(input: &str) -> Vec<Token> {
    tokenize(input).collect::<Result<_, _>>().unwrap()
}

fn ident(name: &str) -> Token {
    Token::Identifier(name.to_string())
}

// ============================================================================
// Punctuation and Keywords
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        (".", Token::Dot),
        ("=", Token::Equal),
        ("#", Token::Octothorpe),
        ("(", Token::LParen),
        (")", Token::RParen),
        ("|", Token::Pipe),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next(), Some(Ok(expected)), "Failed for input: {}", input);
        assert_eq!(lexer.next(), None);
    }
}

#[test]
fn test_keywords() {
    assert_eq!(
        lex("keys attrs kattrs del"),
        vec![Token::Keys, Token::Attrs, Token::AttrKeys, Token::Del]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(lex("keyset"), vec![ident("keyset")]);
    assert_eq!(lex("_del"), vec![ident("_del")]);
}

// ============================================================================
// Whitespace
// ============================================================================

#[test]
fn test_empty_input() {
    assert_eq!(lex(""), vec![]);
    assert_eq!(lex("   "), vec![]);
}

#[test]
fn test_whitespace_is_insignificant() {
    assert_eq!(lex(".a . b"), lex(".a.b"));
    assert_eq!(lex("del( .a )"), lex("del(.a)"));
    assert_eq!(lex(".a|keys"), lex(".a | keys"));
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_integers() {
    let test_cases = vec![("0", 0), ("42", 42), ("-1", -1), ("007", 7)];

    for (input, expected) in test_cases {
        assert_eq!(lex(input), vec![Token::Integer(expected)], "Failed for input: {}", input);
    }
}

#[test]
fn test_floats() {
    assert_eq!(lex("15e-1"), vec![Token::Float(1.5)]);
    assert_eq!(lex("1E3"), vec![Token::Float(1000.0)]);
}

#[test]
fn test_decimal_point_splits_fragments() {
    assert_eq!(
        lex("1.5"),
        vec![Token::Integer(1), Token::Dot, Token::Integer(5)]
    );
}

#[test]
fn test_quoted_identifiers() {
    assert_eq!(lex("'test'"), vec![ident("test")]);
    assert_eq!(lex("\"name\""), vec![ident("name")]);
    assert_eq!(lex("'keys'"), vec![ident("keys")]);
}

#[test]
fn test_assignment_tokens() {
    assert_eq!(
        lex(".b = -1"),
        vec![Token::Dot, ident("b"), Token::Equal, Token::Integer(-1)]
    );
    assert_eq!(
        lex("#c = 'test'"),
        vec![Token::Octothorpe, ident("c"), Token::Equal, ident("test")]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unknown_punctuation() {
    let err = tokenize(".a + 1").find_map(Result::err).unwrap();
    assert_eq!(
        err,
        LexError {
            fragment: "+".to_string(),
            position: 3,
        }
    );
    assert_eq!(err.to_string(), "Syntax error at '+' (position 3)");
}

#[test]
fn test_fragment_starting_with_digit() {
    let err = tokenize("1abc").next().unwrap().unwrap_err();
    assert_eq!(err.fragment, "1abc");
}

#[test]
fn test_tokens_before_error_are_produced() {
    let mut lexer = tokenize(".a $");
    assert_eq!(lexer.next(), Some(Ok(Token::Dot)));
    assert_eq!(lexer.next(), Some(Ok(ident("a"))));
    assert!(matches!(lexer.next(), Some(Err(_))));
    assert_eq!(lexer.next(), None);
}
