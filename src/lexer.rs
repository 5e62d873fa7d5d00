use std::sync::LazyLock;

use regex::{Matches, Regex};
use thiserror::Error;

use crate::ast::Token;

/// A run of key-like characters, or any single other non-whitespace character.
static FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[A-Za-z0-9_'"\-]+|[^\sA-Za-z0-9_'"\-]"#).expect("fragment pattern is valid")
});

/// Input fragment that matches none of the lexical categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Syntax error at '{fragment}' (position {position})")]
pub struct LexError {
    pub fragment: String,
    /// Byte offset of the fragment in the filter string
    pub position: usize,
}

/// Splits a filter string into tokens.
///
/// Fragments are classified independently, numbers first: `12` is always an
/// integer, never an identifier.
pub struct Lexer<'a> {
    fragments: Matches<'static, 'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            fragments: FRAGMENT.find_iter(input),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let fragment = self.fragments.next()?;
        let token = classify(fragment.as_str()).ok_or_else(|| LexError {
            fragment: fragment.as_str().to_string(),
            position: fragment.start(),
        });
        Some(token)
    }
}

/// Tokenizes `input` lazily; restart by calling again.
pub fn tokenize(input: &str) -> Lexer<'_> {
    Lexer::new(input)
}

fn classify(fragment: &str) -> Option<Token> {
    if let Ok(n) = fragment.parse::<i64>() {
        return Some(Token::Integer(n));
    }

    if let Ok(n) = fragment.parse::<f64>() {
        return Some(Token::Float(n));
    }

    if let Some(keyword) = Token::keyword(fragment) {
        return Some(keyword);
    }

    let unquoted = fragment.trim_matches(|c| c == '"' || c == '\'');
    if is_identifier(unquoted) {
        return Some(Token::Identifier(unquoted.to_string()));
    }

    Token::punctuation(fragment)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[test]
fn test_keywords() {
    let tokens: Vec<Token> = tokenize("keys attrs kattrs del")
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        tokens,
        vec![Token::Keys, Token::Attrs, Token::AttrKeys, Token::Del]
    );
}

#[test]
fn test_pipe() {
    let mut lexer = Lexer::new(".a | keys");
    assert_eq!(lexer.next(), Some(Ok(Token::Dot)));
    assert_eq!(
        lexer.next(),
        Some(Ok(Token::Identifier("a".to_string())))
    );
    assert_eq!(lexer.next(), Some(Ok(Token::Pipe)));
    assert_eq!(lexer.next(), Some(Ok(Token::Keys)));
    assert_eq!(lexer.next(), None);
}
