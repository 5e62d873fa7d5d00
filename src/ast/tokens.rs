use std::fmt;

/// Lexical token produced by the lexer.
///
/// Keywords and punctuation carry no payload; literals carry the parsed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    /// Key listing descriptor
    ///
    /// # Example
    /// ```text
    /// .group | keys
    /// ```
    Keys,

    /// Attribute snapshot descriptor
    ///
    /// # Example
    /// ```text
    /// .dataset | attrs
    /// ```
    Attrs,

    /// Attribute name listing descriptor
    ///
    /// # Example
    /// ```text
    /// kattrs
    /// ```
    AttrKeys,

    /// Deletion function
    ///
    /// # Example
    /// ```text
    /// del(.a.b)
    /// ```
    Del,

    // Punctuation
    /// Child access (`.`)
    Dot,

    /// Assignment (`=`)
    Equal,

    /// Attribute access (`#`)
    Octothorpe,

    /// Left parenthesis for function calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Statement separator (`|`)
    Pipe,

    // Literals
    /// Signed integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -1
    /// ```
    Integer(i64),

    /// Floating point number
    ///
    /// # Examples
    /// ```text
    /// 15e-1
    /// 1E3
    /// ```
    Float(f64),

    /// Key, attribute name or bare string value, with surrounding quotes removed
    ///
    /// # Examples
    /// ```text
    /// data
    /// 'test'
    /// "_private"
    /// ```
    Identifier(String),
}

impl Token {
    /// Fixed spelling of keyword and punctuation tokens.
    pub fn symbol(&self) -> Option<&'static str> {
        let symbol = match self {
            Token::Keys => "keys",
            Token::Attrs => "attrs",
            Token::AttrKeys => "kattrs",
            Token::Del => "del",
            Token::Dot => ".",
            Token::Equal => "=",
            Token::Octothorpe => "#",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Pipe => "|",
            Token::Integer(_) | Token::Float(_) | Token::Identifier(_) => return None,
        };
        Some(symbol)
    }

    pub fn keyword(word: &str) -> Option<Token> {
        match word {
            "keys" => Some(Token::Keys),
            "attrs" => Some(Token::Attrs),
            "kattrs" => Some(Token::AttrKeys),
            "del" => Some(Token::Del),
            _ => None,
        }
    }

    pub fn punctuation(fragment: &str) -> Option<Token> {
        match fragment {
            "." => Some(Token::Dot),
            "=" => Some(Token::Equal),
            "#" => Some(Token::Octothorpe),
            "(" => Some(Token::LParen),
            ")" => Some(Token::RParen),
            "|" => Some(Token::Pipe),
            _ => None,
        }
    }
}

/// Short textual form, used to quote token sequences in diagnostics.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Float(n) => write!(f, "{}", n),
            Token::Identifier(name) => write!(f, "{}", name),
            other => f.write_str(other.symbol().unwrap_or_default()),
        }
    }
}

/// Renders a token sequence the way it would read in a filter, quoted.
pub fn repr_tokens(tokens: &[Token]) -> String {
    let body: String = tokens.iter().map(Token::to_string).collect();
    format!("\"{}\"", body)
}
