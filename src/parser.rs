//! Statement matcher for hdfq filters.
//!
//! The token stream is split on `|` and every slice is matched against the
//! statement shapes in priority order: assignment, function call, descriptor,
//! then plain accessor chain. Accessor chains are matched from the right: the
//! trailing `.name` / `#name` is stripped and the prefix is matched recursively
//! as its target.

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        Node, Operand, Token, Tree,
        tokens::repr_tokens,
    },
    context::{BinaryOpKind, ContextInfo, FunctionKind, Side},
    lexer::{LexError, Lexer},
    value::Scalar,
};

/// Errors raised while turning a filter into a [`Tree`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The lexer rejected a fragment
    #[error(transparent)]
    Syntax(#[from] LexError),

    /// A token slice matches no statement shape
    #[error("{message}{}", describe(.context))]
    Unexpected {
        message: String,
        context: Option<ContextInfo>,
    },
}

impl ParseError {
    fn unexpected(message: impl Into<String>, context: Option<ContextInfo>) -> Self {
        ParseError::Unexpected {
            message: message.into(),
            context,
        }
    }

    /// Position the parser was in when it failed, if known.
    pub fn context(&self) -> Option<&ContextInfo> {
        match self {
            ParseError::Unexpected { context, .. } => context.as_ref(),
            ParseError::Syntax(_) => None,
        }
    }
}

fn describe(context: &Option<ContextInfo>) -> String {
    match context {
        Some(context) => format!(" ({})", context),
        None => String::new(),
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Result of parsing a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub tree: Tree,
    /// True when some statement assigns or deletes, so the document must be
    /// opened for writing.
    pub requires_write_access: bool,
}

pub struct Parser {
    tokens: Vec<Token>,
}

impl Parser {
    /// Drains the lexer; fails on the first fragment it cannot classify.
    pub fn new(lexer: Lexer<'_>) -> Result<Self, ParseError> {
        let tokens = lexer.collect::<Result<Vec<_>, _>>()?;
        Ok(Parser { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Matches every pipeline stage and terminates the tree with `Display`.
    pub fn parse(&self) -> ParseResult<Parsed> {
        let mut statements = Vec::new();

        for slice in self.tokens.split(|token| *token == Token::Pipe) {
            if let Some(statement) = match_statement(slice)? {
                debug!(statement = %statement, "matched statement");
                statements.push(statement);
            }
        }

        let tree = Tree::new(statements);
        let requires_write_access = tree.requires_write_access();
        Ok(Parsed {
            tree,
            requires_write_access,
        })
    }
}

/// Parses a filter string.
///
/// # Examples
///
/// ```
/// use hdfq::parser::parse;
///
/// let parsed = parse(".b = -1").unwrap();
/// assert!(parsed.requires_write_access);
///
/// let parsed = parse(".a | keys").unwrap();
/// assert_eq!(parsed.tree.body.len(), 3);
/// assert!(!parsed.requires_write_access);
/// ```
pub fn parse(filter: &str) -> ParseResult<Parsed> {
    let parser = Parser::new(Lexer::new(filter))?;
    debug!(filter, tokens = parser.tokens().len(), "tokenized filter");
    parser.parse()
}

fn match_statement(tokens: &[Token]) -> ParseResult<Option<Node>> {
    if let Some(node) = match_assignment(tokens)? {
        return Ok(Some(node));
    }

    if let Some(node) = match_function_call(tokens)? {
        return Ok(Some(node));
    }

    if let Some(node) = match_descriptor(tokens) {
        return Ok(Some(node));
    }

    match_get_statement_all(tokens, true, None)
}

/// Literal right-hand side of an assignment.
fn match_atom(tokens: &[Token]) -> Option<Node> {
    let value = match tokens {
        [Token::Integer(n)] => Scalar::Integer(*n),
        [Token::Float(n)] => Scalar::Float(*n),
        [Token::Identifier(s)] => Scalar::String(s.clone()),
        _ => return None,
    };
    Some(Node::Constant(value))
}

/// `` and `.` both stand for the whole document; the empty slice only when
/// `allow_empty` is set.
fn matches_whole(tokens: &[Token], allow_empty: bool) -> bool {
    match tokens {
        [] => allow_empty,
        [Token::Dot] => true,
        _ => false,
    }
}

fn match_get_statement_all(
    tokens: &[Token],
    allow_empty: bool,
    context: Option<ContextInfo>,
) -> ParseResult<Option<Node>> {
    if matches_whole(tokens, allow_empty) {
        return Ok(None);
    }

    match_get_statement(tokens, true, context).map(Some)
}

fn match_get_statement(
    tokens: &[Token],
    allow_get_attr: bool,
    context: Option<ContextInfo>,
) -> ParseResult<Node> {
    match tokens {
        [left @ .., Token::Dot, Token::Identifier(value)] => {
            let target = match_target(left, allow_get_attr, context)?;
            Ok(Node::get(target, value.clone()))
        }

        [left @ .., Token::Octothorpe, Token::Identifier(value)] => {
            if !allow_get_attr {
                let context = match context {
                    Some(ContextInfo::GetStatement { second, .. }) => {
                        Some(ContextInfo::GetStatement {
                            second,
                            first: Some(value.clone()),
                        })
                    }
                    other => other,
                };
                return Err(ParseError::unexpected(
                    format!("Cannot get attribute '{}'", value),
                    context,
                ));
            }

            let context = context.or_else(|| {
                Some(ContextInfo::GetStatement {
                    second: value.clone(),
                    first: None,
                })
            });
            let target = match_target(left, false, context)?;
            Ok(Node::get_attr(target, value.clone()))
        }

        _ => Err(ParseError::unexpected(
            format!("Got unexpected pattern {}", repr_tokens(tokens)),
            context,
        )),
    }
}

fn match_target(
    tokens: &[Token],
    allow_get_attr: bool,
    context: Option<ContextInfo>,
) -> ParseResult<Operand> {
    if tokens.is_empty() {
        return Ok(Operand::Context);
    }

    let node = match_get_statement(tokens, allow_get_attr, context)?;
    Ok(Operand::node(node))
}

fn match_assignment(tokens: &[Token]) -> ParseResult<Option<Node>> {
    let Some(index) = tokens.iter().position(|token| *token == Token::Equal) else {
        return Ok(None);
    };
    let (left, right) = (&tokens[..index], &tokens[index + 1..]);

    let left_context = ContextInfo::BinaryOp {
        kind: BinaryOpKind::Assignment,
        side: Side::Left,
    };
    let Some(target) = match_get_statement_all(left, false, Some(left_context.clone()))? else {
        return Err(ParseError::unexpected(
            "Cannot assign to the whole document",
            Some(left_context),
        ));
    };

    let value = match match_atom(right) {
        Some(constant) => Operand::node(constant),
        None => {
            let right_context = ContextInfo::BinaryOp {
                kind: BinaryOpKind::Assignment,
                side: Side::Right,
            };
            match match_get_statement_all(right, false, Some(right_context))? {
                Some(node) => Operand::node(node),
                None => Operand::Context,
            }
        }
    };

    Ok(Some(Node::Assign {
        target: Box::new(target),
        value,
    }))
}

fn match_descriptor(tokens: &[Token]) -> Option<Node> {
    match tokens {
        [Token::Keys] => Some(Node::Keys),
        [Token::Attrs] => Some(Node::Attrs),
        [Token::AttrKeys] => Some(Node::AttrKeys),
        _ => None,
    }
}

fn match_function_call(tokens: &[Token]) -> ParseResult<Option<Node>> {
    match tokens {
        [Token::Del, Token::LParen, argument @ .., Token::RParen] => {
            let context = ContextInfo::FunctionCall {
                kind: FunctionKind::Del,
            };
            let accessor = match_get_statement(argument, true, Some(context.clone()))?;
            let (target, value) = accessor.detach().map_err(|node| {
                ParseError::unexpected(
                    format!("Cannot delete '{}'", node),
                    Some(context),
                )
            })?;
            Ok(Some(Node::Del {
                target,
                value: Box::new(value),
            }))
        }

        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(filter: &str) -> Vec<Token> {
        Lexer::new(filter).collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn test_matches_whole() {
        assert!(matches_whole(&tokens("."), false));
        assert!(matches_whole(&[], true));
        assert!(!matches_whole(&[], false));
        assert!(!matches_whole(&tokens(".a"), true));
    }

    #[test]
    fn test_match_atom() {
        assert_eq!(
            match_atom(&tokens("-1")),
            Some(Node::Constant(Scalar::Integer(-1)))
        );
        assert_eq!(
            match_atom(&tokens("'test'")),
            Some(Node::Constant(Scalar::from("test")))
        );
        assert_eq!(match_atom(&tokens(".a")), None);
    }

    #[test]
    fn test_assignment_without_equal_is_not_an_error() {
        assert_eq!(match_assignment(&tokens(".a.b")), Ok(None));
    }

    #[test]
    fn test_attribute_chain_context() {
        let err = match_get_statement(&tokens("#a#b"), true, None).unwrap_err();
        assert_eq!(
            err.context(),
            Some(&ContextInfo::GetStatement {
                second: "b".to_string(),
                first: Some("a".to_string()),
            })
        );
    }
}
