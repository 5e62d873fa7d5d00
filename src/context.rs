//! Positional information attached to parse errors.
//!
//! A [`ContextInfo`] says which syntactic position the parser was working on
//! when it gave up. It only feeds diagnostics.

use std::fmt;

/// Operator whose operand was being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpKind {
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Function whose argument list was being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Del,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextInfo {
    /// Attribute lookup chained after another one, as in `#first#second`.
    /// `first` is unknown until the inner lookup is reached.
    GetStatement {
        second: String,
        first: Option<String>,
    },

    /// One side of a binary operator
    BinaryOp { kind: BinaryOpKind, side: Side },

    /// Inside a function call's argument list
    FunctionCall { kind: FunctionKind },
}

impl fmt::Display for BinaryOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOpKind::Assignment => f.write_str("assignment"),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionKind::Del => f.write_str("del"),
        }
    }
}

impl fmt::Display for ContextInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextInfo::GetStatement {
                second,
                first: Some(first),
            } => write!(
                f,
                "in '#{}#{}': attributes cannot be read from an attribute",
                first, second
            ),
            ContextInfo::GetStatement {
                second,
                first: None,
            } => write!(f, "while reading attribute '#{}'", second),
            ContextInfo::BinaryOp { kind, side } => {
                write!(f, "on the {} side of {}", side, kind)
            }
            ContextInfo::FunctionCall { kind } => {
                write!(f, "in the argument of function '{}'", kind)
            }
        }
    }
}
