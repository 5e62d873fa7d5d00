//! # hdfq Filter Language - Abstract Syntax Tree
//!
//! A filter is a `|`-separated pipeline of statements evaluated against a
//! hierarchical document of groups, typed arrays and attributes.
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[nodes]** - Statement nodes, the context sentinel and the parsed tree
//!
//! ## Statements
//!
//! ```text
//! .a.b              // child access
//! .a#units          // attribute access (outermost position only)
//! keys | attrs | kattrs
//! .a.b = 3          // assignment
//! #label = 'raw'
//! del(.a.b)         // deletion
//! ```
//!
//! Accessor chains are read right to left: `.a.b.c` is "get `c` from (get `b`
//! from (get `a` from the context))".
pub mod nodes;
pub mod tokens;

pub use nodes::{Node, Operand, Tree};
pub use tokens::Token;
