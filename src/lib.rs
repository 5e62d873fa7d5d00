pub mod ast;
pub mod cli;
pub mod context;
pub mod document;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod store;
pub mod value;

pub use ast::{Node, Operand, Token, Tree};
pub use document::{Attributes, Dataset, Entry, Group, Location, StoreError};
pub use evaluator::{EvalError, EvalObject, Evaluator, Renderer, View};
pub use lexer::{LexError, Lexer, tokenize};
pub use output::{JsonRenderer, TextRenderer};
pub use parser::{ParseError, Parsed, Parser, parse};
pub use store::{ErrorMode, Mode, Store};
pub use value::{DType, Scalar};
