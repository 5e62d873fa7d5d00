use std::fmt;

use crate::value::Scalar;

/// Where a node reads its input from.
///
/// `Context` is the value currently flowing through the pipeline; every chain
/// of accessors bottoms out there.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// The current pipeline value
    Context,

    /// A nested sub-expression
    Node(Box<Node>),
}

impl Operand {
    pub fn node(node: Node) -> Self {
        Operand::Node(Box::new(node))
    }
}

/// Abstract Syntax Tree node for one pipeline statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Renders the pipeline value. Appended to every parsed filter.
    Display,

    /// Ordered key list of a group (`keys`)
    Keys,

    /// Attribute snapshot of a group or dataset (`attrs`)
    Attrs,

    /// Ordered attribute names of a group or dataset (`kattrs`)
    AttrKeys,

    /// Literal value
    ///
    /// # Examples
    /// ```text
    /// .b = -1
    /// #c = 'test'
    /// ```
    Constant(Scalar),

    /// Child access
    ///
    /// # Examples
    /// ```text
    /// .a
    /// .a.b
    /// ```
    Get { target: Operand, value: String },

    /// Attribute access
    ///
    /// # Examples
    /// ```text
    /// #units
    /// .data#units
    /// ```
    GetAttr { target: Operand, value: String },

    /// Writes `value` into the location described by `target` (a `Get` or `GetAttr`).
    ///
    /// # Example
    /// ```text
    /// .a.b = 3
    /// ```
    Assign { target: Box<Node>, value: Operand },

    /// Deletes the key described by `value` (a `Get` or `GetAttr` rooted at the
    /// context) from the container `target` evaluates to.
    ///
    /// # Example
    /// ```text
    /// del(.a.b)
    /// ```
    Del { target: Operand, value: Box<Node> },
}

impl Node {
    pub fn get(target: Operand, value: impl Into<String>) -> Self {
        Node::Get {
            target,
            value: value.into(),
        }
    }

    pub fn get_attr(target: Operand, value: impl Into<String>) -> Self {
        Node::GetAttr {
            target,
            value: value.into(),
        }
    }

    /// Splits an accessor into its target and the same accessor re-rooted at
    /// the context: `.a.b.c` becomes (`.a.b`, `.c`).
    ///
    /// Returns the node unchanged in `Err` when it is not an accessor.
    pub fn detach(self) -> Result<(Operand, Node), Node> {
        match self {
            Node::Get { target, value } => Ok((target, Node::get(Operand::Context, value))),
            Node::GetAttr { target, value } => {
                Ok((target, Node::get_attr(Operand::Context, value)))
            }
            other => Err(other),
        }
    }

    /// Whether evaluating this statement modifies the document.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Node::Assign { .. } | Node::Del { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Node::Display => "Display",
            Node::Keys => "Keys",
            Node::Attrs => "Attrs",
            Node::AttrKeys => "AttrKeys",
            Node::Constant(_) => "Constant",
            Node::Get { .. } => "Get",
            Node::GetAttr { .. } => "GetAttr",
            Node::Assign { .. } => "Assign",
            Node::Del { .. } => "Del",
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Context => f.write_str("CTX"),
            Operand::Node(node) => write!(f, "{}", node),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Constant(value) => write!(f, "Constant(value={})", value),
            Node::Get { target, value } | Node::GetAttr { target, value } => {
                write!(f, "{}(target={}, value={})", self.name(), target, value)
            }
            Node::Assign { target, value } => {
                write!(f, "Assign(target={}, value={})", target, value)
            }
            Node::Del { target, value } => write!(f, "Del(target={}, value={})", target, value),
            _ => write!(f, "{}()", self.name()),
        }
    }
}

/// Parsed filter: the pipeline stages in order, always ending with `Display`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub body: Vec<Node>,
}

impl Tree {
    /// Builds a tree from matched statements, appending the terminal `Display`.
    pub fn new(mut statements: Vec<Node>) -> Self {
        statements.push(Node::Display);
        Tree { body: statements }
    }

    pub fn requires_write_access(&self) -> bool {
        self.body.iter().any(Node::is_mutating)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body: Vec<String> = self.body.iter().map(Node::to_string).collect();
        write!(f, "AST(body=[{}])", body.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detach_nested_get() {
        let node = Node::get(
            Operand::node(Node::get(Operand::node(Node::get(Operand::Context, "a")), "b")),
            "c",
        );
        let (target, value) = node.detach().unwrap();
        assert_eq!(
            target,
            Operand::node(Node::get(Operand::node(Node::get(Operand::Context, "a")), "b"))
        );
        assert_eq!(value, Node::get(Operand::Context, "c"));
    }

    #[test]
    fn test_detach_rejects_descriptors() {
        assert_eq!(Node::Keys.detach(), Err(Node::Keys));
    }

    #[test]
    fn test_tree_display() {
        let tree = Tree::new(vec![Node::get(Operand::Context, "a")]);
        assert_eq!(
            tree.to_string(),
            "AST(body=[Get(target=CTX, value=a), Display()])"
        );
    }
}
