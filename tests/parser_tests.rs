// tests/parser_tests.rs

use hdfq::ast::{Node, Operand, Tree};
use hdfq::context::{BinaryOpKind, ContextInfo, FunctionKind, Side};
use hdfq::parser::{ParseError, parse};
use hdfq::value::Scalar;

fn get(target: Operand, key: &str) -> Node {
    Node::get(target, key)
}

fn ctx_get(key: &str) -> Node {
    Node::get(Operand::Context, key)
}

fn body(filter: &str) -> Vec<Node> {
    parse(filter).unwrap().tree.body
}

// ============================================================================
// Whole document
// ============================================================================

#[test]
fn test_empty_and_dot_are_noops() {
    for filter in ["", ".", " . "] {
        let parsed = parse(filter).unwrap();
        assert_eq!(parsed.tree, Tree::new(vec![]), "Failed for filter: {:?}", filter);
        assert_eq!(parsed.tree.body, vec![Node::Display]);
        assert!(!parsed.requires_write_access);
    }
}

#[test]
fn test_dot_stage_in_pipeline_is_dropped() {
    assert_eq!(body(". | keys"), vec![Node::Keys, Node::Display]);
}

// ============================================================================
// Get statements
// ============================================================================

#[test]
fn test_simple_get() {
    assert_eq!(body(".a"), vec![ctx_get("a"), Node::Display]);
}

#[test]
fn test_nested_get() {
    assert_eq!(
        body(".a.b"),
        vec![get(Operand::node(ctx_get("a")), "b"), Node::Display]
    );
    assert_eq!(
        parse(".a.b").unwrap().tree.to_string(),
        "AST(body=[Get(target=Get(target=CTX, value=a), value=b), Display()])"
    );
}

#[test]
fn test_whitespace_equivalence() {
    assert_eq!(parse(".a . b").unwrap(), parse(".a.b").unwrap());
    assert_eq!(parse(" .x|keys ").unwrap(), parse(".x | keys").unwrap());
}

#[test]
fn test_get_attribute() {
    assert_eq!(
        body("#units"),
        vec![Node::get_attr(Operand::Context, "units"), Node::Display]
    );
    assert_eq!(
        body(".a.b#units"),
        vec![
            Node::get_attr(Operand::node(get(Operand::node(ctx_get("a")), "b")), "units"),
            Node::Display
        ]
    );
}

#[test]
fn test_attribute_of_attribute_is_rejected() {
    let err = parse("#a#b").unwrap_err();
    assert_eq!(
        err.context(),
        Some(&ContextInfo::GetStatement {
            second: "b".to_string(),
            first: Some("a".to_string()),
        })
    );
    assert_eq!(
        err.to_string(),
        "Cannot get attribute 'a' (in '#a#b': attributes cannot be read from an attribute)"
    );
}

#[test]
fn test_attribute_below_attribute_is_rejected() {
    assert!(parse("#a.b#c").is_err());
    assert!(parse(".x#a.b").is_ok());
}

#[test]
fn test_unexpected_pattern() {
    let err = parse(".a..b").unwrap_err();
    assert!(err.to_string().starts_with("Got unexpected pattern"));

    let err = parse("a").unwrap_err();
    assert_eq!(err.to_string(), "Got unexpected pattern \"a\"");
}

// ============================================================================
// Descriptors
// ============================================================================

#[test]
fn test_descriptors() {
    assert_eq!(
        body(".a | keys | attrs | kattrs"),
        vec![ctx_get("a"), Node::Keys, Node::Attrs, Node::AttrKeys, Node::Display]
    );
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_assign_constant() {
    let parsed = parse(".b = -1").unwrap();
    assert!(parsed.requires_write_access);
    assert_eq!(
        parsed.tree.body,
        vec![
            Node::Assign {
                target: Box::new(ctx_get("b")),
                value: Operand::node(Node::Constant(Scalar::Integer(-1))),
            },
            Node::Display
        ]
    );
}

#[test]
fn test_assign_string_to_attribute() {
    assert_eq!(
        body("#c = 'test'"),
        vec![
            Node::Assign {
                target: Box::new(Node::get_attr(Operand::Context, "c")),
                value: Operand::node(Node::Constant(Scalar::from("test"))),
            },
            Node::Display
        ]
    );
}

#[test]
fn test_assign_float() {
    assert_eq!(
        body(".x = 15e-1")[0],
        Node::Assign {
            target: Box::new(ctx_get("x")),
            value: Operand::node(Node::Constant(Scalar::Float(1.5))),
        }
    );
}

#[test]
fn test_assign_from_get() {
    assert_eq!(
        body(".a.b = .c")[0],
        Node::Assign {
            target: Box::new(get(Operand::node(ctx_get("a")), "b")),
            value: Operand::node(ctx_get("c")),
        }
    );
}

#[test]
fn test_assign_whole_document() {
    assert_eq!(
        body(".copy = .")[0],
        Node::Assign {
            target: Box::new(ctx_get("copy")),
            value: Operand::Context,
        }
    );
}

#[test]
fn test_read_only_filters() {
    for filter in [".b", "keys", ".a#b", ".a | attrs"] {
        assert!(!parse(filter).unwrap().requires_write_access, "Failed for filter: {}", filter);
    }
}

#[test]
fn test_literal_cannot_be_assigned() {
    let err = parse("1 = 2").unwrap_err();
    assert_eq!(
        err.context(),
        Some(&ContextInfo::BinaryOp {
            kind: BinaryOpKind::Assignment,
            side: Side::Left,
        })
    );
    assert_eq!(
        err.to_string(),
        "Got unexpected pattern \"1\" (on the left side of assignment)"
    );
}

#[test]
fn test_whole_document_cannot_be_assigned() {
    let err = parse(". = 1").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Unexpected { ref message, .. } if message == "Cannot assign to the whole document"
    ));

    let err = parse("= 1").unwrap_err();
    assert!(err.to_string().starts_with("Got unexpected pattern \"\""));
}

#[test]
fn test_missing_right_side() {
    let err = parse(".a =").unwrap_err();
    assert_eq!(
        err.context(),
        Some(&ContextInfo::BinaryOp {
            kind: BinaryOpKind::Assignment,
            side: Side::Right,
        })
    );
}

// ============================================================================
// Deletion
// ============================================================================

#[test]
fn test_del_nested() {
    let parsed = parse("del(.a.b)").unwrap();
    assert!(parsed.requires_write_access);
    assert_eq!(
        parsed.tree.body,
        vec![
            Node::Del {
                target: Operand::node(ctx_get("a")),
                value: Box::new(ctx_get("b")),
            },
            Node::Display
        ]
    );
}

#[test]
fn test_del_top_level_attribute() {
    assert_eq!(
        body("del(#units)")[0],
        Node::Del {
            target: Operand::Context,
            value: Box::new(Node::get_attr(Operand::Context, "units")),
        }
    );
}

#[test]
fn test_del_requires_accessor() {
    let err = parse("del(keys)").unwrap_err();
    assert_eq!(
        err.context(),
        Some(&ContextInfo::FunctionCall {
            kind: FunctionKind::Del,
        })
    );
    assert!(parse("del()").is_err());
}

#[test]
fn test_pipe_splits_del_argument() {
    let err = parse("del(.a | .b)").unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { .. }));
    assert_eq!(err.to_string(), "Got unexpected pattern \"del(\"");
}

// ============================================================================
// Lexer errors
// ============================================================================

#[test]
fn test_syntax_error_propagates() {
    let err = parse(".a + 1").unwrap_err();
    assert!(matches!(err, ParseError::Syntax(_)));
    assert_eq!(err.context(), None);
}
