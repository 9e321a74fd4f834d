//! Front-end tests against the public API.
//!
//! The JSON snapshots double as documentation of the serialized tree.

use retarget_syntax::{Node, NodeData, NodeKind, Program, StructureEq, reader_for_dialect};

fn parse(dialect: &str, source: &str) -> Program {
    reader_for_dialect(dialect)
        .expect("reader registered")
        .read(source)
        .expect("parse failed")
}

mod python_reader {
    use super::*;

    #[test]
    fn assignment_shape() {
        let program = parse("python", "x = 1");
        insta::assert_json_snapshot!(program.body[0], @r#"
        {
          "line": 1,
          "kind": "Assign",
          "target": {
            "line": 1,
            "kind": "Name",
            "id": "x",
            "ctx": "Store"
          },
          "value": {
            "line": 1,
            "kind": "Constant",
            "value": 1
          }
        }
        "#);
    }

    #[test]
    fn comparison_shape() {
        let program = parse("python", "a < b");
        insta::assert_json_snapshot!(program.body[0], @r#"
        {
          "line": 1,
          "kind": "Expr",
          "value": {
            "line": 1,
            "kind": "Compare",
            "left": {
              "line": 1,
              "kind": "Name",
              "id": "a",
              "ctx": "Load"
            },
            "ops": [
              "<"
            ],
            "comparators": [
              {
                "line": 1,
                "kind": "Name",
                "id": "b",
                "ctx": "Load"
              }
            ]
          }
        }
        "#);
    }

    #[test]
    fn nested_blocks() {
        let source = "\
def f(n):
    total = 0
    for i in range(n):
        if i % 2 == 0:
            continue
        total += i
    return total
";
        let program = parse("python", source);
        assert_eq!(program.body.len(), 1);
        let NodeData::FunctionDef { name, args, body } = &program.body[0].data else {
            panic!("expected function definition");
        };
        assert_eq!(name, "f");
        assert_eq!(args, &["n".to_string()]);
        let kinds: Vec<_> = body.iter().map(Node::kind).collect();
        assert_eq!(kinds, [NodeKind::Assign, NodeKind::For, NodeKind::Return]);

        let NodeData::For { body: loop_body, .. } = &body[1].data else {
            panic!("expected for loop");
        };
        assert_eq!(loop_body[0].kind(), NodeKind::If);
        assert_eq!(loop_body[1].kind(), NodeKind::AugAssign);
        assert_eq!(loop_body[1].line, 6);
    }

    #[test]
    fn classes_and_methods() {
        let source = "\
class Point:
    def __init__(self, x):
        self.x = x
";
        let program = parse("python", source);
        let NodeData::ClassDef { name, body } = &program.body[0].data else {
            panic!("expected class");
        };
        assert_eq!(name, "Point");
        let NodeData::FunctionDef { args, body, .. } = &body[0].data else {
            panic!("expected method");
        };
        assert_eq!(args, &["self".to_string(), "x".to_string()]);
        assert!(matches!(
            &body[0].data,
            NodeData::Assign { target, .. } if target.kind() == NodeKind::Attribute
        ));
    }

    #[test]
    fn comments_are_dropped() {
        let program = parse("python", "# leading\nx = 1  # trailing\n");
        assert_eq!(program.body.len(), 1);
        assert_eq!(program.body[0].line, 2);
    }

    #[test]
    fn else_on_loops_is_rejected() {
        let reader = reader_for_dialect("python").unwrap();
        assert!(reader.read("while x:\n    pass\nelse:\n    pass").is_err());
    }
}

mod json_reader {
    use super::*;

    #[test]
    fn matches_python_front_end() {
        let from_json = parse(
            "json",
            r#"{"body": [{"kind": "Expr", "value": {"kind": "Call",
                "func": {"kind": "Name", "id": "print"},
                "args": [{"kind": "Constant", "value": "hi"}]}}]}"#,
        );
        let from_python = parse("python", "print('hi')");
        assert!(from_json.structure_eq(&from_python));
    }
}
