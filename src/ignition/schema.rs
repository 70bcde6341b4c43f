//! Structural validation of a parsed Container Linux Config
//!
//! Runs right after parsing: flags unrecognized keys (warning), duplicate
//! keys and values of the wrong kind (error). Translation can then assume
//! every recognized key holds the node kind it expects.

use crate::diagnostics::Report;
use crate::dialect::{Document, Node, Spanned};

/// Expected shape of a node
#[derive(Debug)]
pub enum Shape {
    /// Scalar or block scalar
    Leaf,
    Map(&'static [(&'static str, Shape)]),
    List(&'static Shape),
}

impl Shape {
    fn kind(&self) -> &'static str {
        match self {
            Shape::Leaf => "string",
            Shape::Map(_) => "mapping",
            Shape::List(_) => "list",
        }
    }
}

const OWNER: Shape = Shape::Map(&[("id", Shape::Leaf), ("name", Shape::Leaf)]);

const HASH: Shape = Shape::Map(&[("function", Shape::Leaf), ("sum", Shape::Leaf)]);

const REMOTE: Shape = Shape::Map(&[
    ("url", Shape::Leaf),
    ("compression", Shape::Leaf),
    ("verification", Shape::Map(&[("hash", HASH)])),
]);

const CONTENTS: Shape = Shape::Map(&[("inline", Shape::Leaf), ("remote", REMOTE)]);

const FILE: Shape = Shape::Map(&[
    ("filesystem", Shape::Leaf),
    ("path", Shape::Leaf),
    ("contents", CONTENTS),
    ("mode", Shape::Leaf),
    ("user", OWNER),
    ("group", OWNER),
    ("overwrite", Shape::Leaf),
    ("append", Shape::Leaf),
]);

const DIRECTORY: Shape = Shape::Map(&[
    ("filesystem", Shape::Leaf),
    ("path", Shape::Leaf),
    ("mode", Shape::Leaf),
    ("user", OWNER),
    ("group", OWNER),
    ("overwrite", Shape::Leaf),
]);

const LINK: Shape = Shape::Map(&[
    ("filesystem", Shape::Leaf),
    ("path", Shape::Leaf),
    ("target", Shape::Leaf),
    ("hard", Shape::Leaf),
    ("user", OWNER),
    ("group", OWNER),
    ("overwrite", Shape::Leaf),
]);

const DROPIN: Shape = Shape::Map(&[("name", Shape::Leaf), ("contents", Shape::Leaf)]);

const UNIT: Shape = Shape::Map(&[
    ("name", Shape::Leaf),
    ("enable", Shape::Leaf),
    ("enabled", Shape::Leaf),
    ("mask", Shape::Leaf),
    ("contents", Shape::Leaf),
    ("dropins", Shape::List(&DROPIN)),
]);

const USER: Shape = Shape::Map(&[
    ("name", Shape::Leaf),
    ("password_hash", Shape::Leaf),
    ("ssh_authorized_keys", Shape::List(&Shape::Leaf)),
    ("home_dir", Shape::Leaf),
    ("gecos", Shape::Leaf),
    ("groups", Shape::List(&Shape::Leaf)),
    ("shell", Shape::Leaf),
    ("uid", Shape::Leaf),
    ("system", Shape::Leaf),
]);

/// Top-level document shape
pub const ROOT: Shape = Shape::Map(&[
    (
        "storage",
        Shape::Map(&[
            ("files", Shape::List(&FILE)),
            ("directories", Shape::List(&DIRECTORY)),
            ("links", Shape::List(&LINK)),
        ]),
    ),
    ("systemd", Shape::Map(&[("units", Shape::List(&UNIT))])),
    ("passwd", Shape::Map(&[("users", Shape::List(&USER))])),
]);

/// Validate `document` against [`ROOT`]
pub fn check(source: &str, document: &Document) -> Report {
    let mut report = Report::new();
    check_node(source, &document.root, &ROOT, "config", &mut report);
    report
}

fn check_node(source: &str, node: &Spanned<Node>, shape: &Shape, name: &str, report: &mut Report) {
    match (shape, &node.node) {
        (_, Node::Null) => {}
        (Shape::Leaf, Node::Scalar(_) | Node::Block(_)) => {}
        (Shape::Map(fields), Node::Mapping(entries)) => {
            let mut seen: Vec<&str> = Vec::new();
            for (key, value) in entries {
                if seen.contains(&key.node.as_str()) {
                    report.error(source, key.span.clone(), format!("duplicate key: {}", key.node));
                    continue;
                }
                seen.push(&key.node);

                match fields.iter().find(|(k, _)| *k == key.node) {
                    Some((_, field)) => check_node(source, value, field, &key.node, report),
                    None => report.warn(
                        source,
                        key.span.clone(),
                        format!("Config has unrecognized key: {}", key.node),
                    ),
                }
            }
        }
        (Shape::List(item), Node::Sequence(items)) => {
            for entry in items {
                check_node(source, entry, item, name, report);
            }
        }
        (shape, other) => report.error(
            source,
            node.span.clone(),
            format!("expected {} for {}, got {}", shape.kind(), name, other.kind()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::dialect::parse;

    fn messages(source: &str) -> Vec<(Severity, String)> {
        let doc = parse(source).expect("Should parse");
        check(source, &doc)
            .entries()
            .iter()
            .map(|e| (e.severity, e.message.clone()))
            .collect()
    }

    #[test]
    fn test_valid_document_is_clean() {
        let source = "storage:\n  files:\n  - path: /a\n    mode: 0644\n    contents:\n      inline: x\nsystemd:\n  units:\n  - name: a.service\n";
        assert!(messages(source).is_empty());
    }

    #[test]
    fn test_unrecognized_key_warns() {
        assert_eq!(
            messages("storage:\n  filez: []\n"),
            vec![(Severity::Warning, "Config has unrecognized key: filez".to_string())]
        );
    }

    #[test]
    fn test_wrong_kind_is_an_error() {
        assert_eq!(
            messages("storage:\n  files: /etc/foo\n"),
            vec![(Severity::Error, "expected list for files, got string".to_string())]
        );
    }

    #[test]
    fn test_duplicate_key_is_an_error() {
        let found = messages("passwd:\n  users: []\n  users: []\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, Severity::Error);
    }

    #[test]
    fn test_list_items_are_checked() {
        assert_eq!(
            messages("passwd:\n  users:\n  - name: core\n    ssh_authorized_keys:\n    - a: b\n"),
            vec![(
                Severity::Error,
                "expected string for ssh_authorized_keys, got mapping".to_string()
            )]
        );
    }
}
