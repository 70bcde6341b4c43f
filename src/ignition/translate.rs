//! Translation of a validated Container Linux Config AST into Ignition
//!
//! Semantic problems are collected in a [`Report`]; items carrying an error
//! are left out of the produced config. The caller decides whether the
//! report is acceptable.

use super::dataurl;
use super::types::*;
use crate::diagnostics::Report;
use crate::dialect::{Document, Node, Span, Spanned};

const DEFAULT_FILESYSTEM: &str = "root";

const UNIT_EXTENSIONS: &[&str] = &[
    "service",
    "socket",
    "device",
    "mount",
    "automount",
    "swap",
    "target",
    "path",
    "timer",
    "snapshot",
    "slice",
    "scope",
];

/// Translate `document`, parsed from `source`, into an Ignition config
pub fn translate(source: &str, document: &Document) -> (Config, Report) {
    let mut translator = Translator {
        source,
        report: Report::new(),
    };
    let config = translator.config(&document.root);
    (config, translator.report)
}

/// Value of `key` in a mapping node; null values count as absent
fn get<'n>(node: &'n Spanned<Node>, key: &str) -> Option<&'n Spanned<Node>> {
    match &node.node {
        Node::Mapping(entries) => entries
            .iter()
            .find(|(k, _)| k.node == key)
            .map(|(_, v)| v)
            .filter(|v| v.node != Node::Null),
        _ => None,
    }
}

fn items(node: Option<&Spanned<Node>>) -> &[Spanned<Node>] {
    match node.map(|n| &n.node) {
        Some(Node::Sequence(items)) => items,
        _ => &[],
    }
}

fn text(node: &Spanned<Node>) -> Option<String> {
    node.node.as_text().map(str::to_string)
}

fn strings(node: Option<&Spanned<Node>>) -> Vec<String> {
    items(node).iter().filter_map(text).collect()
}

/// Parse a permission mode. A leading `0` or `0o` means octal.
pub fn parse_mode(value: &str) -> Option<u32> {
    let (digits, radix) = if let Some(rest) = value.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = value.strip_prefix("0x") {
        (rest, 16)
    } else if value.len() > 1 && value.starts_with('0') {
        (&value[1..], 8)
    } else {
        (value, 10)
    };
    if digits.starts_with(['+', '-']) {
        return None;
    }
    u32::from_str_radix(digits, radix)
        .ok()
        .filter(|mode| *mode <= 0o7777)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => Some(true),
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

fn plain(node: &Spanned<Node>) -> Option<&str> {
    match &node.node {
        Node::Scalar(s) if s.style == crate::dialect::ScalarStyle::Plain => Some(&s.value),
        _ => None,
    }
}

fn has_unit_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && UNIT_EXTENSIONS.contains(&ext))
}

struct Translator<'s> {
    source: &'s str,
    report: Report,
}

impl<'s> Translator<'s> {
    fn warn(&mut self, span: &Span, message: impl Into<String>) {
        self.report.warn(self.source, span.clone(), message);
    }

    fn error(&mut self, span: &Span, message: impl Into<String>) {
        self.report.error(self.source, span.clone(), message);
    }

    fn config(&mut self, root: &Spanned<Node>) -> Config {
        let mut config = Config::default();

        if let Some(storage) = get(root, "storage") {
            for item in items(get(storage, "files")) {
                if let Some(file) = self.file(item) {
                    config.storage.files.push(file);
                }
            }
            for item in items(get(storage, "directories")) {
                if let Some(directory) = self.directory(item) {
                    config.storage.directories.push(directory);
                }
            }
            for item in items(get(storage, "links")) {
                if let Some(link) = self.link(item) {
                    config.storage.links.push(link);
                }
            }
        }

        if let Some(systemd) = get(root, "systemd") {
            for item in items(get(systemd, "units")) {
                if let Some(unit) = self.unit(item) {
                    config.systemd.units.push(unit);
                }
            }
        }

        if let Some(passwd) = get(root, "passwd") {
            for item in items(get(passwd, "users")) {
                if let Some(user) = self.user(item) {
                    config.passwd.users.push(user);
                }
            }
        }

        config
    }

    fn required(&mut self, node: &Spanned<Node>, key: &str, kind: &str) -> Option<Spanned<String>> {
        match get(node, key).and_then(|v| text(v).map(|t| Spanned::new(t, v.span.clone()))) {
            Some(value) if !value.node.is_empty() => Some(value),
            _ => {
                self.error(&node.span, format!("{} is missing required key: {}", kind, key));
                None
            }
        }
    }

    fn boolean(&mut self, node: &Spanned<Node>, key: &str) -> Option<bool> {
        let value = get(node, key)?;
        match plain(value).and_then(parse_bool) {
            Some(b) => Some(b),
            None => {
                let shown = value.node.as_text().unwrap_or_default().to_string();
                self.error(&value.span, format!("invalid boolean for {}: {:?}", key, shown));
                None
            }
        }
    }

    fn integer(&mut self, node: &Spanned<Node>, key: &str) -> Option<i64> {
        let value = get(node, key)?;
        match plain(value).and_then(|v| v.parse::<i64>().ok()) {
            Some(i) => Some(i),
            None => {
                let shown = value.node.as_text().unwrap_or_default().to_string();
                self.error(&value.span, format!("invalid integer for {}: {:?}", key, shown));
                None
            }
        }
    }

    /// `Some(None)` when the mode is unset, `None` when it is illegal
    fn mode(&mut self, node: &Spanned<Node>, default: &str) -> Option<Option<u32>> {
        let Some(value) = get(node, "mode") else {
            self.warn(&node.span, format!("permissions unset, defaulting to {}", default));
            return Some(None);
        };
        match plain(value).and_then(parse_mode) {
            Some(mode) => Some(Some(mode)),
            None => {
                let shown = value.node.as_text().unwrap_or_default().to_string();
                self.error(&value.span, format!("illegal file mode: {}", shown));
                None
            }
        }
    }

    fn owner(&mut self, node: &Spanned<Node>, key: &str) -> Option<NodeOwner> {
        let owner = get(node, key)?;
        Some(NodeOwner {
            id: self.integer(owner, "id"),
            name: get(owner, "name").and_then(text),
        })
    }

    /// Validated path and filesystem shared by files, directories and links
    fn location(&mut self, node: &Spanned<Node>, kind: &str) -> Option<(String, String)> {
        let path = self.required(node, "path", kind)?;
        if !path.node.starts_with('/') {
            self.error(&path.span, format!("path not absolute: {}", path.node));
            return None;
        }

        let filesystem = get(node, "filesystem")
            .and_then(text)
            .unwrap_or_else(|| DEFAULT_FILESYSTEM.to_string());
        if filesystem != DEFAULT_FILESYSTEM {
            let span = get(node, "filesystem").map_or(node.span.clone(), |f| f.span.clone());
            self.error(
                &span,
                format!("filesystem {:?} is not defined, only \"root\" is available", filesystem),
            );
            return None;
        }

        Some((filesystem, path.node))
    }

    fn file(&mut self, node: &Spanned<Node>) -> Option<File> {
        let location = self.location(node, "file");
        let contents = self.contents(node);
        let mode = self.mode(node, "0644");
        let user = self.owner(node, "user");
        let group = self.owner(node, "group");
        let overwrite = self.boolean(node, "overwrite");
        let append = self.boolean(node, "append").unwrap_or(false);

        let (filesystem, path) = location?;
        Some(File {
            filesystem,
            path,
            user,
            group,
            overwrite,
            append,
            contents: contents?,
            mode: mode?,
        })
    }

    fn contents(&mut self, file: &Spanned<Node>) -> Option<FileContents> {
        let mut contents = FileContents::default();
        let Some(node) = get(file, "contents") else {
            return Some(contents);
        };

        let inline = get(node, "inline");
        let remote = get(node, "remote");
        match (inline, remote) {
            (Some(_), Some(remote)) => {
                self.error(&remote.span, "inline and remote contents are mutually exclusive");
                return None;
            }
            (Some(inline), None) => {
                let data = inline.node.as_text().unwrap_or_default();
                contents.source = dataurl::encode(data.as_bytes());
            }
            (None, Some(remote)) => {
                let url = self.required(remote, "url", "remote contents")?;
                contents.source = url.node;

                if let Some(compression) = get(remote, "compression") {
                    let value = text(compression).unwrap_or_default();
                    if value != "gzip" {
                        self.error(&compression.span, format!("unsupported compression: {}", value));
                        return None;
                    }
                    contents.compression = value;
                }

                if let Some(hash) = get(remote, "verification").and_then(|v| get(v, "hash")) {
                    contents.verification.hash = Some(self.hash(hash)?);
                }
            }
            (None, None) => {}
        }
        Some(contents)
    }

    fn hash(&mut self, node: &Spanned<Node>) -> Option<String> {
        let function = self.required(node, "function", "hash")?;
        let sum = self.required(node, "sum", "hash")?;
        if function.node != "sha512" {
            self.error(
                &function.span,
                format!("unsupported hash function: {}", function.node),
            );
            return None;
        }
        Some(format!("{}-{}", function.node, sum.node))
    }

    fn directory(&mut self, node: &Spanned<Node>) -> Option<Directory> {
        let location = self.location(node, "directory");
        let mode = self.mode(node, "0755");
        let user = self.owner(node, "user");
        let group = self.owner(node, "group");
        let overwrite = self.boolean(node, "overwrite");

        let (filesystem, path) = location?;
        Some(Directory {
            filesystem,
            path,
            user,
            group,
            overwrite,
            mode: mode?,
        })
    }

    fn link(&mut self, node: &Spanned<Node>) -> Option<Link> {
        let location = self.location(node, "link");
        let target = self.required(node, "target", "link");
        let hard = self.boolean(node, "hard").unwrap_or(false);
        let user = self.owner(node, "user");
        let group = self.owner(node, "group");
        let overwrite = self.boolean(node, "overwrite");

        let (filesystem, path) = location?;
        let target = target?;
        if target.node == path {
            self.error(&target.span, format!("link {} points to itself", path));
            return None;
        }
        Some(Link {
            filesystem,
            path,
            user,
            group,
            overwrite,
            target: target.node,
            hard,
        })
    }

    fn unit(&mut self, node: &Spanned<Node>) -> Option<Unit> {
        let name = self.required(node, "name", "unit")?;
        let valid_name = has_unit_extension(&name.node);
        if !valid_name {
            self.error(&name.span, format!("invalid systemd unit extension: {}", name.node));
        }

        let enable = match get(node, "enable") {
            Some(flag) => {
                self.warn(
                    &flag.span,
                    "the enable field has been deprecated in favor of enabled",
                );
                self.boolean(node, "enable").unwrap_or(false)
            }
            None => false,
        };
        let enabled = self.boolean(node, "enabled");
        let mask = self.boolean(node, "mask").unwrap_or(false);
        let contents = get(node, "contents").and_then(text);

        let mut dropins = Vec::new();
        for item in items(get(node, "dropins")) {
            let Some(dropin) = self.required(item, "name", "drop-in") else {
                continue;
            };
            if !dropin.node.ends_with(".conf") {
                self.error(
                    &dropin.span,
                    format!("invalid systemd unit drop-in extension: {}", dropin.node),
                );
                continue;
            }
            dropins.push(Dropin {
                name: dropin.node,
                contents: get(item, "contents").and_then(text),
            });
        }

        valid_name.then_some(Unit {
            name: name.node,
            contents,
            dropins,
            enable,
            enabled,
            mask,
        })
    }

    fn user(&mut self, node: &Spanned<Node>) -> Option<User> {
        let name = self.required(node, "name", "user")?;
        let uid = self.integer(node, "uid");
        let system = self.boolean(node, "system").unwrap_or(false);
        Some(User {
            name: name.node,
            password_hash: get(node, "password_hash").and_then(text),
            ssh_authorized_keys: strings(get(node, "ssh_authorized_keys")),
            home_dir: get(node, "home_dir").and_then(text),
            gecos: get(node, "gecos").and_then(text),
            groups: strings(get(node, "groups")),
            shell: get(node, "shell").and_then(text),
            uid,
            system,
        })
    }
}
