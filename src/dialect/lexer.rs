//! Lexer for the Container Linux Config dialect using logos
//!
//! The dialect is line oriented: a line is either a document marker, a list
//! dash followed by more content, a `key: value` entry, or a bare scalar.
//! Literal block scalars (`key: |`) are captured whole by the entry callback,
//! so their contents never reach the token stream.

use logos::{Lexer, Logos};

use super::ast::{Scalar, Span};

/// Value that follows `key:` on the same line
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    /// Nothing after the colon; a nested node may follow on the next lines
    Empty,
    Scalar(Scalar),
    Block(String),
    /// Flow-style `[]`
    EmptySequence,
    /// Flow-style `{}`
    EmptyMapping,
}

/// A lexed `key: value` line
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub key: String,
    /// Byte length of the key, used to split the token span
    pub key_len: usize,
    pub value: EntryValue,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
pub enum RawToken {
    #[token("---")]
    DocumentStart,

    /// `- item` or a bare `-` whose item starts on the next line
    #[regex(r"-[ \t]*")]
    Dash,

    #[token("\n")]
    Newline,

    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    #[regex(r"[A-Za-z_][A-Za-z0-9_.\-]*:([ \t][^\n]*)?", lex_entry, priority = 10)]
    Entry(RawEntry),

    #[regex(r"[^\s#\-][^\n]*|-[^\s\-][^\n]*", lex_scalar, priority = 1)]
    Scalar(Scalar),
}

/// Lex input string into tokens with spans; lexing failures are kept as `Err`
pub fn lex(input: &str) -> impl Iterator<Item = (Result<RawToken, ()>, Span)> + '_ {
    RawToken::lexer(input).spanned()
}

fn lex_entry(lex: &mut Lexer<RawToken>) -> Option<RawEntry> {
    let slice = lex.slice();
    let colon = slice.find(':')?;
    let key = slice[..colon].to_string();
    let raw_value = strip_comment(slice[colon + 1..].trim());

    let value = if let Some(header) = BlockHeader::parse(raw_value) {
        let start = lex.span().start;
        let line_start = lex.source()[..start].rfind('\n').map_or(0, |i| i + 1);
        let (text, consumed) = scan_block(lex.remainder(), start - line_start, header);
        lex.bump(consumed);
        EntryValue::Block(text)
    } else if raw_value.is_empty() {
        EntryValue::Empty
    } else if raw_value == "[]" {
        EntryValue::EmptySequence
    } else if raw_value == "{}" {
        EntryValue::EmptyMapping
    } else {
        EntryValue::Scalar(parse_scalar(raw_value)?)
    };

    Some(RawEntry {
        key,
        key_len: colon,
        value,
    })
}

fn lex_scalar(lex: &mut Lexer<RawToken>) -> Option<Scalar> {
    parse_scalar(strip_comment(lex.slice().trim()))
}

/// Drop a trailing ` # comment`, leaving quoted text alone
fn strip_comment(value: &str) -> &str {
    let body_start = match value.chars().next() {
        Some(q @ ('"' | '\'')) => match closing_quote(value, q) {
            Some(end) => end + 1,
            None => return value,
        },
        _ => 0,
    };

    let mut prev_ws = body_start == 0;
    for (i, c) in value[body_start..].char_indices() {
        if c == '#' && prev_ws {
            return value[..body_start + i].trim_end();
        }
        prev_ws = c.is_whitespace();
    }
    value
}

/// Byte offset of the quote closing the one at offset 0
fn closing_quote(value: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    let mut chars = value.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if quote == '"' {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                return Some(i);
            }
        } else if c == '\'' {
            // '' is an escaped single quote
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
            } else {
                return Some(i);
            }
        }
    }
    None
}

fn parse_scalar(raw: &str) -> Option<Scalar> {
    match raw.chars().next() {
        Some('"') => {
            let end = closing_quote(raw, '"')?;
            if !raw[end + 1..].trim().is_empty() {
                return None;
            }
            Some(Scalar::quoted(unescape_double(&raw[1..end])?))
        }
        Some('\'') => {
            let end = closing_quote(raw, '\'')?;
            if !raw[end + 1..].trim().is_empty() {
                return None;
            }
            Some(Scalar::quoted(raw[1..end].replace("''", "'")))
        }
        _ => Some(Scalar::plain(raw)),
    }
}

fn unescape_double(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            ' ' => out.push(' '),
            _ => return None,
        }
    }
    Some(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomping {
    Clip,
    Strip,
    Keep,
}

/// Parsed `|`, `|-`, `|+`, `|2`, `|-2` ... header
#[derive(Debug, Clone, Copy)]
struct BlockHeader {
    chomping: Chomping,
    indentation: Option<usize>,
}

impl BlockHeader {
    fn parse(value: &str) -> Option<Self> {
        let rest = value.strip_prefix('|')?;
        let mut header = BlockHeader {
            chomping: Chomping::Clip,
            indentation: None,
        };
        for c in rest.chars() {
            match c {
                '-' if header.chomping == Chomping::Clip => header.chomping = Chomping::Strip,
                '+' if header.chomping == Chomping::Clip => header.chomping = Chomping::Keep,
                '1'..='9' if header.indentation.is_none() => {
                    header.indentation = c.to_digit(10).map(|d| d as usize)
                }
                _ => return None,
            }
        }
        Some(header)
    }
}

/// Capture the lines of a literal block that starts after a key at
/// `key_column`. Returns the block text and the number of bytes consumed
/// from `rest`; consumption stops before the newline of the first line that
/// does not belong to the block.
fn scan_block(rest: &str, key_column: usize, header: BlockHeader) -> (String, usize) {
    let mut content_indent = header.indentation.map(|d| key_column + d);
    let mut lines: Vec<&str> = Vec::new();
    let mut consumed = 0;

    while rest[consumed..].starts_with('\n') {
        let line_begin = consumed + 1;
        if line_begin >= rest.len() {
            break;
        }
        let line_end = rest[line_begin..]
            .find('\n')
            .map_or(rest.len(), |i| line_begin + i);
        let line = rest[line_begin..line_end].trim_end_matches('\r');
        let indent = line.len() - line.trim_start_matches(' ').len();

        if !line.trim().is_empty() {
            let required = *content_indent.get_or_insert(indent);
            if indent <= key_column || indent < required {
                break;
            }
        }

        lines.push(line);
        consumed = line_end;
    }

    let indent = content_indent.unwrap_or(key_column + 1);
    let mut body: Vec<&str> = lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                &line[indent.min(line.len())..]
            }
        })
        .collect();

    if header.chomping != Chomping::Keep {
        while body.last() == Some(&"") {
            body.pop();
        }
    }

    let mut text = body.join("\n");
    if !body.is_empty() && header.chomping != Chomping::Strip {
        text.push('\n');
    }
    (text, consumed)
}
