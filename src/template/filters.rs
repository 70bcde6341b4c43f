//! Tera filters used by the skeletons

use std::collections::HashMap;

use tera::{Error, Result, Value};

/// Prefix every line of `text`, blank ones included, with `width` spaces
pub fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    let separator = format!("\n{}", pad);
    format!("{}{}", pad, text.split('\n').collect::<Vec<_>>().join(&separator))
}

/// Double-quote `value` when it would not read back as the same plain scalar
pub fn quote(value: &str) -> String {
    const SPECIAL_START: &[char] = &[
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%',
        '@', '`',
    ];
    let needs_quotes = value.is_empty()
        || value.starts_with(SPECIAL_START)
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.ends_with(':')
        || value.contains(": ")
        || value.contains(" #")
        || value.contains(['\n', '\t', '\r']);
    if !needs_quotes {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn as_text<'v>(value: &'v Value, filter: &str) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| Error::msg(format!("Filter `{}` expects a string, got {}", filter, value)))
}

/// `{{ text | yaml_indent(width=8) }}`
pub fn yaml_indent(value: &Value, args: &HashMap<String, Value>) -> Result<Value> {
    let text = as_text(value, "yaml_indent")?;
    let width = match args.get("width") {
        Some(width) => width
            .as_u64()
            .ok_or_else(|| Error::msg("Filter `yaml_indent` expects an integer `width`"))?,
        None => return Err(Error::msg("Filter `yaml_indent` requires a `width` argument")),
    };
    Ok(Value::String(indent(text, width as usize)))
}

/// `{{ text | yaml_quote }}`
pub fn yaml_quote(value: &Value, _: &HashMap<String, Value>) -> Result<Value> {
    Ok(Value::String(quote(as_text(value, "yaml_quote")?)))
}
