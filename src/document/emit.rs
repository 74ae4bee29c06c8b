//! Bundle document serialization
//!
//! Block style with two-space indentation and sequences indented under their
//! key. Multi-line strings are written as literal blocks and strings holding a
//! double quote are written double-quoted, since the deploy tool re-parses
//! secret references like `{{secrets/scope/key}}` inside quoted values.

use std::fmt::Write as _;

use serde_yaml::{Mapping, Value};

const INDENT: usize = 2;

/// Serialize a document value
pub fn emit(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Mapping(map) if !map.is_empty() => write_mapping(&mut out, map, 0),
        Value::Sequence(seq) if !seq.is_empty() => write_sequence(&mut out, seq, 0),
        other => {
            out.push_str(&inline_scalar(other));
            out.push('\n');
        }
    }
    out
}

fn pad(indent: usize) -> String {
    " ".repeat(indent)
}

fn write_mapping(out: &mut String, map: &Mapping, indent: usize) {
    for (key, value) in map {
        let _ = write!(out, "{}{}:", pad(indent), key_text(key));
        write_node_after_indicator(out, value, indent);
    }
}

fn write_sequence(out: &mut String, seq: &[Value], indent: usize) {
    for item in seq {
        match item {
            Value::Mapping(map) if !map.is_empty() => {
                let mut nested = String::new();
                write_mapping(&mut nested, map, indent + INDENT);
                out.push_str(&pad(indent));
                out.push_str("- ");
                out.push_str(&nested[indent + INDENT..]);
            }
            Value::Sequence(inner) if !inner.is_empty() => {
                let mut nested = String::new();
                write_sequence(&mut nested, inner, indent + INDENT);
                out.push_str(&pad(indent));
                out.push_str("- ");
                out.push_str(&nested[indent + INDENT..]);
            }
            other => {
                out.push_str(&pad(indent));
                out.push('-');
                write_node_after_indicator(out, other, indent);
            }
        }
    }
}

/// Write a value that follows `key:` or `-` at column `indent`
fn write_node_after_indicator(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Mapping(map) if !map.is_empty() => {
            out.push('\n');
            write_mapping(out, map, indent + INDENT);
        }
        Value::Sequence(seq) if !seq.is_empty() => {
            out.push('\n');
            write_sequence(out, seq, indent + INDENT);
        }
        Value::String(s) if use_literal_block(s) => {
            out.push(' ');
            write_literal_block(out, s, indent + INDENT);
        }
        Value::Tagged(tagged) => {
            let _ = write!(out, " {}", tagged.tag);
            write_node_after_indicator(out, &tagged.value, indent);
        }
        other => {
            out.push(' ');
            out.push_str(&inline_scalar(other));
            out.push('\n');
        }
    }
}

fn use_literal_block(s: &str) -> bool {
    s.contains('\n')
        && !s.starts_with([' ', '\t', '\n'])
        && !s.trim().is_empty()
        && !s.chars().any(|c| c.is_control() && c != '\n' && c != '\t')
}

fn write_literal_block(out: &mut String, s: &str, content_indent: usize) {
    let trailing_newlines = s.len() - s.trim_end_matches('\n').len();
    let chomp = match trailing_newlines {
        0 => "-",
        1 => "",
        _ => "+",
    };
    let _ = writeln!(out, "|{chomp}");

    let body = s.strip_suffix('\n').unwrap_or(s);
    for line in body.split('\n') {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{}{}", pad(content_indent), line);
        }
    }
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) if s.contains('\n') => double_quoted(s),
        other => inline_scalar(other),
    }
}

fn inline_scalar(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains('"') || s.contains('\n') => double_quoted(s),
        Value::Mapping(_) => "{}".to_string(),
        Value::Sequence(_) => "[]".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end_matches('\n').to_string())
            .unwrap_or_default(),
    }
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
