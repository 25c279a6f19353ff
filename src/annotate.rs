//! Marks config lines that point at a frozen image.
//!
//! The config file is read as a sequence of lines. Entry lines
//! (`key = value [# comment]`) are parsed just enough to compare their value;
//! everything else (section headers, comments, blank lines) is carried through
//! byte-for-byte.
//!
//! Values are compared after git-config decoding (quotes and escapes).

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::FROZEN_COMMENT;

#[derive(Debug, PartialEq, Eq)]
enum ConfigLine<'a> {
    Entry {
        /// Line text up to and including the value, comment stripped.
        head: &'a str,
        value: &'a str,
        eol: &'a str,
    },
    Other(&'a str),
}

fn split_eol(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, "\n")
    } else {
        (raw, "")
    }
}

/// Byte offset where a trailing `#`/`;` comment starts, ignoring quoted text.
fn comment_start(s: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '#' | ';' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_line(raw: &str) -> ConfigLine<'_> {
    let (body, eol) = split_eol(raw);
    let trimmed = body.trim_start();
    if trimmed.is_empty() || trimmed.starts_with(['[', '#', ';']) {
        return ConfigLine::Other(raw);
    }
    let Some(eq) = body.find('=') else {
        return ConfigLine::Other(raw);
    };

    let after_eq = &body[eq + 1..];
    let value_part = match comment_start(after_eq) {
        Some(c) => &after_eq[..c],
        None => after_eq,
    };
    let value = value_part.trim();
    let value_end = eq + 1 + value_part.trim_end().len();

    ConfigLine::Entry {
        head: &body[..value_end],
        value,
        eol,
    }
}

/// Decode a raw git-config value: drop quotes and resolve backslash escapes.
fn decode_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {}
            '\\' => match chars.next() {
                Some('t') => out.push('\t'),
                Some('n') => out.push('\n'),
                Some('b') => out.push('\u{8}'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            _ => out.push(c),
        }
    }
    out
}

/// Result of annotating one config text.
#[derive(Debug, PartialEq, Eq)]
pub struct Annotated {
    pub text: String,
    pub matched: usize,
}

/// Append the frozen marker to every entry whose value equals `image`.
///
/// Any trailing comment on a matching line is replaced, so a line that is
/// already marked keeps exactly one marker and still counts as a match.
pub fn annotate_frozen(text: &str, image: &str) -> Annotated {
    let mut out = String::with_capacity(text.len() + 16);
    let mut matched = 0;

    for raw in text.split_inclusive('\n') {
        match parse_line(raw) {
            ConfigLine::Entry { head, value, eol } if decode_value(value) == image => {
                matched += 1;
                out.push_str(head);
                out.push_str("  ");
                out.push_str(FROZEN_COMMENT);
                out.push_str(eol);
            }
            _ => out.push_str(raw),
        }
    }

    Annotated { text: out, matched }
}

/// Annotate `path` in place.
///
/// The rewritten text goes to a scratch file next to `path` that only replaces
/// it once fully written; the scratch file is removed on any failure. The
/// file is left untouched when nothing matched.
pub fn annotate_file(path: &Path, image: &str) -> Result<usize> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let annotated = annotate_frozen(&text, image);
    if annotated.matched == 0 {
        return Ok(0);
    }
    if annotated.text != text {
        write_atomic(path, annotated.text.as_bytes())?;
    }
    Ok(annotated.matched)
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write temp file {}", tmp.path().display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync temp file {}", tmp.path().display()))?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())
            .with_context(|| format!("copy permissions of {}", path.display()))?;
    }
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/annotate_tests.rs"]
mod tests;
