// Network Setup - Sysconfig Document Model
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Lossless model of a shell-sourceable `KEY=VALUE` file.
//!
//! Every entry keeps the exact text it was parsed from, so a document that
//! is loaded and written back without changes reproduces the input byte for
//! byte. Changing a value re-renders only the value token of that line; the
//! indentation, `export` prefix, quoting style and inline comment survive.
//!
//! Files that are not valid UTF-8 (old Latin-1 comments are common) are read
//! byte per character and written back the same way.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{Error, Result};

/// Valid sysconfig variable names.
static KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static key regex is valid")
});

/// Values that a shell reads back unchanged without any quoting.
static BARE_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_./:,+@%=-]*$").expect("static value regex is valid")
});

/// Syntax error found while parsing document text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line number where the offending entry starts.
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Quoting style of a value token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quote {
    /// `KEY=value`
    #[default]
    None,
    /// `KEY='value'`
    Single,
    /// `KEY="value"`
    Double,
}

/// A `KEY=VALUE` assignment together with its surrounding source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// Leading whitespace and an optional `export ` keyword.
    prefix: String,
    key: String,
    /// Logical value with quotes and escapes removed.
    value: String,
    quote: Quote,
    /// Value token exactly as written, quotes included.
    token: String,
    /// Trailing whitespace, inline comment and line terminator.
    suffix: String,
}

impl Pair {
    /// Create a new assignment line terminated by a newline.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let (quote, token) = render_value(&value, Quote::None);
        Self {
            prefix: String::new(),
            key: key.into(),
            value,
            quote,
            token,
            suffix: "\n".to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value, keeping the original quoting where it can hold
    /// the new value. Setting an identical value leaves the text untouched.
    pub fn set_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value == self.value {
            return;
        }
        let (quote, token) = render_value(&value, self.quote);
        self.value = value;
        self.quote = quote;
        self.token = token;
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.prefix);
        out.push_str(&self.key);
        out.push('=');
        out.push_str(&self.token);
        out.push_str(&self.suffix);
    }

    fn ends_with_newline(&self) -> bool {
        self.suffix.ends_with('\n')
    }
}

/// One logical entry of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Pair(Pair),
    /// Comment line, raw text including indentation and line terminator.
    Comment(String),
    /// Empty or whitespace-only line, raw text.
    Blank(String),
}

impl Entry {
    fn write_to(&self, out: &mut String) {
        match self {
            Entry::Pair(pair) => pair.write_to(out),
            Entry::Comment(raw) | Entry::Blank(raw) => out.push_str(raw),
        }
    }

    fn ends_with_newline(&self) -> bool {
        match self {
            Entry::Pair(pair) => pair.ends_with_newline(),
            Entry::Comment(raw) | Entry::Blank(raw) => raw.ends_with('\n'),
        }
    }

    fn push_newline(&mut self) {
        match self {
            Entry::Pair(pair) => pair.suffix.push('\n'),
            Entry::Comment(raw) | Entry::Blank(raw) => raw.push('\n'),
        }
    }
}

/// Byte encoding of a document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// Every byte is one character (ISO 8859-1).
    Latin1,
}

/// Ordered, comment-preserving sysconfig document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueDocument {
    entries: Vec<Entry>,
    encoding: Encoding,
}

impl KeyValueDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw file content. Content that is not UTF-8 is decoded as
    /// Latin-1, so no byte is lost.
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, ParseError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => text.parse(),
            Err(_) => {
                let text: String = bytes.iter().map(|&b| char::from(b)).collect();
                let mut document: Self = text.parse()?;
                document.encoding = Encoding::Latin1;
                Ok(document)
            }
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the assignments in document order, duplicates included.
    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.entries().iter().filter_map(|entry| match entry {
            Entry::Pair(pair) => Some(pair),
            _ => None,
        })
    }

    /// Value of `key`. With duplicate keys the last assignment wins, which
    /// is what a shell sourcing the file would see.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs()
            .filter(|pair| pair.key == key)
            .last()
            .map(Pair::value)
    }

    /// Attribute view: unique keys ordered by first appearance, each with
    /// the value of its last assignment. Comments are excluded.
    pub fn attributes(&self) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = Vec::new();
        for pair in self.pairs() {
            match attrs.iter_mut().find(|(key, _)| key == &pair.key) {
                Some((_, value)) => *value = pair.value.clone(),
                None => attrs.push((pair.key.clone(), pair.value.clone())),
            }
        }
        attrs
    }

    /// Set `key` to `value`.
    ///
    /// An existing assignment is updated in place (the last one when the
    /// key is repeated); otherwise a new line is appended at the end.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if !is_valid_key(key) {
            return Err(Error::InvalidKey(key.to_string()));
        }

        let existing = self
            .entries
            .iter()
            .rposition(|entry| matches!(entry, Entry::Pair(pair) if pair.key == key));

        match existing {
            Some(idx) => {
                if let Entry::Pair(pair) = &mut self.entries[idx] {
                    pair.set_value(value);
                }
            }
            None => self.push(Entry::Pair(Pair::new(key, value))),
        }
        Ok(())
    }

    /// Remove every assignment of `key`. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !matches!(entry, Entry::Pair(pair) if pair.key == key));
        before != self.entries.len()
    }

    /// Append an entry after all existing ones, terminating the previous
    /// last line first if the source lacked a final newline.
    fn push(&mut self, entry: Entry) {
        if let Some(last) = self.entries.last_mut() {
            if !last.ends_with_newline() {
                last.push_newline();
            }
        }
        self.entries.push(entry);
    }

    /// Serialize the document back to text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            entry.write_to(&mut out);
        }
        out
    }

    /// Serialize the document in its on-disk encoding. In a Latin-1
    /// document characters above U+00FF are written as UTF-8.
    pub fn to_bytes(&self) -> Vec<u8> {
        let text = self.to_text();
        match self.encoding {
            Encoding::Utf8 => text.into_bytes(),
            Encoding::Latin1 => {
                let mut out = Vec::with_capacity(text.len());
                for c in text.chars() {
                    match u8::try_from(c) {
                        Ok(byte) => out.push(byte),
                        Err(_) => {
                            let mut buf = [0u8; 4];
                            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                        }
                    }
                }
                out
            }
        }
    }
}

impl fmt::Display for KeyValueDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for KeyValueDocument {
    type Err = ParseError;

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        Parser::new(text).parse()
    }
}

/// Check whether `key` is a valid sysconfig variable name.
pub fn is_valid_key(key: &str) -> bool {
    KEY_RE.is_match(key)
}

/// Render `value` as a token, preferring the `preferred` quoting style.
fn render_value(value: &str, preferred: Quote) -> (Quote, String) {
    match preferred {
        Quote::None if BARE_VALUE_RE.is_match(value) => (Quote::None, value.to_string()),
        Quote::Single if !value.contains('\'') => (Quote::Single, format!("'{}'", value)),
        _ => (Quote::Double, double_quote(value)),
    }
}

fn double_quote(value: &str) -> String {
    let mut token = String::with_capacity(value.len() + 2);
    token.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            token.push('\\');
        }
        token.push(c);
    }
    token.push('"');
    token
}

/// Line-oriented parser producing lossless entries.
struct Parser<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text, line: 1 }
    }

    fn parse(mut self) -> std::result::Result<KeyValueDocument, ParseError> {
        let mut entries = Vec::new();
        while !self.rest.is_empty() {
            let line = first_line(self.rest);
            let content = line.trim();
            let entry = if content.is_empty() {
                Entry::Blank(self.take(line.len()).to_string())
            } else if content.starts_with('#') {
                Entry::Comment(self.take(line.len()).to_string())
            } else {
                Entry::Pair(self.assignment()?)
            };
            entries.push(entry);
        }
        Ok(KeyValueDocument {
            entries,
            encoding: Encoding::Utf8,
        })
    }

    /// Consume `len` bytes, keeping the line counter in step.
    fn take(&mut self, len: usize) -> &'a str {
        let (taken, rest) = self.rest.split_at(len);
        self.line += taken.matches('\n').count();
        self.rest = rest;
        taken
    }

    fn assignment(&mut self) -> std::result::Result<Pair, ParseError> {
        let start_line = self.line;
        let text = self.rest;

        let indent = text.len() - text.trim_start_matches([' ', '\t']).len();
        let mut pos = indent;
        if let Some(after) = text[pos..].strip_prefix("export") {
            let gap = after.len() - after.trim_start_matches([' ', '\t']).len();
            if gap > 0 {
                pos += "export".len() + gap;
            }
        }
        let prefix_end = pos;

        let key_len = text[pos..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(text.len() - pos);
        let key = &text[pos..pos + key_len];
        pos += key_len;

        if !text[pos..].starts_with('=') {
            return Err(ParseError::new(start_line, "expected KEY=VALUE assignment"));
        }
        if !is_valid_key(key) {
            return Err(ParseError::new(start_line, format!("invalid key '{}'", key)));
        }
        pos += 1;

        let value_start = pos;
        let (value, quote, token_len) = scan_value(&text[value_start..])
            .map_err(|reason| ParseError::new(start_line, reason))?;
        let value_end = value_start + token_len;

        let suffix_len = first_line(&text[value_end..]).len();
        let suffix = &text[value_end..value_end + suffix_len];
        let trailing = suffix.trim_end_matches(['\n', '\r']);
        let allowed = trailing.trim().is_empty()
            || (trailing.starts_with([' ', '\t']) && trailing.trim_start().starts_with('#'));
        if !allowed {
            return Err(ParseError::new(start_line, "unexpected text after value"));
        }

        let pair = Pair {
            prefix: text[..prefix_end].to_string(),
            key: key.to_string(),
            value,
            quote,
            token: text[value_start..value_end].to_string(),
            suffix: suffix.to_string(),
        };
        self.take(value_end + suffix_len);
        Ok(pair)
    }
}

/// Text up to and including the next newline.
fn first_line(text: &str) -> &str {
    match text.find('\n') {
        Some(idx) => &text[..=idx],
        None => text,
    }
}

/// Scan a value token at the start of `text`.
///
/// Returns the logical value, the quoting style and the token length.
fn scan_value(text: &str) -> std::result::Result<(String, Quote, usize), String> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, '"')) => {
            let mut value = String::new();
            let mut escaped = false;
            for (idx, c) in chars {
                if escaped {
                    match c {
                        '"' | '\\' | '$' | '`' => value.push(c),
                        '\n' => {}
                        other => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    return Ok((value, Quote::Double, idx + 1));
                } else {
                    value.push(c);
                }
            }
            Err("unterminated double quote".to_string())
        }
        Some((_, '\'')) => match text[1..].find('\'') {
            Some(end) => Ok((text[1..=end].to_string(), Quote::Single, end + 2)),
            None => Err("unterminated single quote".to_string()),
        },
        _ => {
            let len = text
                .find([' ', '\t', '\n', '\r'])
                .unwrap_or(text.len());
            let token = &text[..len];
            if token.contains(['"', '\'']) {
                return Err("quotes inside unquoted value".to_string());
            }
            Ok((token.to_string(), Quote::None, len))
        }
    }
}
