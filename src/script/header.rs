//! The `info { .. }` header block.

use std::collections::BTreeMap;

use super::block::{BlockScanner, Probe, Scope, skip_whitespace, starts_with_ignore_case};

/// Header key/value pairs with uppercased keys.
///
/// Later lines win when a key repeats. Keys the encoder does not understand
/// are kept so callers can inspect them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: BTreeMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value; the key is matched case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_ascii_uppercase(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse the body of a header block: one `KEY = value` per line.
///
/// Lines without `=`, or with an empty key or value, are skipped.
pub fn parse_header_body(body: &str) -> HeaderMap {
    let mut header = HeaderMap::new();
    for line in body.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        log::trace!("header {} = {}", key.to_ascii_uppercase(), value);
        header.insert(key, value);
    }
    header
}

fn info_probe(text: &str, pos: usize) -> Probe<()> {
    let bytes = text.as_bytes();
    if !starts_with_ignore_case(bytes, pos, b"info") {
        return Probe::Miss;
    }
    let open = skip_whitespace(bytes, pos + 4);
    if bytes.get(open) == Some(&b'{') {
        Probe::Open { value: (), open }
    } else {
        Probe::Abandon { resume: pos + 1 }
    }
}

/// Locate the first top-level `info { .. }` block and parse it.
///
/// A script without a header yields an empty map.
pub fn parse_header(text: &str) -> HeaderMap {
    match BlockScanner::new(text, Scope::TopLevel, info_probe).next() {
        Some(block) => parse_header_body(block.body),
        None => {
            log::debug!("no info block found");
            HeaderMap::new()
        }
    }
}
