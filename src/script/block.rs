//! Brace matching and the generic "marker, then braced body" scanner.
//!
//! Header blocks (`info { .. }`), frame blocks (`F1-3 { .. }`) and color
//! blocks (`#FF0000 { .. }`) share one shape: a marker recognised at some
//! position, optional whitespace, then a brace-delimited body. The scanner
//! walks the text once and asks a probe function what, if anything, starts
//! at each position.

use std::ops::Range;

/// Find the `}` closing the `{` at `open`.
///
/// Returns `None` if `text[open]` is not `{` or if the text ends before the
/// nesting depth returns to zero.
pub fn find_matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the first non-whitespace byte at or after `pos`.
#[inline]
pub fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Case-insensitive ASCII prefix test at `pos`.
#[inline]
pub fn starts_with_ignore_case(bytes: &[u8], pos: usize, prefix: &[u8]) -> bool {
    bytes
        .get(pos..pos + prefix.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(prefix))
}

/// Result of probing one position of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Nothing starts here; move on by one byte.
    Miss,
    /// A marker was recognised but no `{` follows it. Scanning resumes at
    /// `resume`, which must lie past the probed position.
    Abandon { resume: usize },
    /// A marker was recognised and its body opens at `open`.
    Open { value: T, open: usize },
}

/// Which positions the scanner is allowed to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every position, including text inside unrelated braces.
    Anywhere,
    /// Only positions outside any brace pair.
    TopLevel,
}

/// A block found by [`BlockScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a, T> {
    /// Whatever the probe extracted from the marker.
    pub value: T,
    /// Text strictly between the braces.
    pub body: &'a str,
    /// Byte range from the opening to the closing brace, inclusive.
    pub braces: Range<usize>,
}

/// Iterator over the braced blocks of `text` whose markers `probe` accepts.
///
/// After a complete block the scan continues past its closing brace. A
/// marker without a body, or whose body never closes, is abandoned and the
/// scan continues; malformed input never stops iteration early.
pub struct BlockScanner<'a, F> {
    text: &'a str,
    pos: usize,
    depth: usize,
    scope: Scope,
    probe: F,
}

impl<'a, T, F> BlockScanner<'a, F>
where
    F: FnMut(&'a str, usize) -> Probe<T>,
{
    pub fn new(text: &'a str, scope: Scope, probe: F) -> Self {
        Self {
            text,
            pos: 0,
            depth: 0,
            scope,
            probe,
        }
    }
}

impl<'a, T, F> Iterator for BlockScanner<'a, F>
where
    F: FnMut(&'a str, usize) -> Probe<T>,
{
    type Item = Block<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();

        while self.pos < bytes.len() {
            let pos = self.pos;

            if self.scope == Scope::TopLevel && self.depth > 0 {
                match bytes[pos] {
                    b'{' => self.depth += 1,
                    b'}' => self.depth -= 1,
                    _ => {}
                }
                self.pos += 1;
                continue;
            }

            match (self.probe)(self.text, pos) {
                Probe::Miss => {
                    if self.scope == Scope::TopLevel && bytes[pos] == b'{' {
                        self.depth += 1;
                    }
                    self.pos += 1;
                }
                Probe::Abandon { resume } => {
                    self.pos = resume.max(pos + 1);
                }
                Probe::Open { value, open } => match find_matching_close(self.text, open) {
                    Some(close) => {
                        self.pos = close + 1;
                        return Some(Block {
                            value,
                            body: &self.text[open + 1..close],
                            braces: open..close + 1,
                        });
                    }
                    None => {
                        log::trace!("unterminated block opened at byte {open}");
                        self.pos = open.max(pos) + 1;
                        if self.scope == Scope::TopLevel {
                            // The unmatched brace keeps everything after it nested.
                            self.pos = bytes.len();
                        }
                    }
                },
            }
        }
        None
    }
}
