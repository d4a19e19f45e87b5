//! Script parser: header, frame blocks and color blocks.
//!
//! ```text
//! info {
//!     DISPLAY=16x16
//!     FPS=8
//!     F=4
//! }
//! F1-4 {
//!     #FF0000 { P=1x1,2x2 }
//!     rgba(0,0,255,128) { PL=1x4-16x4 }
//! }
//! ```
//!
//! The format is permissive: stray text is skipped, and a marker that is
//! not followed by a well-formed block is abandoned without failing the
//! parse.

use super::block::{BlockScanner, Probe, Scope, skip_whitespace, starts_with_ignore_case};
use super::header::{HeaderMap, parse_header};
use super::pixels::{Pixel, parse_pixels};
use crate::render::{Rgba, resolve_color};

/// Draw `pixels` in `color` on every frame in `start_frame..=end_frame`
/// (1-indexed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub start_frame: u32,
    pub end_frame: u32,
    /// Color specifier as written: `#RRGGBB`, `rgb(..)` or `rgba(..)`.
    pub color: String,
    pub pixels: Vec<Pixel>,
}

impl Command {
    /// Resolve the color specifier to RGBA.
    #[inline]
    pub fn rgba(&self) -> Rgba {
        resolve_color(&self.color)
    }
}

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub header: HeaderMap,
    /// Commands in declaration order; each has at least one pixel.
    pub commands: Vec<Command>,
}

impl Script {
    pub fn parse(text: &str) -> Self {
        parse(text)
    }

    /// Total number of pixels across all commands.
    pub fn pixel_count(&self) -> usize {
        self.commands.iter().map(|c| c.pixels.len()).sum()
    }
}

/// Parse a script into its header and draw commands.
pub fn parse(text: &str) -> Script {
    let header = parse_header(text);

    let mut commands = Vec::new();
    let mut frame_blocks = 0usize;
    for block in BlockScanner::new(text, Scope::Anywhere, frame_probe) {
        let (start, end) = block.value;
        log::trace!("frame block F{start}-{end} at bytes {:?}", block.braces);
        parse_frame_body(block.body, start, end, &mut commands);
        frame_blocks += 1;
    }

    log::debug!(
        "parsed {} header keys, {} frame blocks, {} commands",
        header.len(),
        frame_blocks,
        commands.len()
    );

    Script { header, commands }
}

/// Read a run of decimal digits starting at `pos`, saturating on overflow.
fn read_number(bytes: &[u8], pos: &mut usize) -> Option<u32> {
    let start = *pos;
    let mut value = 0u32;
    while let Some(&b) = bytes.get(*pos).filter(|b| b.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(u32::from(b - b'0'));
        *pos += 1;
    }
    (*pos > start).then_some(value)
}

/// Recognise `F<start>[-<end>]` followed by `{`.
fn frame_probe(text: &str, pos: usize) -> Probe<(u32, u32)> {
    let bytes = text.as_bytes();
    if !matches!(bytes[pos], b'F' | b'f') || !bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) {
        return Probe::Miss;
    }

    let mut cursor = pos + 1;
    let Some(start) = read_number(bytes, &mut cursor) else {
        return Probe::Miss;
    };
    let mut end = start;
    if bytes.get(cursor) == Some(&b'-') {
        cursor += 1;
        match read_number(bytes, &mut cursor) {
            Some(n) => end = n,
            None => return Probe::Abandon { resume: pos + 1 },
        }
    }

    let open = skip_whitespace(bytes, cursor);
    if bytes.get(open) == Some(&b'{') {
        Probe::Open {
            value: (start, end),
            open,
        }
    } else {
        Probe::Abandon { resume: pos + 1 }
    }
}

/// Length of the color specifier starting at `pos`, if any.
///
/// Tried in order: `rgba(..)`, `rgb(..)`, `#` plus six hex digits.
fn color_len(bytes: &[u8], pos: usize) -> Option<usize> {
    for prefix in [&b"rgba("[..], &b"rgb("[..]] {
        if starts_with_ignore_case(bytes, pos, prefix) {
            let close = bytes[pos + prefix.len()..].iter().position(|&b| b == b')')?;
            return Some(prefix.len() + close + 1);
        }
    }

    if bytes[pos] == b'#'
        && bytes
            .get(pos + 1..pos + 7)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    {
        return Some(7);
    }

    None
}

/// Recognise a color specifier followed by `{`.
fn color_probe(text: &str, pos: usize) -> Probe<&str> {
    let bytes = text.as_bytes();
    let Some(len) = color_len(bytes, pos) else {
        return Probe::Miss;
    };

    let color = &text[pos..pos + len];
    let open = skip_whitespace(bytes, pos + len);
    if bytes.get(open) == Some(&b'{') {
        Probe::Open { value: color, open }
    } else {
        log::trace!("color {color} has no pixel block");
        Probe::Abandon { resume: open }
    }
}

/// Parse the body of one frame block, appending a command per non-empty
/// color block.
fn parse_frame_body(body: &str, start: u32, end: u32, commands: &mut Vec<Command>) {
    for block in BlockScanner::new(body, Scope::Anywhere, color_probe) {
        let pixels = parse_pixels(block.body);
        if pixels.is_empty() {
            log::trace!("dropping {} block without pixels", block.value);
            continue;
        }
        commands.push(Command {
            start_frame: start,
            end_frame: end,
            color: block.value.to_string(),
            pixels,
        });
    }
}
