//! Pixel lists inside a color block.
//!
//! Two line forms are understood:
//!
//! ```text
//! P=1x1,2x3,10x4     individual pixels
//! PL=1x1-1x8         axis-aligned run, endpoints inclusive
//! ```
//!
//! Anything else is ignored.

use crate::schema::MAX_DIMENSION;

/// A 1-indexed script coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
}

impl Pixel {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Parse an unsigned decimal, saturating on overflow. `None` if empty or
/// not all digits.
fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    }))
}

/// Parse `XxY` (either `x` or `X`), with no spaces inside.
fn parse_pair(s: &str) -> Option<Pixel> {
    let (x, y) = s.split_once(['x', 'X'])?;
    Some(Pixel::new(parse_number(x)?, parse_number(y)?))
}

/// `lo..=hi` cut off past the largest canvas. A run starting beyond it keeps
/// only its first point.
fn run_span(a: u32, b: u32) -> std::ops::RangeInclusive<u32> {
    let lo = a.min(b);
    let hi = a.max(b).min(lo.max(MAX_DIMENSION));
    lo..=hi
}

/// Strip a case-insensitive `prefix` from `line`.
fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &line[prefix.len()..])
}

/// Pixels on the segment between two endpoints, inclusive.
///
/// Only horizontal and vertical segments are drawn; a diagonal produces no
/// pixels. Points past `MAX_DIMENSION` can never land on a canvas and are
/// not generated.
pub fn line_pixels(from: Pixel, to: Pixel) -> Vec<Pixel> {
    if from.y == to.y {
        run_span(from.x, to.x)
            .map(|x| Pixel::new(x, from.y))
            .collect()
    } else if from.x == to.x {
        run_span(from.y, to.y)
            .map(|y| Pixel::new(from.x, y))
            .collect()
    } else {
        Vec::new()
    }
}

/// Parse a color block body into its pixels, in declaration order.
pub fn parse_pixels(body: &str) -> Vec<Pixel> {
    let mut pixels = Vec::new();

    for line in body.lines() {
        let line = line.trim();

        if let Some(list) = strip_prefix_ignore_case(line, "P=") {
            pixels.extend(list.split(',').filter_map(|item| parse_pair(item.trim())));
        } else if let Some(run) = strip_prefix_ignore_case(line, "PL=") {
            let endpoints = run
                .split_once('-')
                .and_then(|(a, b)| Some((parse_pair(a.trim())?, parse_pair(b.trim())?)));
            match endpoints {
                Some((from, to)) => pixels.extend(line_pixels(from, to)),
                None => log::trace!("skipping malformed run '{line}'"),
            }
        }
    }

    pixels
}
