//! RGBA colors and color specifier resolution.

use bytemuck::{Pod, Zeroable};

/// An 8-bit RGBA color. Laid out as four bytes so frame buffers can be
/// viewed as raw `r g b a` byte streams.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Composite `src` onto `self`.
    ///
    /// Opaque sources replace, fully transparent sources are ignored, and
    /// anything in between blends the color channels source-over. Alpha is
    /// raised to the larger of the two rather than composited.
    #[inline]
    pub fn blend(&mut self, src: Rgba) {
        match src.a {
            255 => *self = src,
            0 => {}
            a => {
                let a = f32::from(a) / 255.0;
                let ia = 1.0 - a;
                self.r = (f32::from(src.r) * a + f32::from(self.r) * ia) as u8;
                self.g = (f32::from(src.g) * a + f32::from(self.g) * ia) as u8;
                self.b = (f32::from(src.b) * a + f32::from(self.b) * ia) as u8;
                self.a = self.a.max(src.a);
            }
        }
    }
}

/// Parse a decimal component, narrowing it to 8 bits.
fn component(s: &str) -> Option<u8> {
    s.trim().parse::<i64>().ok().map(|v| v as u8)
}

/// Parse the comma-separated arguments of `name(..)`, returning exactly `N`
/// components.
fn components<const N: usize>(args: &str) -> Option<[u8; N]> {
    let inner = args.strip_suffix(')').unwrap_or(args);
    let mut parts = inner.split(',');
    let mut out = [0u8; N];
    for slot in &mut out {
        *slot = component(parts.next()?)?;
    }
    parts.next().is_none().then_some(out)
}

fn hex_byte(s: &str) -> Option<u8> {
    u8::from_str_radix(s, 16).ok()
}

/// Resolve a color specifier.
///
/// `#RRGGBB` and `rgb(r,g,b)` are opaque; `rgba(r,g,b,a)` carries its own
/// alpha. Components outside 0-255 wrap. Anything unrecognised resolves to
/// opaque white.
pub fn resolve_color(spec: &str) -> Rgba {
    try_resolve_color(spec).unwrap_or(Rgba::WHITE)
}

fn try_resolve_color(spec: &str) -> Option<Rgba> {
    let spec = spec.trim();
    let lower = spec.to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix('#') {
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        return Some(Rgba::opaque(
            hex_byte(&hex[0..2])?,
            hex_byte(&hex[2..4])?,
            hex_byte(&hex[4..6])?,
        ));
    }
    if let Some(args) = lower.strip_prefix("rgba(") {
        let [r, g, b, a] = components::<4>(args)?;
        return Some(Rgba::new(r, g, b, a));
    }
    if let Some(args) = lower.strip_prefix("rgb(") {
        let [r, g, b] = components::<3>(args)?;
        return Some(Rgba::opaque(r, g, b));
    }
    None
}
