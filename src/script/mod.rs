//! Script module - Parsing of HMIC animation scripts.

mod block;
mod header;
mod parser;
mod pixels;

pub use block::{Block, BlockScanner, Probe, Scope, find_matching_close};
pub use header::{HeaderMap, parse_header, parse_header_body};
pub use parser::{Command, Script, parse};
pub use pixels::{Pixel, line_pixels, parse_pixels};
